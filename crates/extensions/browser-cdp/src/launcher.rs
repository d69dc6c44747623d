//! Chrome process management.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{info, warn};

use autoengage_protocols::{Browser, Page, PageError};

use crate::client::CdpClient;
use crate::error::CdpError;
use crate::page::CdpPage;

const STARTUP_ATTEMPTS: u32 = 30;
const STARTUP_POLL: Duration = Duration::from_millis(200);

/// How to obtain a Chrome instance.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Start Chrome ourselves. When false only attach to `debug_port`.
    pub launch: bool,
    pub debug_port: u16,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Persistent profile so login state survives restarts.
    pub profile_dir: PathBuf,
    pub chrome_path: Option<PathBuf>,
    /// Passed through as `--proxy-server`.
    pub proxy: Option<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            launch: true,
            debug_port: 9222,
            headless: false,
            viewport_width: 1280,
            viewport_height: 800,
            profile_dir: PathBuf::from(".autoengage/chrome-profile"),
            chrome_path: None,
            proxy: None,
        }
    }
}

impl LaunchOptions {
    pub fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.debug_port)
    }

    /// Command-line flags for a launched Chrome.
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.debug_port),
            format!("--user-data-dir={}", self.profile_dir.display()),
            format!(
                "--window-size={},{}",
                self.viewport_width, self.viewport_height
            ),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-sync".to_string(),
            "--disable-translate".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        if let Some(proxy) = &self.proxy {
            args.push(format!("--proxy-server={}", proxy));
        }
        args
    }
}

/// Locate a Chrome-family executable in the usual install paths.
pub fn find_chrome() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    let paths: &[&str] = &[
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    #[cfg(target_os = "linux")]
    let paths: &[&str] = &[
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
    ];

    #[cfg(target_os = "windows")]
    let paths: &[&str] = &[
        r"C:\Program Files\Google\Chrome\Application\chrome.exe",
        r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    ];

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    let paths: &[&str] = &[];

    paths.iter().map(PathBuf::from).find(|p| p.exists())
}

/// A connected Chrome, optionally owned by this process.
pub struct CdpBrowser {
    client: CdpClient,
    options: LaunchOptions,
    chrome: Mutex<Option<Child>>,
}

impl CdpBrowser {
    /// Connect to Chrome, starting it first if allowed and not already listening.
    pub async fn launch(options: LaunchOptions) -> Result<Self, CdpError> {
        let endpoint = options.endpoint();
        let running = CdpClient::version(&endpoint).await.is_ok();

        let chrome = if running {
            info!(port = options.debug_port, "Chrome already running, attaching");
            None
        } else if options.launch {
            let child = Self::spawn(&options)?;
            Self::wait_until_listening(&endpoint).await?;
            Some(child)
        } else {
            return Err(CdpError::ChromeNotAvailable(endpoint));
        };

        let client = CdpClient::connect(&endpoint).await?;
        info!(endpoint = %endpoint, "Connected to Chrome");

        Ok(Self {
            client,
            options,
            chrome: Mutex::new(chrome),
        })
    }

    fn spawn(options: &LaunchOptions) -> Result<Child, CdpError> {
        let chrome_path = options
            .chrome_path
            .clone()
            .or_else(find_chrome)
            .ok_or(CdpError::ChromeNotFound)?;

        if let Err(e) = std::fs::create_dir_all(&options.profile_dir) {
            warn!("Failed to create profile directory: {}", e);
        }
        info!(
            profile = %options.profile_dir.display(),
            headless = options.headless,
            "Launching Chrome"
        );

        let child = Command::new(&chrome_path)
            .args(options.chrome_args())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CdpError::LaunchFailed(e.to_string()))?;

        info!("Chrome launched with PID: {:?}", child.id());
        Ok(child)
    }

    async fn wait_until_listening(endpoint: &str) -> Result<(), CdpError> {
        for _ in 0..STARTUP_ATTEMPTS {
            tokio::time::sleep(STARTUP_POLL).await;
            if CdpClient::version(endpoint).await.is_ok() {
                return Ok(());
            }
        }
        Err(CdpError::LaunchFailed(
            "Chrome failed to start within timeout".to_string(),
        ))
    }

    /// Open a tab sized to the configured viewport.
    pub async fn open_page(&self) -> Result<CdpPage, CdpError> {
        let session = self.client.new_page().await?;
        session
            .set_viewport(self.options.viewport_width, self.options.viewport_height)
            .await?;
        Ok(CdpPage::new(session))
    }

    pub fn client(&self) -> &CdpClient {
        &self.client
    }

    /// Kill Chrome if this process started it.
    pub async fn shutdown(&self) {
        if let Some(mut child) = self.chrome.lock().await.take() {
            info!("Shutting down Chrome");
            if let Err(e) = child.kill().await {
                warn!("Failed to kill Chrome: {}", e);
            }
        }
    }
}

#[async_trait]
impl Browser for CdpBrowser {
    async fn new_page(&self) -> Result<Box<dyn Page>, PageError> {
        Ok(Box::new(self.open_page().await?))
    }
}
