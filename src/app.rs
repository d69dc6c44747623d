//! Wiring from configuration to a ready [`Session`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use autoengage_browser_cdp::{CdpBrowser, LaunchOptions};
use autoengage_config::{BrowserConfig, Config, ConfigLoader, GeneratorConfig};
use autoengage_core::{LoginMethod, Session, SessionSettings};
use autoengage_protocols::{
    Browser, ContentGenerator, DedupStore, GenerationError, GenerationRequest, Page,
};
use autoengage_provider_gemini::GeminiGenerator;
use autoengage_store_sqlite::{JsonCookieStore, SqliteDedupStore};

/// Get the .autoengage directory path.
pub(crate) fn autoengage_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".autoengage"))
        .unwrap_or_else(|| PathBuf::from(".autoengage"))
}

/// Generator used when no API key is configured. Every call fails, so the
/// engine skips comment and DM generation but keeps liking and browsing.
pub(crate) struct UnconfiguredGenerator;

#[async_trait]
impl ContentGenerator for UnconfiguredGenerator {
    fn id(&self) -> &str {
        "unconfigured"
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<Value, GenerationError> {
        Err(GenerationError::NotConfigured(
            "no generator API key configured".to_string(),
        ))
    }
}

pub(crate) fn launch_options(config: &BrowserConfig) -> LaunchOptions {
    LaunchOptions {
        launch: config.launch,
        debug_port: config.debug_port,
        headless: config.headless,
        viewport_width: config.viewport_width,
        viewport_height: config.viewport_height,
        profile_dir: PathBuf::from(ConfigLoader::expand_path(&config.profile_dir)),
        chrome_path: config
            .chrome_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(|p| PathBuf::from(ConfigLoader::expand_path(p))),
        proxy: config.proxy.clone().filter(|p| !p.trim().is_empty()),
    }
}

pub(crate) fn build_generator(config: &GeneratorConfig) -> Arc<dyn ContentGenerator> {
    if config.provider != "gemini" {
        warn!(provider = %config.provider, "Unknown generator provider, generation disabled");
        return Arc::new(UnconfiguredGenerator);
    }
    let Some(api_key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
        warn!("No generator API key, comments and DMs will not be generated");
        return Arc::new(UnconfiguredGenerator);
    };
    match GeminiGenerator::with_options(
        api_key,
        config.base_url.as_deref(),
        config.model.clone(),
        Duration::from_secs(config.timeout_seconds),
    ) {
        Ok(generator) => {
            info!(model = %generator.model(), "Gemini generator ready");
            Arc::new(generator)
        }
        Err(e) => {
            warn!(error = %e, "Cannot create Gemini generator, generation disabled");
            Arc::new(UnconfiguredGenerator)
        }
    }
}

/// Open the dedup store. A failure degrades to session-only dedup.
async fn open_store(config: &Config) -> Option<Arc<dyn DedupStore>> {
    if !config.store.enabled {
        info!("Dedup store disabled, dedup is session-only");
        return None;
    }
    let path = ConfigLoader::expand_path(&config.store.path);
    match SqliteDedupStore::open(&path).await {
        Ok(store) => {
            info!(path = %path, "Dedup store opened");
            Some(Arc::new(store))
        }
        Err(e) => {
            warn!(path = %path, error = %e, "Dedup store unavailable, dedup is session-only");
            None
        }
    }
}

/// A connected browser and the session that drives it.
pub(crate) struct App {
    browser: Arc<CdpBrowser>,
    pub session: Session,
}

impl App {
    /// Launch or attach Chrome, build the session and log in.
    pub async fn start(config: &Config) -> anyhow::Result<Self> {
        let browser = Arc::new(
            CdpBrowser::launch(launch_options(&config.browser))
                .await
                .context("Cannot reach Chrome")?,
        );

        let page: Arc<dyn Page> = Arc::new(
            browser
                .open_page()
                .await
                .context("Cannot open the primary page")?,
        );

        let mut builder = Session::builder(
            page,
            browser.clone() as Arc<dyn Browser>,
            build_generator(&config.generator),
        )
        .settings(SessionSettings::from_config(config));
        if let Some(store) = open_store(config).await {
            builder = builder.store(store);
        }
        let mut session = builder.build();

        let cookies = JsonCookieStore::new(ConfigLoader::expand_path(&config.account.cookie_file));
        let app = match session
            .bootstrap(&cookies, config.account.password.as_deref())
            .await
        {
            Ok(method) => {
                info!(
                    username = %config.account.username,
                    cookies = method == LoginMethod::Cookies,
                    "Session ready"
                );
                Self { browser, session }
            }
            Err(e) => {
                browser.shutdown().await;
                return Err(e).context("Login failed");
            }
        };
        Ok(app)
    }

    pub async fn shutdown(self) {
        if let Err(e) = self.session.page().close().await {
            warn!(error = %e, "Failed to close page");
        }
        self.browser.shutdown().await;
    }
}
