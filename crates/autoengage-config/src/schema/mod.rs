//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

mod schema_engine;
mod schema_outreach;

pub use schema_engine::*;
pub use schema_outreach::*;

/// Shared default helper used by submodules.
pub(crate) fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub keywords: KeywordsConfig,

    #[serde(default)]
    pub outreach: OutreachConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Account the session logs in as.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub username: String,

    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    #[serde(default = "default_cookie_file")]
    pub cookie_file: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: None,
            cookie_file: default_cookie_file(),
        }
    }
}

fn default_cookie_file() -> String {
    "~/.autoengage/cookies.json".to_string()
}

/// Browser launch / attach settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Launch a fresh Chrome. When false, attach to one already listening on `debug_port`.
    #[serde(default = "default_true")]
    pub launch: bool,

    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    #[serde(default)]
    pub headless: bool,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    #[serde(default = "default_profile_dir")]
    pub profile_dir: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            launch: true,
            debug_port: default_debug_port(),
            headless: false,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            profile_dir: default_profile_dir(),
            chrome_path: None,
            proxy: None,
        }
    }
}

fn default_debug_port() -> u16 {
    9222
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    800
}

fn default_profile_dir() -> String {
    "~/.autoengage/chrome-profile".to_string()
}

/// Dedup store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "~/.autoengage/autoengage.db".to_string()
}

/// Content generator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_generator_timeout")]
    pub timeout_seconds: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            model: default_model(),
            base_url: None,
            timeout_seconds: default_generator_timeout(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_generator_timeout() -> u64 {
    60
}

/// Log and screenshot locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            screenshot_dir: default_screenshot_dir(),
        }
    }
}

fn default_log_dir() -> String {
    "~/.autoengage/logs".to_string()
}

fn default_screenshot_dir() -> String {
    "~/.autoengage/screens".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
