//! Configuration loader.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"));

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    ///
    /// Clamps the outreach persona into its supported ranges.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let mut config: Config = toml::from_str(&expanded)?;
        config.outreach.normalize();
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    ///
    /// Lines that are TOML comments are left untouched.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut lines = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim_start().starts_with('#') {
                lines.push(line.to_string());
                continue;
            }
            let mut expanded = line.to_string();
            for cap in ENV_VAR.captures_iter(line) {
                let var = &cap[1];
                let value = std::env::var(var).map_err(|_| ConfigError::EnvVarNotSet {
                    var: var.to_string(),
                    line: index + 1,
                })?;
                expanded = expanded.replace(&cap[0], &value);
            }
            lines.push(expanded);
        }

        Ok(lines.join("\n"))
    }

    /// Expand shell-style paths (e.g., `~/.autoengage`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}
