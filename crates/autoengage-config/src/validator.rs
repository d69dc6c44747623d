//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Fold all errors into a single [`ConfigError::Invalid`].
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        if self.is_valid() {
            return Ok(());
        }
        Err(ConfigError::Invalid(
            self.errors
                .iter()
                .map(|e| format!("{}: {}", e.path, e.message))
                .collect(),
        ))
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_account(config, &mut result);
        Self::validate_browser(config, &mut result);
        Self::validate_store(config, &mut result);
        Self::validate_generator(config, &mut result);
        Self::validate_engine(config, &mut result);
        Self::validate_keywords(config, &mut result);

        Ok(result)
    }

    fn validate_account(config: &Config, result: &mut ValidationResult) {
        if config.account.username.trim().is_empty() {
            result.add_warning(ValidationWarning::new(
                "account.username",
                "username is empty; existing-comment checks and credential login are disabled",
            ));
        }
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        if config.browser.debug_port == 0 {
            result.add_error(ValidationError::new(
                "browser.debug_port",
                "Port cannot be 0",
            ));
        }

        if config.browser.viewport_width == 0 || config.browser.viewport_height == 0 {
            result.add_error(ValidationError::new(
                "browser.viewport",
                "Viewport width and height must be greater than 0",
            ));
        }
    }

    fn validate_store(config: &Config, result: &mut ValidationResult) {
        if !config.store.enabled {
            result.add_warning(ValidationWarning::new(
                "store.enabled",
                "Dedup store disabled, duplicate suppression is session-only",
            ));
        } else if config.store.path.trim().is_empty() {
            result.add_error(ValidationError::new(
                "store.path",
                "Store path cannot be empty when the store is enabled",
            ));
        }
    }

    fn validate_generator(config: &Config, result: &mut ValidationResult) {
        let valid_providers = ["gemini"];
        if !valid_providers.contains(&config.generator.provider.as_str()) {
            result.add_error(ValidationError::new(
                "generator.provider",
                format!(
                    "Unknown generator provider '{}', valid values: {:?}",
                    config.generator.provider, valid_providers
                ),
            ));
        }

        if config.generator.api_key.is_none() {
            result.add_warning(ValidationWarning::new(
                "generator.api_key",
                "API key is not set, may need to be set via environment variable",
            ));
        }

        if let Some(ref url) = config.generator.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                result.add_error(ValidationError::new(
                    "generator.base_url",
                    "base_url must start with http:// or https://",
                ));
            }
        }

        if config.generator.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "generator.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }
    }

    fn validate_engine(config: &Config, result: &mut ValidationResult) {
        let engine = &config.engine;

        for (path, value) in [
            ("engine.language_confidence_floor", engine.language_confidence_floor),
            ("engine.like_skip_probability", engine.like_skip_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                result.add_error(ValidationError::new(path, "must be within [0, 1]"));
            }
        }

        if !(engine.relaxation_factor > 0.0 && engine.relaxation_factor < 1.0) {
            result.add_error(ValidationError::new(
                "engine.relaxation_factor",
                "relaxation_factor must be strictly between 0 and 1",
            ));
        }

        if engine.relax_after_skips == 0 {
            result.add_error(ValidationError::new(
                "engine.relax_after_skips",
                "relax_after_skips must be greater than 0",
            ));
        }

        if engine.screenshot_every == 0 {
            result.add_error(ValidationError::new(
                "engine.screenshot_every",
                "screenshot_every must be greater than 0",
            ));
        }

        if engine.post_pause_min_ms > engine.post_pause_max_ms {
            result.add_warning(ValidationWarning::new(
                "engine.post_pause_min_ms",
                "post_pause_min_ms exceeds post_pause_max_ms, bounds will be swapped",
            ));
        }

        if engine.max_outbound_dms > 50 {
            result.add_warning(ValidationWarning::new(
                "engine.max_outbound_dms",
                "max_outbound_dms is very high (>50), the account may be rate limited",
            ));
        }
    }

    fn validate_keywords(config: &Config, result: &mut ValidationResult) {
        for keyword in &config.keywords.restaurant {
            let normalized = keyword.trim().to_lowercase();
            if config
                .keywords
                .foodie
                .iter()
                .any(|k| k.trim().to_lowercase() == normalized)
            {
                result.add_error(ValidationError::new(
                    "keywords",
                    format!("Keyword '{}' is in both restaurant and foodie lists", keyword),
                ));
            }
        }

        if config.keywords.restaurant.is_empty() {
            result.add_warning(ValidationWarning::new(
                "keywords.restaurant",
                "No restaurant keywords, no profile will qualify for outreach",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
