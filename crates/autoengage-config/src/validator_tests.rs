use super::*;

fn config_with_user() -> Config {
    let mut config = Config::default();
    config.account.username = "tasty_bot".to_string();
    config.generator.api_key = Some("key".to_string());
    config
}

#[test]
fn test_validate_default_config() {
    let result = ConfigValidator::validate(&Config::default()).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "account.username"));
    assert!(result.warnings.iter().any(|w| w.path == "generator.api_key"));
}

#[test]
fn test_validate_complete_config_has_no_warnings() {
    let result = ConfigValidator::validate(&config_with_user()).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_invalid_port() {
    let mut config = config_with_user();
    config.browser.debug_port = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "browser.debug_port"));
}

#[test]
fn test_validate_zero_viewport() {
    let mut config = config_with_user();
    config.browser.viewport_height = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "browser.viewport"));
}

#[test]
fn test_validate_probability_out_of_range() {
    let mut config = config_with_user();
    config.engine.like_skip_probability = 1.5;
    config.engine.language_confidence_floor = -0.1;

    let result = ConfigValidator::validate(&config).unwrap();
    assert_eq!(result.errors.len(), 2);
}

#[test]
fn test_validate_relaxation_factor() {
    let mut config = config_with_user();
    config.engine.relaxation_factor = 1.2;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "engine.relaxation_factor"));
}

#[test]
fn test_validate_keyword_overlap() {
    let mut config = config_with_user();
    config.keywords.foodie.push("Bakery".to_string());

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.message.contains("Bakery")));
}

#[test]
fn test_validate_unknown_provider() {
    let mut config = config_with_user();
    config.generator.provider = "other".to_string();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "generator.provider"));
}

#[test]
fn test_validate_invalid_base_url() {
    let mut config = config_with_user();
    config.generator.base_url = Some("localhost:8080".to_string());

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
}

#[test]
fn test_validate_store_disabled_warning() {
    let mut config = config_with_user();
    config.store.enabled = false;
    config.store.path = String::new();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "store.enabled"));
}

#[test]
fn test_validate_inverted_pause_warning() {
    let mut config = config_with_user();
    config.engine.post_pause_min_ms = 30_000;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "engine.post_pause_min_ms"));
}

#[test]
fn test_validation_result_default() {
    let result = ValidationResult::default();
    assert!(result.is_valid());
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_ensure_valid_folds_errors() {
    let mut config = config_with_user();
    config.browser.debug_port = 0;
    config.engine.screenshot_every = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    match result.ensure_valid() {
        Err(ConfigError::Invalid(messages)) => {
            assert_eq!(messages.len(), 2);
            assert!(messages[0].starts_with("browser.debug_port: "));
        }
        other => panic!("expected Invalid, got {:?}", other),
    }
    assert!(ConfigValidator::validate(&config_with_user())
        .unwrap()
        .ensure_valid()
        .is_ok());
}
