use super::types::*;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Write configuration back to a TOML file
pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<()> {
    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Validate the configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.panel.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Panel URL is not set".to_string(),
        ));
    }

    if !config.panel.url.starts_with("http://") && !config.panel.url.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "Panel URL must start with http:// or https://: {}",
            config.panel.url
        )));
    }

    if config.panel.admin_api_key.is_empty() {
        return Err(ConfigError::ValidationError(
            "Admin API key is not set".to_string(),
        ));
    }

    if config.panel.client_api_key.is_empty() {
        return Err(ConfigError::ValidationError(
            "Client API key is not set".to_string(),
        ));
    }

    if config.panel.request_timeout_seconds == 0 {
        return Err(ConfigError::ValidationError(
            "Request timeout must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            panel: PanelConfig {
                url: "https://panel.example.com".to_string(),
                admin_api_key: "ptla_test".to_string(),
                client_api_key: "ptlc_test".to_string(),
                request_timeout_seconds: 30,
            },
            rotation: RotationConfig::default(),
            logging: LoggingSettings::default(),
        }
    }

    #[test]
    fn test_valid_config_passes_validation() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_url_rejected() {
        let mut config = valid_config();
        config.panel.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_non_http_url_rejected() {
        let mut config = valid_config();
        config.panel.url = "panel.example.com".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_keys_rejected() {
        let mut config = valid_config();
        config.panel.admin_api_key = String::new();
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.panel.client_api_key = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_policy_round_trips_through_toml() {
        let mut config = valid_config();
        config.rotation.on_locked = RotationPolicy::AutoDeleteNext;

        let serialized = toml::to_string_pretty(&config).unwrap();
        assert!(serialized.contains("on_locked = \"delete-next\""));

        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.rotation.on_locked, RotationPolicy::AutoDeleteNext);
    }
}
