use crate::config::types::{Config, CrawlerConfig, StoreConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_store_config(&config.store)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 100, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.fetch_timeout_secs < 1 || config.fetch_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_secs must be between 1 and 300, got {}",
            config.fetch_timeout_secs
        )));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates store configuration
fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> Config {
        Config {
            crawler: CrawlerConfig {
                base_url: "https://books.example.com/".to_string(),
                max_concurrent_fetches: 10,
                fetch_timeout_secs: 30,
                user_agent: "shelfwatch/1.0.0".to_string(),
            },
            store: StoreConfig {
                database_path: "./books.db".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config() {
        let config = create_test_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = create_test_config();
        config.crawler.base_url = "not a url".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_base_url_scheme_rejected() {
        let mut config = create_test_config();
        config.crawler.base_url = "ftp://books.example.com/".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = create_test_config();
        config.crawler.max_concurrent_fetches = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_excessive_concurrency_rejected() {
        let mut config = create_test_config();
        config.crawler.max_concurrent_fetches = 500;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = create_test_config();
        config.crawler.fetch_timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_database_path_rejected() {
        let mut config = create_test_config();
        config.store.database_path = String::new();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }
}
