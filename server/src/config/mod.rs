use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::extractor::ExtractorConfig;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub cache_capacity: usize,
    pub cache_empty_results: bool,
    pub coalesce_requests: bool,
    pub fetch_timeout: Option<Duration>,
    pub fetch_user_agent: Option<String>,
    pub block_private_addresses: bool,
    /// Target used when a request carries no `url` parameter.
    pub default_target_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "0.0.0.0".to_string(),
            server_port: DEFAULT_PORT,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_empty_results: true,
            coalesce_requests: true,
            fetch_timeout: None,
            fetch_user_agent: None,
            block_private_addresses: false,
            default_target_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT")?.unwrap_or(defaults.server_port),
            cache_capacity: parse_var("CACHE_CAPACITY")?.unwrap_or(defaults.cache_capacity),
            cache_empty_results: flag_var("CACHE_EMPTY_RESULTS")?
                .unwrap_or(defaults.cache_empty_results),
            coalesce_requests: flag_var("COALESCE_REQUESTS")?
                .unwrap_or(defaults.coalesce_requests),
            fetch_timeout: parse_var::<u64>("FETCH_TIMEOUT_SECS")?
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            fetch_user_agent: non_empty_var("FETCH_USER_AGENT"),
            block_private_addresses: flag_var("BLOCK_PRIVATE_ADDRESSES")?
                .unwrap_or(defaults.block_private_addresses),
            default_target_url: non_empty_var("DEFAULT_TARGET_URL"),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            timeout: self.fetch_timeout,
            user_agent: self.fetch_user_agent.clone(),
            cache_empty_results: self.cache_empty_results,
            coalesce_requests: self.coalesce_requests,
            block_private_addresses: self.block_private_addresses,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match non_empty_var(name) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn flag_var(name: &'static str) -> Result<Option<bool>, ConfigError> {
    match non_empty_var(name) {
        None => Ok(None),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::Invalid { name, value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "SERVER_HOST",
        "SERVER_PORT",
        "CACHE_CAPACITY",
        "CACHE_EMPTY_RESULTS",
        "COALESCE_REQUESTS",
        "FETCH_TIMEOUT_SECS",
        "FETCH_USER_AGENT",
        "BLOCK_PRIVATE_ADDRESSES",
        "DEFAULT_TARGET_URL",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn defaults_when_unset() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config.server_port, 8000);
        assert_eq!(config.cache_capacity, 100);
        assert!(config.cache_empty_results);
        assert!(config.coalesce_requests);
        assert!(config.fetch_timeout.is_none());
        assert!(!config.block_private_addresses);
        assert!(config.default_target_url.is_none());
        assert_eq!(config.server_addr(), "0.0.0.0:8000");
    }

    #[test]
    #[serial]
    fn reads_overrides() {
        clear_env();
        env::set_var("SERVER_PORT", "9001");
        env::set_var("CACHE_CAPACITY", "5");
        env::set_var("CACHE_EMPTY_RESULTS", "false");
        env::set_var("FETCH_TIMEOUT_SECS", "3");
        env::set_var("DEFAULT_TARGET_URL", "https://getalby.com/");
        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.server_port, 9001);
        assert_eq!(config.cache_capacity, 5);
        assert!(!config.cache_empty_results);
        assert_eq!(config.fetch_timeout, Some(Duration::from_secs(3)));
        assert_eq!(
            config.default_target_url.as_deref(),
            Some("https://getalby.com/")
        );
    }

    #[test]
    #[serial]
    fn zero_timeout_means_none() {
        clear_env();
        env::set_var("FETCH_TIMEOUT_SECS", "0");
        let config = Config::from_env().unwrap();
        clear_env();
        assert!(config.fetch_timeout.is_none());
    }

    #[test]
    #[serial]
    fn rejects_bad_port() {
        clear_env();
        env::set_var("SERVER_PORT", "eighty");
        let result = Config::from_env();
        clear_env();
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "SERVER_PORT",
                ..
            })
        ));
    }

    #[test]
    #[serial]
    fn rejects_bad_flag() {
        clear_env();
        env::set_var("COALESCE_REQUESTS", "maybe");
        let result = Config::from_env();
        clear_env();
        assert!(result.is_err());
    }

    #[test]
    fn extractor_config_mirrors_fields() {
        let config = Config {
            block_private_addresses: true,
            fetch_user_agent: Some("bot/1.0".into()),
            ..Config::default()
        };
        let extractor = config.extractor_config();
        assert!(extractor.block_private_addresses);
        assert_eq!(extractor.user_agent.as_deref(), Some("bot/1.0"));
        assert!(extractor.cache_empty_results);
    }
}
