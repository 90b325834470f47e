use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// If set, debug logs are also written to a daily rotating file in this
    /// directory.
    #[serde(default)]
    pub logging_dir: Option<String>,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub fallback: FallbackConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn from_toml_str(s: &str) -> eyre::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// Settings for probing servers directly over their own protocol.
#[derive(Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields, default)]
pub struct ProbeConfig {
    /// The timeout for each attempt, in order. There's one attempt per entry.
    pub attempt_timeouts_ms: Vec<u64>,
    /// How long to wait before each retry.
    pub retry_pause_ms: u64,
    /// How many servers are probed at the same time by `probe_batch`.
    pub batch_width: usize,
    pub cache_ttl_secs: u64,
    /// How long to wait for a Bedrock pong, on top of the attempt timeouts.
    pub bedrock_timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            attempt_timeouts_ms: vec![2000, 3000, 5000],
            retry_pause_ms: 1000,
            batch_width: 5,
            cache_ttl_secs: 30,
            bedrock_timeout_secs: 5,
        }
    }
}

impl ProbeConfig {
    pub fn attempt_timeouts(&self) -> Vec<Duration> {
        self.attempt_timeouts_ms
            .iter()
            .map(|&ms| Duration::from_millis(ms))
            .collect()
    }

    pub fn retry_pause(&self) -> Duration {
        Duration::from_millis(self.retry_pause_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn bedrock_timeout(&self) -> Duration {
        Duration::from_secs(self.bedrock_timeout_secs)
    }
}

/// Settings for the third-party status service used when we can't or don't
/// want to ping a server ourselves.
#[derive(Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields, default)]
pub struct FallbackConfig {
    pub base_url: String,
    pub cache_ttl_secs: u64,
    pub max_attempts: u32,
    /// The wait before the first retry. Later retries wait a multiple of this.
    pub initial_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mcstatus.io".to_string(),
            cache_ttl_secs: 60,
            max_attempts: 3,
            initial_delay_ms: 1000,
            request_timeout_secs: 15,
        }
    }
}

impl FallbackConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(
            config.probe.attempt_timeouts(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(3),
                Duration::from_secs(5)
            ]
        );
        assert_eq!(config.probe.batch_width, 5);
        assert_eq!(config.probe.cache_ttl(), Duration::from_secs(30));
        assert_eq!(config.fallback.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.fallback.request_timeout(), Duration::from_secs(15));
        assert!(config.logging_dir.is_none());
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml_str(
            r#"
            logging_dir = "logs"

            [probe]
            attempt_timeouts_ms = [500, 500]
            batch_width = 10

            [fallback]
            base_url = "http://localhost:8080"
            "#,
        )
        .unwrap();
        assert_eq!(config.logging_dir.as_deref(), Some("logs"));
        assert_eq!(config.probe.attempt_timeouts().len(), 2);
        assert_eq!(config.probe.batch_width, 10);
        assert_eq!(config.probe.retry_pause_ms, 1000);
        assert_eq!(config.fallback.base_url, "http://localhost:8080");
        assert_eq!(config.fallback.max_attempts, 3);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(Config::from_toml_str("[probe]\nrate = 5").is_err());
    }
}
