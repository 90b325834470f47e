//! Getting a server's status from a third-party status service instead of
//! pinging it ourselves.

use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    cache::{CacheKey, Clock, ResultCache, SystemClock},
    config::FallbackConfig,
    endpoint::{GameType, ServerEndpoint},
    error::ProbeError,
    status::{Motd, Players, ProbeResult, SamplePlayer, Version, strip_formatting_codes},
};

pub const STALE_MARKER: &str = "using stale data";
const REPORTED_OFFLINE: &str = "status service reports the server offline";

pub struct FallbackClient {
    http: reqwest::Client,
    base_url: String,
    cache: ResultCache,
    max_attempts: u32,
    initial_delay: Duration,
    request_timeout: Duration,
}

impl FallbackClient {
    pub fn new(config: &FallbackConfig) -> Result<Self, ProbeError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &FallbackConfig, clock: Arc<dyn Clock>) -> Result<Self, ProbeError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache: ResultCache::new(config.cache_ttl(), clock),
            max_attempts: config.max_attempts.max(1),
            initial_delay: config.initial_delay(),
            request_timeout: config.request_timeout(),
        })
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// The url the status service is asked for. The port is left out when
    /// it's the default for the edition.
    pub fn status_url(&self, endpoint: &ServerEndpoint) -> Option<String> {
        let edition = match endpoint.game_type {
            GameType::Java => "java",
            GameType::Bedrock => "bedrock",
            GameType::Other(_) => return None,
        };
        let target = if endpoint.game_type.default_port() == Some(endpoint.port) {
            endpoint.host.clone()
        } else {
            endpoint.address()
        };
        Some(format!("{}/v2/status/{edition}/{target}", self.base_url))
    }

    /// Get the server's status from the service. Like
    /// [`StatusScanner::probe`](crate::scanner::StatusScanner::probe) this
    /// never fails, errors end up in the result.
    pub async fn fetch_status(&self, endpoint: &ServerEndpoint) -> ProbeResult {
        let Some(url) = self.status_url(endpoint) else {
            return ProbeError::UnsupportedGame(endpoint.game_type.to_string()).into();
        };

        let key = CacheKey::from(endpoint);
        if let Some(entry) = self.cache.get_fresh(&key) {
            debug!("{endpoint}: using cached status service response");
            return entry.to_result();
        }

        let mut last_error = None;
        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                let delay = self.initial_delay * (attempt - 1);
                debug!("{endpoint}: retrying status service in {delay:?}");
                tokio::time::sleep(delay).await;
            }

            match self.request_once(&url).await {
                Ok(mut result) if result.online || result.has_data() => {
                    if !result.online && result.error.is_none() {
                        result.error = Some(REPORTED_OFFLINE.to_string());
                    }
                    return self.cache.insert(key, result).to_result();
                }
                // a bare offline answer mustn't replace what we knew before
                Ok(_) => {
                    debug!("{endpoint}: status service says the server is offline");
                    return self
                        .cache
                        .stale_or_offline(&key, REPORTED_OFFLINE, STALE_MARKER);
                }
                Err(err) => {
                    warn!("{endpoint}: status service attempt {attempt} failed: {err}");
                    last_error = Some(err);
                }
            }
        }

        let error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts were made".to_string());
        self.cache.stale_or_offline(&key, &error, STALE_MARKER)
    }

    async fn request_once(&self, url: &str) -> Result<ProbeResult, ProbeError> {
        // the timeout covers reading the body too, dropping the future cancels
        // the request
        let request = async {
            let response = self.http.get(url).send().await?.error_for_status()?;
            response.json::<AggregatorStatus>().await
        };
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(status) => Ok(status?.into()),
            Err(_) => Err(ProbeError::Timeout(self.request_timeout)),
        }
    }
}

#[derive(Deserialize)]
struct AggregatorStatus {
    online: bool,
    #[serde(default)]
    version: Option<AggregatorVersion>,
    #[serde(default)]
    players: Option<AggregatorPlayers>,
    #[serde(default)]
    motd: Option<AggregatorMotd>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    gamemode: Option<String>,
}

#[derive(Deserialize)]
struct AggregatorVersion {
    #[serde(default, alias = "name")]
    name_raw: Option<String>,
    #[serde(default)]
    name_clean: Option<String>,
    #[serde(default)]
    protocol: Option<i32>,
}

#[derive(Deserialize)]
struct AggregatorPlayers {
    #[serde(default)]
    online: Option<i64>,
    #[serde(default)]
    max: Option<i64>,
    #[serde(default, alias = "sample")]
    list: Vec<AggregatorPlayer>,
}

#[derive(Deserialize)]
struct AggregatorPlayer {
    #[serde(default, alias = "id")]
    uuid: Option<String>,
    #[serde(default, alias = "name")]
    name_clean: Option<String>,
}

#[derive(Deserialize)]
struct AggregatorMotd {
    #[serde(default)]
    raw: Option<String>,
    #[serde(default)]
    clean: Option<String>,
}

impl From<AggregatorStatus> for ProbeResult {
    fn from(status: AggregatorStatus) -> Self {
        let version = status.version.and_then(|v| {
            let raw = v.name_raw.or_else(|| v.name_clean.clone())?;
            let clean = v.name_clean.unwrap_or_else(|| strip_formatting_codes(&raw));
            Some(Version {
                raw,
                clean,
                protocol: v.protocol,
            })
        });

        let players = status.players.map(|p| Players {
            online: p.online,
            max: p.max,
            sample: p
                .list
                .iter()
                .map(|player| {
                    SamplePlayer::lenient(player.uuid.as_deref(), player.name_clean.as_deref())
                })
                .collect(),
        });

        let motd = status.motd.and_then(|m| {
            let mut motd = Motd::from_text(m.raw.as_deref().or(m.clean.as_deref())?);
            if let Some(clean) = m.clean {
                motd.clean = clean.split('\n').map(str::to_string).collect();
            }
            Some(motd)
        });

        ProbeResult {
            online: status.online,
            players,
            version,
            motd,
            icon: status.icon,
            gamemode: status.gamemode,
            ..Default::default()
        }
    }
}
