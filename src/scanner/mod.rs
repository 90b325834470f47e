pub mod attempt;
pub mod prober;
pub mod protocols;

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::{
    cache::{CacheKey, Clock, ResultCache, SystemClock},
    config::ProbeConfig,
    endpoint::{GameType, ServerEndpoint},
    error::ProbeError,
    net::{NetworkTransport, TokioTransport},
    status::ProbeResult,
};

use self::attempt::{AttemptState, supervise};

pub const STALE_MARKER: &str = "using last known data";

/// Checks servers over their own protocols, with retries, timeouts and a
/// cache in front.
pub struct StatusScanner<T = TokioTransport> {
    transport: T,
    cache: ResultCache,
    attempt_timeouts: Vec<Duration>,
    retry_pause: Duration,
    batch_width: usize,
    bedrock_timeout: Duration,
}

impl StatusScanner<TokioTransport> {
    pub fn new(config: &ProbeConfig) -> Self {
        Self::with_transport(TokioTransport, config, Arc::new(SystemClock))
    }
}

impl Default for StatusScanner<TokioTransport> {
    fn default() -> Self {
        Self::new(&ProbeConfig::default())
    }
}

impl<T: NetworkTransport> StatusScanner<T> {
    pub fn with_transport(transport: T, config: &ProbeConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            cache: ResultCache::new(config.cache_ttl(), clock),
            attempt_timeouts: config.attempt_timeouts(),
            retry_pause: config.retry_pause(),
            // a width of 0 would never make progress
            batch_width: config.batch_width.max(1),
            bedrock_timeout: config.bedrock_timeout(),
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the status of a server. This never fails, problems are reported in
    /// the `error` field of an offline result.
    pub async fn probe(&self, endpoint: &ServerEndpoint) -> ProbeResult {
        if let GameType::Other(title) = &endpoint.game_type {
            debug!("{endpoint}: no protocol for {title}");
            return ProbeError::UnsupportedGame(title.clone()).into();
        }

        self.probe_with(endpoint, || self.dispatch(endpoint)).await
    }

    /// The cache and retry logic of [`Self::probe`], with `attempt` doing the
    /// talking to the server.
    pub(crate) async fn probe_with<F, Fut>(
        &self,
        endpoint: &ServerEndpoint,
        mut attempt: F,
    ) -> ProbeResult
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ProbeResult, ProbeError>>,
    {
        let key = CacheKey::from(endpoint);
        if let Some(entry) = self.cache.get_fresh(&key) {
            debug!("{endpoint}: using cached status from {}", entry.captured_at);
            return entry.to_result();
        }

        let mut state = AttemptState::default();
        // a failed attempt that still told us something, in case nothing works
        let mut best_failure: Option<ProbeResult> = None;

        for (attempt_index, &budget) in self.attempt_timeouts.iter().enumerate() {
            if attempt_index > 0 {
                tokio::time::sleep(self.retry_pause).await;
            }
            state.begin(attempt_index, budget);
            debug!(
                "{endpoint}: attempt {} with a {budget:?} budget",
                attempt_index + 1
            );

            match supervise(budget, attempt()).await {
                Ok(result) if result.online => {
                    return self.cache.insert(key, result).to_result();
                }
                Ok(result) => {
                    warn!("{endpoint}: attempt {} reported offline", attempt_index + 1);
                    state.last_error = Some(ProbeError::protocol(
                        result
                            .error
                            .clone()
                            .unwrap_or_else(|| "server reported itself offline".to_string()),
                    ));
                    if result.has_data() {
                        best_failure = Some(result);
                    }
                }
                Err(err) => {
                    warn!("{endpoint}: attempt {} failed: {err}", attempt_index + 1);
                    state.last_error = Some(err);
                }
            }
        }

        if let Some(result) = best_failure {
            return result;
        }
        let error = state.last_error_message();
        info!("{endpoint}: all attempts failed, last error: {error}");
        self.cache.stale_or_offline(&key, &error, STALE_MARKER)
    }

    async fn dispatch(&self, endpoint: &ServerEndpoint) -> Result<ProbeResult, ProbeError> {
        match &endpoint.game_type {
            GameType::Java => prober::ping_java(&self.transport, endpoint).await,
            GameType::Bedrock => {
                prober::ping_bedrock(&self.transport, endpoint, self.bedrock_timeout).await
            }
            GameType::Other(title) => Err(ProbeError::UnsupportedGame(title.clone())),
        }
    }

    /// Probe many servers, a window at a time. Servers in a window are probed
    /// concurrently and the next window starts once the whole window is done.
    ///
    /// The results are keyed by `host:port`.
    pub async fn probe_batch(&self, endpoints: &[ServerEndpoint]) -> HashMap<String, ProbeResult> {
        let mut results = HashMap::with_capacity(endpoints.len());
        for (i, window) in endpoints.chunks(self.batch_width).enumerate() {
            debug!("probing window {} ({} servers)", i + 1, window.len());
            let window_results = join_all(window.iter().map(|endpoint| async move {
                (endpoint.address(), self.probe(endpoint).await)
            }))
            .await;
            results.extend(window_results);
        }
        results
    }
}
