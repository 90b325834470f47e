use std::{future::Future, time::Duration};

use tracing::debug;

use crate::{error::ProbeError, status::ProbeResult};

/// Bookkeeping for the attempts of a single probe, thrown away once the probe
/// returns.
#[derive(Debug, Default)]
pub struct AttemptState {
    pub attempt_index: usize,
    pub timeout_budget: Duration,
    pub last_error: Option<ProbeError>,
}

impl AttemptState {
    pub fn begin(&mut self, attempt_index: usize, timeout_budget: Duration) {
        self.attempt_index = attempt_index;
        self.timeout_budget = timeout_budget;
    }

    pub fn last_error_message(&self) -> String {
        self.last_error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts were made".to_string())
    }
}

/// Race a probe against its timeout budget.
///
/// If the timer wins the probe future is dropped right here, which closes
/// whatever socket it had open instead of leaving it to finish in the
/// background.
pub async fn supervise<F>(budget: Duration, probe: F) -> Result<ProbeResult, ProbeError>
where
    F: Future<Output = Result<ProbeResult, ProbeError>>,
{
    match tokio::time::timeout(budget, probe).await {
        Ok(outcome) => outcome,
        Err(_) => {
            debug!("attempt ran out of its {budget:?} budget");
            Err(ProbeError::Timeout(budget))
        }
    }
}
