use std::time::Duration;

use crate::scanner::protocols::varint::VarIntError;

/// Everything that can go wrong while asking a server for its status.
///
/// None of these ever reach the caller of a probe directly, they're turned
/// into an offline [`ProbeResult`](crate::status::ProbeResult) with the error
/// message attached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("could not connect: {0}")]
    Connection(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid response: {0}")]
    Protocol(String),
    #[error("status checks for {0} servers are not yet supported")]
    UnsupportedGame(String),
    #[error("status service request failed: {0}")]
    Http(String),
}

impl ProbeError {
    pub fn protocol(reason: impl Into<String>) -> Self {
        ProbeError::Protocol(reason.into())
    }
}

impl From<VarIntError> for ProbeError {
    fn from(err: VarIntError) -> Self {
        ProbeError::Protocol(err.to_string())
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::Protocol(format!("malformed status json: {err}"))
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        ProbeError::Http(err.to_string())
    }
}
