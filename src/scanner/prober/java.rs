use std::fmt;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, trace};

use crate::{
    endpoint::ServerEndpoint,
    error::ProbeError,
    net::NetworkTransport,
    scanner::protocols::{ParseResponseError, java},
    status::ProbeResult,
};

/// How far we got in the server list ping, kept so errors can say where
/// things went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JavaPingState {
    Idle,
    Connecting,
    HandshakeSent,
    StatusRequested,
    AwaitingResponse,
    ParsingResponse,
    Done,
}

impl fmt::Display for JavaPingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JavaPingState::Idle => "idle",
            JavaPingState::Connecting => "connecting",
            JavaPingState::HandshakeSent => "handshake sent",
            JavaPingState::StatusRequested => "status requested",
            JavaPingState::AwaitingResponse => "awaiting response",
            JavaPingState::ParsingResponse => "parsing response",
            JavaPingState::Done => "done",
        };
        f.write_str(s)
    }
}

/// Do a server list ping over a fresh TCP connection.
///
/// The connection is owned by this future, so it's closed when the ping
/// finishes or when the future is dropped (which is how timeouts cancel it).
pub async fn ping_java<T: NetworkTransport>(
    transport: &T,
    endpoint: &ServerEndpoint,
) -> Result<ProbeResult, ProbeError> {
    let mut state = JavaPingState::Idle;
    trace!("{endpoint}: {state}");

    state = JavaPingState::Connecting;
    let mut stream = transport
        .connect(&endpoint.host, endpoint.port)
        .await
        .map_err(|e| ProbeError::Connection(format!("{e} while {state}")))?;

    // the handshake and status request are written together, so both states
    // are passed in one go
    let request = java::build_status_request(&endpoint.host, endpoint.port);
    stream
        .write_all(&request)
        .await
        .map_err(|e| ProbeError::Connection(format!("{e} while {state}")))?;
    state = JavaPingState::HandshakeSent;
    trace!("{endpoint}: {state}");
    state = JavaPingState::StatusRequested;
    trace!("{endpoint}: {state}");

    state = JavaPingState::AwaitingResponse;
    let mut buffer = Vec::new();
    let mut chunk = [0; 4096];
    let status_json = loop {
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| ProbeError::Connection(format!("{e} while {state}")))?;
        if n == 0 {
            return Err(ProbeError::protocol(format!(
                "connection closed after {} bytes while {state}",
                buffer.len()
            )));
        }
        buffer.extend_from_slice(&chunk[..n]);

        match java::parse_response(&buffer) {
            Ok(status_json) => break status_json,
            Err(ParseResponseError::Incomplete { expected_length }) => {
                trace!(
                    "{endpoint}: have {} bytes, waiting for a {expected_length} byte packet",
                    buffer.len()
                );
            }
            Err(err) => return Err(err.into()),
        }
    };

    // we have everything we need, let the server know we're done
    if let Err(e) = stream.shutdown().await {
        trace!("{endpoint}: shutdown failed: {e}");
    }
    drop(stream);

    state = JavaPingState::ParsingResponse;
    trace!("{endpoint}: {state}");
    let result = java::parse_status_json(&status_json)?;

    state = JavaPingState::Done;
    debug!("{endpoint}: {state}");
    Ok(result)
}
