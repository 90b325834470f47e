use std::time::Duration;

use chrono::Utc;
use tracing::{debug, trace};

use crate::{
    endpoint::ServerEndpoint,
    error::ProbeError,
    net::{DatagramSocket, NetworkTransport},
    scanner::protocols::bedrock,
    status::ProbeResult,
};

/// Pongs are well under this, it's the usual MTU.
const MAX_DATAGRAM_LEN: usize = 1500;

/// Send an unconnected ping and wait for the pong.
///
/// There's no retrying here. Any pong at all means the server is up, so a
/// badly formed one still gives an online result.
pub async fn ping_bedrock<T: NetworkTransport>(
    transport: &T,
    endpoint: &ServerEndpoint,
    timeout: Duration,
) -> Result<ProbeResult, ProbeError> {
    let socket = transport
        .bind_datagram(&endpoint.host, endpoint.port)
        .await
        .map_err(|e| ProbeError::Connection(e.to_string()))?;

    let client_guid = rand::random::<u64>();
    let timestamp = Utc::now().timestamp_millis() as u64;
    let ping = bedrock::build_unconnected_ping(timestamp, client_guid);
    socket
        .send(&ping)
        .await
        .map_err(|e| ProbeError::Connection(e.to_string()))?;
    trace!("{endpoint}: sent unconnected ping");

    let mut buffer = vec![0; MAX_DATAGRAM_LEN];
    let n = match tokio::time::timeout(timeout, socket.recv(&mut buffer)).await {
        Ok(received) => received.map_err(|e| ProbeError::Connection(e.to_string()))?,
        Err(_) => return Err(ProbeError::Timeout(timeout)),
    };
    drop(socket);

    let server_id = bedrock::parse_unconnected_pong(&buffer[..n])?;
    debug!("{endpoint}: got pong {server_id:?}");
    Ok(bedrock::parse_server_id(&server_id))
}
