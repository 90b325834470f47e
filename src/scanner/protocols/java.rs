use serde_json::Value;

use super::{
    ParseResponseError,
    varint::{VarIntError, read_varint, write_varint},
};
use crate::{
    chat::ChatComponent,
    error::ProbeError,
    status::{Players, ProbeResult, SamplePlayer, Version},
};

/// The protocol version sent in the handshake. -1 means we're only pinging so
/// servers don't care which version we are.
pub const PING_PROTOCOL_VERSION: i32 = -1;

/// The biggest packet a server may send, the most a 3 byte varint can hold.
pub const MAX_PACKET_LENGTH: i32 = (1 << 21) - 1;

/// Build the handshake packet followed by the status request packet, both
/// prefixed with their length.
pub fn build_status_request(hostname: &str, port: u16) -> Vec<u8> {
    // buffer for the 1st packet's data part
    let mut buffer = vec![
        // 0 for handshake packet
        0x00,
    ];

    write_varint(&mut buffer, PING_PROTOCOL_VERSION);

    // Some server implementations require hostname and port to be properly set (Notchian does not)
    write_varint(&mut buffer, hostname.len() as i32);
    buffer.extend_from_slice(hostname.as_bytes());
    buffer.extend_from_slice(&port.to_be_bytes());
    // next state: 1 (status)
    write_varint(&mut buffer, 1);

    // buffer for the 1st and 2nd packet
    let mut full_buffer = vec![];
    write_varint(&mut full_buffer, buffer.len() as i32);
    full_buffer.append(&mut buffer);
    full_buffer.extend_from_slice(&[
        1,    // length of 2nd packet id + data as VarInt
        0x00, // 2nd packet id: 0 for request as VarInt
    ]);

    full_buffer
}

/// Try to read a full status response frame out of what we've received so
/// far, returning the json body.
pub fn parse_response(response: &[u8]) -> Result<String, ParseResponseError> {
    let (packet_length, header_length) = read_varint(response).map_err(|e| match e {
        VarIntError::Incomplete => ParseResponseError::Incomplete { expected_length: 0 },
        VarIntError::TooLong => ParseResponseError::Invalid(e.to_string()),
    })?;
    if packet_length <= 0 {
        return Err(ParseResponseError::Invalid(format!(
            "packet length {packet_length} is too small"
        )));
    }
    if packet_length > MAX_PACKET_LENGTH {
        return Err(ParseResponseError::Invalid(format!(
            "packet length {packet_length} is too big"
        )));
    }
    let packet_length = packet_length as usize;
    let Some(packet) = response.get(header_length..header_length + packet_length) else {
        return Err(ParseResponseError::Incomplete {
            expected_length: packet_length as u32,
        });
    };

    // the whole packet is here now, so anything missing inside it is an error
    let (packet_id, id_length) = read_varint(packet)?;
    if packet_id != 0x00 {
        return Err(ParseResponseError::Invalid(format!(
            "expected packet id 0, got {packet_id}"
        )));
    }
    let packet = &packet[id_length..];
    let (json_length, json_length_length) = read_varint(packet)?;
    if json_length < 0 {
        return Err(ParseResponseError::Invalid(format!(
            "negative json length {json_length}"
        )));
    }
    let Some(status_buffer) = packet[json_length_length..].get(..json_length as usize) else {
        return Err(ParseResponseError::Invalid(format!(
            "json length {json_length} doesn't fit in a {packet_length} byte packet"
        )));
    };

    let status_string = String::from_utf8_lossy(status_buffer).to_string();

    // make sure it starts with {
    if !status_string.starts_with('{') {
        return Err(ParseResponseError::Invalid(
            "status response isn't a json object".to_string(),
        ));
    }

    Ok(status_string)
}

/// Read an integer that some servers send as a float or a string.
fn lenient_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Turn the json body of a status response into a result. Only a body that
/// isn't a json object is an error, fields with unexpected types are left
/// unknown.
pub fn parse_status_json(data: &str) -> Result<ProbeResult, ProbeError> {
    let status: Value = serde_json::from_str(data)?;
    let Some(status) = status.as_object() else {
        return Err(ProbeError::protocol("status response isn't a json object"));
    };

    let players = status.get("players").and_then(|p| p.as_object()).map(|players| Players {
        online: players.get("online").and_then(lenient_int),
        max: players.get("max").and_then(lenient_int),
        sample: players
            .get("sample")
            .and_then(|s| s.as_array())
            .map(|sample| {
                sample
                    .iter()
                    .map(|player| {
                        SamplePlayer::lenient(
                            player.get("id").and_then(|id| id.as_str()),
                            player.get("name").and_then(|name| name.as_str()),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default(),
    });

    let version = status.get("version").and_then(|version| {
        let name = version.get("name").and_then(|name| name.as_str())?;
        let protocol = version
            .get("protocol")
            .and_then(lenient_int)
            .and_then(|p| i32::try_from(p).ok());
        Some(Version::new(name, protocol))
    });

    let motd = status
        .get("description")
        .map(|description| ChatComponent::from_value(description).to_motd());

    Ok(ProbeResult {
        online: true,
        players,
        version,
        motd,
        icon: status
            .get("favicon")
            .and_then(|f| f.as_str())
            .map(str::to_string),
        ..Default::default()
    })
}
