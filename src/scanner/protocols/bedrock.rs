//! RakNet unconnected ping/pong, which is how Bedrock servers advertise their
//! status.

use super::ParseResponseError;
use crate::status::{Motd, Players, ProbeResult, Version};

pub const UNCONNECTED_PING_ID: u8 = 0x01;
pub const UNCONNECTED_PONG_ID: u8 = 0x1c;

/// The "offline message" magic that RakNet puts in every unconnected packet.
pub const MAGIC: [u8; 16] = [
    0x00, 0xff, 0xff, 0x00, 0xfe, 0xfe, 0xfe, 0xfe, 0xfd, 0xfd, 0xfd, 0xfd, 0x12, 0x34, 0x56, 0x78,
];

/// id + time + server guid + magic + string length
pub const PONG_HEADER_LEN: usize = 1 + 8 + 8 + 16 + 2;

pub fn build_unconnected_ping(timestamp_millis: u64, client_guid: u64) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(1 + 8 + MAGIC.len() + 8);
    buffer.push(UNCONNECTED_PING_ID);
    buffer.extend_from_slice(&timestamp_millis.to_be_bytes());
    buffer.extend_from_slice(&MAGIC);
    buffer.extend_from_slice(&client_guid.to_be_bytes());
    buffer
}

/// Get the server id string out of a pong. Truncated pongs give back whatever
/// text is there (possibly nothing), only a packet that isn't a pong at all is
/// an error.
pub fn parse_unconnected_pong(datagram: &[u8]) -> Result<String, ParseResponseError> {
    match datagram.first() {
        Some(&UNCONNECTED_PONG_ID) => {}
        Some(id) => {
            return Err(ParseResponseError::Invalid(format!(
                "expected unconnected pong (0x1c), got packet id {id:#04x}"
            )));
        }
        None => return Err(ParseResponseError::Invalid("empty datagram".to_string())),
    }

    let Some(body) = datagram.get(PONG_HEADER_LEN..) else {
        return Ok(String::new());
    };
    let declared_length =
        u16::from_be_bytes([datagram[PONG_HEADER_LEN - 2], datagram[PONG_HEADER_LEN - 1]]) as usize;
    // some servers lie about the length, use what we actually got
    let body = &body[..declared_length.min(body.len())];

    Ok(String::from_utf8_lossy(body).into_owned())
}

/// Map the fields of the server id string into a result.
///
/// The string looks like
/// `MCPE;motd line 1;protocol;version;online;max;server guid;motd line 2;gamemode;gamemode id;port v4;port v6`,
/// anything missing or unparseable is left as unknown.
pub fn parse_server_id(server_id: &str) -> ProbeResult {
    let fields = server_id.split(';').collect::<Vec<_>>();
    let field = |i: usize| fields.get(i).copied().filter(|f| !f.is_empty());

    // lines keep their position, only trailing empty ones are dropped
    let mut motd_lines = vec![field(1).unwrap_or_default(), field(7).unwrap_or_default()];
    while motd_lines.last().is_some_and(|line| line.is_empty()) {
        motd_lines.pop();
    }
    let motd = (!motd_lines.is_empty()).then(|| Motd::from_lines(motd_lines));

    let version = field(3).map(|name| Version::new(name, field(2).and_then(|p| p.parse().ok())));

    let online = field(4).and_then(|n| n.parse().ok());
    let max = field(5).and_then(|n| n.parse().ok());
    let players = (online.is_some() || max.is_some()).then(|| Players {
        online,
        max,
        sample: Vec::new(),
    });

    ProbeResult {
        online: true,
        players,
        version,
        motd,
        gamemode: field(8).map(str::to_string),
        ..Default::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn pong(server_id: &str) -> Vec<u8> {
        let mut datagram = vec![UNCONNECTED_PONG_ID];
        datagram.extend_from_slice(&1234u64.to_be_bytes());
        datagram.extend_from_slice(&5678u64.to_be_bytes());
        datagram.extend_from_slice(&MAGIC);
        datagram.extend_from_slice(&(server_id.len() as u16).to_be_bytes());
        datagram.extend_from_slice(server_id.as_bytes());
        datagram
    }

    #[test]
    fn test_build_unconnected_ping() {
        let ping = build_unconnected_ping(1, 2);
        assert_eq!(ping.len(), 33);
        assert_eq!(ping[0], UNCONNECTED_PING_ID);
        assert_eq!(&ping[1..9], &1u64.to_be_bytes());
        assert_eq!(&ping[9..25], &MAGIC);
        assert_eq!(&ping[25..33], &2u64.to_be_bytes());
    }

    #[test]
    fn test_parse_pong() {
        let server_id = "MCPE;Hello;477;1.19;3;20;123456;Level;Survival;1;19132;19133";
        assert_eq!(parse_unconnected_pong(&pong(server_id)).unwrap(), server_id);

        let result = parse_server_id(server_id);
        assert!(result.online);
        let players = result.players.unwrap();
        assert_eq!(players.online, Some(3));
        assert_eq!(players.max, Some(20));
        let version = result.version.unwrap();
        assert_eq!(version.clean, "1.19");
        assert_eq!(version.protocol, Some(477));
        let motd = result.motd.unwrap();
        assert_eq!(motd.clean[0], "Hello");
        assert_eq!(motd.clean, vec!["Hello", "Level"]);
        assert_eq!(result.gamemode.as_deref(), Some("Survival"));
    }

    #[test]
    fn test_motd_lines_keep_their_position() {
        let motd = parse_server_id("MCPE;;477;1.19;3;20;123456;Level").motd.unwrap();
        assert_eq!(motd.raw, vec!["", "Level"]);
        assert_eq!(motd.clean, vec!["", "Level"]);

        let motd = parse_server_id("MCPE;Hello;477;1.19;3;20;123456;").motd.unwrap();
        assert_eq!(motd.raw, vec!["Hello"]);

        assert!(parse_server_id("MCPE;;477;1.19;3;20").motd.is_none());
    }

    #[test]
    fn test_formatted_motd() {
        let result = parse_server_id("MCPE;§aGreen §lServer;600;1.20.40;0;10");
        let motd = result.motd.unwrap();
        assert_eq!(motd.raw, vec!["§aGreen §lServer"]);
        assert_eq!(motd.clean, vec!["Green Server"]);
    }

    #[test]
    fn test_short_pong_is_still_online() {
        let mut truncated = pong("MCPE;Hi");
        truncated.truncate(20);
        assert_eq!(parse_unconnected_pong(&truncated).unwrap(), "");

        let result = parse_server_id("");
        assert!(result.online);
        assert!(result.players.is_none());
        assert!(result.version.is_none());
        assert!(result.motd.is_none());

        let result = parse_server_id("MCPE;Hi;abc;1.0;lots");
        assert!(result.online);
        assert!(result.players.is_none());
        assert_eq!(result.version.unwrap().protocol, None);
    }

    #[test]
    fn test_length_overrun_is_clamped() {
        let mut datagram = pong("MCPE;Hi");
        datagram[PONG_HEADER_LEN - 1] = 200;
        assert_eq!(parse_unconnected_pong(&datagram).unwrap(), "MCPE;Hi");
    }

    #[test]
    fn test_not_a_pong() {
        assert!(parse_unconnected_pong(&[0x05, 0x00]).is_err());
        assert!(parse_unconnected_pong(&[]).is_err());
    }
}
