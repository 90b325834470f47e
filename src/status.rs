use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProbeError;

/// Legacy formatting codes, like `§6` for gold or `§l` for bold.
static FORMATTING_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(?i)§[0-9a-fk-or]").unwrap());

pub const ANONYMOUS_PLAYER_NAME: &str = "Anonymous Player";

/// Remove every legacy formatting code from the text.
pub fn strip_formatting_codes(text: &str) -> String {
    FORMATTING_CODE.replace_all(text, "").into_owned()
}

/// The normalized status of a server, no matter which protocol it came from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<Players>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motd: Option<Motd>,
    /// A `data:image/png;base64,...` uri, passed through as the server sent it.
    #[serde(default)]
    pub icon: Option<String>,
    /// Only sent by Bedrock servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamemode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when this is an expired cache entry that we're replaying because
    /// the server couldn't be reached.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stale: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Players {
    pub online: Option<i64>,
    pub max: Option<i64>,
    #[serde(default)]
    pub sample: Vec<SamplePlayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePlayer {
    pub id: Uuid,
    pub name: String,
}

impl SamplePlayer {
    /// Servers put all kinds of junk in the sample, so anything we can't read
    /// becomes a nil uuid or an anonymous name instead of an error.
    pub fn lenient(id: Option<&str>, name: Option<&str>) -> Self {
        Self {
            id: id
                .and_then(|id| Uuid::parse_str(id).ok())
                .unwrap_or_default(),
            name: name
                .filter(|name| !name.is_empty())
                .unwrap_or(ANONYMOUS_PLAYER_NAME)
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub raw: String,
    pub clean: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<i32>,
}

impl Version {
    pub fn new(raw: impl Into<String>, protocol: Option<i32>) -> Self {
        let raw = raw.into();
        Self {
            clean: strip_formatting_codes(&raw),
            raw,
            protocol,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Motd {
    pub raw: Vec<String>,
    pub clean: Vec<String>,
}

impl Motd {
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let raw = lines.into_iter().map(Into::into).collect::<Vec<String>>();
        let clean = raw.iter().map(|line| strip_formatting_codes(line)).collect();
        Self { raw, clean }
    }

    /// Split text that may contain newlines into one entry per line.
    pub fn from_text(text: &str) -> Self {
        Self::from_lines(text.split('\n'))
    }
}

impl ProbeResult {
    pub fn offline(error: impl Into<String>) -> Self {
        Self {
            online: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Whether this result tells us anything beyond online/offline.
    pub fn has_data(&self) -> bool {
        self.players.is_some() || self.version.is_some() || self.motd.is_some() || self.icon.is_some()
    }
}

impl From<ProbeError> for ProbeResult {
    fn from(err: ProbeError) -> Self {
        ProbeResult::offline(err.to_string())
    }
}
