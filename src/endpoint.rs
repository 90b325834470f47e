use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub const JAVA_DEFAULT_PORT: u16 = 25565;
pub const BEDROCK_DEFAULT_PORT: u16 = 19132;

/// The kind of game server we're asked to check. Anything that isn't Java or
/// Bedrock is kept around by name so we can tell the caller it's unsupported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GameType {
    Java,
    Bedrock,
    Other(String),
}

impl GameType {
    /// The port servers of this type listen on if the owner didn't change it.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            GameType::Java => Some(JAVA_DEFAULT_PORT),
            GameType::Bedrock => Some(BEDROCK_DEFAULT_PORT),
            GameType::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GameType::Java => "java",
            GameType::Bedrock => "bedrock",
            GameType::Other(title) => title,
        }
    }
}

impl From<String> for GameType {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "java" => GameType::Java,
            "bedrock" => GameType::Bedrock,
            _ => GameType::Other(s),
        }
    }
}

impl From<GameType> for String {
    fn from(game_type: GameType) -> Self {
        game_type.as_str().to_string()
    }
}

impl FromStr for GameType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(GameType::from(s.to_string()))
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server to probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
    pub game_type: GameType,
}

impl ServerEndpoint {
    pub fn new(host: impl Into<String>, port: u16, game_type: GameType) -> Self {
        Self {
            host: host.into(),
            port,
            game_type,
        }
    }

    pub fn java(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, GameType::Java)
    }

    pub fn bedrock(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, GameType::Bedrock)
    }

    /// The key used for this endpoint in batch results.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
