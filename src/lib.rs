//! Asking Minecraft servers (Java and Bedrock edition) whether they're online,
//! and what they say about themselves.

pub mod cache;
pub mod chat;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod fallback;
pub mod net;
pub mod scanner;
pub mod status;
pub mod tracing;

pub use config::Config;
pub use endpoint::{GameType, ServerEndpoint};
pub use error::ProbeError;
pub use fallback::FallbackClient;
pub use scanner::StatusScanner;
pub use status::ProbeResult;
