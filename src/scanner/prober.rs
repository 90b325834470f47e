//! One attempt at getting a server's status over its native protocol.

pub mod bedrock;
pub mod java;

pub use bedrock::ping_bedrock;
pub use java::ping_java;
