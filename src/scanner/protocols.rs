pub mod bedrock;
pub mod java;
pub mod varint;

use crate::error::ProbeError;

use self::varint::VarIntError;

#[derive(Debug, PartialEq, Eq)]
pub enum ParseResponseError {
    Invalid(String),
    /// We need more bytes before we can tell. `expected_length` is 0 if we
    /// don't even know the packet length yet.
    Incomplete { expected_length: u32 },
}

impl From<VarIntError> for ParseResponseError {
    fn from(err: VarIntError) -> Self {
        ParseResponseError::Invalid(err.to_string())
    }
}

impl From<ParseResponseError> for ProbeError {
    fn from(err: ParseResponseError) -> Self {
        match err {
            ParseResponseError::Invalid(reason) => ProbeError::Protocol(reason),
            ParseResponseError::Incomplete { expected_length } => ProbeError::Protocol(format!(
                "response ended early (expected a {expected_length} byte packet)"
            )),
        }
    }
}
