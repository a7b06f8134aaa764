//! Centralized error types for the message model.
//!
//! Only text decoding can fail. Structural parsing always degrades to
//! defaults or partial results instead of returning an error.

use thiserror::Error;

/// All errors produced by the charset / transfer-decoding engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// The charset name could not be resolved, neither through the alias
    /// table nor through the encoding registry.
    #[error("unknown charset: {0}")]
    UnknownCharset(String),

    /// The bytes are not well-formed under the resolved encoding.
    #[error("invalid encoding - {0}")]
    InvalidEncoding(String),

    /// A character has no representation in the target encoding.
    #[error("undefined conversion of {ch:?} to {encoding}")]
    UndefinedConversion { ch: char, encoding: String },
}

/// Convenience alias for `Result<T, MessageError>`.
pub type Result<T> = std::result::Result<T, MessageError>;

impl MessageError {
    /// Build an `UnknownCharset` from a raw charset label.
    pub fn unknown_charset(label: &[u8]) -> Self {
        Self::UnknownCharset(String::from_utf8_lossy(label).into_owned())
    }
}
