//! Framing error types

use thiserror::Error;

/// Endpoint message framing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Attempted to frame a fragment of a larger message
    #[error("cannot format message where end_of_message is false")]
    NotEndOfMessage,

    /// Unknown format indicator byte
    #[error("invalid message format: {indicator:#x}")]
    InvalidFormat {
        /// Indicator byte found
        indicator: u8,
    },

    /// Unknown content type string
    #[error("invalid message format: {0}")]
    InvalidContentType(String),

    /// Unknown binary type indicator
    #[error("invalid message type: {type_byte:#x}")]
    InvalidMessageType {
        /// Invalid type byte
        type_byte: u8,
    },

    /// Unknown text type flag
    #[error("invalid message type flag: {flag:?}")]
    InvalidTypeFlag {
        /// Invalid flag character
        flag: char,
    },

    /// Length field is not a non-negative decimal integer
    #[error("invalid length field")]
    InvalidLength,

    /// Expected a field delimiter
    #[error("missing delimiter: expected {expected:?}, got {found:?}")]
    MissingDelimiter {
        /// Expected delimiter
        expected: char,
        /// Byte found instead
        found: char,
    },

    /// Base64 payload did not decode to the announced size
    #[error("invalid base64 payload")]
    InvalidPayload,

    /// Payload was followed by something other than the terminator, or a
    /// fully-read buffer ended inside a message
    #[error("incomplete message")]
    IncompleteMessage,

    /// Payload length cannot be represented on this platform
    #[error("payload too large: {size} bytes")]
    PayloadTooLarge {
        /// Announced payload size
        size: u64,
    },

    /// The output refused to provide more space
    #[error("output buffer exhausted")]
    OutputExhausted,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
