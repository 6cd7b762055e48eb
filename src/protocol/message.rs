//! Endpoint message implementation

use bytes::Bytes;

use super::{MessageFormat, MessageType, Result};

/// A discrete endpoint message
///
/// Messages are immutable once built. Only messages with `end_of_message` set
/// can be framed; fragments must be reassembled by the caller first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    payload: Bytes,
    message_type: MessageType,
    end_of_message: bool,
}

impl Message {
    /// Create a complete message
    pub fn new(message_type: MessageType, payload: impl Into<Bytes>) -> Self {
        Self::with_end_of_message(message_type, payload, true)
    }

    /// Create a complete text message
    pub fn text(payload: impl Into<Bytes>) -> Self {
        Self::new(MessageType::Text, payload)
    }

    /// Create a complete binary message
    pub fn binary(payload: impl Into<Bytes>) -> Self {
        Self::new(MessageType::Binary, payload)
    }

    /// Create a message with an explicit end-of-message flag
    pub fn with_end_of_message(
        message_type: MessageType,
        payload: impl Into<Bytes>,
        end_of_message: bool,
    ) -> Self {
        Self {
            payload: payload.into(),
            message_type,
            end_of_message,
        }
    }

    /// Get message type
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Get payload
    #[must_use]
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Consume the message, returning its payload
    #[must_use]
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Whether this message is complete
    #[must_use]
    pub const fn end_of_message(&self) -> bool {
        self.end_of_message
    }

    /// Encode message to bytes in the given format
    pub fn encode(&self, format: MessageFormat) -> Result<Bytes> {
        super::encode(self, format)
    }

    /// Decode a single message from the start of `bytes`
    ///
    /// Returns `Ok(None)` when more bytes are needed.
    pub fn decode(bytes: &Bytes, format: MessageFormat) -> Result<Option<(Self, usize)>> {
        super::parse_message(bytes, format)
    }
}
