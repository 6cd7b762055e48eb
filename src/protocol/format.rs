//! Format dispatch between the text and binary framings.
//!
//! A long-poll response body starts with a single format indicator byte
//! (`'T'` or `'B'`) followed by zero or more framed messages. The indicator
//! characters are unrelated to the per-message type bytes of either framing.

use bytes::Bytes;

use super::{ArrayOutput, Error, Message, MessageFormat, Output, Result, binary, text};

/// Indicator byte for the text framing
pub const TEXT_FORMAT_INDICATOR: u8 = b'T';

/// Indicator byte for the binary framing
pub const BINARY_FORMAT_INDICATOR: u8 = b'B';

/// Content type negotiated for the text framing
pub const TEXT_CONTENT_TYPE: &str = "application/vnd.endpoint-messages.v1+text";

/// Content type negotiated for the binary framing
pub const BINARY_CONTENT_TYPE: &str = "application/vnd.endpoint-messages.v1+binary";

impl MessageFormat {
    /// Resolve a format indicator byte
    pub fn from_indicator(indicator: u8) -> Result<Self> {
        match indicator {
            TEXT_FORMAT_INDICATOR => Ok(Self::Text),
            BINARY_FORMAT_INDICATOR => Ok(Self::Binary),
            _ => Err(Error::InvalidFormat { indicator }),
        }
    }

    /// Format indicator byte
    #[must_use]
    pub const fn indicator(self) -> u8 {
        match self {
            Self::Text => TEXT_FORMAT_INDICATOR,
            Self::Binary => BINARY_FORMAT_INDICATOR,
        }
    }

    /// Content type used for negotiation
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Text => TEXT_CONTENT_TYPE,
            Self::Binary => BINARY_CONTENT_TYPE,
        }
    }

    /// Resolve a negotiated content type
    pub fn from_content_type(content_type: &str) -> Result<Self> {
        match content_type {
            TEXT_CONTENT_TYPE => Ok(Self::Text),
            BINARY_CONTENT_TYPE => Ok(Self::Binary),
            other => Err(Error::InvalidContentType(other.to_string())),
        }
    }
}

/// Write one complete message to `output`
///
/// # Errors
///
/// Returns [`Error::NotEndOfMessage`] for fragments, and
/// [`Error::OutputExhausted`] if `output` stops granting space.
pub fn write_message<O: Output + ?Sized>(
    message: &Message,
    output: &mut O,
    format: MessageFormat,
) -> Result<()> {
    if !message.end_of_message() {
        return Err(Error::NotEndOfMessage);
    }

    match format {
        MessageFormat::Text => text::write_message(message, output),
        MessageFormat::Binary => binary::write_message(message, output),
    }
}

/// Encode one complete message into a fresh buffer
pub fn encode(message: &Message, format: MessageFormat) -> Result<Bytes> {
    let mut output = ArrayOutput::default();
    write_message(message, &mut output, format)?;
    Ok(output.into_bytes())
}

/// Parse one message from the start of `buffer`
///
/// Returns the message and the number of bytes it occupied, or `Ok(None)`
/// when `buffer` ends before the frame does. Nothing is consumed in that case.
pub fn parse_message(buffer: &Bytes, format: MessageFormat) -> Result<Option<(Message, usize)>> {
    match format {
        MessageFormat::Text => text::parse_message(buffer),
        MessageFormat::Binary => binary::parse_message(buffer),
    }
}

/// Iterator over every message in a fully received buffer.
///
/// Because no more bytes will follow, a frame cut short at the end of the
/// buffer yields [`Error::IncompleteMessage`]. Iteration stops after the first
/// error.
#[derive(Debug, Clone)]
pub struct Messages {
    remaining: Bytes,
    format: MessageFormat,
    failed: bool,
}

impl Messages {
    /// Iterate over framed messages in `buffer` using `format`
    #[must_use]
    pub fn new(buffer: Bytes, format: MessageFormat) -> Self {
        Self {
            remaining: buffer,
            format,
            failed: false,
        }
    }

    /// Read the leading indicator byte of `body` and iterate over the rest
    ///
    /// Returns `Ok(None)` for an empty body.
    pub fn from_body(body: Bytes) -> Result<Option<Self>> {
        let Some(&indicator) = body.first() else {
            return Ok(None);
        };
        let format = MessageFormat::from_indicator(indicator)?;
        Ok(Some(Self::new(body.slice(1..), format)))
    }

    /// Format of the messages being read
    #[must_use]
    pub const fn format(&self) -> MessageFormat {
        self.format
    }

    /// Bytes not yet consumed
    #[must_use]
    pub fn remaining(&self) -> &Bytes {
        &self.remaining
    }
}

impl Iterator for Messages {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining.is_empty() {
            return None;
        }

        match parse_message(&self.remaining, self.format) {
            Ok(Some((message, consumed))) => {
                self.remaining = self.remaining.slice(consumed..);
                Some(Ok(message))
            }
            Ok(None) => {
                self.failed = true;
                Some(Err(Error::IncompleteMessage))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MessageType;

    #[test]
    fn test_indicator_roundtrip() {
        for format in [MessageFormat::Text, MessageFormat::Binary] {
            assert_eq!(MessageFormat::from_indicator(format.indicator()), Ok(format));
        }
        assert_eq!(MessageFormat::Text.indicator(), 0x54);
        assert_eq!(MessageFormat::Binary.indicator(), 0x42);
    }

    #[test]
    fn test_invalid_indicator() {
        assert_eq!(
            MessageFormat::from_indicator(0x00),
            Err(Error::InvalidFormat { indicator: 0x00 })
        );
        assert_eq!(
            MessageFormat::from_indicator(b't'),
            Err(Error::InvalidFormat { indicator: b't' })
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(MessageFormat::Text.content_type(), TEXT_CONTENT_TYPE);
        assert_eq!(MessageFormat::Binary.content_type(), BINARY_CONTENT_TYPE);
        assert_eq!(
            MessageFormat::from_content_type(BINARY_CONTENT_TYPE),
            Ok(MessageFormat::Binary)
        );
        assert!(matches!(
            MessageFormat::from_content_type("text/plain"),
            Err(Error::InvalidContentType(_))
        ));
    }

    #[test]
    fn test_encode_vectors() {
        assert_eq!(
            encode(&Message::binary(Bytes::new()), MessageFormat::Text)
                .unwrap()
                .as_ref(),
            b"0:B:;"
        );
        assert_eq!(
            encode(&Message::text("Hello,\r\nWorld!"), MessageFormat::Text)
                .unwrap()
                .as_ref(),
            b"14:T:Hello,\r\nWorld!;"
        );
        assert_eq!(
            encode(
                &Message::binary(vec![0xAB, 0xCD, 0xEF, 0x12]),
                MessageFormat::Text
            )
            .unwrap()
            .as_ref(),
            b"8:B:q83vEg==;"
        );
        assert_eq!(
            encode(&Message::text("ABC"), MessageFormat::Binary)
                .unwrap()
                .as_ref(),
            &[0, 0, 0, 0, 0, 0, 0, 3, 0x00, b'A', b'B', b'C']
        );
    }

    #[test]
    fn test_reject_fragments() {
        let fragment = Message::with_end_of_message(MessageType::Text, "part", false);
        let mut output = ArrayOutput::new(8);

        assert_eq!(
            write_message(&fragment, &mut output, MessageFormat::Text),
            Err(Error::NotEndOfMessage)
        );
        assert!(output.is_empty());
    }

    #[test]
    fn test_messages_from_body() {
        let body = Bytes::from_static(b"T3:T:ABC;0:C:;");
        let messages: Vec<_> = Messages::from_body(body)
            .unwrap()
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(
            messages,
            vec![Message::text("ABC"), Message::new(MessageType::Close, "")]
        );
    }

    #[test]
    fn test_messages_binary_body() {
        let mut body = vec![BINARY_FORMAT_INDICATOR];
        body.extend_from_slice(&encode(&Message::binary(vec![1u8, 2]), MessageFormat::Binary).unwrap());
        body.extend_from_slice(&encode(&Message::text("x"), MessageFormat::Binary).unwrap());

        let mut messages = Messages::from_body(Bytes::from(body)).unwrap().unwrap();
        assert_eq!(messages.format(), MessageFormat::Binary);
        assert_eq!(messages.next(), Some(Ok(Message::binary(vec![1u8, 2]))));
        assert_eq!(messages.next(), Some(Ok(Message::text("x"))));
        assert_eq!(messages.next(), None);
        assert!(messages.remaining().is_empty());
    }

    #[test]
    fn test_messages_trailing_bytes() {
        let mut messages = Messages::new(Bytes::from_static(b"3:T:ABC;5:T:AB"), MessageFormat::Text);

        assert_eq!(messages.next(), Some(Ok(Message::text("ABC"))));
        assert_eq!(messages.next(), Some(Err(Error::IncompleteMessage)));
        assert_eq!(messages.next(), None);
        assert_eq!(messages.remaining().as_ref(), b"5:T:AB");
    }

    #[test]
    fn test_messages_empty_and_invalid_body() {
        assert!(Messages::from_body(Bytes::new()).unwrap().is_none());
        assert!(matches!(
            Messages::from_body(Bytes::from_static(b"X0:T:;")),
            Err(Error::InvalidFormat { indicator: b'X' })
        ));
        assert_eq!(
            Messages::from_body(Bytes::from_static(b"T")).unwrap().unwrap().count(),
            0
        );
    }
}
