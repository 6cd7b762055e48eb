//! Text endpoint message framing
//!
//! ```text
//! <length>:<flag>:<payload>;
//! ```
//!
//! `length` is the ASCII decimal size of `payload` as it appears on the wire.
//! Binary payloads are base64 encoded, so their length counts base64
//! characters rather than raw bytes. The terminator is located by length,
//! never by scanning, so payloads may contain `:` and `;`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;

use super::output::OutputExt;
use super::{Error, Message, MessageType, Output, Result, TEXT_FRAME_OVERHEAD};

const FIELD_DELIMITER: u8 = b':';
const MESSAGE_DELIMITER: u8 = b';';
const PADDING: u8 = b'=';

const TEXT_FLAG: u8 = b'T';
const BINARY_FLAG: u8 = b'B';
const CLOSE_FLAG: u8 = b'C';
const ERROR_FLAG: u8 = b'E';

fn type_flag(message_type: MessageType) -> u8 {
    match message_type {
        MessageType::Text => TEXT_FLAG,
        MessageType::Binary => BINARY_FLAG,
        MessageType::Close => CLOSE_FLAG,
        MessageType::Error => ERROR_FLAG,
    }
}

fn parse_flag(flag: u8) -> Result<MessageType> {
    match flag {
        TEXT_FLAG => Ok(MessageType::Text),
        BINARY_FLAG => Ok(MessageType::Binary),
        CLOSE_FLAG => Ok(MessageType::Close),
        ERROR_FLAG => Ok(MessageType::Error),
        _ => Err(Error::InvalidTypeFlag {
            flag: char::from(flag),
        }),
    }
}

/// Write one message in the text framing
pub(crate) fn write_message<O: Output + ?Sized>(message: &Message, output: &mut O) -> Result<()> {
    let flag = type_flag(message.message_type());

    let encoded;
    let payload: &[u8] = if message.message_type() == MessageType::Binary {
        encoded = STANDARD.encode(message.payload());
        encoded.as_bytes()
    } else {
        message.payload()
    };

    output.write_all(payload.len().to_string().as_bytes())?;
    output.write_u8(FIELD_DELIMITER)?;
    output.write_u8(flag)?;
    output.write_u8(FIELD_DELIMITER)?;
    output.write_all(payload)?;
    output.write_u8(MESSAGE_DELIMITER)
}

/// Parse one message from the start of `buffer`
///
/// Returns `Ok(None)` while the buffer is too short to hold the frame its
/// length field announces.
pub(crate) fn parse_message(buffer: &Bytes) -> Result<Option<(Message, usize)>> {
    let Some(colon) = buffer.iter().position(|&b| b == FIELD_DELIMITER) else {
        return Ok(None);
    };

    let length = parse_length(&buffer[..colon])?;
    let frame = &buffer[colon..];

    let required = length
        .checked_add(TEXT_FRAME_OVERHEAD)
        .ok_or(Error::InvalidLength)?;
    if frame.len() < required {
        return Ok(None);
    }

    expect_delimiter(frame[0], FIELD_DELIMITER)?;
    let message_type = parse_flag(frame[1])?;
    expect_delimiter(frame[2], FIELD_DELIMITER)?;

    let payload_start = colon + 3;
    let payload_end = payload_start + length;
    let raw = buffer.slice(payload_start..payload_end);

    let payload = if message_type == MessageType::Binary && !raw.is_empty() {
        decode_base64(&raw)?
    } else {
        raw
    };

    if buffer[payload_end] != MESSAGE_DELIMITER {
        return Err(Error::IncompleteMessage);
    }

    Ok(Some((Message::new(message_type, payload), payload_end + 1)))
}

fn parse_length(digits: &[u8]) -> Result<usize> {
    if digits.is_empty() {
        return Err(Error::InvalidLength);
    }

    digits.iter().try_fold(0usize, |acc, &digit| {
        if !digit.is_ascii_digit() {
            return Err(Error::InvalidLength);
        }
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(usize::from(digit - b'0')))
            .ok_or(Error::InvalidLength)
    })
}

fn expect_delimiter(found: u8, expected: u8) -> Result<()> {
    if found == expected {
        Ok(())
    } else {
        Err(Error::MissingDelimiter {
            expected: char::from(expected),
            found: char::from(found),
        })
    }
}

/// Expected decoded size of a padded base64 payload.
fn decoded_len(encoded: &[u8]) -> Option<usize> {
    let len = encoded.len();
    let mut decoded = (len / 4) * 3;

    if encoded[len - 1] == PADDING {
        decoded = decoded.checked_sub(1)?;
    }
    if len > 1 && encoded[len - 2] == PADDING {
        decoded = decoded.checked_sub(1)?;
    }
    Some(decoded)
}

fn decode_base64(encoded: &[u8]) -> Result<Bytes> {
    let expected = decoded_len(encoded).ok_or(Error::InvalidPayload)?;

    let mut decoded = Vec::with_capacity(expected);
    STANDARD
        .decode_vec(encoded, &mut decoded)
        .map_err(|_| Error::InvalidPayload)?;

    if decoded.len() != expected {
        return Err(Error::InvalidPayload);
    }
    Ok(Bytes::from(decoded))
}
