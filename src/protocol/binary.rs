//! Binary endpoint message framing
//!
//! ```text
//! [LENGTH (8 bytes, big-endian)] [TYPE (1 byte)] [PAYLOAD (LENGTH bytes)]
//! ```

use bytes::Bytes;

use super::output::OutputExt;
use super::{BINARY_HEADER_SIZE, Error, Message, MessageType, Output, Result};

const TEXT_TYPE: u8 = 0x00;
const BINARY_TYPE: u8 = 0x01;
const ERROR_TYPE: u8 = 0x02;
const CLOSE_TYPE: u8 = 0x03;

fn type_indicator(message_type: MessageType) -> u8 {
    match message_type {
        MessageType::Text => TEXT_TYPE,
        MessageType::Binary => BINARY_TYPE,
        MessageType::Error => ERROR_TYPE,
        MessageType::Close => CLOSE_TYPE,
    }
}

fn parse_type(type_byte: u8) -> Result<MessageType> {
    match type_byte {
        TEXT_TYPE => Ok(MessageType::Text),
        BINARY_TYPE => Ok(MessageType::Binary),
        ERROR_TYPE => Ok(MessageType::Error),
        CLOSE_TYPE => Ok(MessageType::Close),
        _ => Err(Error::InvalidMessageType { type_byte }),
    }
}

/// Write one message in the binary framing
pub(crate) fn write_message<O: Output + ?Sized>(message: &Message, output: &mut O) -> Result<()> {
    let indicator = type_indicator(message.message_type());
    let payload = message.payload();

    output.write_u64_be(payload.len() as u64)?;
    output.write_u8(indicator)?;
    output.write_all(payload)
}

/// Parse one message from the start of `buffer`
///
/// Returns `Ok(None)` if the buffer does not yet hold the whole frame.
pub(crate) fn parse_message(buffer: &Bytes) -> Result<Option<(Message, usize)>> {
    if buffer.len() < BINARY_HEADER_SIZE {
        return Ok(None);
    }

    let mut length_bytes = [0u8; 8];
    length_bytes.copy_from_slice(&buffer[..8]);
    let announced = u64::from_be_bytes(length_bytes);

    let total = usize::try_from(announced)
        .ok()
        .and_then(|len| len.checked_add(BINARY_HEADER_SIZE))
        .ok_or(Error::PayloadTooLarge { size: announced })?;

    if buffer.len() < total {
        return Ok(None);
    }

    let message_type = parse_type(buffer[8])?;
    let payload = buffer.slice(BINARY_HEADER_SIZE..total);

    Ok(Some((Message::new(message_type, payload), total)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ArrayOutput;

    fn encode(message: &Message) -> Bytes {
        let mut output = ArrayOutput::new(8);
        write_message(message, &mut output).unwrap();
        output.into_bytes()
    }

    #[test]
    fn test_encode_text_message() {
        let encoded = encode(&Message::text("ABC"));

        assert_eq!(
            encoded.as_ref(),
            &[0, 0, 0, 0, 0, 0, 0, 3, 0x00, b'A', b'B', b'C']
        );
    }

    #[test]
    fn test_type_indicators() {
        let cases = [
            (MessageType::Text, 0x00),
            (MessageType::Binary, 0x01),
            (MessageType::Error, 0x02),
            (MessageType::Close, 0x03),
        ];

        for (message_type, indicator) in cases {
            let encoded = encode(&Message::new(message_type, Bytes::new()));
            assert_eq!(encoded.len(), BINARY_HEADER_SIZE);
            assert_eq!(encoded[8], indicator, "{message_type}");
        }
    }

    #[test]
    fn test_decode_needs_header() {
        let buffer = Bytes::from_static(&[0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(parse_message(&buffer), Ok(None));
    }

    #[test]
    fn test_decode_needs_full_payload() {
        let encoded = encode(&Message::binary(vec![1u8, 2, 3, 4]));
        for end in 0..encoded.len() {
            assert_eq!(parse_message(&encoded.slice(..end)), Ok(None), "end={end}");
        }
    }

    #[test]
    fn test_decode_stops_at_frame_boundary() {
        let mut output = ArrayOutput::new(8);
        write_message(&Message::text("one"), &mut output).unwrap();
        write_message(&Message::new(MessageType::Close, "two"), &mut output).unwrap();
        let bytes = output.into_bytes();

        let (first, consumed) = parse_message(&bytes).unwrap().unwrap();
        assert_eq!(first, Message::text("one"));
        assert_eq!(consumed, BINARY_HEADER_SIZE + 3);

        let (second, rest) = parse_message(&bytes.slice(consumed..)).unwrap().unwrap();
        assert_eq!(second, Message::new(MessageType::Close, "two"));
        assert_eq!(consumed + rest, bytes.len());
    }

    #[test]
    fn test_decode_invalid_type() {
        let buffer = Bytes::from_static(&[0, 0, 0, 0, 0, 0, 0, 1, 0x07, b'x']);
        assert_eq!(
            parse_message(&buffer),
            Err(Error::InvalidMessageType { type_byte: 0x07 })
        );
    }

    #[test]
    fn test_decode_oversized_length() {
        let buffer = Bytes::from_static(&[0xFF; 16]);
        assert_eq!(
            parse_message(&buffer),
            Err(Error::PayloadTooLarge { size: u64::MAX })
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn message_type_strategy() -> impl Strategy<Value = MessageType> {
            prop_oneof![
                Just(MessageType::Text),
                Just(MessageType::Binary),
                Just(MessageType::Close),
                Just(MessageType::Error),
            ]
        }

        proptest! {
            /// Property: Any complete message should roundtrip correctly
            #[test]
            fn prop_roundtrip_preserves_data(
                message_type in message_type_strategy(),
                payload in prop::collection::vec(any::<u8>(), 0..=4096),
                chunk_size in 1usize..64,
            ) {
                let original = Message::new(message_type, payload);
                let mut output = ArrayOutput::new(chunk_size);
                write_message(&original, &mut output).unwrap();
                let encoded = output.into_bytes();

                let reference = encode(&original);
                prop_assert_eq!(encoded.as_ref(), reference.as_ref());

                let (decoded, consumed) = parse_message(&encoded).unwrap().unwrap();
                prop_assert_eq!(decoded, original);
                prop_assert_eq!(consumed, encoded.len());
            }
        }
    }
}
