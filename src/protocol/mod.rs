//! Endpoint message framing
//!
//! This module provides the message type, the two wire encodings (text and
//! binary) and the format dispatcher that selects between them.

mod binary;
mod error;
pub mod format;
mod message;
mod output;
mod text;
mod types;

pub use error::{Error, Result};
pub use format::{
    BINARY_CONTENT_TYPE, BINARY_FORMAT_INDICATOR, Messages, TEXT_CONTENT_TYPE,
    TEXT_FORMAT_INDICATOR, encode, parse_message, write_message,
};
pub use message::Message;
pub use output::{ArrayOutput, DEFAULT_CHUNK_SIZE, Output};
pub use types::{MessageFormat, MessageType};

/// Binary encoding header size: 8-byte length plus 1-byte type indicator
pub const BINARY_HEADER_SIZE: usize = 9;

/// Fixed text framing overhead after the length field: `:`, flag, `:`, `;`
pub const TEXT_FRAME_OVERHEAD: usize = 4;
