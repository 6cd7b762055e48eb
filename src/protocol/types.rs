//! Message types and wire formats

use std::fmt;

/// Logical message types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageType {
    /// UTF-8 (or otherwise textual) application data
    Text,
    /// Opaque binary application data
    Binary,
    /// Connection is closing; payload carries an optional reason
    Close,
    /// Remote error; payload carries a description
    Error,
}

impl MessageType {
    /// All message types, in binary indicator order
    pub const ALL: [Self; 4] = [Self::Text, Self::Binary, Self::Error, Self::Close];

    /// Check if this is a control message (Close or Error)
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(self, Self::Close | Self::Error)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "Text",
            Self::Binary => "Binary",
            Self::Close => "Close",
            Self::Error => "Error",
        };
        write!(f, "{name}")
    }
}

/// Wire encoding used for a batch of messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageFormat {
    /// `<length>:<flag>:<payload>;` framing
    Text,
    /// Length-prefixed binary framing
    Binary,
}

impl fmt::Display for MessageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "Text"),
            Self::Binary => write!(f, "Binary"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_types() {
        assert!(MessageType::Close.is_control());
        assert!(MessageType::Error.is_control());
        assert!(!MessageType::Text.is_control());
        assert!(!MessageType::Binary.is_control());
    }

    #[test]
    fn test_display() {
        assert_eq!(MessageType::Binary.to_string(), "Binary");
        assert_eq!(MessageFormat::Text.to_string(), "Text");
    }
}
