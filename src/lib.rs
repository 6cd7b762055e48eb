//! Long-polling client transport with endpoint message framing
//!
//! This library emulates a persistent, bidirectional message channel over
//! plain HTTP requests, and provides the framing used to carry messages in
//! poll responses.
//!
//! # Quick Start
//!
//! ```rust
//! use polling_sockets::{Message, MessageFormat};
//!
//! // Encode a binary message with the text framing
//! let msg = Message::binary(vec![0xAB, 0xCD, 0xEF, 0x12]);
//! let bytes = msg.encode(MessageFormat::Text)?;
//! assert_eq!(&bytes[..], b"8:B:q83vEg==;");
//!
//! // Decode it back; `None` would mean more bytes are needed
//! let (decoded, consumed) = Message::decode(&bytes, MessageFormat::Text)?.unwrap();
//! assert_eq!(decoded, msg);
//! assert_eq!(consumed, bytes.len());
//! # Ok::<(), polling_sockets::Error>(())
//! ```
//!
//! Connecting a transport:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use polling_sockets::transport::{DuplexChannel, LongPollingTransport, ReqwestHttpClient};
//! use polling_sockets::Message;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let (transport_side, application) = DuplexChannel::pair(64);
//! let transport = LongPollingTransport::new(ReqwestHttpClient::new());
//! let url = "http://localhost:5000/chat".parse()?;
//! transport.start(&url, Arc::new(transport_side)).await?;
//!
//! application.writer().write(Message::text("hello")).await.ok();
//! while let Some(message) = application.reader().read().await? {
//!     println!("{:?}", message.payload());
//! }
//! transport.stop().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Two framings** - human-readable text and compact length-prefixed binary
//! - **Streaming-friendly decoding** - short buffers report "need more data"
//! - **Coupled loops** - receive and send loops stop together and report the
//!   first failure through the application's queue
//! - **Pluggable HTTP** - any [`transport::HttpClient`]; `reqwest` by default

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod protocol;
pub mod transport;

pub use protocol::{Error, Message, MessageFormat, MessageType, Result};
pub use transport::{LongPollingTransport, TransportConfig, TransportError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
