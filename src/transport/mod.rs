//! Long-polling client transport

mod channel;
mod error;
pub mod http;
mod join;
mod long_polling;
mod metrics;

pub use channel::{
    Channel, ChannelConnection, ChannelReader, ChannelWriter, CloseReason, DuplexChannel,
};
pub use error::TransportError;
#[cfg(feature = "reqwest")]
pub use http::ReqwestHttpClient;
pub use http::{HttpClient, HttpError, HttpRequest, HttpResponse, Method};
pub use long_polling::{DEFAULT_USER_AGENT, LongPollingTransport, TransportConfig, TransportState};
pub use metrics::MetricsSnapshot;
