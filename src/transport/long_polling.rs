//! Long-polling transport: a receive loop and a send loop over plain HTTP.
//!
//! ```text
//!  application output ◄── poll loop ◄── GET  <base>/poll
//!  application input  ──► send loop ──► POST <base>/send
//! ```
//!
//! Both loops share one cancellation token. Whichever loop ends first cancels
//! it, so the other stops at its next suspension point. The combined result
//! closes the application's output queue, carrying the first error if any.
//! An error the application completes its input queue with counts as a send
//! loop error.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};
use url::Url;

use super::channel::{ChannelConnection, ChannelReader, ChannelWriter, CloseReason};
use super::error::TransportError;
use super::http::{HttpClient, HttpRequest, STATUS_NO_CONTENT, USER_AGENT_HEADER};
use super::join::join_first_error;
use super::metrics::{MetricsSnapshot, TransportMetrics};
use crate::protocol::{Message, Messages};

/// Default `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("polling-sockets/", env!("CARGO_PKG_VERSION"));

/// Transport configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TransportConfig {
    /// Value of the identifying `User-Agent` header.
    pub user_agent: String,
    /// Path segment appended to the base URL for receiving.
    pub poll_path: String,
    /// Path segment appended to the base URL for sending.
    pub send_path: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            poll_path: "poll".to_string(),
            send_path: "send".to_string(),
        }
    }
}

/// Lifecycle of a [`LongPollingTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Created, not started yet.
    Idle,
    /// Both loops have been started.
    Running,
    /// `stop` is waiting for the loops to finish.
    Stopping,
    /// Shut down; a new transport is needed to reconnect.
    Stopped,
}

/// `finished` fires once both loops have ended and the application's output
/// queue is completed.
enum Session {
    Idle,
    Running {
        cancel: CancellationToken,
        finished: CancellationToken,
    },
    Stopping {
        finished: CancellationToken,
    },
    Stopped,
}

/// Client-side long-polling transport.
///
/// One instance serves one logical connection. After [`stop`](Self::stop)
/// it cannot be started again.
pub struct LongPollingTransport<H> {
    http: Arc<H>,
    config: TransportConfig,
    metrics: Arc<TransportMetrics>,
    session: Mutex<Session>,
}

impl<H> std::fmt::Debug for LongPollingTransport<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LongPollingTransport")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<H: HttpClient + 'static> LongPollingTransport<H> {
    /// Create a transport with the default configuration.
    #[must_use]
    pub fn new(http: H) -> Self {
        Self::with_config(http, TransportConfig::default())
    }

    /// Create a transport with the given configuration.
    #[must_use]
    pub fn with_config(http: H, config: TransportConfig) -> Self {
        Self {
            http: Arc::new(http),
            config,
            metrics: Arc::new(TransportMetrics::default()),
            session: Mutex::new(Session::Idle),
        }
    }

    /// Start polling `<url>/poll` and sending to `<url>/send`.
    ///
    /// Messages received are written to `application.output()`; messages
    /// read from `application.input()` are posted. When both loops finish,
    /// `application.output()` is completed, with the first loop error as the
    /// reason if there was one.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::AlreadyStarted`] unless the transport is
    /// idle, and [`TransportError::InvalidUrl`] if `url` cannot take path
    /// segments.
    #[instrument(level = "info", skip_all, fields(url = %url))]
    pub async fn start<C>(&self, url: &Url, application: Arc<C>) -> Result<(), TransportError>
    where
        C: ChannelConnection<Message> + 'static,
    {
        let mut session = self.lock_session();
        if !matches!(*session, Session::Idle) {
            return Err(TransportError::AlreadyStarted);
        }

        let poll_url = append_path(url, &self.config.poll_path)?;
        let send_url = append_path(url, &self.config.send_path)?;
        let cancel = CancellationToken::new();

        let poller = poll_loop(
            LoopContext::new(self, poll_url, &cancel),
            Arc::clone(&application),
        );
        let sender = send_loop(
            LoopContext::new(self, send_url, &cancel),
            Arc::clone(&application),
        );

        let finished = CancellationToken::new();
        let done = finished.clone().drop_guard();
        tokio::spawn(async move {
            let _done = done;
            let result: Result<(), CloseReason> = join_first_error([
                Box::pin(sender) as LoopFuture,
                Box::pin(poller) as LoopFuture,
            ])
            .await
            .map_err(Arc::new);

            match &result {
                Ok(()) => debug!("transport loops finished"),
                Err(err) => debug!(error = %err, "transport loops finished with error"),
            }
            application.output().try_complete(result.err());
        });

        *session = Session::Running { cancel, finished };
        info!("long polling transport started");
        Ok(())
    }

    /// Cancel both loops and wait for them to finish.
    ///
    /// Every concurrent caller waits for the same shutdown. Loop errors are
    /// not returned: they have already been delivered by completing the
    /// application's output queue.
    #[instrument(level = "info", skip(self))]
    pub async fn stop(&self) {
        let finished = {
            let mut session = self.lock_session();
            let finished = match &*session {
                Session::Idle | Session::Stopped => None,
                Session::Stopping { finished } => Some(finished.clone()),
                Session::Running { cancel, finished } => {
                    cancel.cancel();
                    Some(finished.clone())
                }
            };
            let Some(finished) = finished else {
                *session = Session::Stopped;
                return;
            };
            *session = Session::Stopping {
                finished: finished.clone(),
            };
            finished
        };

        finished.cancelled().await;

        *self.lock_session() = Session::Stopped;
        info!("long polling transport stopped");
    }
}

impl<H> LongPollingTransport<H> {
    /// Current lifecycle state.
    ///
    /// A transport whose shutdown completed reports `Stopped` even if the
    /// `stop` call that began it was dropped before returning.
    #[must_use]
    pub fn state(&self) -> TransportState {
        match &*self.lock_session() {
            Session::Idle => TransportState::Idle,
            Session::Running { .. } => TransportState::Running,
            Session::Stopping { finished } if finished.is_cancelled() => TransportState::Stopped,
            Session::Stopping { .. } => TransportState::Stopping,
            Session::Stopped => TransportState::Stopped,
        }
    }

    /// Whether both loops have finished, whether or not `stop` was called.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        match &*self.lock_session() {
            Session::Idle => false,
            Session::Running { finished, .. } | Session::Stopping { finished } => {
                finished.is_cancelled()
            }
            Session::Stopped => true,
        }
    }

    /// Snapshot of this transport's counters.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<H> Drop for LongPollingTransport<H> {
    fn drop(&mut self) {
        if let Session::Running { cancel, .. } = &*self.lock_session() {
            cancel.cancel();
        }
    }
}

type LoopFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), TransportError>> + Send>>;

/// Everything one loop needs, cloned out of the transport.
struct LoopContext<H> {
    http: Arc<H>,
    url: Url,
    user_agent: String,
    metrics: Arc<TransportMetrics>,
    cancel: CancellationToken,
}

impl<H> LoopContext<H> {
    fn new(transport: &LongPollingTransport<H>, url: Url, cancel: &CancellationToken) -> Self {
        Self {
            http: Arc::clone(&transport.http),
            url,
            user_agent: transport.config.user_agent.clone(),
            metrics: Arc::clone(&transport.metrics),
            cancel: cancel.clone(),
        }
    }

    fn request(&self, request: HttpRequest) -> HttpRequest {
        request.header(USER_AGENT_HEADER, self.user_agent.as_str())
    }
}

fn append_path(base: &Url, segment: &str) -> Result<Url, TransportError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| TransportError::InvalidUrl { url: base.clone() })?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

#[instrument(level = "debug", name = "poll", skip_all, fields(url = %ctx.url))]
async fn poll_loop<H, C>(ctx: LoopContext<H>, application: Arc<C>) -> Result<(), TransportError>
where
    H: HttpClient,
    C: ChannelConnection<Message>,
{
    let _cancel_sibling = ctx.cancel.clone().drop_guard();

    let result = poll(&ctx, application.output()).await;
    if let Err(err) = &result {
        ctx.metrics.record_error();
        error!(url = %ctx.url, error = %err, "error while polling");
    }
    result
}

async fn poll<H, W>(ctx: &LoopContext<H>, output: &W) -> Result<(), TransportError>
where
    H: HttpClient,
    W: ChannelWriter<Message>,
{
    while !ctx.cancel.is_cancelled() {
        let request = ctx.request(HttpRequest::get(ctx.url.clone()));
        let response = ctx.http.send(request).await?;
        ctx.metrics.record_poll();

        if !response.is_success() {
            return Err(TransportError::UnexpectedStatus {
                url: ctx.url.clone(),
                status: response.status,
            });
        }

        if response.status == STATUS_NO_CONTENT {
            debug!("server closed the poll stream");
            break;
        }
        if ctx.cancel.is_cancelled() {
            break;
        }

        let Some(messages) = Messages::from_body(response.body)? else {
            continue;
        };

        for message in messages {
            let message = message?;
            debug!(message_type = %message.message_type(), len = message.payload().len(), "received message");
            if !deliver(output, message, &ctx.cancel).await {
                return Ok(());
            }
            ctx.metrics.record_received();
        }
    }
    Ok(())
}

/// Push `message` to the application, waiting while its queue is full.
///
/// Returns `false` if cancellation fired or the queue was completed first.
async fn deliver<W>(output: &W, mut message: Message, cancel: &CancellationToken) -> bool
where
    W: ChannelWriter<Message>,
{
    loop {
        match output.try_write(message) {
            Ok(()) => return true,
            Err(rejected) => message = rejected,
        }

        let writable = tokio::select! {
            biased;
            () = cancel.cancelled() => false,
            writable = output.wait_to_write() => writable,
        };
        if !writable {
            return false;
        }
    }
}

#[instrument(level = "debug", name = "send", skip_all, fields(url = %ctx.url))]
async fn send_loop<H, C>(ctx: LoopContext<H>, application: Arc<C>) -> Result<(), TransportError>
where
    H: HttpClient,
    C: ChannelConnection<Message>,
{
    let _cancel_sibling = ctx.cancel.clone().drop_guard();

    let result = send(&ctx, application.input()).await;
    if let Err(err) = &result {
        ctx.metrics.record_error();
        error!(url = %ctx.url, error = %err, "error while sending");
    }
    result
}

async fn send<H, R>(ctx: &LoopContext<H>, input: &R) -> Result<(), TransportError>
where
    H: HttpClient,
    R: ChannelReader<Message>,
{
    loop {
        let readable = tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => false,
            readable = input.wait_to_read() => readable.map_err(TransportError::InputFaulted)?,
        };
        if !readable {
            return Ok(());
        }

        while !ctx.cancel.is_cancelled() {
            let Some(message) = input.try_read() else {
                break;
            };

            let mut request = ctx.request(HttpRequest::post(ctx.url.clone()));
            if !message.payload().is_empty() {
                request = request.body(message.into_payload());
            }

            let started = Instant::now();
            let response = ctx.http.send(request).await?;
            if !response.is_success() {
                return Err(TransportError::UnexpectedStatus {
                    url: ctx.url.clone(),
                    status: response.status,
                });
            }
            ctx.metrics.record_sent(started.elapsed());
            debug!("sent message");
        }
    }
}
