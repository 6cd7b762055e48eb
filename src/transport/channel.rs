//! Duplex message queues shared between the transport and the application.
//!
//! The transport only sees the two capability traits, [`ChannelReader`] and
//! [`ChannelWriter`]. [`Channel`] is a bounded in-memory implementation of
//! both, and [`DuplexChannel::pair`] wires two of them into the transport
//! side and the application side of one connection.

use std::collections::VecDeque;
use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::TransportError;

/// Error a channel was completed with, shared by every reader.
pub type CloseReason = Arc<TransportError>;

/// Readable side of a queue.
#[async_trait]
pub trait ChannelReader<T: Send>: Send + Sync {
    /// Take the next item if one is buffered.
    fn try_read(&self) -> Option<T>;

    /// Wait until an item is available.
    ///
    /// Resolves to `Ok(false)` once the queue is completed and drained, or to
    /// the completion error if it was completed with one.
    async fn wait_to_read(&self) -> Result<bool, CloseReason>;
}

/// Writable side of a queue.
#[async_trait]
pub trait ChannelWriter<T: Send>: Send + Sync {
    /// Push `item` without waiting, handing it back if the queue is full or
    /// completed.
    fn try_write(&self, item: T) -> Result<(), T>;

    /// Wait until there is room for another item.
    ///
    /// Resolves to `false` once the queue is completed.
    async fn wait_to_write(&self) -> bool;

    /// Mark the queue completed, optionally with an error for the reader.
    ///
    /// Returns `false` if it was already completed.
    fn try_complete(&self, reason: Option<CloseReason>) -> bool;
}

/// The pair of queues connecting a transport to its application.
///
/// `input` carries messages the transport must send, `output` carries
/// messages it has received.
pub trait ChannelConnection<T: Send>: Send + Sync {
    /// Queue the transport reads outbound messages from.
    type Input: ChannelReader<T>;
    /// Queue the transport writes inbound messages to.
    type Output: ChannelWriter<T>;

    /// Queue the transport reads from.
    fn input(&self) -> &Self::Input;

    /// Queue the transport writes to.
    fn output(&self) -> &Self::Output;
}

/// Bounded multi-producer, multi-consumer queue with completion.
#[derive(Debug)]
pub struct Channel<T> {
    inner: Arc<ChannelInner<T>>,
}

#[derive(Debug)]
struct ChannelInner<T> {
    state: Mutex<ChannelState<T>>,
    changed: Notify,
    capacity: usize,
}

#[derive(Debug)]
struct ChannelState<T> {
    items: VecDeque<T>,
    completed: bool,
    reason: Option<CloseReason>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Channel<T> {
    /// Create a queue holding at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        Self {
            inner: Arc::new(ChannelInner {
                state: Mutex::new(ChannelState {
                    items: VecDeque::new(),
                    completed: false,
                    reason: None,
                }),
                changed: Notify::new(),
                capacity,
            }),
        }
    }

    /// Create a queue that never refuses a write until completed.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::bounded(usize::MAX)
    }

    /// Maximum number of buffered items.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Number of buffered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Check whether no items are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Check whether the queue has been completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.lock().completed
    }

    /// Read the next item, waiting if necessary.
    ///
    /// Returns `Ok(None)` once the queue completed cleanly and is drained, or
    /// the completion error once a failed queue is drained.
    pub async fn read(&self) -> Result<Option<T>, CloseReason> {
        loop {
            let changed = self.inner.changed.notified();
            let mut changed = pin!(changed);
            changed.as_mut().enable();

            {
                let mut state = self.lock();
                let item = state.items.pop_front();
                if let Some(item) = item {
                    drop(state);
                    self.inner.changed.notify_waiters();
                    return Ok(Some(item));
                }
                if state.completed {
                    return match &state.reason {
                        Some(reason) => Err(Arc::clone(reason)),
                        None => Ok(None),
                    };
                }
            }

            changed.await;
        }
    }

    /// Write `item`, waiting for room if necessary.
    ///
    /// Hands the item back if the queue is completed.
    pub async fn write(&self, mut item: T) -> Result<(), T> {
        loop {
            match self.push(item) {
                Ok(()) => return Ok(()),
                Err(rejected) => item = rejected,
            }
            if !self.wait_writable().await {
                return Err(item);
            }
        }
    }

    /// Complete the queue without error.
    pub fn close(&self) -> bool {
        self.complete(None)
    }

    fn lock(&self) -> MutexGuard<'_, ChannelState<T>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn pop(&self) -> Option<T> {
        let item = self.lock().items.pop_front();
        if item.is_some() {
            self.inner.changed.notify_waiters();
        }
        item
    }

    fn push(&self, item: T) -> Result<(), T> {
        {
            let mut state = self.lock();
            if state.completed || state.items.len() >= self.inner.capacity {
                return Err(item);
            }
            state.items.push_back(item);
        }
        self.inner.changed.notify_waiters();
        Ok(())
    }

    fn complete(&self, reason: Option<CloseReason>) -> bool {
        {
            let mut state = self.lock();
            if state.completed {
                return false;
            }
            state.completed = true;
            state.reason = reason;
        }
        self.inner.changed.notify_waiters();
        true
    }

    async fn wait_readable(&self) -> Result<bool, CloseReason> {
        loop {
            let changed = self.inner.changed.notified();
            let mut changed = pin!(changed);
            changed.as_mut().enable();

            {
                let state = self.lock();
                if !state.items.is_empty() {
                    return Ok(true);
                }
                if state.completed {
                    return match &state.reason {
                        Some(reason) => Err(Arc::clone(reason)),
                        None => Ok(false),
                    };
                }
            }

            changed.await;
        }
    }

    async fn wait_writable(&self) -> bool {
        loop {
            let changed = self.inner.changed.notified();
            let mut changed = pin!(changed);
            changed.as_mut().enable();

            {
                let state = self.lock();
                if state.completed {
                    return false;
                }
                if state.items.len() < self.inner.capacity {
                    return true;
                }
            }

            changed.await;
        }
    }
}

#[async_trait]
impl<T: Send> ChannelReader<T> for Channel<T> {
    fn try_read(&self) -> Option<T> {
        self.pop()
    }

    async fn wait_to_read(&self) -> Result<bool, CloseReason> {
        self.wait_readable().await
    }
}

#[async_trait]
impl<T: Send> ChannelWriter<T> for Channel<T> {
    fn try_write(&self, item: T) -> Result<(), T> {
        self.push(item)
    }

    async fn wait_to_write(&self) -> bool {
        self.wait_writable().await
    }

    fn try_complete(&self, reason: Option<CloseReason>) -> bool {
        self.complete(reason)
    }
}

/// One end of a pair of [`Channel`]s.
#[derive(Debug)]
pub struct DuplexChannel<T> {
    input: Channel<T>,
    output: Channel<T>,
}

impl<T> DuplexChannel<T> {
    /// Create connected transport and application ends.
    ///
    /// Whatever one end writes to its `output` the other reads from its
    /// `input`. Both directions hold at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn pair(capacity: usize) -> (Self, Self) {
        let outbound = Channel::bounded(capacity);
        let inbound = Channel::bounded(capacity);

        let transport = Self {
            input: outbound.clone(),
            output: inbound.clone(),
        };
        let application = Self {
            input: inbound,
            output: outbound,
        };
        (transport, application)
    }

    /// Queue this end reads from.
    #[must_use]
    pub fn reader(&self) -> &Channel<T> {
        &self.input
    }

    /// Queue this end writes to.
    #[must_use]
    pub fn writer(&self) -> &Channel<T> {
        &self.output
    }
}

impl<T: Send> ChannelConnection<T> for DuplexChannel<T> {
    type Input = Channel<T>;
    type Output = Channel<T>;

    fn input(&self) -> &Channel<T> {
        &self.input
    }

    fn output(&self) -> &Channel<T> {
        &self.output
    }
}
