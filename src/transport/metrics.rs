use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const NANOSECONDS_PER_MICROSECOND: u128 = 1_000;

/// Per-transport counters, updated by both loops.
#[derive(Debug, Default)]
pub(crate) struct TransportMetrics {
    polls: AtomicU64,
    received_messages: AtomicU64,
    sent_messages: AtomicU64,
    errors: AtomicU64,
    send_latency_total_ns: AtomicU64,
    send_latency_max_ns: AtomicU64,
}

impl TransportMetrics {
    #[inline]
    pub(crate) fn record_poll(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_received(&self) {
        self.received_messages.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_sent(&self, latency: Duration) {
        self.sent_messages.fetch_add(1, Ordering::Relaxed);

        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.send_latency_total_ns
            .fetch_add(nanos, Ordering::Relaxed);
        update_max(&self.send_latency_max_ns, nanos);
    }

    #[inline]
    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            polls: self.polls.load(Ordering::Relaxed),
            received_messages: self.received_messages.load(Ordering::Relaxed),
            sent_messages: self.sent_messages.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            send_latency_total_ns: self.send_latency_total_ns.load(Ordering::Relaxed),
            send_latency_max_ns: self.send_latency_max_ns.load(Ordering::Relaxed),
        }
    }
}

fn update_max(target: &AtomicU64, candidate: u64) {
    let mut current = target.load(Ordering::Relaxed);
    while candidate > current {
        match target.compare_exchange_weak(
            current,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return,
            Err(old) => current = old,
        }
    }
}

/// Lightweight snapshot of transport counters.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Poll requests that received a response.
    pub polls: u64,
    /// Messages delivered to the application.
    pub received_messages: u64,
    /// Messages posted to the server.
    pub sent_messages: u64,
    /// Loops that ended with an error.
    pub errors: u64,
    /// Sum of round-trip times of successful sends.
    pub send_latency_total_ns: u64,
    /// Slowest successful send.
    pub send_latency_max_ns: u64,
}

impl MetricsSnapshot {
    /// Average send latency in microseconds.
    #[must_use]
    pub fn avg_send_latency_us(&self) -> Option<u64> {
        if self.sent_messages == 0 {
            return None;
        }

        let total_ns = u128::from(self.send_latency_total_ns);
        let average = total_ns / (u128::from(self.sent_messages) * NANOSECONDS_PER_MICROSECOND);
        Some(u64::try_from(average).unwrap_or(u64::MAX))
    }
}
