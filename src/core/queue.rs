//! Inbound message and outbound scan-result queues
//!
//! Both queues are unbounded MPSC channels. Producers (the radio receive path and
//! the WiFi scan path) hold cloneable sender handles and may run on any task;
//! the provisioning state machine owns the receiving ends and is the only
//! consumer. Pushing never blocks and popping never waits.

use std::{
    str::Utf8Error,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

use crate::core::{
    error::{TransportError, TransportResult},
    types::AccessPointRecord,
};

/// Push/pop counters for one queue
///
/// Queues are unbounded, so these counters are the only signal of growth.
#[derive(Debug, Default)]
pub struct QueueStats {
    pushed: AtomicU64,
    popped: AtomicU64,
    high_water: AtomicU64,
}

impl QueueStats {
    fn record_push(&self) {
        let pushed = self.pushed.fetch_add(1, Ordering::Relaxed) + 1;
        let depth = pushed.saturating_sub(self.popped.load(Ordering::Relaxed));
        self.high_water.fetch_max(depth, Ordering::Relaxed);
    }

    fn revert_push(&self) {
        self.pushed.fetch_sub(1, Ordering::Relaxed);
    }

    fn record_pop(&self) {
        self.popped.fetch_add(1, Ordering::Relaxed);
    }

    /// Total items accepted by the queue
    pub fn pushed(&self) -> u64 {
        self.pushed.load(Ordering::Relaxed)
    }

    /// Total items taken out of the queue
    pub fn popped(&self) -> u64 {
        self.popped.load(Ordering::Relaxed)
    }

    /// Items currently waiting (`pushed - popped`)
    pub fn depth(&self) -> u64 {
        let popped = self.popped();
        self.pushed().saturating_sub(popped)
    }

    /// Largest depth observed so far
    pub fn high_water(&self) -> u64 {
        self.high_water.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
struct Producer<T> {
    tx: UnboundedSender<T>,
    stats: Arc<QueueStats>,
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            stats: self.stats.clone(),
        }
    }
}

impl<T> Producer<T> {
    fn push(&self, item: T) -> Result<(), T> {
        self.stats.record_push();
        self.tx.send(item).map_err(|e| {
            self.stats.revert_push();
            e.0
        })
    }
}

#[derive(Debug)]
struct Consumer<T> {
    rx: UnboundedReceiver<T>,
    stats: Arc<QueueStats>,
}

impl<T> Consumer<T> {
    fn pop(&mut self) -> Option<T> {
        let item = self.rx.try_recv().ok()?;
        self.stats.record_pop();
        Some(item)
    }
}

fn tracked_channel<T>() -> (Producer<T>, Consumer<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stats = Arc::new(QueueStats::default());
    (
        Producer {
            tx,
            stats: stats.clone(),
        },
        Consumer { rx, stats },
    )
}

/// One frame received from the radio link
///
/// Owns a private copy of the received bytes, since the radio stack reuses its
/// receive buffer. Move-only: the queue hands it to the parser, which drops it.
#[derive(Debug, PartialEq, Eq)]
pub struct InboundMessage {
    bytes: Box<[u8]>,
}

impl InboundMessage {
    /// Copy a received frame, returns `None` for an empty frame
    pub fn from_frame(frame: &[u8]) -> Option<Self> {
        if frame.is_empty() {
            return None;
        }
        Some(Self {
            bytes: frame.into(),
        })
    }

    /// Raw frame bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Message text, terminated at the first NUL byte if the peer sent one
    pub fn text(&self) -> Result<&str, Utf8Error> {
        let end = self
            .bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.bytes.len());
        std::str::from_utf8(&self.bytes[..end])
    }
}

/// Producer handle for the inbound message queue, held by the radio receive path
#[derive(Debug, Clone)]
pub struct InboundSender {
    inner: Producer<InboundMessage>,
}

impl InboundSender {
    /// Queue a frame received from the peer
    ///
    /// Empty frames are discarded.
    pub fn push_frame(&self, frame: &[u8]) -> TransportResult<()> {
        let Some(message) = InboundMessage::from_frame(frame) else {
            debug!("Discarding empty frame");
            return Ok(());
        };
        self.push(message)?;
        trace!(len = frame.len(), "Added message to the queue");
        Ok(())
    }

    /// Queue an already-owned message
    pub fn push(&self, message: InboundMessage) -> TransportResult<()> {
        self.inner
            .push(message)
            .map_err(|_| TransportError::SessionClosed)
    }

    pub fn stats(&self) -> &QueueStats {
        &self.inner.stats
    }
}

/// Consumer end of the inbound message queue
#[derive(Debug)]
pub struct InboundQueue {
    inner: Consumer<InboundMessage>,
}

impl InboundQueue {
    /// Create a connected sender/queue pair
    pub fn channel() -> (InboundSender, InboundQueue) {
        let (producer, consumer) = tracked_channel();
        (
            InboundSender { inner: producer },
            InboundQueue { inner: consumer },
        )
    }

    pub fn is_empty(&self) -> bool {
        self.inner.rx.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.rx.len()
    }

    /// Take the oldest message without waiting
    pub fn pop(&mut self) -> Option<InboundMessage> {
        self.inner.pop()
    }

    pub fn stats(&self) -> &QueueStats {
        &self.inner.stats
    }
}

/// Producer handle for scan results, passed to the WiFi backend with each scan request
#[derive(Debug, Clone)]
pub struct ScanResultSink {
    inner: Producer<AccessPointRecord>,
}

impl ScanResultSink {
    /// Append a discovered access point
    ///
    /// Returns `false` once the consuming state machine is gone.
    pub fn push(&self, record: AccessPointRecord) -> bool {
        match self.inner.push(record) {
            Ok(()) => true,
            Err(record) => {
                debug!(ssid = %record.ssid, "Scan result dropped, queue closed");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.tx.is_closed()
    }

    pub fn stats(&self) -> &QueueStats {
        &self.inner.stats
    }
}

/// Consumer end of the scan-result queue
#[derive(Debug)]
pub struct ScanResultQueue {
    inner: Consumer<AccessPointRecord>,
}

impl ScanResultQueue {
    /// Create a connected sink/queue pair
    pub fn channel() -> (ScanResultSink, ScanResultQueue) {
        let (producer, consumer) = tracked_channel();
        (
            ScanResultSink { inner: producer },
            ScanResultQueue { inner: consumer },
        )
    }

    pub fn is_empty(&self) -> bool {
        self.inner.rx.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.rx.len()
    }

    /// Take the oldest record without waiting
    pub fn pop(&mut self) -> Option<AccessPointRecord> {
        self.inner.pop()
    }

    pub fn stats(&self) -> &QueueStats {
        &self.inner.stats
    }
}
