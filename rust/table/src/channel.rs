//! Whole-document, last-write-wins replication of round documents.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::document::{Epoch, RoundDocument, RoundId, WriterLease};
use crate::errors::TableError;

// A subscriber whose buffer is full keeps only the newest overflowing document
const SUBSCRIBER_BUFFER: usize = 256;

pub type DocumentReceiver = mpsc::Receiver<RoundDocument>;

/// Newest document that did not fit in a lagging subscriber's buffer.
pub type OverflowSlot = Arc<Mutex<Option<RoundDocument>>>;

/// Live feed of one round's documents. Dropping it unsubscribes.
pub struct Subscription {
    round_id: RoundId,
    receiver: DocumentReceiver,
    overflow: OverflowSlot,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(
        round_id: RoundId,
        receiver: DocumentReceiver,
        overflow: OverflowSlot,
        cancel: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            round_id,
            receiver,
            overflow,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn round_id(&self) -> &str {
        &self.round_id
    }

    /// Waits for the next document; `None` once the channel side is gone.
    pub async fn next(&mut self) -> Option<RoundDocument> {
        if let Some(doc) = self.try_next() {
            return Some(doc);
        }
        self.receiver.recv().await
    }

    /// Next document already delivered, without waiting. Buffered documents come
    /// first, then the newest one that overflowed.
    pub fn try_next(&mut self) -> Option<RoundDocument> {
        match self.receiver.try_recv() {
            Ok(doc) => Some(doc),
            Err(_) => self.overflow.lock().ok().and_then(|mut slot| slot.take()),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Shared store the host writes to and every client reads from.
///
/// Delivery is at-least-once and carries whole documents; readers must tolerate
/// duplicates and out-of-order arrival.
pub trait ReplicationChannel: Send + Sync {
    /// Grants `holder` the writer lease for `round_id` with a fresh, higher epoch.
    fn acquire_lease(&self, round_id: &str, holder: &str) -> Result<WriterLease, TableError>;

    /// Stores `doc` as the latest version and notifies subscribers.
    /// Returns the revision the channel assigned.
    fn write(&self, lease: &WriterLease, doc: RoundDocument) -> Result<u64, TableError>;

    fn subscribe(&self, round_id: &str) -> Subscription;

    fn latest(&self, round_id: &str) -> Option<RoundDocument>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryChannel {
    inner: Arc<ChannelInner>,
}

#[derive(Debug, Default)]
struct ChannelInner {
    rounds: RwLock<HashMap<RoundId, RoundSlot>>,
    subscribers: RwLock<HashMap<RoundId, Vec<Subscriber>>>,
    next_subscriber: AtomicUsize,
    faults: RwLock<Faults>,
}

#[derive(Debug, Clone)]
struct Subscriber {
    id: usize,
    sender: mpsc::Sender<RoundDocument>,
    overflow: OverflowSlot,
}

#[derive(Debug, Default)]
struct RoundSlot {
    lease_epoch: Epoch,
    lease_holder: Option<String>,
    latest: Option<RoundDocument>,
}

#[derive(Debug, Default)]
struct Faults {
    fail_writes: usize,
    duplicate_deliveries: bool,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the next `n` writes with [`TableError::WriteFailure`].
    pub fn fail_next_writes(&self, n: usize) {
        if let Ok(mut faults) = self.inner.faults.write() {
            faults.fail_writes = n;
        }
    }

    /// Delivers every document twice from now on.
    pub fn duplicate_deliveries(&self, on: bool) {
        if let Ok(mut faults) = self.inner.faults.write() {
            faults.duplicate_deliveries = on;
        }
    }

    /// Re-sends the latest document, as a re-fired change notification would.
    pub fn replay_latest(&self, round_id: &str) {
        if let Some(doc) = self.latest(round_id) {
            self.broadcast(round_id, doc);
        }
    }

    /// Delivers an arbitrary (possibly stale) document without storing it.
    pub fn deliver(&self, doc: RoundDocument) {
        let round_id = doc.round_id.clone();
        self.broadcast(&round_id, doc);
    }

    pub fn subscriber_count(&self, round_id: &str) -> usize {
        let guard = self
            .inner
            .subscribers
            .read()
            .expect("subscriber lock poisoned");
        guard.get(round_id).map_or(0, Vec::len)
    }

    fn broadcast(&self, round_id: &str, doc: RoundDocument) {
        let list = {
            let guard = self
                .inner
                .subscribers
                .read()
                .expect("subscriber lock poisoned");
            guard.get(round_id).cloned()
        };
        let Some(list) = list else {
            tracing::trace!(round_id, "no subscribers for round");
            return;
        };
        let copies = if self.duplicates() { 2 } else { 1 };

        let mut closed = Vec::new();
        for sub in list {
            for _ in 0..copies {
                match sub.sender.try_send(doc.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(doc)) => {
                        tracing::debug!(
                            round_id,
                            subscriber_id = sub.id,
                            revision = doc.revision,
                            "subscriber lagging; keeping newest document aside"
                        );
                        if let Ok(mut slot) = sub.overflow.lock() {
                            *slot = Some(doc);
                        }
                        break;
                    }
                    Err(TrySendError::Closed(_)) => {
                        tracing::warn!(
                            round_id,
                            subscriber_id = sub.id,
                            "subscriber gone; removing it"
                        );
                        closed.push(sub.id);
                        break;
                    }
                }
            }
        }
        if !closed.is_empty() {
            self.remove_subscribers(round_id, &closed);
        }
    }

    fn duplicates(&self) -> bool {
        self.inner
            .faults
            .read()
            .map(|f| f.duplicate_deliveries)
            .unwrap_or(false)
    }

    fn take_injected_failure(&self) -> bool {
        match self.inner.faults.write() {
            Ok(mut faults) if faults.fail_writes > 0 => {
                faults.fail_writes -= 1;
                true
            }
            _ => false,
        }
    }

    fn remove_subscribers(&self, round_id: &str, ids: &[usize]) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .expect("subscriber lock poisoned");
        if let Some(list) = guard.get_mut(round_id) {
            list.retain(|sub| !ids.contains(&sub.id));
            if list.is_empty() {
                guard.remove(round_id);
            }
        }
    }
}

impl ReplicationChannel for InMemoryChannel {
    fn acquire_lease(&self, round_id: &str, holder: &str) -> Result<WriterLease, TableError> {
        let mut rounds = self
            .inner
            .rounds
            .write()
            .map_err(|_| TableError::StoragePoisoned)?;
        let slot = rounds.entry(round_id.to_string()).or_default();
        slot.lease_epoch += 1;
        slot.lease_holder = Some(holder.to_string());
        tracing::info!(round_id, holder, epoch = slot.lease_epoch, "writer lease granted");
        Ok(WriterLease {
            round_id: round_id.to_string(),
            holder: holder.to_string(),
            epoch: slot.lease_epoch,
        })
    }

    fn write(&self, lease: &WriterLease, mut doc: RoundDocument) -> Result<u64, TableError> {
        let round_id = lease.round_id.clone();
        let revision = {
            let mut rounds = self
                .inner
                .rounds
                .write()
                .map_err(|_| TableError::StoragePoisoned)?;
            let Some(slot) = rounds.get_mut(&round_id) else {
                return Err(TableError::NoLease {
                    round_id,
                    holder: lease.holder.clone(),
                });
            };
            if lease.epoch < slot.lease_epoch {
                return Err(TableError::Fenced {
                    round_id,
                    epoch: lease.epoch,
                    current: slot.lease_epoch,
                });
            }
            if slot.lease_holder.as_deref() != Some(lease.holder.as_str()) {
                return Err(TableError::NoLease {
                    round_id,
                    holder: lease.holder.clone(),
                });
            }
            if self.take_injected_failure() {
                return Err(TableError::WriteFailure {
                    round_id,
                    reason: "injected failure".to_string(),
                });
            }
            let revision = slot.latest.as_ref().map_or(0, |d| d.revision) + 1;
            doc.round_id = round_id.clone();
            doc.revision = revision;
            doc.epoch = lease.epoch;
            doc.writer = lease.holder.clone();
            slot.latest = Some(doc.clone());
            revision
        };
        tracing::debug!(round_id = %round_id, revision, epoch = lease.epoch, "document written");
        self.broadcast(&round_id, doc);
        Ok(revision)
    }

    fn subscribe(&self, round_id: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::AcqRel);
        let overflow = OverflowSlot::default();
        {
            let mut guard = self
                .inner
                .subscribers
                .write()
                .expect("subscriber lock poisoned");
            guard.entry(round_id.to_string()).or_default().push(Subscriber {
                id,
                sender: tx,
                overflow: overflow.clone(),
            });
        }
        tracing::debug!(round_id, subscriber_id = id, "subscribed to round");

        let channel = self.clone();
        let key = round_id.to_string();
        Subscription::new(round_id.to_string(), rx, overflow, move || {
            channel.remove_subscribers(&key, &[id]);
        })
    }

    fn latest(&self, round_id: &str) -> Option<RoundDocument> {
        let rounds = self.inner.rounds.read().ok()?;
        rounds.get(round_id)?.latest.clone()
    }
}
