//! Live collection feed
//!
//! A feed pushes the complete current set of records of a collection every
//! time any record in it changes. Each collection is backed by a
//! `tokio::sync::watch` channel: subscribers always see the latest snapshot,
//! intermediate snapshots may be skipped, and nothing ever queues up behind a
//! slow reader.
//!
//! ```text
//! RecordStore mutation ──▶ FeedHub::publish(collection, records)
//!                                   │
//!                           watch::Sender<Snapshot>
//!                                   │
//!               ┌───────────────────┼───────────────────┐
//!          Subscription        Subscription        Subscription
//!        (REST list read)    (live view socket)        ...
//! ```

use crate::core::field;
use crate::core::record::Record;
use futures::Stream;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Complete, consistent view of one collection
///
/// A snapshot always replaces the previous one; it is never a delta.
pub type Snapshot = Arc<Vec<Record>>;

/// Registry of per-collection snapshot channels
///
/// Cheap to clone; all clones share the same channels.
#[derive(Debug, Clone, Default)]
pub struct FeedHub {
    channels: Arc<RwLock<HashMap<String, watch::Sender<Snapshot>>>>,
}

impl FeedHub {
    /// Create an empty hub
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot of a collection and wake every subscriber
    pub fn publish(&self, collection: &str, records: Vec<Record>) {
        let count = records.len();
        let sender = self.sender(collection);
        sender.send_replace(Arc::new(records));

        tracing::trace!(
            collection = %collection,
            records = count,
            subscribers = sender.receiver_count(),
            "Snapshot published"
        );
    }

    /// Subscribe to a collection, ordered by `order_field` descending
    ///
    /// The subscription immediately holds the current snapshot (empty if the
    /// collection has never been written).
    pub fn subscribe(&self, collection: &str, order_field: &str) -> Subscription {
        let rx = self.sender(collection).subscribe();

        tracing::debug!(
            collection = %collection,
            order_field = %order_field,
            "Feed subscription opened"
        );

        Subscription {
            collection: collection.to_string(),
            order_field: order_field.to_string(),
            rx: Some(rx),
        }
    }

    /// Current snapshot of a collection, ordered by `order_field` descending
    pub fn snapshot(&self, collection: &str, order_field: &str) -> Snapshot {
        self.subscribe(collection, order_field).current()
    }

    /// Number of open subscriptions on a collection
    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.channels
            .read()
            .map(|channels| {
                channels
                    .get(collection)
                    .map(watch::Sender::receiver_count)
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }

    /// Forget a collection's channel unless someone still follows it
    ///
    /// Returns whether the channel was removed. A later publish or subscribe
    /// starts a fresh, empty channel.
    pub fn release(&self, collection: &str) -> bool {
        let mut channels = self
            .channels
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let idle = channels
            .get(collection)
            .is_some_and(|sender| sender.receiver_count() == 0);
        if idle {
            channels.remove(collection);
            tracing::debug!(collection = %collection, "Feed channel released");
        }
        idle
    }

    /// Whether a channel exists for a collection
    pub fn has_channel(&self, collection: &str) -> bool {
        self.channels
            .read()
            .map(|channels| channels.contains_key(collection))
            .unwrap_or(false)
    }

    fn sender(&self, collection: &str) -> watch::Sender<Snapshot> {
        if let Ok(channels) = self.channels.read()
            && let Some(sender) = channels.get(collection)
        {
            return sender.clone();
        }

        // A poisoned lock only means another writer panicked mid-insert; the
        // map itself is still usable.
        let mut channels = self
            .channels
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        channels
            .entry(collection.to_string())
            .or_insert_with(|| watch::channel(Snapshot::default()).0)
            .clone()
    }
}

/// An open subscription to one collection's snapshots
///
/// Dropping the subscription (or calling [`Subscription::unsubscribe`])
/// stops delivery. After unsubscription no snapshot is ever returned again.
#[derive(Debug)]
pub struct Subscription {
    collection: String,
    order_field: String,
    rx: Option<watch::Receiver<Snapshot>>,
}

impl Subscription {
    /// Collection this subscription follows
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Whether the subscription is still delivering snapshots
    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }

    /// Latest snapshot, marking it as seen
    ///
    /// Returns an empty snapshot once unsubscribed.
    pub fn current(&mut self) -> Snapshot {
        match self.rx.as_mut() {
            Some(rx) => {
                let raw = rx.borrow_and_update().clone();
                order_snapshot(raw, &self.order_field)
            }
            None => Snapshot::default(),
        }
    }

    /// Wait for the next snapshot
    ///
    /// Returns `None` when unsubscribed or when the hub has gone away.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        let rx = self.rx.as_mut()?;
        if rx.changed().await.is_err() {
            tracing::debug!(collection = %self.collection, "Feed closed");
            self.rx = None;
            return None;
        }
        let raw = rx.borrow_and_update().clone();
        Some(order_snapshot(raw, &self.order_field))
    }

    /// Stop receiving snapshots
    pub fn unsubscribe(&mut self) {
        if self.rx.take().is_some() {
            tracing::debug!(collection = %self.collection, "Feed subscription closed");
        }
    }

    /// Turn the subscription into a stream of snapshots
    ///
    /// The stream yields the current snapshot first, then every change.
    pub fn into_stream(mut self) -> impl Stream<Item = Snapshot> + Send + 'static {
        let order_field = self.order_field.clone();
        let stream = self.rx.take().map(WatchStream::new);
        futures::stream::iter(stream)
            .flatten()
            .map(move |raw| order_snapshot(raw, &order_field))
    }
}

/// Order a raw snapshot by `order_field` descending (stable)
fn order_snapshot(raw: Snapshot, order_field: &str) -> Snapshot {
    let already_ordered = raw.windows(2).all(|pair| {
        field::epoch_millis(pair[0].get(order_field)) >= field::epoch_millis(pair[1].get(order_field))
    });
    if already_ordered {
        return raw;
    }

    let mut records = raw.as_ref().clone();
    records.sort_by(|a, b| {
        field::epoch_millis(b.get(order_field)).cmp(&field::epoch_millis(a.get(order_field)))
    });
    Arc::new(records)
}
