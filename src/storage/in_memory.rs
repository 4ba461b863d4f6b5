//! In-memory implementation of RecordStore for testing and development

use crate::core::events::{EventBus, RecordEvent};
use crate::core::feed::{FeedHub, Subscription};
use crate::core::record::{CREATED_AT, Fields, Record, UPDATED_AT};
use crate::core::store::RecordStore;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

type Collections = HashMap<String, IndexMap<Uuid, Record>>;

/// In-memory record store
///
/// Records are kept per collection in insertion order. Every mutation
/// republishes the collection to the feed while the write lock is held, so
/// snapshots are published in the same order as the mutations they reflect.
#[derive(Clone)]
pub struct InMemoryRecordStore {
    collections: Arc<RwLock<Collections>>,
    feed: FeedHub,
    events: EventBus,
    last_stamp: Arc<AtomicI64>,
}

impl InMemoryRecordStore {
    /// Create a store with its own feed and event bus
    pub fn new() -> Self {
        Self::with_channels(FeedHub::new(), EventBus::default())
    }

    /// Create a store publishing into an existing feed and event bus
    pub fn with_channels(feed: FeedHub, events: EventBus) -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            feed,
            events,
            last_stamp: Arc::new(AtomicI64::new(0)),
        }
    }

    pub fn feed(&self) -> &FeedHub {
        &self.feed
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Server timestamp, strictly increasing across calls
    fn stamp(&self) -> String {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        let millis = now.max(previous + 1);

        DateTime::from_timestamp_millis(millis)
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn publish(&self, collection: &str, records: &IndexMap<Uuid, Record>) {
        self.feed
            .publish(collection, records.values().cloned().collect());
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create(&self, collection: &str, mut fields: Fields) -> Result<Record> {
        fields.remove("id");
        fields.insert(CREATED_AT.to_string(), self.stamp().into());
        let record = Record::new(fields);

        {
            let mut collections = self
                .collections
                .write()
                .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
            let records = collections.entry(collection.to_string()).or_default();
            records.insert(record.id, record.clone());
            self.publish(collection, records);
        }

        tracing::debug!(collection = %collection, record_id = %record.id, "Record created");
        self.events.publish(RecordEvent::Created {
            collection: collection.to_string(),
            record_id: record.id,
            data: record.to_json(),
        });
        Ok(record)
    }

    async fn set(&self, collection: &str, id: Uuid, mut fields: Fields, merge: bool) -> Result<Record> {
        fields.remove("id");

        let (record, existed) = {
            let mut collections = self
                .collections
                .write()
                .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
            let records = collections.entry(collection.to_string()).or_default();

            let (record, existed) = match records.get_mut(&id) {
                Some(existing) if merge => {
                    existing.merge(fields);
                    existing.set(UPDATED_AT, self.stamp());
                    (existing.clone(), true)
                }
                Some(existing) => {
                    let created = existing.get(CREATED_AT).cloned();
                    let mut record = Record::with_id(id, fields);
                    if let Some(created) = created {
                        record.fields.entry(CREATED_AT).or_insert(created);
                    }
                    record.set(UPDATED_AT, self.stamp());
                    *existing = record.clone();
                    (record, true)
                }
                None => {
                    let mut record = Record::with_id(id, fields);
                    if !record.fields.contains_key(CREATED_AT) {
                        record.set(CREATED_AT, self.stamp());
                    }
                    records.insert(id, record.clone());
                    (record, false)
                }
            };
            self.publish(collection, records);
            (record, existed)
        };

        let event = if existed {
            RecordEvent::Updated {
                collection: collection.to_string(),
                record_id: id,
                data: record.to_json(),
            }
        } else {
            RecordEvent::Created {
                collection: collection.to_string(),
                record_id: id,
                data: record.to_json(),
            }
        };
        self.events.publish(event);
        Ok(record)
    }

    async fn get(&self, collection: &str, id: &Uuid) -> Result<Option<Record>> {
        let collections = self
            .collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(collections
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Record>> {
        let collections = self
            .collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut records: Vec<Record> = collections
            .get(collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default();
        records.sort_by_key(|record| std::cmp::Reverse(record.created_millis()));
        Ok(records)
    }

    async fn update(&self, collection: &str, id: &Uuid, mut fields: Fields) -> Result<Record> {
        fields.remove("id");

        let record = {
            let mut collections = self
                .collections
                .write()
                .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
            let records = collections
                .get_mut(collection)
                .ok_or_else(|| anyhow!("Record not found: {}/{}", collection, id))?;
            let existing = records
                .get_mut(id)
                .ok_or_else(|| anyhow!("Record not found: {}/{}", collection, id))?;

            existing.merge(fields);
            existing.set(UPDATED_AT, self.stamp());
            let record = existing.clone();
            self.publish(collection, records);
            record
        };

        tracing::debug!(collection = %collection, record_id = %id, "Record updated");
        self.events.publish(RecordEvent::Updated {
            collection: collection.to_string(),
            record_id: *id,
            data: record.to_json(),
        });
        Ok(record)
    }

    async fn delete(&self, collection: &str, id: &Uuid) -> Result<()> {
        let removed = {
            let mut collections = self
                .collections
                .write()
                .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
            match collections.get_mut(collection) {
                Some(records) => {
                    // shift_remove keeps the remaining records in insertion order
                    let removed = records.shift_remove(id).is_some();
                    if removed {
                        self.publish(collection, records);
                    }
                    removed
                }
                None => false,
            }
        };

        if removed {
            tracing::debug!(collection = %collection, record_id = %id, "Record deleted");
            self.events.publish(RecordEvent::Deleted {
                collection: collection.to_string(),
                record_id: *id,
            });
        }
        Ok(())
    }

    async fn drop_collection(&self, collection: &str) -> Result<usize> {
        let removed = {
            let mut collections = self
                .collections
                .write()
                .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
            let removed = collections.remove(collection).unwrap_or_default();
            if !removed.is_empty() {
                self.feed.publish(collection, Vec::new());
            }
            // Open subscriptions keep the channel and see the empty snapshot
            self.feed.release(collection);
            removed
        };

        for id in removed.keys() {
            self.events.publish(RecordEvent::Deleted {
                collection: collection.to_string(),
                record_id: *id,
            });
        }
        tracing::debug!(collection = %collection, records = removed.len(), "Collection dropped");
        Ok(removed.len())
    }

    fn subscribe(&self, collection: &str, order_field: &str) -> Subscription {
        self.feed.subscribe(collection, order_field)
    }
}
