/// Bounded, TTL-limited snapshot store over a key-value backend
///
/// Each record lands under `{prefix}:{security_id}:{packet_type}` as a
/// newest-first list capped at `max_snapshots`, with the key TTL refreshed
/// on every save. Fetch fans in across all keys matching a glob pattern and
/// returns a stable, freshness-ordered merge.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::backend::{BackendError, SnapshotBackend};
use crate::config::CacheSettings;
use crate::protocol::MarketData;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Operation counters. Corrupt-entry skips are deliberate best-effort
/// behavior; counting them lets operators notice format drift.
#[derive(Debug, Default)]
pub struct StoreMetrics {
    snapshots_saved: AtomicU64,
    snapshots_fetched: AtomicU64,
    corrupt_entries_skipped: AtomicU64,
}

impl StoreMetrics {
    pub fn snapshots_saved(&self) -> u64 {
        self.snapshots_saved.load(Ordering::Relaxed)
    }

    pub fn snapshots_fetched(&self) -> u64 {
        self.snapshots_fetched.load(Ordering::Relaxed)
    }

    pub fn corrupt_entries_skipped(&self) -> u64 {
        self.corrupt_entries_skipped.load(Ordering::Relaxed)
    }
}

pub struct SnapshotStore {
    backend: Arc<dyn SnapshotBackend>,
    settings: CacheSettings,
    metrics: StoreMetrics,
}

impl SnapshotStore {
    /// The backend handle is injected here; its lifecycle belongs to the
    /// enclosing service, not to first-call timing.
    pub fn new(backend: Arc<dyn SnapshotBackend>, settings: CacheSettings) -> Self {
        SnapshotStore {
            backend,
            settings,
            metrics: StoreMetrics::default(),
        }
    }

    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    fn key_for(&self, record: &MarketData) -> String {
        format!(
            "{}:{}:{}",
            self.settings.key_prefix,
            record.security_id(),
            record.packet_type() as u8
        )
    }

    /// Persist one record as the newest snapshot for its key.
    ///
    /// Push, trim and TTL refresh commit as a single backend transaction.
    /// Under concurrent saves to one key, history order is backend
    /// transaction order, not call order.
    pub async fn save(&self, record: &MarketData) -> Result<(), StoreError> {
        let key = self.key_for(record);
        let payload = serde_json::to_string(record)?;

        self.backend
            .push_capped(
                &key,
                &payload,
                self.settings.max_snapshots,
                Duration::from_secs(self.settings.ttl_seconds),
            )
            .await?;

        self.metrics.snapshots_saved.fetch_add(1, Ordering::Relaxed);
        debug!(
            key = %key,
            security_id = record.security_id(),
            packet_type = record.packet_type() as u8,
            "stored market data snapshot"
        );
        Ok(())
    }

    /// Fetch the freshest snapshots across every key matching `pattern`.
    ///
    /// Keys are enumerated with a bounded cursor scan, each key contributes
    /// its `max_snapshots` newest entries, unparseable entries are skipped,
    /// and the merge is stably sorted newest-first by freshness timestamp
    /// then truncated to `max_snapshots`. The scan and the per-key reads are
    /// not one transaction; read skew is acceptable for this cache.
    pub async fn fetch(&self, pattern: &str) -> Result<Vec<MarketData>, StoreError> {
        let mut records = Vec::new();
        let newest_range_end = self.settings.max_snapshots as isize - 1;

        let mut cursor = 0u64;
        loop {
            let (next, keys) = self
                .backend
                .scan_keys(pattern, cursor, self.settings.scan_batch_size)
                .await?;

            for key in keys {
                let entries = self.backend.range(&key, 0, newest_range_end).await?;
                for entry in entries {
                    match serde_json::from_str::<MarketData>(&entry) {
                        Ok(record) => records.push(record),
                        Err(error) => {
                            self.metrics
                                .corrupt_entries_skipped
                                .fetch_add(1, Ordering::Relaxed);
                            warn!(key = %key, %error, "skipping unparseable snapshot entry");
                        }
                    }
                }
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        // Stable sort: equal timestamps, including the zero fallback for
        // timestamp-less variants, keep their scan/read order.
        records.sort_by(|a, b| b.freshness_timestamp().cmp(&a.freshness_timestamp()));
        records.truncate(self.settings.max_snapshots);

        self.metrics
            .snapshots_fetched
            .fetch_add(records.len() as u64, Ordering::Relaxed);
        debug!(pattern, count = records.len(), "retrieved market data snapshots");
        Ok(records)
    }
}
