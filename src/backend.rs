/// Ordered key-value backend behind the snapshot store
///
/// The store only needs three operations: an atomic push+trim+expire on a
/// per-key list, a bounded newest-first range read, and a cursor-based glob
/// key scan. `RedisBackend` maps these onto a Redis MULTI/EXEC pipeline,
/// LRANGE and SCAN; `MemoryBackend` is an in-process stand-in for tests and
/// local runs.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::AsyncCommands;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Redis(#[from] redis::RedisError),
}

pub type BackendResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// Prepend `value` to the list at `key` (newest element first), trim the
    /// list to its `max_len` newest elements and reset the key's TTL.
    /// The three steps commit as one unit: a concurrent reader never sees
    /// the trim or the expiry without the push.
    async fn push_capped(
        &self,
        key: &str,
        value: &str,
        max_len: usize,
        ttl: Duration,
    ) -> BackendResult<()>;

    /// Read list elements in the inclusive range `[start, stop]`,
    /// newest first.
    async fn range(&self, key: &str, start: isize, stop: isize) -> BackendResult<Vec<String>>;

    /// One step of a cursor-based key scan for `pattern`, with a `count`
    /// batch-size hint. A `cursor` of zero starts the scan; a returned
    /// cursor of zero terminates it.
    async fn scan_keys(
        &self,
        pattern: &str,
        cursor: u64,
        count: usize,
    ) -> BackendResult<(u64, Vec<String>)>;
}

/// Redis-backed implementation. The connection manager handle is cheap to
/// clone and reconnects on its own; ownership belongs to whoever builds the
/// store, not to a process-wide singleton.
#[derive(Clone)]
pub struct RedisBackend {
    connection: redis::aio::ConnectionManager,
}

impl RedisBackend {
    pub async fn connect(uri: &str) -> BackendResult<Self> {
        let client = redis::Client::open(uri)
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        let connection = client
            .get_connection_manager()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Ok(RedisBackend { connection })
    }

    pub fn with_connection(connection: redis::aio::ConnectionManager) -> Self {
        RedisBackend { connection }
    }
}

#[async_trait]
impl SnapshotBackend for RedisBackend {
    async fn push_capped(
        &self,
        key: &str,
        value: &str,
        max_len: usize,
        ttl: Duration,
    ) -> BackendResult<()> {
        let mut connection = self.connection.clone();
        let _: () = redis::pipe()
            .atomic()
            .lpush(key, value)
            .ltrim(key, 0, max_len as isize - 1)
            .expire(key, ttl.as_secs() as i64)
            .query_async(&mut connection)
            .await?;
        Ok(())
    }

    async fn range(&self, key: &str, start: isize, stop: isize) -> BackendResult<Vec<String>> {
        let mut connection = self.connection.clone();
        let values: Vec<String> = connection.lrange(key, start, stop).await?;
        Ok(values)
    }

    async fn scan_keys(
        &self,
        pattern: &str,
        cursor: u64,
        count: usize,
    ) -> BackendResult<(u64, Vec<String>)> {
        let mut connection = self.connection.clone();
        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut connection)
            .await?;
        Ok((next, keys))
    }
}

/// In-process backend with the same list/TTL/scan semantics, used by the
/// test suite and the replay demo. Expired keys are dropped lazily on
/// access; `ttl` and `remaining_ttl` expose expiry state to tests.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

struct MemoryEntry {
    values: Vec<String>, // newest first
    ttl: Duration,
    expires_at: Instant,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// TTL last applied to `key`, if the key is live.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let mut entries = self.entries.lock();
        prune_expired(&mut entries);
        entries.get(key).map(|e| e.ttl)
    }

    /// Time left until `key` expires.
    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let mut entries = self.entries.lock();
        prune_expired(&mut entries);
        entries
            .get(key)
            .map(|e| e.expires_at.saturating_duration_since(Instant::now()))
    }

    /// Force a key's TTL to elapse, for expiry tests.
    pub fn expire_now(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    pub fn key_count(&self) -> usize {
        let mut entries = self.entries.lock();
        prune_expired(&mut entries);
        entries.len()
    }
}

fn prune_expired(entries: &mut HashMap<String, MemoryEntry>) {
    let now = Instant::now();
    entries.retain(|_, entry| entry.expires_at > now);
}

#[async_trait]
impl SnapshotBackend for MemoryBackend {
    async fn push_capped(
        &self,
        key: &str,
        value: &str,
        max_len: usize,
        ttl: Duration,
    ) -> BackendResult<()> {
        let mut entries = self.entries.lock();
        prune_expired(&mut entries);
        let entry = entries.entry(key.to_string()).or_insert_with(|| MemoryEntry {
            values: Vec::new(),
            ttl,
            expires_at: Instant::now() + ttl,
        });
        entry.values.insert(0, value.to_string());
        entry.values.truncate(max_len);
        entry.ttl = ttl;
        entry.expires_at = Instant::now() + ttl;
        Ok(())
    }

    async fn range(&self, key: &str, start: isize, stop: isize) -> BackendResult<Vec<String>> {
        let mut entries = self.entries.lock();
        prune_expired(&mut entries);
        let Some(entry) = entries.get(key) else {
            return Ok(Vec::new());
        };
        let len = entry.values.len() as isize;
        let clamp = |i: isize| -> usize {
            let i = if i < 0 { len + i } else { i };
            i.clamp(0, len) as usize
        };
        let (start, stop) = (clamp(start), clamp(stop));
        if start >= entry.values.len() || stop < start {
            return Ok(Vec::new());
        }
        let stop = (stop + 1).min(entry.values.len());
        Ok(entry.values[start..stop].to_vec())
    }

    async fn scan_keys(
        &self,
        pattern: &str,
        cursor: u64,
        count: usize,
    ) -> BackendResult<(u64, Vec<String>)> {
        let mut entries = self.entries.lock();
        prune_expired(&mut entries);

        // Cursor is an index into the sorted key list. Keys appearing or
        // vanishing between steps shift the window, matching the weak
        // guarantees of a real SCAN.
        let mut matched: Vec<String> = entries
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();
        matched.sort();

        let start = cursor as usize;
        if start >= matched.len() {
            return Ok((0, Vec::new()));
        }
        let end = (start + count.max(1)).min(matched.len());
        let next = if end == matched.len() { 0 } else { end as u64 };
        Ok((next, matched[start..end].to_vec()))
    }
}

/// Glob matching over `*` and `?`, the subset Redis key patterns use here.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut mark = 0usize;

    while ti < text.len() {
        if pi < pattern.len() && (pattern[pi] == '?' || pattern[pi] == text[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < pattern.len() && pattern[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if let Some(star_at) = star {
            pi = star_at + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }
    pattern[pi..].iter().all(|&c| c == '*')
}
