/// Feed Cache - Market Data Decoder and Snapshot Store
///
/// Decodes length-implicit binary market-data frames into typed quote/index
/// records and keeps a bounded, TTL-limited per-instrument history of them
/// in an ordered key-value backend. Features include:
/// - Offset-exact binary packet decoding (six record variants, little-endian)
/// - Atomic bounded-list snapshot persistence with per-key expiry
/// - Glob-pattern fan-in retrieval with stable freshness ordering
/// - Pluggable backend (Redis or in-process) injected at construction

pub mod protocol;
pub mod decoder;
pub mod backend;
pub mod store;
pub mod config;

pub use protocol::{
    Full, IndexFull, IndexLtp, IndexQuote, Ltp, MarketData, MarketDepth, PacketType, Quote,
};
pub use decoder::Decoder;
pub use backend::{BackendError, MemoryBackend, RedisBackend, SnapshotBackend};
pub use store::{SnapshotStore, StoreError, StoreMetrics};
pub use config::{CacheSettings, ConfigError};
