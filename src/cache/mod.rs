//! Time-bounded cache for corpus results.
//!
//! [`CorpusCache`] wraps a corpus computation: entries younger than the TTL are
//! returned as-is, anything else is recomputed and written back. Storage and
//! time are injected ([`CacheStore`], [`Clock`]) so expiry and store failures
//! can be driven from tests.

pub mod clock;
pub mod disk;
pub mod memory;
pub mod store;
pub mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use store::{CacheEntry, CacheKey, CacheStore};
pub use ttl::{CacheStats, CorpusCache, DEFAULT_TTL};
