//! Key hashing used for initial shard assignment.

use xxhash_rust::xxh3::xxh3_64;

/// Stable hash over keys.
///
/// Implementations must return the same value for the same key across the
/// lifetime of a store; shard assignment of untracked keys depends on it.
pub trait KeyHasher: Send + Sync {
    fn hash(&self, key: &str) -> u64;
}

/// Default hasher built on xxh3 (fast, not cryptographically secure).
#[derive(Debug, Default, Clone, Copy)]
pub struct Xxh3KeyHasher;

impl KeyHasher for Xxh3KeyHasher {
    fn hash(&self, key: &str) -> u64 {
        xxh3_64(key.as_bytes())
    }
}
