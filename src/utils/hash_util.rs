use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use siphasher::sip::SipHasher13;

/// Hash function consumed by the disk hash index.
///
/// The index routes on exactly 32 bits of output: the header page takes the
/// top `max_depth` bits and the directory takes the low `global_depth` bits,
/// so implementations should spread entropy across the whole word.
pub trait HashFunction<K>: Send + Sync {
    fn hash_key(&self, key: &K) -> u32;
}

/// SipHash-1-3 with fixed keys.
///
/// Keyed to constants rather than a per-process random seed so that the same
/// key lands in the same bucket across runs against the same database file.
pub struct SipHashFunction {
    key0: u64,
    key1: u64,
}

impl SipHashFunction {
    pub fn new() -> Self {
        Self::with_keys(0x7079_7269_7465_6462, 0x6469_736b_6861_7368)
    }

    pub fn with_keys(key0: u64, key1: u64) -> Self {
        SipHashFunction { key0, key1 }
    }
}

impl Default for SipHashFunction {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash> HashFunction<K> for SipHashFunction {
    fn hash_key(&self, key: &K) -> u32 {
        let mut hasher = SipHasher13::new_with_keys(self.key0, self.key1);
        key.hash(&mut hasher);
        hasher.finish() as u32
    }
}

/// Total order over keys, injected into the index instead of pinning it to
/// `Ord` so callers can impose their own collation.
pub trait KeyComparator<K>: Send + Sync {
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering;
}

#[derive(Clone, Copy, Default)]
pub struct OrdComparator;

impl<K: Ord> KeyComparator<K> for OrdComparator {
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering {
        lhs.cmp(rhs)
    }
}
