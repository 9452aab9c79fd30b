use bytes::{Buf, BufMut};

use crate::storage::page::htable_page_layout::BUCKET_ARRAY_OFFSET;
use crate::storage::page::page::page_constants::PAGE_SIZE;
use crate::storage::page::storable::Storable;
use crate::utils::hash_util::KeyComparator;

/// Leaf level of the hash index: an unordered set of unique keys with their
/// values, packed as fixed-width pairs after the two length fields.
pub struct HtableBucketPage<K, V> {
    max_size: u32,
    entries: Vec<(K, V)>,
}

impl<K: Storable, V: Storable> HtableBucketPage<K, V> {
    /// How many entries one page can hold for this key/value instantiation.
    pub fn capacity() -> u32 {
        ((PAGE_SIZE - BUCKET_ARRAY_OFFSET) / (K::SIZE + V::SIZE)) as u32
    }

    /// A configured max size larger than the page can carry is clamped.
    pub fn init(max_size: u32) -> Self {
        HtableBucketPage {
            max_size: max_size.min(Self::capacity()),
            entries: Vec::new(),
        }
    }

    pub fn decode(data: &[u8]) -> Self {
        let mut buf = &data[..];
        let size = buf.get_u32_ne();
        let max_size = buf.get_u32_ne();
        assert!(
            max_size <= Self::capacity() && size <= max_size,
            "corrupt bucket page: size {} / max size {}",
            size,
            max_size
        );

        let mut entries = Vec::with_capacity(size as usize);
        for _ in 0..size {
            let key = K::decode(&mut buf);
            let value = V::decode(&mut buf);
            entries.push((key, value));
        }

        HtableBucketPage { max_size, entries }
    }

    pub fn encode(&self, data: &mut [u8]) {
        let mut buf = &mut data[..];
        buf.put_u32_ne(self.entries.len() as u32);
        buf.put_u32_ne(self.max_size);
        for (key, value) in &self.entries {
            key.encode(&mut buf);
            value.encode(&mut buf);
        }
    }

    pub fn lookup(&self, key: &K, cmp: &impl KeyComparator<K>) -> Option<&V> {
        self.entries
            .iter()
            .find(|(entry_key, _)| cmp.compare(key, entry_key).is_eq())
            .map(|(_, value)| value)
    }

    /// Inserts the pair. Fails on a full bucket or a duplicate key; the
    /// bucket is a set of unique keys.
    pub fn insert(&mut self, key: &K, value: &V, cmp: &impl KeyComparator<K>) -> bool {
        if self.is_full() {
            return false;
        }
        if self.lookup(key, cmp).is_some() {
            return false;
        }
        self.entries.push((key.clone(), value.clone()));
        true
    }

    /// Removes the key by swapping the last entry into its slot.
    pub fn remove(&mut self, key: &K, cmp: &impl KeyComparator<K>) -> bool {
        let position = self
            .entries
            .iter()
            .position(|(entry_key, _)| cmp.compare(key, entry_key).is_eq());

        match position {
            Some(idx) => {
                self.entries.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn remove_at(&mut self, bucket_idx: usize) {
        self.entries.swap_remove(bucket_idx);
    }

    pub fn key_at(&self, bucket_idx: usize) -> &K {
        &self.entries[bucket_idx].0
    }

    pub fn value_at(&self, bucket_idx: usize) -> &V {
        &self.entries[bucket_idx].1
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() as u32 >= self.max_size
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
