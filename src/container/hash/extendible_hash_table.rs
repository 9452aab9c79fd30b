use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use tracing::{debug, warn};

use crate::buffer::buffer_pool_manager::{BufferPoolManager, PageId};
use crate::storage::page::htable_bucket_page::HtableBucketPage;
use crate::storage::page::htable_directory_page::HtableDirectoryPage;
use crate::storage::page::htable_header_page::HtableHeaderPage;
use crate::storage::page::htable_page_layout::{
    HTABLE_DIRECTORY_MAX_DEPTH, HTABLE_HEADER_MAX_DEPTH,
};
use crate::storage::page::page::page_constants::INVALID_PAGE_ID;
use crate::storage::page::storable::Storable;
use crate::utils::hash_util::{HashFunction, KeyComparator};

/// On-disk extendible hash index.
///
/// Three page levels: a header routing on the top `header_max_depth` bits
/// of the 32-bit hash, directories routing on the low `global_depth` bits,
/// and buckets holding the entries. Every page access goes through buffer
/// pool guards; structural changes (bucket split + directory growth on
/// insert, bucket merge + directory shrink on remove) happen under write
/// guards held from the directory down.
///
/// Keys are unique: inserting a present key fails rather than updating.
pub struct DiskExtendibleHashTable<K, V, C> {
    bpm: Arc<BufferPoolManager>,
    cmp: C,
    hash_fn: Box<dyn HashFunction<K>>,

    // The header's own max depth lives on its page; only the bounds used
    // when creating further pages are kept here.
    directory_max_depth: u32,
    bucket_max_size: u32,

    header_page_id: PageId,

    _values: PhantomData<V>,
}

impl<K, V, C> DiskExtendibleHashTable<K, V, C>
where
    K: Storable,
    V: Storable,
    C: KeyComparator<K>,
{
    /// Allocates and initializes the header page. Fails if the pool cannot
    /// give out a frame or a depth bound does not fit its page layout.
    pub fn new(
        bpm: Arc<BufferPoolManager>,
        cmp: C,
        hash_fn: Box<dyn HashFunction<K>>,
        header_max_depth: u32,
        directory_max_depth: u32,
        bucket_max_size: u32,
    ) -> Result<Self> {
        ensure!(
            header_max_depth <= HTABLE_HEADER_MAX_DEPTH,
            "header max depth {} exceeds the page bound {}",
            header_max_depth,
            HTABLE_HEADER_MAX_DEPTH
        );
        ensure!(
            directory_max_depth <= HTABLE_DIRECTORY_MAX_DEPTH,
            "directory max depth {} exceeds the page bound {}",
            directory_max_depth,
            HTABLE_DIRECTORY_MAX_DEPTH
        );
        ensure!(bucket_max_size > 0, "bucket max size must be at least 1");
        let bucket_max_size = bucket_max_size.min(HtableBucketPage::<K, V>::capacity());

        let guard = bpm
            .new_page()
            .context("buffer pool exhausted while allocating the hash table header")?;
        let mut header_guard = guard.upgrade_write();

        let header = HtableHeaderPage::init(header_max_depth);
        header.encode(header_guard.data_mut());
        let header_page_id = header_guard.page_id();

        Ok(DiskExtendibleHashTable {
            bpm,
            cmp,
            hash_fn,
            directory_max_depth,
            bucket_max_size,
            header_page_id,
            _values: PhantomData,
        })
    }

    pub fn header_page_id(&self) -> PageId {
        self.header_page_id
    }

    fn hash_key(&self, key: &K) -> u32 {
        self.hash_fn.hash_key(key)
    }

    /// Point lookup. Guards are crabbed: each parent is released as soon as
    /// the child guard is held, since reads never restructure anything.
    pub fn get_value(&self, key: &K) -> Option<V> {
        let hash = self.hash_key(key);

        let header_guard = self.bpm.fetch_page_read(self.header_page_id)?;
        let header = HtableHeaderPage::decode(header_guard.data());

        let directory_idx = header.hash_to_directory_index(hash);
        let directory_page_id = header.directory_page_id(directory_idx);
        if directory_page_id == INVALID_PAGE_ID {
            return None;
        }

        let directory_guard = self.bpm.fetch_page_read(directory_page_id)?;
        drop(header_guard);
        let directory = HtableDirectoryPage::decode(directory_guard.data());

        let bucket_idx = directory.hash_to_bucket_index(hash);
        let bucket_page_id = directory.bucket_page_id(bucket_idx);
        if bucket_page_id == INVALID_PAGE_ID {
            return None;
        }

        let bucket_guard = self.bpm.fetch_page_read(bucket_page_id)?;
        drop(directory_guard);
        let bucket = HtableBucketPage::<K, V>::decode(bucket_guard.data());

        bucket.lookup(key, &self.cmp).cloned()
    }

    /// Inserts a unique key. Returns false on a duplicate, when the pool
    /// cannot supply a page, or when a needed split cannot grow the
    /// directory past its max depth.
    pub fn insert(&self, key: &K, value: &V) -> bool {
        let hash = self.hash_key(key);

        let Some(mut header_guard) = self.bpm.fetch_page_write(self.header_page_id) else {
            return false;
        };
        let mut header = HtableHeaderPage::decode(header_guard.data());
        let directory_idx = header.hash_to_directory_index(hash);

        // Resolve the directory, creating it on first touch.
        let mut directory_guard;
        if header.directory_page_id(directory_idx) == INVALID_PAGE_ID {
            let Some(guard) = self.bpm.new_page() else {
                return false;
            };
            directory_guard = guard.upgrade_write();

            let directory = HtableDirectoryPage::init(self.directory_max_depth);
            directory.encode(directory_guard.data_mut());

            header.set_directory_page_id(directory_idx, directory_guard.page_id());
            header.encode(header_guard.data_mut());
        } else {
            let directory_page_id = header.directory_page_id(directory_idx);
            let Some(guard) = self.bpm.fetch_page_write(directory_page_id) else {
                return false;
            };
            directory_guard = guard;
        }
        // The header cannot change below this point.
        drop(header_guard);

        let mut directory = HtableDirectoryPage::decode(directory_guard.data());
        let mut bucket_idx = directory.hash_to_bucket_index(hash);

        // Resolve the bucket, creating it on first touch.
        let mut bucket_guard;
        if directory.bucket_page_id(bucket_idx) == INVALID_PAGE_ID {
            let Some(guard) = self.bpm.new_page() else {
                return false;
            };
            bucket_guard = guard.upgrade_write();

            let bucket = HtableBucketPage::<K, V>::init(self.bucket_max_size);
            bucket.encode(bucket_guard.data_mut());

            directory.set_bucket_page_id(bucket_idx, bucket_guard.page_id());
            directory.set_local_depth(bucket_idx, 0);
            directory.encode(directory_guard.data_mut());
        } else {
            let bucket_page_id = directory.bucket_page_id(bucket_idx);
            let Some(guard) = self.bpm.fetch_page_write(bucket_page_id) else {
                return false;
            };
            bucket_guard = guard;
        }
        let mut bucket = HtableBucketPage::<K, V>::decode(bucket_guard.data());

        if bucket.lookup(key, &self.cmp).is_some() {
            return false;
        }

        // Split until the target bucket has room. Each iteration raises the
        // bucket's local depth by one, growing the directory first when the
        // bucket already uses every global bit.
        while bucket.is_full() {
            if directory.local_depth(bucket_idx) == directory.global_depth() {
                if directory.global_depth() >= directory.max_depth() {
                    debug!(
                        global_depth = directory.global_depth(),
                        "directory is saturated, rejecting insert"
                    );
                    return false;
                }
                directory.incr_global_depth();
                bucket_idx = directory.hash_to_bucket_index(hash);
            }

            let Some(guard) = self.bpm.new_page() else {
                return false;
            };
            let mut new_bucket_guard = guard.upgrade_write();
            let new_bucket_page_id = new_bucket_guard.page_id();
            let mut new_bucket = HtableBucketPage::<K, V>::init(self.bucket_max_size);

            let old_local_depth = directory.local_depth(bucket_idx) as usize;
            let new_local_depth = (old_local_depth + 1) as u8;
            let old_page_id = directory.bucket_page_id(bucket_idx);
            let split_idx = bucket_idx ^ (1usize << old_local_depth);

            debug!(
                bucket_idx,
                split_idx,
                new_local_depth,
                global_depth = directory.global_depth(),
                "splitting bucket"
            );

            // Retag every slot that aliased the old bucket. The half whose
            // distinguishing bit matches the split image moves to the new
            // page; the other half keeps the old page at the deeper depth.
            for slot in 0..directory.size() {
                if directory.bucket_page_id(slot) != old_page_id {
                    continue;
                }
                if (slot >> old_local_depth) & 1 == (split_idx >> old_local_depth) & 1 {
                    directory.set_bucket_page_id(slot, new_bucket_page_id);
                }
                directory.set_local_depth(slot, new_local_depth);
            }

            // Redistribute: entries whose hash no longer matches the old
            // bucket's deeper prefix move over.
            let local_mask = directory.local_depth_mask(bucket_idx);
            let target = bucket_idx as u32 & local_mask;
            let mut idx = 0;
            while idx < bucket.size() {
                let entry_hash = self.hash_key(bucket.key_at(idx));
                if entry_hash & local_mask == target {
                    idx += 1;
                    continue;
                }
                let entry_key = bucket.key_at(idx).clone();
                let entry_value = bucket.value_at(idx).clone();
                new_bucket.insert(&entry_key, &entry_value, &self.cmp);
                bucket.remove_at(idx);
            }

            bucket.encode(bucket_guard.data_mut());
            new_bucket.encode(new_bucket_guard.data_mut());
            directory.encode(directory_guard.data_mut());

            // The incoming key now maps to one of the two halves.
            bucket_idx = directory.hash_to_bucket_index(hash);
            if directory.bucket_page_id(bucket_idx) == new_bucket_page_id {
                bucket_guard = new_bucket_guard;
                bucket = new_bucket;
            }
        }

        let inserted = bucket.insert(key, value, &self.cmp);
        bucket.encode(bucket_guard.data_mut());
        inserted
    }

    /// Removes the key if present. Emptied buckets merge with their split
    /// image while possible, and the directory shrinks whenever no live
    /// bucket uses its full depth.
    pub fn remove(&self, key: &K) -> bool {
        let hash = self.hash_key(key);

        let Some(header_guard) = self.bpm.fetch_page_write(self.header_page_id) else {
            return false;
        };
        let header = HtableHeaderPage::decode(header_guard.data());

        let directory_idx = header.hash_to_directory_index(hash);
        let directory_page_id = header.directory_page_id(directory_idx);
        if directory_page_id == INVALID_PAGE_ID {
            return false;
        }

        let Some(mut directory_guard) = self.bpm.fetch_page_write(directory_page_id) else {
            return false;
        };
        drop(header_guard);
        let mut directory = HtableDirectoryPage::decode(directory_guard.data());

        let mut bucket_idx = directory.hash_to_bucket_index(hash);
        let bucket_page_id = directory.bucket_page_id(bucket_idx);
        if bucket_page_id == INVALID_PAGE_ID {
            return false;
        }

        let Some(mut bucket_guard) = self.bpm.fetch_page_write(bucket_page_id) else {
            return false;
        };
        let mut bucket = HtableBucketPage::<K, V>::decode(bucket_guard.data());

        if !bucket.remove(key, &self.cmp) {
            return false;
        }
        bucket.encode(bucket_guard.data_mut());

        // Merge cascade: while the bucket is empty, fold it together with
        // its split image, then re-evaluate one level shallower.
        while bucket.is_empty() && directory.global_depth() > 0 {
            let local_depth = directory.local_depth(bucket_idx);
            if local_depth == 0 {
                break;
            }

            let split_idx = bucket_idx ^ (1usize << (local_depth - 1));
            if directory.local_depth(split_idx) != local_depth {
                break;
            }
            let split_page_id = directory.bucket_page_id(split_idx);
            let keep_page_id = directory.bucket_page_id(bucket_idx);
            if split_page_id == INVALID_PAGE_ID || split_page_id == keep_page_id {
                break;
            }

            {
                let Some(split_guard) = self.bpm.fetch_page_write(split_page_id) else {
                    break;
                };
                let split_bucket = HtableBucketPage::<K, V>::decode(split_guard.data());
                if !split_bucket.is_empty() {
                    break;
                }
            }

            debug!(
                bucket_idx,
                split_idx,
                merged_depth = local_depth - 1,
                "merging empty buckets"
            );

            // Local depth may sit below the global depth, so repoint every
            // slot aliasing either page, not just the two indices at hand.
            let merged_depth = (local_depth - 1) as u8;
            for slot in 0..directory.size() {
                let slot_page_id = directory.bucket_page_id(slot);
                if slot_page_id == split_page_id || slot_page_id == keep_page_id {
                    directory.set_bucket_page_id(slot, keep_page_id);
                    directory.set_local_depth(slot, merged_depth);
                }
            }

            while directory.can_shrink() {
                directory.decr_global_depth();
            }
            directory.encode(directory_guard.data_mut());

            // Nothing points at the split image's page anymore.
            if !self.bpm.delete_page(split_page_id) {
                warn!(page_id = split_page_id, "merged bucket page could not be reclaimed");
            }

            bucket_idx = directory.hash_to_bucket_index(hash);
            let current_page_id = directory.bucket_page_id(bucket_idx);
            if current_page_id != keep_page_id {
                drop(bucket_guard);
                let Some(guard) = self.bpm.fetch_page_write(current_page_id) else {
                    break;
                };
                bucket_guard = guard;
                bucket = HtableBucketPage::<K, V>::decode(bucket_guard.data());
            }
        }

        true
    }

    /// Global depth of the directory at the given header slot, if one has
    /// been created there.
    pub fn global_depth(&self, directory_idx: usize) -> Option<u32> {
        let header_guard = self.bpm.fetch_page_read(self.header_page_id)?;
        let header = HtableHeaderPage::decode(header_guard.data());

        let directory_page_id = header.directory_page_id(directory_idx);
        if directory_page_id == INVALID_PAGE_ID {
            return None;
        }

        let directory_guard = self.bpm.fetch_page_read(directory_page_id)?;
        drop(header_guard);
        Some(HtableDirectoryPage::decode(directory_guard.data()).global_depth())
    }

    /// Walks every directory and asserts the aliasing invariants.
    pub fn verify_integrity(&self) {
        let header_guard = self
            .bpm
            .fetch_page_read(self.header_page_id)
            .expect("header page must be fetchable");
        let header = HtableHeaderPage::decode(header_guard.data());

        for directory_idx in 0..header.max_size() {
            let directory_page_id = header.directory_page_id(directory_idx);
            if directory_page_id == INVALID_PAGE_ID {
                continue;
            }
            let directory_guard = self
                .bpm
                .fetch_page_read(directory_page_id)
                .expect("directory page must be fetchable");
            HtableDirectoryPage::decode(directory_guard.data()).verify_integrity();
        }
    }
}
