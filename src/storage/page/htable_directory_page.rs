use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};

use crate::buffer::buffer_pool_manager::PageId;
use crate::storage::page::htable_page_layout::{
    DIRECTORY_BUCKET_IDS_OFFSET, DIRECTORY_GLOBAL_DEPTH_OFFSET, DIRECTORY_LOCAL_DEPTHS_OFFSET,
    DIRECTORY_MAX_DEPTH_OFFSET, HTABLE_DIRECTORY_MAX_DEPTH,
};
use crate::storage::page::page::page_constants::INVALID_PAGE_ID;

/// Middle level of the hash index: maps the low `global_depth` bits of a
/// hash to a bucket page. Only the first `2^global_depth` slots are live;
/// a bucket whose local depth is below the global depth is aliased by
/// every slot sharing its low `local_depth` bits.
pub struct HtableDirectoryPage {
    max_depth: u32,
    global_depth: u32,
    local_depths: Vec<u8>,
    bucket_page_ids: Vec<PageId>,
}

impl HtableDirectoryPage {
    pub fn init(max_depth: u32) -> Self {
        assert!(
            max_depth <= HTABLE_DIRECTORY_MAX_DEPTH,
            "directory max depth {} exceeds the page bound",
            max_depth
        );

        HtableDirectoryPage {
            max_depth,
            global_depth: 0,
            local_depths: vec![0; 1 << max_depth],
            bucket_page_ids: vec![INVALID_PAGE_ID; 1 << max_depth],
        }
    }

    pub fn decode(data: &[u8]) -> Self {
        let mut cursor = Cursor::new(data);

        cursor
            .seek(SeekFrom::Start(DIRECTORY_MAX_DEPTH_OFFSET as u64))
            .unwrap();
        let max_depth = cursor.read_u32::<NativeEndian>().unwrap();
        assert!(
            max_depth <= HTABLE_DIRECTORY_MAX_DEPTH,
            "corrupt directory page: max depth {}",
            max_depth
        );

        cursor
            .seek(SeekFrom::Start(DIRECTORY_GLOBAL_DEPTH_OFFSET as u64))
            .unwrap();
        let global_depth = cursor.read_u32::<NativeEndian>().unwrap();
        assert!(
            global_depth <= max_depth,
            "corrupt directory page: global depth {} over max {}",
            global_depth,
            max_depth
        );

        let array_size = 1usize << max_depth;

        cursor
            .seek(SeekFrom::Start(DIRECTORY_LOCAL_DEPTHS_OFFSET as u64))
            .unwrap();
        let mut local_depths = vec![0u8; array_size];
        cursor.read_exact(&mut local_depths).unwrap();

        cursor
            .seek(SeekFrom::Start(DIRECTORY_BUCKET_IDS_OFFSET as u64))
            .unwrap();
        let mut bucket_page_ids = Vec::with_capacity(array_size);
        for _ in 0..array_size {
            bucket_page_ids.push(cursor.read_i32::<NativeEndian>().unwrap());
        }

        HtableDirectoryPage {
            max_depth,
            global_depth,
            local_depths,
            bucket_page_ids,
        }
    }

    pub fn encode(&self, data: &mut [u8]) {
        let mut cursor = Cursor::new(data);

        cursor
            .seek(SeekFrom::Start(DIRECTORY_MAX_DEPTH_OFFSET as u64))
            .unwrap();
        cursor.write_u32::<NativeEndian>(self.max_depth).unwrap();

        cursor
            .seek(SeekFrom::Start(DIRECTORY_GLOBAL_DEPTH_OFFSET as u64))
            .unwrap();
        cursor.write_u32::<NativeEndian>(self.global_depth).unwrap();

        cursor
            .seek(SeekFrom::Start(DIRECTORY_LOCAL_DEPTHS_OFFSET as u64))
            .unwrap();
        cursor.write_all(&self.local_depths).unwrap();

        cursor
            .seek(SeekFrom::Start(DIRECTORY_BUCKET_IDS_OFFSET as u64))
            .unwrap();
        for &page_id in &self.bucket_page_ids {
            cursor.write_i32::<NativeEndian>(page_id).unwrap();
        }
    }

    pub fn hash_to_bucket_index(&self, hash: u32) -> usize {
        (hash & self.global_depth_mask()) as usize
    }

    pub fn global_depth_mask(&self) -> u32 {
        (1u32 << self.global_depth) - 1
    }

    pub fn local_depth_mask(&self, bucket_idx: usize) -> u32 {
        (1u32 << self.local_depths[bucket_idx]) - 1
    }

    pub fn bucket_page_id(&self, bucket_idx: usize) -> PageId {
        self.bucket_page_ids[bucket_idx]
    }

    pub fn set_bucket_page_id(&mut self, bucket_idx: usize, page_id: PageId) {
        self.bucket_page_ids[bucket_idx] = page_id;
    }

    pub fn local_depth(&self, bucket_idx: usize) -> u32 {
        self.local_depths[bucket_idx] as u32
    }

    pub fn set_local_depth(&mut self, bucket_idx: usize, local_depth: u8) {
        self.local_depths[bucket_idx] = local_depth;
    }

    pub fn global_depth(&self) -> u32 {
        self.global_depth
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Number of live slots.
    pub fn size(&self) -> usize {
        1 << self.global_depth
    }

    pub fn max_size(&self) -> usize {
        1 << self.max_depth
    }

    /// Doubles the live directory. Every new slot starts out aliasing the
    /// bucket of its split image, with the same local depth.
    pub fn incr_global_depth(&mut self) {
        assert!(
            self.global_depth < self.max_depth,
            "directory cannot grow past max depth {}",
            self.max_depth
        );

        let old_size = self.size();
        self.global_depth += 1;

        for idx in 0..old_size {
            self.bucket_page_ids[old_size + idx] = self.bucket_page_ids[idx];
            self.local_depths[old_size + idx] = self.local_depths[idx];
        }
    }

    /// Halves the live directory and scrubs the dead half.
    pub fn decr_global_depth(&mut self) {
        assert!(self.global_depth > 0, "directory cannot shrink below depth 0");

        let old_size = self.size();
        self.global_depth -= 1;

        for idx in self.size()..old_size {
            self.bucket_page_ids[idx] = INVALID_PAGE_ID;
            self.local_depths[idx] = 0;
        }
    }

    /// The directory may halve only while no live bucket uses its full
    /// global-depth prefix.
    pub fn can_shrink(&self) -> bool {
        if self.global_depth == 0 {
            return false;
        }
        (0..self.size()).all(|idx| self.local_depth(idx) < self.global_depth)
    }

    /// Asserts the aliasing invariant: every slot's local depth is bounded
    /// by the global depth, and all slots that share a bucket's low
    /// `local_depth` bits point at the same page with the same depth.
    pub fn verify_integrity(&self) {
        for idx in 0..self.size() {
            let local_depth = self.local_depth(idx);
            assert!(
                local_depth <= self.global_depth,
                "slot {} has local depth {} over global depth {}",
                idx,
                local_depth,
                self.global_depth
            );

            if self.bucket_page_ids[idx] == INVALID_PAGE_ID {
                continue;
            }

            // Aliases differ only in bits at or above the local depth.
            for bit in local_depth..self.global_depth {
                let alias = idx ^ (1usize << bit);
                assert_eq!(
                    self.bucket_page_ids[alias], self.bucket_page_ids[idx],
                    "slots {} and {} should alias the same bucket",
                    alias, idx
                );
                assert_eq!(
                    self.local_depths[alias], self.local_depths[idx],
                    "aliased slots {} and {} disagree on local depth",
                    alias, idx
                );
            }
        }
    }
}
