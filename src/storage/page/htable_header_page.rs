use std::io::{Cursor, Seek, SeekFrom};

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};

use crate::buffer::buffer_pool_manager::PageId;
use crate::storage::page::htable_page_layout::{
    HEADER_DIRECTORY_IDS_OFFSET, HEADER_MAX_DEPTH_OFFSET, HTABLE_HEADER_MAX_DEPTH,
};

/// Top level of the hash index: routes the high `max_depth` bits of a hash
/// to one of up to `2^max_depth` directory pages.
///
/// Decoded view over a page image; mutations stick once the view is encoded
/// back into the guard's buffer.
pub struct HtableHeaderPage {
    max_depth: u32,
    directory_page_ids: Vec<PageId>,
}

impl HtableHeaderPage {
    pub fn init(max_depth: u32) -> Self {
        assert!(
            max_depth <= HTABLE_HEADER_MAX_DEPTH,
            "header max depth {} exceeds the page bound",
            max_depth
        );

        HtableHeaderPage {
            max_depth,
            directory_page_ids: vec![super::page::page_constants::INVALID_PAGE_ID; 1 << max_depth],
        }
    }

    pub fn decode(data: &[u8]) -> Self {
        let mut cursor = Cursor::new(data);

        cursor
            .seek(SeekFrom::Start(HEADER_MAX_DEPTH_OFFSET as u64))
            .unwrap();
        let max_depth = cursor.read_u32::<NativeEndian>().unwrap();
        assert!(
            max_depth <= HTABLE_HEADER_MAX_DEPTH,
            "corrupt header page: max depth {}",
            max_depth
        );

        cursor
            .seek(SeekFrom::Start(HEADER_DIRECTORY_IDS_OFFSET as u64))
            .unwrap();
        let mut directory_page_ids = Vec::with_capacity(1 << max_depth);
        for _ in 0..(1usize << max_depth) {
            directory_page_ids.push(cursor.read_i32::<NativeEndian>().unwrap());
        }

        HtableHeaderPage {
            max_depth,
            directory_page_ids,
        }
    }

    pub fn encode(&self, data: &mut [u8]) {
        let mut cursor = Cursor::new(data);

        cursor
            .seek(SeekFrom::Start(HEADER_MAX_DEPTH_OFFSET as u64))
            .unwrap();
        cursor.write_u32::<NativeEndian>(self.max_depth).unwrap();

        cursor
            .seek(SeekFrom::Start(HEADER_DIRECTORY_IDS_OFFSET as u64))
            .unwrap();
        for &page_id in &self.directory_page_ids {
            cursor.write_i32::<NativeEndian>(page_id).unwrap();
        }
    }

    /// Directory slot for a hash: its top `max_depth` bits. A zero-depth
    /// header has a single slot, and shifting by the full hash width is not
    /// defined, so that case short-circuits.
    pub fn hash_to_directory_index(&self, hash: u32) -> usize {
        if self.max_depth == 0 {
            return 0;
        }
        (hash >> (32 - self.max_depth)) as usize
    }

    pub fn directory_page_id(&self, directory_idx: usize) -> PageId {
        self.directory_page_ids[directory_idx]
    }

    pub fn set_directory_page_id(&mut self, directory_idx: usize, page_id: PageId) {
        self.directory_page_ids[directory_idx] = page_id;
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn max_size(&self) -> usize {
        1 << self.max_depth
    }
}
