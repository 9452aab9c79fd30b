use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::buffer::buffer_pool_manager::{FrameId, PageId};

pub mod page_constants {
    /// A single page size.
    pub const PAGE_SIZE: usize = 4096;

    /// Marker for a frame that holds no page. Page ids are never negative,
    /// so the sentinel cannot collide with a real id.
    pub const INVALID_PAGE_ID: i32 = -1;
}

use page_constants::{INVALID_PAGE_ID, PAGE_SIZE};

/// One frame of the buffer pool: a 4 KiB buffer plus its bookkeeping.
///
/// The buffer sits behind the per-frame reader/writer latch; page guards
/// hold that latch for their lifetime. The metadata fields are atomics
/// mutated only under the buffer pool latch, so loads here use relaxed
/// ordering.
pub struct FrameHeader {
    frame_id: FrameId,
    page_id: AtomicI32,
    pin_count: AtomicU32,
    is_dirty: AtomicBool,

    data: Arc<RwLock<Box<[u8; PAGE_SIZE]>>>,
}

impl FrameHeader {
    pub fn new(frame_id: FrameId) -> Self {
        FrameHeader {
            frame_id,
            page_id: AtomicI32::new(INVALID_PAGE_ID),
            pin_count: AtomicU32::new(0),
            is_dirty: AtomicBool::new(false),
            data: Arc::new(RwLock::new(Box::new([0; PAGE_SIZE]))),
        }
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    pub fn page_id(&self) -> PageId {
        self.page_id.load(Ordering::Relaxed)
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Relaxed)
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::Relaxed)
    }

    /// The latched buffer. Callers take the latch through `read`/`write`
    /// (or the `_arc` variants the guards use).
    pub fn data(&self) -> &Arc<RwLock<Box<[u8; PAGE_SIZE]>>> {
        &self.data
    }

    pub(crate) fn set_page_id(&self, page_id: PageId) {
        self.page_id.store(page_id, Ordering::Relaxed);
    }

    pub(crate) fn set_dirty(&self, dirty: bool) {
        self.is_dirty.store(dirty, Ordering::Relaxed);
    }

    pub(crate) fn set_pin_count(&self, pin_count: u32) {
        self.pin_count.store(pin_count, Ordering::Relaxed);
    }

    pub(crate) fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn unpin(&self) -> u32 {
        self.pin_count.fetch_sub(1, Ordering::Relaxed) - 1
    }

    /// Returns the frame to its free state. The buffer keeps its stale
    /// bytes; whoever claims the frame next overwrites them in full.
    pub(crate) fn reset(&self) {
        self.set_page_id(INVALID_PAGE_ID);
        self.set_pin_count(0);
        self.set_dirty(false);
    }
}
