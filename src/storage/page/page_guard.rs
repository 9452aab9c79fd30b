use std::sync::Arc;

use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

use crate::buffer::buffer_pool_manager::{BufferPoolManager, PageId};
use crate::storage::page::page::page_constants::PAGE_SIZE;
use crate::storage::page::page::FrameHeader;

type FrameReadLatch = ArcRwLockReadGuard<RawRwLock, Box<[u8; PAGE_SIZE]>>;
type FrameWriteLatch = ArcRwLockWriteGuard<RawRwLock, Box<[u8; PAGE_SIZE]>>;

/// A pinned page without a latch.
///
/// The guard owns one unit of the frame's pin count and carries the dirty
/// bit it accumulated; dropping it hands both back to the buffer pool.
/// Dirty is monotone: once `write` has been taken, the bit reaches
/// `unpin_page` no matter how the guard is moved around before the drop.
pub struct BasicPageGuard {
    bpm: Arc<BufferPoolManager>,
    frame: Arc<FrameHeader>,
    page_id: PageId,
    is_dirty: bool,
}

impl BasicPageGuard {
    /// The frame must already be pinned on the caller's behalf; the guard
    /// takes over that pin.
    pub(crate) fn new(bpm: Arc<BufferPoolManager>, frame: Arc<FrameHeader>) -> Self {
        let page_id = frame.page_id();
        BasicPageGuard {
            bpm,
            frame,
            page_id,
            is_dirty: false,
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Transient read access; the latch is held only while the returned
    /// lock guard lives.
    pub fn read(&self) -> RwLockReadGuard<'_, Box<[u8; PAGE_SIZE]>> {
        self.frame.data().read()
    }

    /// Transient write access; marks the page dirty.
    pub fn write(&mut self) -> RwLockWriteGuard<'_, Box<[u8; PAGE_SIZE]>> {
        self.is_dirty = true;
        self.frame.data().write()
    }

    /// Trades the bare pin for a pin plus a held reader latch.
    pub fn upgrade_read(self) -> ReadPageGuard {
        let latch = self.frame.data().read_arc();
        ReadPageGuard { latch, guard: self }
    }

    /// Trades the bare pin for a pin plus a held writer latch.
    pub fn upgrade_write(self) -> WritePageGuard {
        let latch = self.frame.data().write_arc();
        WritePageGuard { latch, guard: self }
    }
}

impl Drop for BasicPageGuard {
    fn drop(&mut self) {
        if !self.bpm.unpin_page(self.page_id, self.is_dirty) {
            // The page was deleted or force-reset out from under a live
            // guard; that is a caller bug worth hearing about.
            warn!(page_id = self.page_id, "dropping a guard failed to unpin its page");
        }
    }
}

/// A pinned page with the reader latch held for the guard's lifetime.
///
/// Field order matters: the latch is released before the pin, so the frame
/// is never observable unpinned-but-latched.
pub struct ReadPageGuard {
    latch: FrameReadLatch,
    guard: BasicPageGuard,
}

impl ReadPageGuard {
    pub fn page_id(&self) -> PageId {
        self.guard.page_id()
    }

    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        &self.latch
    }
}

/// A pinned page with the writer latch held for the guard's lifetime.
pub struct WritePageGuard {
    latch: FrameWriteLatch,
    guard: BasicPageGuard,
}

impl WritePageGuard {
    pub fn page_id(&self) -> PageId {
        self.guard.page_id()
    }

    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        &self.latch
    }

    pub fn data_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        self.guard.is_dirty = true;
        &mut self.latch
    }
}
