use std::collections::VecDeque;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use hashlink::LinkedHashMap;
use tracing::debug;

use crate::storage::disk::manager::DiskManager;
use crate::storage::disk::scheduler::{DiskData, DiskRequest, DiskScheduler};
use crate::storage::page::page::FrameHeader;
use crate::storage::page::page_guard::{BasicPageGuard, ReadPageGuard, WritePageGuard};
use crate::utils::replacer::{LRUKReplacer, Replacer};

pub type FrameId = u32;
pub type PageId = i32;

// Everything the BPM latch protects. Keeping the page table, free list and
// replacer behind one mutex is what makes their mutual invariants easy:
// at all times |free_frames| + |page_table| == pool size, and no pinned
// frame is evictable.
struct PoolState {
    // page_id -> frame_id for the resident set
    page_table: LinkedHashMap<PageId, FrameId>,
    free_frames: VecDeque<FrameId>,
    replacer: LRUKReplacer,
}

/// Caches a bounded set of disk pages in fixed frames.
///
/// All I/O goes through the disk scheduler; the BPM blocks on the request's
/// completion channel. The latch is held across those waits, which trades
/// throughput for simple invariants and matches the single-latch baseline.
pub struct BufferPoolManager {
    num_frames: usize,
    next_page_id: AtomicI32,

    // Declared before the frames so dropping the pool stops the worker
    // first; any buffers still referenced by queued requests stay alive
    // through their Arcs.
    disk_scheduler: DiskScheduler,

    // The frame array never changes shape after construction; only the
    // state behind the latch decides which page lives where.
    frames: Vec<Arc<FrameHeader>>,
    state: Mutex<PoolState>,
}

impl BufferPoolManager {
    pub fn new(num_frames: usize, disk_manager: DiskManager, k_dist: usize) -> Self {
        let manager = Arc::new(Mutex::new(disk_manager));

        let mut frames = Vec::with_capacity(num_frames);
        let mut free_frames = VecDeque::with_capacity(num_frames);
        for i in 0..num_frames {
            frames.push(Arc::new(FrameHeader::new(i as FrameId)));
            free_frames.push_back(i as FrameId);
        }

        BufferPoolManager {
            num_frames,
            next_page_id: AtomicI32::new(0),
            disk_scheduler: DiskScheduler::new(manager),
            frames,
            state: Mutex::new(PoolState {
                page_table: LinkedHashMap::with_capacity(num_frames),
                free_frames,
                replacer: LRUKReplacer::new(num_frames, k_dist),
            }),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.num_frames
    }

    /// Allocates a fresh page id in a zeroed frame, pinned once.
    ///
    /// Returns `None` when every frame is pinned. Page ids are handed out by
    /// a bare counter and never reused; deleting a page does not return its
    /// id to the pool.
    pub fn new_page(self: &Arc<Self>) -> Option<BasicPageGuard> {
        let mut state = self.state.lock().unwrap();

        let frame_id = self.acquire_frame(&mut state)?;
        let frame = &self.frames[frame_id as usize];

        let page_id = self.next_page_id.fetch_add(1, Ordering::Relaxed);

        // Fresh pages start out blank. The frame may still carry the bytes
        // of whatever was evicted from it.
        frame.data().write().fill(0);

        frame.set_page_id(page_id);
        frame.set_dirty(false);
        frame.set_pin_count(1);

        state.page_table.insert(page_id, frame_id);
        state.replacer.record_access(frame_id);
        state.replacer.set_evictable(frame_id, false);
        drop(state);

        Some(BasicPageGuard::new(Arc::clone(self), Arc::clone(frame)))
    }

    /// Pins the page, faulting it in from disk if it is not resident.
    /// Returns `None` only when no frame can be freed up.
    fn fetch_frame(&self, page_id: PageId) -> Option<Arc<FrameHeader>> {
        if page_id < 0 {
            return None;
        }

        let mut state = self.state.lock().unwrap();

        // 1. Page already resident: pin it and refresh its access history.
        if let Some(&frame_id) = state.page_table.get(&page_id) {
            let frame = &self.frames[frame_id as usize];
            frame.pin();
            state.replacer.record_access(frame_id);
            state.replacer.set_evictable(frame_id, false);
            return Some(Arc::clone(frame));
        }

        // 2. Page fault: claim a frame and read the page into it.
        let frame_id = self.acquire_frame(&mut state)?;
        let frame = &self.frames[frame_id as usize];

        let (callback, receiver) = DiskScheduler::create_callback();
        self.disk_scheduler.schedule(DiskRequest {
            data: DiskData::Read(Arc::clone(frame.data())),
            page_id,
            callback,
        });
        let ok = receiver.blocking_recv().unwrap_or(false);
        assert!(ok, "disk read failed for page {}", page_id);

        frame.set_page_id(page_id);
        frame.set_dirty(false);
        frame.set_pin_count(1);

        state.page_table.insert(page_id, frame_id);
        state.replacer.record_access(frame_id);
        state.replacer.set_evictable(frame_id, false);

        Some(Arc::clone(frame))
    }

    /// Finds a frame to hold a new resident page: free list first, then a
    /// replacer victim. Dirty victims are written back before reuse. Called
    /// with the BPM latch held.
    fn acquire_frame(&self, state: &mut PoolState) -> Option<FrameId> {
        if let Some(frame_id) = state.free_frames.pop_front() {
            return Some(frame_id);
        }

        let victim_id = state.replacer.evict()?;
        let frame = &self.frames[victim_id as usize];
        let victim_page_id = frame.page_id();
        debug_assert_eq!(frame.frame_id(), victim_id);
        debug_assert_eq!(frame.pin_count(), 0, "replacer returned a pinned frame");

        if frame.is_dirty() {
            debug!(page_id = victim_page_id, frame_id = victim_id, "flushing dirty victim");
            self.write_page_to_disk(frame);
        }

        state.page_table.remove(&victim_page_id);
        frame.reset();

        Some(victim_id)
    }

    /// Schedules a write of the frame's current contents and waits for it.
    fn write_page_to_disk(&self, frame: &Arc<FrameHeader>) {
        let page_id = frame.page_id();
        // Snapshot under the read latch; a page with pin count zero has no
        // guard holding the latch, so this cannot block on a writer.
        let data = frame.data().read().clone();

        let (callback, receiver) = DiskScheduler::create_callback();
        self.disk_scheduler.schedule(DiskRequest {
            data: DiskData::Write(data),
            page_id,
            callback,
        });
        let ok = receiver.blocking_recv().unwrap_or(false);
        assert!(ok, "disk write failed for page {}", page_id);
    }

    /// Drops one pin and ORs in the dirty bit. A pin count that reaches
    /// zero marks the frame evictable; eligibility is not eviction, so the
    /// page stays resident until the replacer actually needs the frame.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let mut state = self.state.lock().unwrap();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return false;
        };
        let frame = &self.frames[frame_id as usize];
        if frame.pin_count() == 0 {
            return false;
        }

        if is_dirty {
            frame.set_dirty(true);
        }
        if frame.unpin() == 0 {
            state.replacer.set_evictable(frame_id, true);
        }
        true
    }

    /// Writes the resident page out and clears its dirty bit. Pin counts
    /// and residency are untouched.
    pub fn flush_page(&self, page_id: PageId) -> bool {
        let state = self.state.lock().unwrap();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return false;
        };
        let frame = &self.frames[frame_id as usize];

        self.write_page_to_disk(frame);
        frame.set_dirty(false);
        true
    }

    pub fn flush_all_pages(&self) {
        let state = self.state.lock().unwrap();

        for (_, &frame_id) in state.page_table.iter() {
            let frame = &self.frames[frame_id as usize];
            self.write_page_to_disk(frame);
            frame.set_dirty(false);
        }
    }

    /// Evicts the page and returns its frame to the free list. True when
    /// the page is gone (including "was never resident"); false when pins
    /// keep it alive. The page id is not recycled.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut state = self.state.lock().unwrap();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return true;
        };
        let frame = &self.frames[frame_id as usize];
        if frame.pin_count() > 0 {
            return false;
        }

        if frame.is_dirty() {
            self.write_page_to_disk(frame);
        }

        state.page_table.remove(&page_id);
        state.replacer.remove(frame_id);
        frame.reset();
        state.free_frames.push_back(frame_id);
        true
    }

    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let state = self.state.lock().unwrap();
        let &frame_id = state.page_table.get(&page_id)?;
        Some(self.frames[frame_id as usize].pin_count())
    }

    pub fn fetch_page_basic(self: &Arc<Self>, page_id: PageId) -> Option<BasicPageGuard> {
        let frame = self.fetch_frame(page_id)?;
        Some(BasicPageGuard::new(Arc::clone(self), frame))
    }

    // The page latch is taken after the BPM latch is released: the frame is
    // already pinned, so it cannot be evicted in between, and latching
    // outside keeps the BPM latch out of any latch-ordering cycles.

    pub fn fetch_page_read(self: &Arc<Self>, page_id: PageId) -> Option<ReadPageGuard> {
        Some(self.fetch_page_basic(page_id)?.upgrade_read())
    }

    pub fn fetch_page_write(self: &Arc<Self>, page_id: PageId) -> Option<WritePageGuard> {
        Some(self.fetch_page_basic(page_id)?.upgrade_write())
    }

    #[cfg(test)]
    pub(crate) fn state_counts(&self) -> (usize, usize, usize) {
        let state = self.state.lock().unwrap();
        (
            state.free_frames.len(),
            state.page_table.len(),
            state.replacer.size(),
        )
    }
}
