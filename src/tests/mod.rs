pub mod buffer_pool_test;
pub mod htable_page_test;

use std::sync::Arc;

use tempfile::TempDir;

use crate::buffer::buffer_pool_manager::BufferPoolManager;
use crate::storage::disk::manager::DiskManager;

/// Buffer pool over a scratch database file. The tempdir is returned so it
/// outlives the pool.
pub(crate) fn test_bpm(num_frames: usize, k_dist: usize) -> (TempDir, Arc<BufferPoolManager>) {
    let dir = tempfile::tempdir().unwrap();
    let manager = DiskManager::new(dir.path().join("pyrite.db")).unwrap();
    let bpm = Arc::new(BufferPoolManager::new(num_frames, manager, k_dist));
    (dir, bpm)
}

pub(crate) fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
