use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Sender};
use parking_lot::RwLock;
use tokio::sync::oneshot;
use tracing::error;

use crate::buffer::buffer_pool_manager::PageId;
use crate::storage::disk::manager::DiskManager;
use crate::storage::page::page::page_constants::PAGE_SIZE;

/// Payload of a disk request.
///
/// Writes move their buffer into the request; the worker consumes it. Reads
/// carry a shared reference to the destination buffer, which the worker
/// fills while holding its write latch.
pub enum DiskData {
    Write(Box<[u8; PAGE_SIZE]>),
    Read(Arc<RwLock<Box<[u8; PAGE_SIZE]>>>),
}

pub struct DiskRequest {
    pub data: DiskData,

    // ID of the page being read from / written to disk.
    pub page_id: PageId,

    // One-shot channel used to signal the issuer once the request completes.
    // The worker owns the write end, the requester keeps the read end.
    pub callback: oneshot::Sender<bool>,
}

/// Serializes page I/O through one background worker.
///
/// Requests drain in FIFO order off an unbounded queue, so everything a
/// single thread submits executes in submission order. A `None` sentinel
/// posted on drop shuts the worker down after the queue is empty.
pub struct DiskScheduler {
    request_tx: Sender<Option<DiskRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl DiskScheduler {
    pub fn new(manager: Arc<Mutex<DiskManager>>) -> Self {
        let (request_tx, request_rx) = unbounded::<Option<DiskRequest>>();

        let worker = thread::spawn(move || {
            while let Ok(Some(request)) = request_rx.recv() {
                let result = {
                    let mut manager = manager.lock().unwrap();
                    match &request.data {
                        DiskData::Write(data) => manager.write_page(request.page_id, data),
                        DiskData::Read(buffer) => {
                            let mut buffer = buffer.write();
                            manager.read_page(request.page_id, &mut buffer)
                        }
                    }
                };

                // A failed request must not take the worker down with it; the
                // issuer learns about it through the completion value.
                let ok = match result {
                    Ok(()) => true,
                    Err(err) => {
                        error!(page_id = request.page_id, error = %err, "disk request failed");
                        false
                    }
                };

                // The issuer may have given up on the request; nothing to do.
                let _ = request.callback.send(ok);
            }
        });

        DiskScheduler {
            request_tx,
            worker: Some(worker),
        }
    }

    /// Creates the completion channel for a request.
    pub fn create_callback() -> (oneshot::Sender<bool>, oneshot::Receiver<bool>) {
        oneshot::channel()
    }

    pub fn schedule(&self, request: DiskRequest) {
        self.request_tx
            .send(Some(request))
            .expect("disk scheduler worker has shut down");
    }
}

impl Drop for DiskScheduler {
    fn drop(&mut self) {
        // Sentinel drains the queue, then the worker exits.
        let _ = self.request_tx.send(None);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
