use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};

use crate::buffer::buffer_pool_manager::PageId;
use crate::storage::page::page::page_constants::PAGE_SIZE;

/// The raw block device: a single database file addressed in page-sized
/// blocks at offset `page_id * PAGE_SIZE`.
///
/// The manager knows nothing about allocation. Page ids are handed out by
/// the buffer pool; reading a page that was never written returns zeroes,
/// the same bytes a freshly allocated page holds.
pub struct DiskManager {
    db_io: File,
    db_file_path: PathBuf,
    num_pages: u32,
}

impl DiskManager {
    pub fn new(db_file: impl AsRef<Path>) -> Result<Self> {
        let path = db_file.as_ref();
        if let Some(parent) = path.parent() {
            create_dir_all(parent)
                .with_context(|| format!("failed to create database directory {:?}", parent))?;
        }

        let db_io = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("failed to open database file {:?}", path))?;

        let file_size = db_io.metadata().context("failed to stat database file")?.len();
        let num_pages = (file_size / PAGE_SIZE as u64) as u32;

        Ok(DiskManager {
            db_io,
            db_file_path: path.to_path_buf(),
            num_pages,
        })
    }

    pub fn read_page(&mut self, page_id: PageId, page_data: &mut [u8; PAGE_SIZE]) -> Result<()> {
        ensure!(page_id >= 0, "cannot read invalid page id {}", page_id);

        // Pages past the end of the file have never been written. Hand back
        // zeroes instead of failing so a clean page round-trips.
        if page_id as u32 >= self.num_pages {
            page_data.fill(0);
            return Ok(());
        }

        let offset = page_id as u64 * PAGE_SIZE as u64;
        self.db_io
            .seek(SeekFrom::Start(offset))
            .with_context(|| format!("I/O error while seeking page {}", page_id))?;

        let bytes_read = self
            .db_io
            .read(page_data)
            .with_context(|| format!("I/O error while reading page {}", page_id))?;

        // A ragged tail can only come from a file we did not write; zero it.
        if bytes_read < PAGE_SIZE {
            page_data[bytes_read..].fill(0);
        }

        Ok(())
    }

    pub fn write_page(&mut self, page_id: PageId, page_data: &[u8; PAGE_SIZE]) -> Result<()> {
        ensure!(page_id >= 0, "cannot write invalid page id {}", page_id);

        let offset = page_id as u64 * PAGE_SIZE as u64;
        self.db_io
            .seek(SeekFrom::Start(offset))
            .with_context(|| format!("I/O error while seeking page {}", page_id))?;

        self.db_io
            .write_all(page_data)
            .with_context(|| format!("I/O error while writing page {}", page_id))?;

        self.db_io
            .flush()
            .with_context(|| format!("error flushing page {}", page_id))?;

        if page_id as u32 >= self.num_pages {
            self.num_pages = page_id as u32 + 1;
        }

        Ok(())
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    pub fn db_file_path(&self) -> &Path {
        &self.db_file_path
    }
}
