//! On-page layout of the extendible hash table's three page kinds.
//!
//! All multi-byte fields are native-endian; the format is self-consistent
//! within a process lifetime, not portable across architectures. The hash
//! the index routes on is 32 bits wide.

/// Upper bound on the header page depth: 2^9 directory slots of 4 bytes
/// each, plus the depth field, is 2052 bytes and fits one page.
pub const HTABLE_HEADER_MAX_DEPTH: u32 = 9;

/// Upper bound on the directory depth: 2^9 entries of (1-byte local depth +
/// 4-byte page id) plus the two depth fields is 2568 bytes and fits.
pub const HTABLE_DIRECTORY_MAX_DEPTH: u32 = 9;

pub const HTABLE_HEADER_ARRAY_SIZE: usize = 1 << HTABLE_HEADER_MAX_DEPTH;
pub const HTABLE_DIRECTORY_ARRAY_SIZE: usize = 1 << HTABLE_DIRECTORY_MAX_DEPTH;

/// Header page layout.
pub const HEADER_MAX_DEPTH_OFFSET: usize = 0;
pub const HEADER_MAX_DEPTH_SIZE: usize = 4;
pub const HEADER_DIRECTORY_IDS_OFFSET: usize = HEADER_MAX_DEPTH_OFFSET + HEADER_MAX_DEPTH_SIZE;

/// Directory page layout. The local-depth bytes for every slot come before
/// the page-id array.
pub const DIRECTORY_MAX_DEPTH_OFFSET: usize = 0;
pub const DIRECTORY_GLOBAL_DEPTH_OFFSET: usize = 4;
pub const DIRECTORY_LOCAL_DEPTHS_OFFSET: usize = 8;
pub const DIRECTORY_BUCKET_IDS_OFFSET: usize =
    DIRECTORY_LOCAL_DEPTHS_OFFSET + HTABLE_DIRECTORY_ARRAY_SIZE;

/// Bucket page layout: `size`, `max_size`, then the entry array.
pub const BUCKET_SIZE_OFFSET: usize = 0;
pub const BUCKET_MAX_SIZE_OFFSET: usize = 4;
pub const BUCKET_ARRAY_OFFSET: usize = 8;
