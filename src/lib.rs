//! Storage-and-access core of an embedded relational database: a buffer pool
//! over a single database file, an LRU-K replacer, a background disk
//! scheduler, and an extendible hash index built on top of page guards.

pub mod buffer;
pub mod container;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod tests;
