//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod chat;
pub mod folder;
pub mod pool;
pub mod profile;
pub mod summary;
