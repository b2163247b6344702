//! SQLite-backed generational cache for response snapshots.
//!
//! This module provides a persistent store of named cache generations, each
//! holding (request -> response snapshot) entries, using SQLite with async
//! access via tokio-rusqlite. It supports:
//!
//! - Lazily created, independently deletable generations
//! - Request keys derived with SHA-256 hashing
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::GenerationHandle;
pub use generations::GenerationStats;
