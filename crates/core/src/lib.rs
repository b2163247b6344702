//! Core types and shared functionality for mapcache.
//!
//! This crate provides:
//! - Request descriptors and response snapshots
//! - Generational cache store with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, GenerationHandle, GenerationStats};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Method, RequestDescriptor, ResponseSnapshot, ResponseType};
