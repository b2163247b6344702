//! Client code for mapcache.
//!
//! This crate provides the network fetch primitive the cache worker talks to,
//! plus URL resolution and origin classification.

pub mod fetch;

pub use fetch::{FetchConfig, HttpNetwork, Network, NetworkError, UrlError, resolve, same_origin};
