//! The offline cache manager.
//!
//! Receives the `install`, `activate` and `fetch` lifecycle signals from a
//! host and answers them against a generational cache store:
//!
//! - `install` pre-fetches the preload list into the current generation
//! - `activate` prunes every other generation
//! - `fetch` handles everything but POST: GET is served cache-first and
//!   populates the store from same-origin 200s, other methods go to the
//!   network, and an unreachable network yields a synthetic 503

pub mod fallback;
pub mod lifecycle;
pub mod manager;
pub mod preload;
pub mod report;

pub use fallback::{OFFLINE_MESSAGE, offline_response};
pub use lifecycle::WorkerState;
pub use manager::{CacheManager, WorkerOptions};
pub use preload::PreloadList;
pub use report::{ActivateReport, FetchOutcome, FetchSource, InstallReport, PreloadFailure};
