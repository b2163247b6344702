//! Results of the lifecycle handlers.

use mapcache_core::ResponseSnapshot;
use serde::Serialize;

/// Outcome of one install pass.
///
/// Every preload URL appears exactly once, in either `cached` or `failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub generation: String,
    pub cached: Vec<String>,
    pub failed: Vec<PreloadFailure>,
}

impl InstallReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct PreloadFailure {
    pub url: String,
    pub reason: String,
}

/// Outcome of one activate pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct ActivateReport {
    pub generation: String,
    /// Generations removed, sorted by name.
    pub deleted: Vec<String>,
}

/// Where a fetch response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FetchSource {
    Cache,
    Network,
    Fallback,
}

impl FetchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Network => "network",
            Self::Fallback => "fallback",
        }
    }
}

/// Decision for one intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not handled; the host performs its default network fetch.
    Passthrough,
    Respond { response: ResponseSnapshot, source: FetchSource },
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&ResponseSnapshot> {
        match self {
            Self::Passthrough => None,
            Self::Respond { response, .. } => Some(response),
        }
    }

    pub fn source(&self) -> Option<FetchSource> {
        match self {
            Self::Passthrough => None,
            Self::Respond { source, .. } => Some(*source),
        }
    }
}
