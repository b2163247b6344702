//! The resolved preload list.

use mapcache_client::resolve;
use mapcache_core::{AppConfig, Error};
use url::Url;

/// Absolute URLs fetched into the current generation on install, in
/// configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadList {
    urls: Vec<Url>,
}

impl PreloadList {
    /// Resolve entries against the worker scope. Relative entries such as
    /// `./` resolve under the scope; absolute entries are kept as-is.
    pub fn resolve<S: AsRef<str>>(scope: &Url, entries: &[S]) -> Result<Self, Error> {
        let urls = entries
            .iter()
            .map(|entry| {
                resolve(scope, entry.as_ref())
                    .map_err(|e| Error::InvalidUrl(format!("preload entry '{}': {}", entry.as_ref(), e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { urls })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let scope = config.scope_url().map_err(|e| Error::InvalidInput(e.to_string()))?;
        Self::resolve(&scope, &config.preload_urls)
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }
}
