//! The cache manager: install, activate and fetch handlers.
//!
//! ### Install
//! Fetches every preload URL concurrently (bounded by `preload_concurrency`)
//! and stores each successful response in the current generation. One failed
//! URL never aborts the others; failures are logged and reported.
//!
//! ### Activate
//! Deletes every generation whose name differs from the current one.
//!
//! ### Fetch
//! While active, every request except POST is handled. GET is cache-first: a
//! stored entry is returned without touching the network, a miss goes to the
//! network and same-origin 200 responses are written back. Other methods skip
//! the store and go straight to the network. A network failure yields the
//! synthetic offline response.

use std::sync::Arc;
use std::time::Duration;

use mapcache_client::{Network, NetworkError};
use mapcache_core::{AppConfig, CacheDb, Error, GenerationHandle, Method, RequestDescriptor, ResponseSnapshot};
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;
use url::Url;

use crate::fallback::offline_response;
use crate::lifecycle::WorkerState;
use crate::preload::PreloadList;
use crate::report::{ActivateReport, FetchOutcome, FetchSource, InstallReport, PreloadFailure};

/// Worker settings derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub generation: String,
    pub preload: PreloadList,
    pub timeout: Duration,
    pub preload_concurrency: usize,
}

impl WorkerOptions {
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self {
            generation: config.generation.clone(),
            preload: PreloadList::from_config(config)?,
            timeout: config.timeout(),
            preload_concurrency: config.preload_concurrency,
        })
    }
}

pub struct CacheManager<N> {
    options: Arc<WorkerOptions>,
    db: CacheDb,
    network: Arc<N>,
    state: Arc<RwLock<WorkerState>>,
}

impl<N> Clone for CacheManager<N> {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            db: self.db.clone(),
            network: self.network.clone(),
            state: self.state.clone(),
        }
    }
}

impl<N: Network + 'static> CacheManager<N> {
    pub fn new(options: WorkerOptions, db: CacheDb, network: Arc<N>) -> Self {
        Self {
            options: Arc::new(options),
            db,
            network,
            state: Arc::new(RwLock::new(WorkerState::Uninstalled)),
        }
    }

    pub fn options(&self) -> &WorkerOptions {
        &self.options
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn network(&self) -> &Arc<N> {
        &self.network
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    async fn transition(&self, to: WorkerState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if !state.can_transition_to(to) {
            return Err(Error::InvalidState(format!("cannot move from {} to {}", *state, to)));
        }
        tracing::info!(from = %*state, to = %to, generation = %self.options.generation, "worker state change");
        *state = to;
        Ok(())
    }

    /// Handle the install signal.
    ///
    /// Completes once every preload URL has either been stored or reported as
    /// failed. Only a store that cannot be opened fails the install, leaving
    /// the worker redundant.
    pub async fn on_install(&self) -> Result<InstallReport, Error> {
        self.transition(WorkerState::Installing).await?;

        let cache = match self.db.open_generation(&self.options.generation).await {
            Ok(cache) => cache,
            Err(e) => {
                tracing::error!(generation = %self.options.generation, error = %e, "failed to open cache generation");
                self.transition(WorkerState::Redundant).await?;
                return Err(e);
            }
        };

        let urls = self.options.preload.urls();
        let semaphore = Arc::new(Semaphore::new(self.options.preload_concurrency));
        let mut join_set = JoinSet::new();

        for (index, url) in urls.iter().cloned().enumerate() {
            let semaphore = semaphore.clone();
            let cache = cache.clone();
            let network = self.network.clone();
            let timeout = self.options.timeout;

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = preload_one(&cache, network.as_ref(), &url, timeout).await;
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<(), String>>> = vec![None; urls.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => tracing::error!(error = %e, "preload task did not complete"),
            }
        }

        let mut report = InstallReport { generation: self.options.generation.clone(), ..Default::default() };
        for (url, result) in urls.iter().zip(results) {
            match result.unwrap_or_else(|| Err("preload task did not complete".to_string())) {
                Ok(()) => report.cached.push(url.to_string()),
                Err(reason) => {
                    tracing::warn!(url = %url, reason = %reason, "failed to preload resource");
                    report.failed.push(PreloadFailure { url: url.to_string(), reason });
                }
            }
        }

        tracing::info!(
            generation = %report.generation,
            cached = report.cached.len(),
            failed = report.failed.len(),
            "install complete"
        );

        self.transition(WorkerState::Installed).await?;
        Ok(report)
    }

    /// Handle the activate signal.
    ///
    /// Deletion failures are logged per generation and do not block
    /// activation; the next activation retries them.
    pub async fn on_activate(&self) -> Result<ActivateReport, Error> {
        self.transition(WorkerState::Activating).await?;

        let current = self.options.generation.clone();
        let names = match self.db.generation_names().await {
            Ok(names) => names,
            Err(e) => {
                tracing::error!(error = %e, "failed to enumerate cache generations");
                Vec::new()
            }
        };

        let mut join_set = JoinSet::new();
        for name in names.into_iter().filter(|name| *name != current) {
            let db = self.db.clone();
            join_set.spawn(async move {
                let result = db.delete_generation(&name).await;
                (name, result)
            });
        }

        let mut deleted = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(true))) => {
                    tracing::info!(generation = %name, "deleted stale cache generation");
                    deleted.push(name);
                }
                Ok((_, Ok(false))) => {}
                Ok((name, Err(e))) => {
                    tracing::warn!(generation = %name, error = %e, "failed to delete stale cache generation");
                }
                Err(e) => tracing::error!(error = %e, "generation delete task did not complete"),
            }
        }
        deleted.sort();

        self.transition(WorkerState::Active).await?;
        Ok(ActivateReport { generation: current, deleted })
    }

    /// Handle one intercepted request. Never fails: every error path ends in a
    /// network response, the offline response, or passthrough.
    pub async fn on_fetch(&self, request: &RequestDescriptor) -> FetchOutcome {
        if request.method == Method::Post {
            tracing::debug!(url = %request.url, "passthrough: POST");
            return FetchOutcome::Passthrough;
        }

        let state = self.state().await;
        if !state.intercepts_fetches() {
            tracing::debug!(state = %state, url = %request.url, "passthrough: worker not active");
            return FetchOutcome::Passthrough;
        }

        let cache = self.db.generation(&self.options.generation);

        if request.method.is_cacheable() {
            match cache.match_request(request).await {
                Ok(Some(response)) => {
                    tracing::debug!(url = %request.url, "cache hit");
                    return FetchOutcome::Respond { response, source: FetchSource::Cache };
                }
                Ok(None) => tracing::debug!(url = %request.url, "cache miss"),
                Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed, using network"),
            }
        }

        match fetch_bounded(self.network.as_ref(), request, self.options.timeout).await {
            Ok(response) => {
                self.store_if_allowed(&cache, request, &response).await;
                FetchOutcome::Respond { response, source: FetchSource::Network }
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "network fetch failed, serving offline response");
                FetchOutcome::Respond { response: offline_response(&request.url), source: FetchSource::Fallback }
            }
        }
    }

    async fn store_if_allowed(
        &self, cache: &GenerationHandle, request: &RequestDescriptor, response: &ResponseSnapshot,
    ) {
        if !request.method.is_cacheable() || !response.is_storable() {
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                status = response.status,
                response_type = response.response_type.as_str(),
                "response not stored"
            );
            return;
        }

        if let Err(e) = cache.put(request, response).await {
            tracing::warn!(url = %request.url, error = %e, "failed to store response");
        }
    }
}

async fn fetch_bounded<N: Network + ?Sized>(
    network: &N, request: &RequestDescriptor, timeout: Duration,
) -> Result<ResponseSnapshot, NetworkError> {
    match tokio::time::timeout(timeout, network.fetch(request)).await {
        Ok(result) => result,
        Err(_) => Err(NetworkError::Timeout(timeout.as_millis() as u64)),
    }
}

async fn preload_one<N: Network + ?Sized>(
    cache: &GenerationHandle, network: &N, url: &Url, timeout: Duration,
) -> Result<(), String> {
    let request = RequestDescriptor::get(url.clone());
    let response = fetch_bounded(network, &request, timeout).await.map_err(|e| e.to_string())?;

    if !response.is_ok() {
        return Err(format!("unexpected status {} {}", response.status, response.status_text));
    }
    if !response.response_type.is_preloadable() {
        return Err(format!("unusable response type {}", response.response_type.as_str()));
    }

    cache.put(&request, &response).await.map_err(|e| e.to_string())
}
