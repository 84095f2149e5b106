use futures::future::{join_all, try_join_all};
use tracing::{debug, info};

use super::events::{ActivateOutcome, FetchOutcome, InstallOutcome};
use super::Agent;
use crate::diagnostics::Diagnostic;
use crate::error::AgentError;
use crate::http::{Request, Response};

impl Agent {
    /// Requests for every manifest asset, in manifest order.
    pub fn manifest_requests(&self) -> Result<Vec<Request>, AgentError> {
        self.config
            .assets
            .iter()
            .map(|path| self.resolve(path).map(Request::get))
            .collect()
    }

    /// Fetch one manifest asset. Non-2xx responses reject the whole install.
    async fn fetch_asset(&self, request: Request) -> Result<(Request, Response), AgentError> {
        let response = self.host.network.fetch(&request).await?;
        if !response.is_ok() {
            return Err(AgentError::AssetRejected {
                url: request.url.to_string(),
                status: response.status,
            });
        }
        Ok((request, response))
    }

    /// Populate the current generation with the whole manifest, or nothing.
    pub(super) async fn install(&self) -> Result<InstallOutcome, AgentError> {
        let cache = self.config.cache_name.clone();
        info!(cache = %cache, assets = self.config.assets.len(), "Caching app shell");

        match self.populate(&cache).await {
            Ok(cached) => {
                self.report(Diagnostic::AssetsCached {
                    cache: cache.clone(),
                    count: cached,
                });
                self.host.scope.skip_waiting().await;
                Ok(InstallOutcome { cache, cached })
            }
            Err(e) => {
                self.report(Diagnostic::InstallFailed {
                    cache,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn populate(&self, cache: &str) -> Result<usize, AgentError> {
        let requests = self.manifest_requests()?;
        self.host.caches.open(cache).await?;

        let entries = try_join_all(requests.into_iter().map(|r| self.fetch_asset(r))).await?;
        let cached = entries.len();
        self.host.caches.put_all(cache, entries).await?;
        Ok(cached)
    }

    /// Delete every generation except the current one, then claim clients.
    pub(super) async fn activate(&self) -> Result<ActivateOutcome, AgentError> {
        let current = self.config.cache_name.as_str();
        let stale: Vec<String> = self
            .host
            .caches
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != current)
            .collect();

        let results = join_all(stale.iter().map(|name| self.host.caches.delete(name))).await;

        let mut outcome = ActivateOutcome::default();
        let mut first_error = None;
        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(true) => {
                    self.report(Diagnostic::CacheDeleted {
                        cache: name.clone(),
                    });
                    outcome.deleted.push(name);
                }
                Ok(false) => debug!(cache = %name, "Cache already gone"),
                Err(e) => {
                    self.report(Diagnostic::CacheDeleteFailed {
                        cache: name,
                        error: e.to_string(),
                    });
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e.into());
        }

        info!(cache = %current, "Activation complete, claiming clients");
        self.host.clients.claim().await?;
        Ok(outcome)
    }

    /// Cache-first for GET, everything else passes through untouched.
    pub(super) async fn fetch(&self, request: Request) -> FetchOutcome {
        if !request.is_get() {
            return FetchOutcome::Passthrough;
        }

        match self
            .host
            .caches
            .match_request(&self.config.cache_name, &request)
            .await
        {
            Ok(Some(response)) => {
                debug!(url = %request.url, "Serving from cache");
                return FetchOutcome::Cache(response);
            }
            Ok(None) => {}
            Err(e) => self.report(Diagnostic::CacheLookupFailed {
                url: request.url.to_string(),
                error: e.to_string(),
            }),
        }

        debug!(url = %request.url, "Not in cache, fetching from network");
        match self.host.network.fetch(&request).await {
            Ok(response) => FetchOutcome::Network(response),
            Err(e) => {
                self.report(Diagnostic::FetchFailed {
                    url: request.url.to_string(),
                    error: e.to_string(),
                });
                FetchOutcome::Failed
            }
        }
    }
}
