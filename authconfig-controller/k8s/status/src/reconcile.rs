use crate::{ControllerMetrics, Error, Outcome, Result, StatusClient};
use authconfig_controller_core::{FindKeys, ResourceId};
use authconfig_controller_k8s_api::{labels::Selector, AuthConfig, AuthConfigStatus, ResourceExt};
use std::{future::Future, time::Duration};
use tokio::time;

/// How long to wait before checking again on a managed AuthConfig that the
/// cache has not indexed yet.
pub const DEFAULT_REQUEUE_AFTER: Duration = Duration::from_secs(1);

/// Bound on each API call made during a reconciliation.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Synchronizes AuthConfig readiness with the cache.
///
/// Holds no per-resource state, so a single instance may reconcile distinct
/// AuthConfigs concurrently. The caller must not reconcile the same
/// AuthConfig concurrently.
pub struct Reconciler<C, K> {
    client: C,
    cache: K,
    selector: Option<Selector>,
    requeue_after: Duration,
    request_timeout: Duration,
    metrics: ControllerMetrics,
}

/// What a reconciliation observed about an AuthConfig.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Observed {
    NotFound,
    Unmanaged,
    Ready,
    NotReady,
}

// === impl Reconciler ===

impl<C, K> Reconciler<C, K>
where
    C: StatusClient,
    K: FindKeys,
{
    pub fn new(
        client: C,
        cache: K,
        selector: Option<Selector>,
        metrics: ControllerMetrics,
    ) -> Self {
        Self {
            client,
            cache,
            selector,
            requeue_after: DEFAULT_REQUEUE_AFTER,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            metrics,
        }
    }

    pub fn with_requeue_after(mut self, requeue_after: Duration) -> Self {
        self.requeue_after = requeue_after;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub async fn reconcile(&self, id: &ResourceId) -> Result<Outcome> {
        let observed = match self.observe(id).await {
            Ok(observed) => observed,
            Err(error) => {
                self.metrics.reconciled(error.kind());
                return Err(error);
            }
        };

        let outcome = match observed {
            Observed::NotFound => {
                self.metrics.reconciled("not_found");
                Outcome::Done
            }
            Observed::Unmanaged => {
                self.metrics.reconciled("unmanaged");
                Outcome::Done
            }
            Observed::Ready => {
                self.metrics.reconciled("ready");
                Outcome::Done
            }
            Observed::NotReady => {
                self.metrics.reconciled("not_ready");
                Outcome::Requeue(self.requeue_after)
            }
        };
        Ok(outcome)
    }

    async fn observe(&self, id: &ResourceId) -> Result<Observed> {
        let config = match self.timeout(id, "get", self.client.get(id)).await? {
            Ok(Some(config)) => config,
            Ok(None) => {
                tracing::debug!(namespace = %id.namespace, name = %id.name, "AuthConfig not found");
                return Ok(Observed::NotFound);
            }
            Err(source) => {
                return Err(Error::Fetch {
                    id: id.clone(),
                    source,
                })
            }
        };

        let managed = self.is_managed(&config);
        let ready = managed && !self.cache.find_keys(&id.cache_key()).is_empty();
        tracing::debug!(namespace = %id.namespace, name = %id.name, managed, ready);

        if config.is_ready() != ready {
            self.update_status(id, &config, ready).await?;
        }

        Ok(match (managed, ready) {
            (false, _) => Observed::Unmanaged,
            (true, true) => Observed::Ready,
            (true, false) => Observed::NotReady,
        })
    }

    fn is_managed(&self, config: &AuthConfig) -> bool {
        self.selector
            .as_ref()
            .map_or(true, |selector| selector.matches(config.labels()))
    }

    async fn update_status(&self, id: &ResourceId, config: &AuthConfig, ready: bool) -> Result<()> {
        let status = AuthConfigStatus { ready };
        self.timeout(id, "status update", self.client.update_status(config, &status))
            .await?
            .map_err(|source| Error::from_write(id, source))?;

        tracing::info!(namespace = %id.namespace, name = %id.name, ready, "Updated AuthConfig status");
        self.metrics.status_updated(ready);
        Ok(())
    }

    async fn timeout<F: Future>(&self, id: &ResourceId, op: &'static str, f: F) -> Result<F::Output> {
        time::timeout(self.request_timeout, f)
            .await
            .map_err(|_| Error::Timeout {
                id: id.clone(),
                op,
                timeout: self.request_timeout,
            })
    }
}
