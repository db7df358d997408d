use crate::{
    backoff::Backoff,
    core::ResourceId,
    index::SharedIndex,
    k8s::{self, AuthConfig, ResourceExt},
    lease::Leadership,
    status::{self, KubeStatusClient, Reconciler},
};
use anyhow::{bail, Result};
use futures::prelude::*;
use kube::runtime::{controller::Action, watcher, Controller};
use std::sync::Arc;

/// State shared by all reconciliations.
pub(crate) struct Context {
    reconciler: Reconciler<KubeStatusClient, SharedIndex>,
    backoff: Backoff,
}

// === impl Context ===

impl Context {
    pub(crate) fn new(reconciler: Reconciler<KubeStatusClient, SharedIndex>) -> Self {
        Self {
            reconciler,
            backoff: Backoff::default(),
        }
    }
}

/// Dispatches AuthConfig events to the reconciler until shutdown.
///
/// When `leadership` is set, nothing is reconciled until this replica holds
/// the status Lease, and losing the Lease stops the controller with an error.
pub(crate) async fn run(
    api: k8s::Api<AuthConfig>,
    ctx: Arc<Context>,
    leadership: Option<Leadership>,
    drain: drain::Watch,
) -> Result<()> {
    let mut leadership = leadership;
    if let Some(leadership) = leadership.as_mut() {
        tokio::select! {
            res = leadership.acquired() => res?,
            handle = drain.clone().signaled() => {
                drop(handle);
                return Ok(());
            }
        }
    }

    let (close_tx, close_rx) = tokio::sync::oneshot::channel::<()>();
    let controller = Controller::new(api, watcher::Config::default())
        .graceful_shutdown_on(close_rx.map(|_| ()))
        .run(reconcile, error_policy, ctx)
        .for_each(|res| {
            match res {
                Ok((obj, action)) => tracing::trace!(%obj, ?action, "Reconciled"),
                Err(error) => tracing::debug!(%error, "Reconciliation failed"),
            }
            future::ready(())
        });
    tokio::pin!(controller);

    let lost = async move {
        match leadership {
            Some(mut leadership) => leadership.lost().await,
            None => future::pending().await,
        }
    };

    tracing::info!("AuthConfig status controller started");
    tokio::select! {
        () = &mut controller => {}
        res = lost => {
            let _ = close_tx.send(());
            controller.await;
            res?;
            bail!("lost the status Lease");
        }
        handle = drain.signaled() => {
            let _ = close_tx.send(());
            handle.release_after(controller).await;
        }
    }
    Ok(())
}

async fn reconcile(config: Arc<AuthConfig>, ctx: Arc<Context>) -> status::Result<Action> {
    let Some(namespace) = config.namespace() else {
        return Ok(Action::await_change());
    };
    let id = ResourceId::new(namespace, config.name_any());
    let outcome = ctx.reconciler.reconcile(&id).await?;
    ctx.backoff.reset(&id);
    Ok(outcome.into())
}

fn error_policy(_: Arc<AuthConfig>, error: &status::Error, ctx: Arc<Context>) -> Action {
    let delay = ctx.backoff.next(error.id());
    tracing::warn!(%error, ?delay, "Failed to reconcile AuthConfig");
    Action::requeue(delay)
}
