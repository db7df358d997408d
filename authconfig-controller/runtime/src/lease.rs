use crate::{
    core::STATUS_CONTROLLER_NAME,
    k8s::{self, Deployment, Lease, ObjectMeta, Patch, PatchParams, Resource},
};
use anyhow::{anyhow, Result};
use kubert::lease::Claim;
use std::sync::Arc;
use tokio::{sync::watch, time};

const LEASE_DURATION: time::Duration = time::Duration::from_secs(30);
const LEASE_NAME: &str = "authconfig-status-writer";
const RENEW_GRACE_PERIOD: time::Duration = time::Duration::from_secs(1);

/// Tracks whether this replica may write AuthConfig statuses.
pub(crate) struct Leadership {
    claims: watch::Receiver<Arc<Claim>>,
    claimant: String,
}

pub(crate) async fn init<T>(
    runtime: &kubert::Runtime<T>,
    ns: &str,
    deployment_name: &str,
    hostname: &str,
) -> Result<watch::Receiver<Arc<Claim>>> {
    // The Lease is owned by the controller's Deployment so that it is garbage
    // collected with it.
    let api = k8s::Api::<Deployment>::namespaced(runtime.client(), ns);
    let deployment = api.get(deployment_name).await?;
    let owner = deployment
        .controller_owner_ref(&())
        .ok_or_else(|| anyhow!("Deployment {ns}/{deployment_name} has no name or uid"))?;

    let lease = Lease {
        metadata: ObjectMeta {
            name: Some(LEASE_NAME.to_string()),
            namespace: Some(ns.to_string()),
            // Specifying a resource version of "0" means that we will
            // only create the Lease if it does not already exist.
            resource_version: Some("0".to_string()),
            owner_references: Some(vec![owner]),
            labels: Some(
                [(
                    "app.kubernetes.io/managed-by".to_string(),
                    deployment_name.to_string(),
                )]
                .into_iter()
                .collect(),
            ),
            ..Default::default()
        },
        spec: None,
    };
    let api = k8s::Api::<Lease>::namespaced(runtime.client(), ns);
    match api
        .patch(
            LEASE_NAME,
            &PatchParams {
                field_manager: Some(STATUS_CONTROLLER_NAME.to_string()),
                ..Default::default()
            },
            &Patch::Apply(lease),
        )
        .await
    {
        Ok(lease) => tracing::info!(?lease, "Created Lease resource"),
        Err(k8s::Error::Api(_)) => tracing::debug!("Lease already exists, no need to create it"),
        Err(error) => return Err(error.into()),
    };

    let params = kubert::lease::ClaimParams {
        lease_duration: LEASE_DURATION,
        renew_grace_period: RENEW_GRACE_PERIOD,
    };
    let (claims, _task) = kubert::lease::LeaseManager::init(api, LEASE_NAME)
        .await?
        .spawn(hostname, params)
        .await?;
    Ok(claims)
}

// === impl Leadership ===

impl Leadership {
    pub(crate) fn new(claims: watch::Receiver<Arc<Claim>>, claimant: String) -> Self {
        Self { claims, claimant }
    }

    fn is_leader(&mut self) -> bool {
        self.claims.borrow_and_update().is_current_for(&self.claimant)
    }

    /// Completes once this replica holds the Lease.
    pub(crate) async fn acquired(&mut self) -> Result<()> {
        while !self.is_leader() {
            tracing::debug!(claimant = %self.claimant, "Waiting for the status Lease");
            self.claims.changed().await?;
        }
        tracing::info!(claimant = %self.claimant, "Acquired the status Lease");
        Ok(())
    }

    /// Completes once this replica no longer holds the Lease.
    pub(crate) async fn lost(&mut self) -> Result<()> {
        while self.is_leader() {
            self.claims.changed().await?;
        }
        Ok(())
    }
}
