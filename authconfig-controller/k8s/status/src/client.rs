use authconfig_controller_core::{ResourceId, STATUS_CONTROLLER_NAME};
use authconfig_controller_k8s_api::{
    self as k8s, AuthConfig, AuthConfigStatus, Resource, ResourceExt,
};
use std::sync::Arc;

/// Reads AuthConfigs and writes their status subresource.
#[async_trait::async_trait]
pub trait StatusClient: Send + Sync {
    /// Fetches the current state of an AuthConfig, or `None` if it no longer
    /// exists.
    async fn get(&self, id: &ResourceId) -> Result<Option<AuthConfig>, k8s::Error>;

    /// Replaces the status of `config`.
    ///
    /// The write is conditional on `config`'s resource version: if the
    /// resource has changed since it was read, the update fails with a
    /// `409 Conflict` API error.
    async fn update_status(
        &self,
        config: &AuthConfig,
        status: &AuthConfigStatus,
    ) -> Result<(), k8s::Error>;
}

#[async_trait::async_trait]
impl<T: StatusClient + ?Sized> StatusClient for Arc<T> {
    async fn get(&self, id: &ResourceId) -> Result<Option<AuthConfig>, k8s::Error> {
        (**self).get(id).await
    }

    async fn update_status(
        &self,
        config: &AuthConfig,
        status: &AuthConfigStatus,
    ) -> Result<(), k8s::Error> {
        (**self).update_status(config, status).await
    }
}

/// A [`StatusClient`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeStatusClient {
    client: k8s::Client,
}

// === impl KubeStatusClient ===

impl KubeStatusClient {
    pub fn new(client: k8s::Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> k8s::Api<AuthConfig> {
        k8s::Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait::async_trait]
impl StatusClient for KubeStatusClient {
    async fn get(&self, id: &ResourceId) -> Result<Option<AuthConfig>, k8s::Error> {
        self.api(&id.namespace).get_opt(&id.name).await
    }

    async fn update_status(
        &self,
        config: &AuthConfig,
        status: &AuthConfigStatus,
    ) -> Result<(), k8s::Error> {
        let namespace = config.namespace().unwrap_or_default();
        let name = config.name_any();
        let patch = make_patch(config, status);
        let params = k8s::PatchParams {
            field_manager: Some(STATUS_CONTROLLER_NAME.to_string()),
            ..Default::default()
        };
        self.api(&namespace)
            .patch_status(&name, &params, &k8s::Patch::Merge(patch))
            .await?;
        Ok(())
    }
}

/// Builds a merge patch that only touches `status`.
///
/// Including `metadata.resourceVersion` makes the API server reject the
/// write if the resource was modified after it was read.
pub(crate) fn make_patch(config: &AuthConfig, status: &AuthConfigStatus) -> serde_json::Value {
    let mut patch = serde_json::json!({
        "apiVersion": AuthConfig::api_version(&()),
        "kind": AuthConfig::kind(&()),
        "status": status,
    });
    if let Some(version) = config.resource_version() {
        patch["metadata"] = serde_json::json!({ "resourceVersion": version });
    }
    patch
}
