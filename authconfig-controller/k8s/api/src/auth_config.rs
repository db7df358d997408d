use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Declares the authorization configuration served for a set of hosts.
///
/// Only the fields the status controller reads are modeled here; everything
/// else in the resource is left untouched because the controller writes
/// through the status subresource.
#[derive(Clone, Debug, Default, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "authorino.kuadrant.io",
    version = "v1beta1",
    kind = "AuthConfig",
    status = "AuthConfigStatus",
    printcolumn = r#"{"name":"Ready","type":"boolean","jsonPath":".status.ready"}"#,
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfigSpec {
    /// The hosts for which this configuration is looked up.
    #[serde(default)]
    pub hosts: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfigStatus {
    #[serde(default)]
    pub ready: bool,
}

impl AuthConfig {
    /// The readiness last recorded on the resource; an absent status reads
    /// as not ready.
    pub fn is_ready(&self) -> bool {
        self.status.as_ref().map_or(false, |s| s.ready)
    }
}
