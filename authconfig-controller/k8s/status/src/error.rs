use authconfig_controller_core::ResourceId;
use authconfig_controller_k8s_api as k8s;
use std::time::Duration;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures talking to the Kubernetes API while reconciling an AuthConfig.
///
/// Every variant is retryable: the next attempt re-reads the resource.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to fetch AuthConfig {id}: {source}")]
    Fetch { id: ResourceId, source: k8s::Error },

    #[error("AuthConfig {id} was modified before its status could be updated: {source}")]
    Conflict { id: ResourceId, source: k8s::Error },

    #[error("failed to update status of AuthConfig {id}: {source}")]
    Write { id: ResourceId, source: k8s::Error },

    #[error("{op} of AuthConfig {id} timed out after {timeout:?}")]
    Timeout {
        id: ResourceId,
        op: &'static str,
        timeout: Duration,
    },
}

// === impl Error ===

impl Error {
    pub(crate) fn from_write(id: &ResourceId, source: k8s::Error) -> Self {
        let id = id.clone();
        if matches!(&source, k8s::Error::Api(rsp) if rsp.code == 409) {
            return Self::Conflict { id, source };
        }
        Self::Write { id, source }
    }

    pub fn id(&self) -> &ResourceId {
        match self {
            Self::Fetch { id, .. }
            | Self::Conflict { id, .. }
            | Self::Write { id, .. }
            | Self::Timeout { id, .. } => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch_error",
            Self::Conflict { .. } => "conflict",
            Self::Write { .. } => "write_error",
            Self::Timeout { .. } => "timeout",
        }
    }
}
