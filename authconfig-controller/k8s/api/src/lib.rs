#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod auth_config;
pub mod labels;

pub use self::auth_config::{AuthConfig, AuthConfigSpec, AuthConfigStatus};
pub use k8s_openapi::api::{self, apps::v1::Deployment, coordination::v1::Lease};
pub use kube::{
    api::{Api, ObjectMeta, Patch, PatchParams, ResourceExt},
    error::ErrorResponse,
    Client, Error, Resource,
};
