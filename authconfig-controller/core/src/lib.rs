#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Types shared between the AuthConfig status controller and the index that
//! serves as its runtime cache.

mod cache;
mod resource_id;

pub use self::{cache::FindKeys, resource_id::ResourceId};

pub const STATUS_CONTROLLER_NAME: &str = "authorino.kuadrant.io/status-controller";
