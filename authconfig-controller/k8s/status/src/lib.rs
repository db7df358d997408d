//! Keeps each AuthConfig's `status.ready` in line with the runtime cache.
//!
//! A [`Reconciler`] is invoked once per AuthConfig identifier. It reads the
//! resource, decides whether this controller manages it, asks the cache
//! whether anything has been indexed for it, and writes the status
//! subresource when the stored readiness differs from what it observed.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod metrics;
mod outcome;
mod reconcile;


pub use self::{
    client::{KubeStatusClient, StatusClient},
    error::{Error, Result},
    metrics::ControllerMetrics,
    outcome::Outcome,
    reconcile::Reconciler,
};
