//! AuthConfig host index
//!
//! Tracks which hosts each AuthConfig has been loaded for. A host is served by
//! at most one AuthConfig: the first one to claim it keeps it until it is
//! deleted or stops requesting it, at which point the host is handed to the
//! next AuthConfig (in identifier order) that requests it.
//!
//! ```text
//! [ AuthConfig ] -> [ hosts ] -> owner: "<namespace>/<name>"
//! ```
//!
//! The status controller reads the index through
//! [`FindKeys`](authconfig_controller_core::FindKeys), keyed by the
//! AuthConfig's `namespace/name` identifier.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod index;
pub mod metrics;


pub use self::index::{Index, SharedIndex};
