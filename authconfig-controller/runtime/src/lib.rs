#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use authconfig_controller_core as core;
pub use authconfig_controller_k8s_api as k8s;
pub use authconfig_controller_k8s_index as index;
pub use authconfig_controller_k8s_status as status;

mod args;
mod backoff;
mod controller;
mod lease;

pub use self::args::Args;
