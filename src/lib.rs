//! Azure resource group management
//!
//! A small facade ([`ResourceGroupService`]) over an injected
//! [`ResourceManagementClient`], plus an ARM REST implementation of that
//! client in [`azure`].

pub mod azure;
pub mod config;
pub mod error;
pub mod notification;
pub mod resource_group;

/// Version injected at compile time via AZRG_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("AZRG_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

pub use error::{RemoteFailure, ResourceError, Result};
pub use resource_group::{ResourceGroup, ResourceGroupService, ResourceManagementClient};
