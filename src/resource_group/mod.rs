//! Resource group management
//!
//! - [`model`] - Resource group and list page types
//! - [`client`] - The remote capability the service delegates to
//! - [`service`] - The facade callers use
//!
//! # Example
//!
//! ```ignore
//! use azrg::resource_group::ResourceGroupService;
//!
//! async fn example(client: std::sync::Arc<azrg::azure::client::ArmClient>) -> azrg::Result<()> {
//!     let service = ResourceGroupService::new(client);
//!     service.create_resource_group("rg-demo", "eastus", None).await?;
//!     service.delete_resource_group("rg-demo").await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod model;
pub mod service;

pub use client::ResourceManagementClient;
pub use model::{default_tags, ResourceGroup, ResourceGroupPage, ResourceGroupProperties, Tags};
pub use service::{ResourceGroupService, ResourceGroupServiceBuilder};
