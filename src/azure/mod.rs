//! Azure Resource Manager interaction module
//!
//! Concrete [`ResourceManagementClient`](crate::resource_group::ResourceManagementClient)
//! speaking the ARM REST API.
//!
//! # Module Structure
//!
//! - [`auth`] - Bearer tokens from the environment or the Azure CLI
//! - [`client`] - ARM client for resource group operations
//! - [`http`] - HTTP utilities and error decoding for REST calls
//!
//! # Example
//!
//! ```ignore
//! use azrg::azure::{auth, client::ArmClient};
//!
//! async fn example() -> azrg::Result<()> {
//!     let client = ArmClient::new("00000000-0000-0000-0000-000000000000", auth::default_credential())?;
//!     let page = client.list_first_page().await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
