//! Resource management client capability
//!
//! The facade only knows this trait. The ARM REST implementation lives in
//! [`crate::azure::client::ArmClient`]; tests provide scripted fakes.

use super::model::{ResourceGroup, ResourceGroupPage};
use crate::error::Result;
use async_trait::async_trait;

/// Remote operations on resource groups.
///
/// Implementations own authentication, transport, retries and the pagination
/// wire format. They must report a missing group as
/// [`ResourceError::NotFound`](crate::error::ResourceError::NotFound).
#[async_trait]
pub trait ResourceManagementClient: Send + Sync {
    /// Fetch the first page of resource groups
    async fn list_first_page(&self) -> Result<ResourceGroupPage>;

    /// Fetch the page identified by a continuation cursor
    async fn list_next_page(&self, cursor: &str) -> Result<ResourceGroupPage>;

    /// Create the named group, or update it when it already exists
    async fn create_or_update(&self, name: &str, parameters: &ResourceGroup) -> Result<ResourceGroup>;

    /// Delete the named group
    async fn delete(&self, name: &str) -> Result<()>;
}
