//! ARM Client
//!
//! Resource group operations against the Azure Resource Manager REST API,
//! combining a token credential with the HTTP helpers.

use super::auth::TokenCredential;
use super::http::ArmHttpClient;
use crate::config::validate_subscription_id;
use crate::error::{RemoteFailure, ResourceError, Result};
use crate::resource_group::{ResourceGroup, ResourceGroupPage, ResourceManagementClient};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Public Azure cloud management endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Resource groups API version
pub const DEFAULT_API_VERSION: &str = "2021-04-01";

/// Delay between long-running operation polls when ARM sends no Retry-After
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Upper bound on long-running operation polls
pub const MAX_POLLS: u32 = 120;

/// Longest Retry-After honoured unless the poll interval is longer
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Azure Resource Manager client scoped to one subscription
#[derive(Clone)]
pub struct ArmClient {
    credential: Arc<dyn TokenCredential>,
    http: ArmHttpClient,
    subscription_id: String,
    endpoint: String,
    api_version: String,
    poll_interval: Duration,
}

impl ArmClient {
    /// Create a client for the public Azure cloud.
    /// The subscription ID must be a GUID since it is spliced into every URL.
    pub fn new(subscription_id: &str, credential: Arc<dyn TokenCredential>) -> Result<Self> {
        if !validate_subscription_id(subscription_id) {
            return Err(ResourceError::InvalidArgument(format!(
                "subscription ID must be a GUID, got '{}'",
                subscription_id
            )));
        }

        Ok(Self {
            credential,
            http: ArmHttpClient::new()?,
            subscription_id: subscription_id.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Use a different management endpoint (sovereign clouds, tests)
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.to_string();
        self
    }

    /// Fallback delay between polls of an accepted delete
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build the resource groups collection URL
    pub fn resource_groups_url(&self) -> String {
        format!(
            "{}/subscriptions/{}/resourcegroups?api-version={}",
            self.endpoint, self.subscription_id, self.api_version
        )
    }

    /// Build the URL of a single resource group
    pub fn resource_group_url(&self, name: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourcegroups/{}?api-version={}",
            self.endpoint,
            self.subscription_id,
            urlencoding::encode(name),
            self.api_version
        )
    }

    /// Delay before the next poll, with Retry-After capped
    fn poll_delay(&self, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(delay) => delay.min(self.poll_interval.max(MAX_RETRY_AFTER)),
            None => self.poll_interval,
        }
    }

    /// Only follow continuation and polling links on our own endpoint,
    /// so the bearer token is never sent elsewhere
    fn check_same_origin(&self, link: &str) -> Result<()> {
        let expected = url::Url::parse(&self.endpoint)
            .map_err(|e| RemoteFailure::transport(format!("Invalid endpoint: {}", e)))?;
        let actual = url::Url::parse(link)
            .map_err(|e| RemoteFailure::transport(format!("Invalid link {}: {}", link, e)))?;

        if expected.origin() != actual.origin() {
            return Err(RemoteFailure::transport(format!(
                "Refusing to follow link to foreign host: {}",
                actual.host_str().unwrap_or("-")
            ))
            .into());
        }
        Ok(())
    }

    /// Poll an accepted long-running operation until it leaves 202
    async fn wait_for_completion(&self, mut location: String, mut delay: Duration) -> Result<()> {
        for attempt in 1..=MAX_POLLS {
            tokio::time::sleep(delay).await;
            self.check_same_origin(&location)?;

            let token = self.credential.token().await?;
            let response = self
                .http
                .send::<()>(Method::GET, &location, &token, None)
                .await?
                .error_for_status()
                .map_err(|e| match e {
                    // The group existed when the delete was accepted; a missing
                    // status resource is not a missing group
                    ResourceError::NotFound(message) => ResourceError::Remote(RemoteFailure::new(
                        Some(StatusCode::NOT_FOUND.as_u16()),
                        Some("OperationNotFound".into()),
                        message,
                    )),
                    other => other,
                })?;

            if response.status != StatusCode::ACCEPTED {
                tracing::debug!("Operation completed after {} polls", attempt);
                return Ok(());
            }

            if let Some(next) = response.location {
                location = next;
            }
            delay = self.poll_delay(response.retry_after);
        }

        Err(RemoteFailure::new(
            Some(StatusCode::ACCEPTED.as_u16()),
            Some("OperationTimedOut".into()),
            format!("Operation still running after {} polls", MAX_POLLS),
        )
        .into())
    }
}

#[async_trait]
impl ResourceManagementClient for ArmClient {
    async fn list_first_page(&self) -> Result<ResourceGroupPage> {
        let token = self.credential.token().await?;
        self.http.get(&self.resource_groups_url(), &token).await
    }

    async fn list_next_page(&self, cursor: &str) -> Result<ResourceGroupPage> {
        self.check_same_origin(cursor)?;
        let token = self.credential.token().await?;
        self.http.get(cursor, &token).await
    }

    async fn create_or_update(&self, name: &str, parameters: &ResourceGroup) -> Result<ResourceGroup> {
        let token = self.credential.token().await?;
        self.http
            .put(&self.resource_group_url(name), &token, parameters)
            .await
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let token = self.credential.token().await?;
        let response = self.http.delete(&self.resource_group_url(name), &token).await?;

        if response.status != StatusCode::ACCEPTED {
            return Ok(());
        }

        match response.location {
            Some(location) => {
                tracing::info!("Delete of {} accepted, waiting for completion", name);
                let delay = self.poll_delay(response.retry_after);
                self.wait_for_completion(location, delay).await
            }
            None => Ok(()),
        }
    }
}
