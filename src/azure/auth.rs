//! Azure Authentication
//!
//! Bearer tokens for Azure Resource Manager, either taken from the
//! environment or obtained from the Azure CLI and cached until shortly
//! before they expire.

use crate::error::{RemoteFailure, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::process::Command;
use tokio::sync::RwLock;

/// Token audience for Azure Resource Manager
pub const ARM_RESOURCE: &str = "https://management.azure.com/";

/// Environment variable holding a pre-issued access token
pub const TOKEN_ENV_VAR: &str = "AZURE_ACCESS_TOKEN";

/// Refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Token TTL when the CLI does not report an expiry
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Source of bearer tokens for ARM requests
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn token(&self) -> Result<String>;
}

/// A fixed token, e.g. from `AZURE_ACCESS_TOKEN`
#[derive(Clone)]
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Read the token from `AZURE_ACCESS_TOKEN`, if set and non-empty
    pub fn from_env() -> Option<Self> {
        std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(|t| Self::new(t.trim()))
    }
}

impl std::fmt::Debug for StaticTokenCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenCredential")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Output of `az account get-access-token --output json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    /// Seconds since the epoch (Azure CLI 2.54+)
    #[serde(default, rename = "expires_on")]
    expires_on: Option<u64>,
}

/// Tokens obtained from a logged-in Azure CLI, with caching
#[derive(Clone, Default)]
pub struct AzureCliCredential {
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl AzureCliCredential {
    pub fn new() -> Self {
        Self::default()
    }

    async fn fetch(&self) -> Result<CachedToken> {
        tracing::debug!("Requesting ARM token from Azure CLI");

        let output = Command::new("az")
            .args([
                "account",
                "get-access-token",
                "--resource",
                ARM_RESOURCE,
                "--output",
                "json",
            ])
            .output()
            .await
            .map_err(|e| {
                RemoteFailure::transport(format!(
                    "Failed to run Azure CLI ({}). Install it and run 'az login'",
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!("az account get-access-token failed: {}", stderr.trim());
            return Err(RemoteFailure::new(
                Some(401),
                Some("CliAuthenticationFailed".into()),
                "Azure CLI could not issue a token. Run 'az login'",
            )
            .into());
        }

        let parsed: CliToken = serde_json::from_slice(&output.stdout)
            .map_err(|e| RemoteFailure::transport(format!("Failed to parse Azure CLI token: {}", e)))?;

        Ok(CachedToken {
            token: parsed.access_token,
            expires_at: Instant::now() + ttl_from_epoch(parsed.expires_on, SystemTime::now()),
        })
    }
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    async fn token(&self) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let fresh = self.fetch().await?;
        let token = fresh.token.clone();
        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(fresh);
        }

        Ok(token)
    }
}

/// Remaining lifetime of a token expiring at `expires_on`, minus the refresh
/// buffer. Falls back to the default TTL when no expiry is known.
fn ttl_from_epoch(expires_on: Option<u64>, now: SystemTime) -> Duration {
    let remaining = match expires_on {
        Some(epoch) => {
            let now_secs = now
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            Duration::from_secs(epoch.saturating_sub(now_secs))
        }
        None => DEFAULT_TOKEN_TTL,
    };
    remaining.saturating_sub(TOKEN_EXPIRY_BUFFER)
}

/// `AZURE_ACCESS_TOKEN` when set, otherwise the Azure CLI
pub fn default_credential() -> Arc<dyn TokenCredential> {
    match StaticTokenCredential::from_env() {
        Some(credential) => {
            tracing::debug!("Using access token from {}", TOKEN_ENV_VAR);
            Arc::new(credential)
        }
        None => Arc::new(AzureCliCredential::new()),
    }
}
