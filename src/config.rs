//! Configuration Management
//!
//! Handles persistent configuration storage for azrg.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Subscription fallback when neither CLI nor config provide one
pub const SUBSCRIPTION_ENV_VAR: &str = "AZURE_SUBSCRIPTION_ID";

/// Location fallback used by the Azure CLI for `--location` defaults
pub const LOCATION_ENV_VAR: &str = "AZURE_DEFAULTS_LOCATION";

pub const DEFAULT_LOCATION: &str = "eastus";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Last used subscription ID
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Location for new resource groups
    #[serde(default)]
    pub location: Option<String>,
    /// Management endpoint override (sovereign clouds)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Resource groups API version override
    #[serde(default)]
    pub api_version: Option<String>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("azrg").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Parse config JSON, falling back to defaults on malformed content
    pub fn parse(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed config file: {}", e);
            Self::default()
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective subscription (CLI > config > environment)
    /// Security: An explicit flag or config value that is not a GUID is an
    /// error rather than being spliced into request URLs
    pub fn effective_subscription(&self, cli: Option<&str>) -> Result<Option<String>> {
        if let Some(subscription) = cli {
            return checked_subscription(subscription, "--subscription").map(Some);
        }
        if let Some(subscription) = self.subscription_id.as_deref() {
            return checked_subscription(subscription, "config file").map(Some);
        }
        Ok(subscription_from_env())
    }

    /// Get effective location (CLI > config > environment > eastus)
    pub fn effective_location(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| self.location.clone())
            .or_else(|| std::env::var(LOCATION_ENV_VAR).ok().filter(|l| !l.is_empty()))
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string())
    }

    /// Set subscription and save
    pub fn set_subscription(&mut self, subscription_id: &str) -> Result<()> {
        self.subscription_id = Some(subscription_id.to_string());
        self.save()
    }
}

/// Subscription IDs are hyphenated GUIDs
pub fn validate_subscription_id(subscription_id: &str) -> bool {
    subscription_id.len() == 36 && Uuid::parse_str(subscription_id).is_ok()
}

fn checked_subscription(subscription_id: &str, source: &str) -> Result<String> {
    if !validate_subscription_id(subscription_id) {
        anyhow::bail!(
            "Invalid subscription ID from {}: expected a GUID, got '{}'",
            source,
            subscription_id
        );
    }
    Ok(subscription_id.to_string())
}

/// Read the subscription from the environment
/// Security: Validates the format before it ends up in request URLs
fn subscription_from_env() -> Option<String> {
    let value = std::env::var(SUBSCRIPTION_ENV_VAR).ok()?;
    if validate_subscription_id(&value) {
        return Some(value);
    }
    tracing::warn!("Invalid subscription ID format in {}", SUBSCRIPTION_ENV_VAR);
    None
}
