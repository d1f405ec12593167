//! Client configuration
//!
//! Explicit configuration for the ARM client: management endpoint, API
//! version and subscription. A config value is constructed and handed to
//! [`crate::ArmClient::new`]; nothing here is process-global.

use crate::error::{Error, Result};
use std::path::PathBuf;
use uuid::Uuid;

/// Default ARM management endpoint (Azure public cloud).
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ArmConfig {
    /// Base URL of the Resource Manager endpoint. Override for sovereign
    /// clouds or Azure Stack.
    pub endpoint: String,
    /// API version appended to every request.
    pub api_version: String,
    /// Subscription the clients operate on.
    pub subscription_id: String,
}

impl ArmConfig {
    /// Create a configuration for the public cloud with the default API
    /// version.
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: crate::DEFAULT_API_VERSION.to_string(),
            subscription_id: subscription_id.into(),
        }
    }

    /// Build a configuration from the environment.
    ///
    /// The subscription is resolved from `AZURE_SUBSCRIPTION_ID`, falling
    /// back to the Azure CLI configuration on disk.
    pub fn from_env() -> Result<Self> {
        let subscription = default_subscription_id().ok_or_else(|| {
            Error::Config(
                "no subscription configured; set AZURE_SUBSCRIPTION_ID or run 'az account set'"
                    .to_string(),
            )
        })?;
        Ok(Self::new(subscription))
    }

    /// Replace the management endpoint (sovereign clouds, test servers).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        // URL joining assumes no trailing slash
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    /// Replace the API version.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }
}

/// Get the Azure CLI configuration directory
fn azure_config_dir() -> Option<PathBuf> {
    // Check AZURE_CONFIG_DIR environment variable first
    if let Ok(path) = std::env::var("AZURE_CONFIG_DIR") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|p| p.join(".azure"))
}

/// Validate a subscription ID: ARM subscription IDs are UUIDs
fn validate_subscription_id(subscription: &str) -> bool {
    Uuid::parse_str(subscription).is_ok()
}

/// Read the default subscription from the environment or the Azure CLI
/// configuration.
/// Security: Validates the subscription ID format before returning
pub fn default_subscription_id() -> Option<String> {
    // Check environment variable first
    if let Ok(subscription) = std::env::var("AZURE_SUBSCRIPTION_ID") {
        if validate_subscription_id(&subscription) {
            return Some(subscription);
        }
        tracing::warn!("Invalid subscription ID format in AZURE_SUBSCRIPTION_ID");
    }

    // Try the [defaults] section of the Azure CLI config file
    let config_path = azure_config_dir()?.join("config");
    let content = std::fs::read_to_string(&config_path).ok()?;

    let mut in_defaults_section = false;
    for line in content.lines() {
        let line = line.trim();
        // Security: Skip comments and empty lines
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line == "[defaults]" {
            in_defaults_section = true;
        } else if line.starts_with('[') {
            in_defaults_section = false;
        } else if in_defaults_section && line.starts_with("subscription") && line.contains('=') {
            if let Some(value) = line.split('=').nth(1) {
                let subscription = value.trim().to_string();
                if validate_subscription_id(&subscription) {
                    return Some(subscription);
                }
                tracing::warn!("Invalid subscription ID format in Azure CLI config");
            }
        }
    }

    None
}
