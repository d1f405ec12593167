//! Azure firewalls
//!
//! Client for the `Microsoft.Network/azureFirewalls` resource type.
//! Firewall provisioning is among the slowest operations in the provider,
//! so callers should expect many polls on `begin_create_or_update`.

use crate::arm::client::ArmClient;
use crate::error::Result;
use crate::poller::Poller;
use crate::resources::models::AzureFirewall;
use reqwest::{Method, StatusCode};

const RESOURCE_TYPE: &str = "azureFirewalls";
const NAME_PARAM: &str = "azureFirewallName";

#[derive(Clone)]
pub struct AzureFirewallsClient {
    client: ArmClient,
}

impl AzureFirewallsClient {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    /// Get the specified Azure firewall.
    pub async fn get(&self, resource_group: &str, name: &str) -> Result<AzureFirewall> {
        let url = self
            .client
            .resource_url(resource_group, RESOURCE_TYPE, NAME_PARAM, name)?;
        self.client.get_resource(url).await
    }

    /// List all firewalls in a resource group.
    pub async fn list(&self, resource_group: &str) -> Result<Vec<AzureFirewall>> {
        let url = self.client.collection_url(resource_group, RESOURCE_TYPE)?;
        self.client.list_pages(url).await
    }

    /// List all firewalls in the subscription.
    pub async fn list_all(&self) -> Result<Vec<AzureFirewall>> {
        let url = self.client.subscription_provider_url(RESOURCE_TYPE)?;
        self.client.list_pages(url).await
    }

    /// Create or update an Azure firewall. Returns a poller tracking the
    /// operation.
    pub async fn begin_create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        parameters: AzureFirewall,
    ) -> Result<Poller<AzureFirewall>> {
        let url = self
            .client
            .resource_url(resource_group, RESOURCE_TYPE, NAME_PARAM, name)?;
        let body = serde_json::to_value(&parameters)?;
        self.client
            .begin(
                Method::PUT,
                url,
                Some(body),
                &[StatusCode::OK, StatusCode::CREATED, StatusCode::ACCEPTED],
            )
            .await
    }

    /// Delete an Azure firewall. Returns a poller tracking the operation.
    pub async fn begin_delete(&self, resource_group: &str, name: &str) -> Result<Poller<()>> {
        let url = self
            .client
            .resource_url(resource_group, RESOURCE_TYPE, NAME_PARAM, name)?;
        self.client
            .begin(
                Method::DELETE,
                url,
                None,
                &[
                    StatusCode::OK,
                    StatusCode::ACCEPTED,
                    StatusCode::NO_CONTENT,
                ],
            )
            .await
    }
}
