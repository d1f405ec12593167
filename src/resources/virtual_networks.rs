//! Virtual networks
//!
//! Client for the `Microsoft.Network/virtualNetworks` resource type.

use crate::arm::client::ArmClient;
use crate::arm::http::expect_status;
use crate::error::Result;
use crate::poller::Poller;
use crate::resources::models::{IpAddressAvailabilityResult, VirtualNetwork};
use reqwest::{Method, StatusCode};

const RESOURCE_TYPE: &str = "virtualNetworks";
const NAME_PARAM: &str = "virtualNetworkName";

#[derive(Clone)]
pub struct VirtualNetworksClient {
    client: ArmClient,
}

impl VirtualNetworksClient {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    /// Get the specified virtual network.
    pub async fn get(&self, resource_group: &str, name: &str) -> Result<VirtualNetwork> {
        let url = self
            .client
            .resource_url(resource_group, RESOURCE_TYPE, NAME_PARAM, name)?;
        self.client.get_resource(url).await
    }

    /// List all virtual networks in a resource group.
    pub async fn list(&self, resource_group: &str) -> Result<Vec<VirtualNetwork>> {
        let url = self.client.collection_url(resource_group, RESOURCE_TYPE)?;
        self.client.list_pages(url).await
    }

    /// List all virtual networks in the subscription.
    pub async fn list_all(&self) -> Result<Vec<VirtualNetwork>> {
        let url = self.client.subscription_provider_url(RESOURCE_TYPE)?;
        self.client.list_pages(url).await
    }

    /// Create or update a virtual network. Returns a poller tracking the
    /// operation.
    pub async fn begin_create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        parameters: VirtualNetwork,
    ) -> Result<Poller<VirtualNetwork>> {
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

    /// Delete a virtual network. Returns a poller tracking the operation.
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

    /// Check whether a private IP address is available for use inside the
    /// virtual network.
    pub async fn check_ip_address_availability(
        &self,
        resource_group: &str,
        name: &str,
        ip_address: &str,
    ) -> Result<IpAddressAvailabilityResult> {
        let mut url = self
            .client
            .resource_url(resource_group, RESOURCE_TYPE, NAME_PARAM, name)?;
        url.path_segments_mut()
            .map_err(|_| crate::error::Error::Config("endpoint cannot be a base URL".to_string()))?
            .push("CheckIPAddressAvailability");
        url.query_pairs_mut().append_pair("ipAddress", ip_address);

        let response = self.client.pipeline().get(url).await?;
        expect_status(&response, &[StatusCode::OK])?;
        response.json()
    }
}
