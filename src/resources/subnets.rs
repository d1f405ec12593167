//! Subnets
//!
//! Client for subnets, which live under a parent virtual network
//! (`Microsoft.Network/virtualNetworks/{vnet}/subnets`).

use crate::arm::client::ArmClient;
use crate::error::Result;
use crate::poller::Poller;
use crate::resources::models::Subnet;
use reqwest::{Method, StatusCode};

const PARENT_TYPE: &str = "virtualNetworks";
const PARENT_PARAM: &str = "virtualNetworkName";
const CHILD_TYPE: &str = "subnets";
const NAME_PARAM: &str = "subnetName";

#[derive(Clone)]
pub struct SubnetsClient {
    client: ArmClient,
}

impl SubnetsClient {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    /// Get the specified subnet of a virtual network.
    pub async fn get(
        &self,
        resource_group: &str,
        virtual_network: &str,
        name: &str,
    ) -> Result<Subnet> {
        let url = self.client.child_resource_url(
            resource_group,
            PARENT_TYPE,
            PARENT_PARAM,
            virtual_network,
            CHILD_TYPE,
            NAME_PARAM,
            name,
        )?;
        self.client.get_resource(url).await
    }

    /// List all subnets of a virtual network.
    pub async fn list(&self, resource_group: &str, virtual_network: &str) -> Result<Vec<Subnet>> {
        let url = self.client.child_collection_url(
            resource_group,
            PARENT_TYPE,
            PARENT_PARAM,
            virtual_network,
            CHILD_TYPE,
        )?;
        self.client.list_pages(url).await
    }

    /// Create or update a subnet. Returns a poller tracking the operation.
    pub async fn begin_create_or_update(
        &self,
        resource_group: &str,
        virtual_network: &str,
        name: &str,
        parameters: Subnet,
    ) -> Result<Poller<Subnet>> {
        let url = self.client.child_resource_url(
            resource_group,
            PARENT_TYPE,
            PARENT_PARAM,
            virtual_network,
            CHILD_TYPE,
            NAME_PARAM,
            name,
        )?;
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

    /// Delete a subnet. Returns a poller tracking the operation.
    pub async fn begin_delete(
        &self,
        resource_group: &str,
        virtual_network: &str,
        name: &str,
    ) -> Result<Poller<()>> {
        let url = self.client.child_resource_url(
            resource_group,
            PARENT_TYPE,
            PARENT_PARAM,
            virtual_network,
            CHILD_TYPE,
            NAME_PARAM,
            name,
        )?;
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
