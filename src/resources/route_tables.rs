//! Route tables
//!
//! Client for the `Microsoft.Network/routeTables` resource type.

use crate::arm::client::ArmClient;
use crate::error::Result;
use crate::poller::Poller;
use crate::resources::models::RouteTable;
use reqwest::{Method, StatusCode};

const RESOURCE_TYPE: &str = "routeTables";
const NAME_PARAM: &str = "routeTableName";

#[derive(Clone)]
pub struct RouteTablesClient {
    client: ArmClient,
}

impl RouteTablesClient {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    /// Get the specified route table.
    pub async fn get(&self, resource_group: &str, name: &str) -> Result<RouteTable> {
        let url = self
            .client
            .resource_url(resource_group, RESOURCE_TYPE, NAME_PARAM, name)?;
        self.client.get_resource(url).await
    }

    /// List all route tables in a resource group.
    pub async fn list(&self, resource_group: &str) -> Result<Vec<RouteTable>> {
        let url = self.client.collection_url(resource_group, RESOURCE_TYPE)?;
        self.client.list_pages(url).await
    }

    /// List all route tables in the subscription.
    pub async fn list_all(&self) -> Result<Vec<RouteTable>> {
        let url = self.client.subscription_provider_url(RESOURCE_TYPE)?;
        self.client.list_pages(url).await
    }

    /// Create or update a route table. Returns a poller tracking the
    /// operation.
    pub async fn begin_create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        parameters: RouteTable,
    ) -> Result<Poller<RouteTable>> {
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

    /// Delete a route table. Returns a poller tracking the operation.
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
