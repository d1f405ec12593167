//! Load balancers
//!
//! Client for the `Microsoft.Network/loadBalancers` resource type.

use crate::arm::client::ArmClient;
use crate::error::Result;
use crate::poller::Poller;
use crate::resources::models::LoadBalancer;
use reqwest::{Method, StatusCode};

const RESOURCE_TYPE: &str = "loadBalancers";
const NAME_PARAM: &str = "loadBalancerName";

#[derive(Clone)]
pub struct LoadBalancersClient {
    client: ArmClient,
}

impl LoadBalancersClient {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    /// Get the specified load balancer.
    pub async fn get(&self, resource_group: &str, name: &str) -> Result<LoadBalancer> {
        let url = self
            .client
            .resource_url(resource_group, RESOURCE_TYPE, NAME_PARAM, name)?;
        self.client.get_resource(url).await
    }

    /// List all load balancers in a resource group.
    pub async fn list(&self, resource_group: &str) -> Result<Vec<LoadBalancer>> {
        let url = self.client.collection_url(resource_group, RESOURCE_TYPE)?;
        self.client.list_pages(url).await
    }

    /// List all load balancers in the subscription.
    pub async fn list_all(&self) -> Result<Vec<LoadBalancer>> {
        let url = self.client.subscription_provider_url(RESOURCE_TYPE)?;
        self.client.list_pages(url).await
    }

    /// Create or update a load balancer. Returns a poller tracking the
    /// operation.
    pub async fn begin_create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        parameters: LoadBalancer,
    ) -> Result<Poller<LoadBalancer>> {
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

    /// Delete a load balancer. Returns a poller tracking the operation.
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
