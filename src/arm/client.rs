//! ARM client
//!
//! The core client for the `Microsoft.Network` resource provider, combining
//! configuration, authentication and the HTTP pipeline. Resource clients
//! ([`crate::resources`]) are thin wrappers that supply URL templates and
//! payload types; everything mechanical (URL building, paging, the hand-off
//! to the poller) lives here.

use crate::arm::auth::{CachedCredential, TokenCredential};
use crate::arm::http::{expect_status, Pipeline};
use crate::config::ArmConfig;
use crate::error::{Error, Result};
use crate::poller::Poller;
use crate::resources::models::ResourceListResult;
use crate::resources::{
    firewalls::AzureFirewallsClient, load_balancers::LoadBalancersClient,
    route_tables::RouteTablesClient, subnets::SubnetsClient,
    virtual_networks::VirtualNetworksClient,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use url::Url;
use urlencoding::encode;

/// Namespace of the resource provider all clients in this crate talk to.
const PROVIDER_NAMESPACE: &str = "Microsoft.Network";

/// Core ARM client
#[derive(Clone)]
pub struct ArmClient {
    config: ArmConfig,
    pipeline: Pipeline,
}

fn require_non_empty(name: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        Err(Error::EmptyParameter(name))
    } else {
        Ok(())
    }
}

impl ArmClient {
    /// Create a new ARM client. The credential is wrapped in a cache so
    /// tokens are only fetched when the previous one nears expiry.
    pub fn new(config: ArmConfig, credential: Arc<dyn TokenCredential>) -> Result<Self> {
        require_non_empty("subscriptionId", &config.subscription_id)?;
        let pipeline = Pipeline::new(Arc::new(CachedCredential::new(credential)))?;
        Ok(Self { config, pipeline })
    }

    pub fn config(&self) -> &ArmConfig {
        &self.config
    }

    pub(crate) fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    // =========================================================================
    // Resource clients
    // =========================================================================

    pub fn virtual_networks(&self) -> VirtualNetworksClient {
        VirtualNetworksClient::new(self.clone())
    }

    pub fn subnets(&self) -> SubnetsClient {
        SubnetsClient::new(self.clone())
    }

    pub fn load_balancers(&self) -> LoadBalancersClient {
        LoadBalancersClient::new(self.clone())
    }

    pub fn route_tables(&self) -> RouteTablesClient {
        RouteTablesClient::new(self.clone())
    }

    pub fn azure_firewalls(&self) -> AzureFirewallsClient {
        AzureFirewallsClient::new(self.clone())
    }

    // =========================================================================
    // URL builders
    // =========================================================================

    /// Parse `path` against the configured endpoint and attach the API
    /// version query parameter.
    fn build_url(&self, path: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.config.endpoint, path))
            .map_err(|e| Error::Config(format!("invalid endpoint URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.config.api_version);
        Ok(url)
    }

    fn resource_group_prefix(&self, resource_group: &str) -> Result<String> {
        require_non_empty("resourceGroupName", resource_group)?;
        Ok(format!(
            "subscriptions/{}/resourceGroups/{}/providers/{}",
            encode(&self.config.subscription_id),
            encode(resource_group),
            PROVIDER_NAMESPACE,
        ))
    }

    /// URL of a resource collection across the whole subscription
    /// (`list_all` operations).
    pub(crate) fn subscription_provider_url(&self, resource_type: &'static str) -> Result<Url> {
        self.build_url(&format!(
            "subscriptions/{}/providers/{}/{}",
            encode(&self.config.subscription_id),
            PROVIDER_NAMESPACE,
            resource_type,
        ))
    }

    /// URL of a resource collection inside a resource group.
    pub(crate) fn collection_url(
        &self,
        resource_group: &str,
        resource_type: &'static str,
    ) -> Result<Url> {
        let prefix = self.resource_group_prefix(resource_group)?;
        self.build_url(&format!("{prefix}/{resource_type}"))
    }

    /// URL of a single named resource inside a resource group.
    pub(crate) fn resource_url(
        &self,
        resource_group: &str,
        resource_type: &'static str,
        name_param: &'static str,
        name: &str,
    ) -> Result<Url> {
        require_non_empty(name_param, name)?;
        let prefix = self.resource_group_prefix(resource_group)?;
        self.build_url(&format!("{prefix}/{resource_type}/{}", encode(name)))
    }

    /// URL of a child collection under a named parent resource
    /// (e.g. the subnets of a virtual network).
    pub(crate) fn child_collection_url(
        &self,
        resource_group: &str,
        parent_type: &'static str,
        parent_param: &'static str,
        parent_name: &str,
        child_type: &'static str,
    ) -> Result<Url> {
        require_non_empty(parent_param, parent_name)?;
        let prefix = self.resource_group_prefix(resource_group)?;
        self.build_url(&format!(
            "{prefix}/{parent_type}/{}/{child_type}",
            encode(parent_name)
        ))
    }

    /// URL of a named child resource under a named parent resource.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn child_resource_url(
        &self,
        resource_group: &str,
        parent_type: &'static str,
        parent_param: &'static str,
        parent_name: &str,
        child_type: &'static str,
        name_param: &'static str,
        name: &str,
    ) -> Result<Url> {
        require_non_empty(parent_param, parent_name)?;
        require_non_empty(name_param, name)?;
        let prefix = self.resource_group_prefix(resource_group)?;
        self.build_url(&format!(
            "{prefix}/{parent_type}/{}/{child_type}/{}",
            encode(parent_name),
            encode(name)
        ))
    }

    // =========================================================================
    // Request helpers
    // =========================================================================

    /// GET a single resource, expecting a 200 with a JSON body.
    pub(crate) async fn get_resource<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.pipeline.get(url).await?;
        expect_status(&response, &[StatusCode::OK])?;
        response.json()
    }

    /// GET a paged list, following `nextLink` until exhaustion.
    pub(crate) async fn list_pages<T: DeserializeOwned>(&self, first: Url) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(first);

        while let Some(url) = next {
            let response = self.pipeline.get(url).await?;
            expect_status(&response, &[StatusCode::OK])?;
            let page: ResourceListResult<T> = response.json()?;
            items.extend(page.value);

            next = match page.next_link.as_deref().filter(|l| !l.is_empty()) {
                Some(link) => Some(Url::parse(link).map_err(|_| {
                    Error::MalformedResponse(format!("nextLink is not a valid URL: {link}"))
                })?),
                None => None,
            };
        }

        Ok(items)
    }

    /// Send the triggering request of a long-running operation and hand the
    /// response to the poller. Contains no polling logic of its own.
    pub(crate) async fn begin<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        expected: &[StatusCode],
    ) -> Result<Poller<T>> {
        let response = self
            .pipeline
            .send(method.clone(), url.clone(), body.as_ref())
            .await?;
        expect_status(&response, expected)?;
        Poller::from_initial_response(self.pipeline.clone(), method, url, response)
    }
}
