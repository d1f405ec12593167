//! Per-resource-type clients for the `Microsoft.Network` provider
//!
//! Each client is a thin wrapper around [`crate::ArmClient`]: it supplies
//! the URL template and payload types for one resource type and delegates
//! everything else (paging, status checking, the poller hand-off) to the
//! core client.

pub mod firewalls;
pub mod load_balancers;
pub mod models;
pub mod route_tables;
pub mod subnets;
pub mod virtual_networks;

pub use firewalls::AzureFirewallsClient;
pub use load_balancers::LoadBalancersClient;
pub use route_tables::RouteTablesClient;
pub use subnets::SubnetsClient;
pub use virtual_networks::VirtualNetworksClient;
