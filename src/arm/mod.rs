//! Azure Resource Manager interaction module
//!
//! This module provides the core functionality for talking to ARM:
//! authentication, the shared HTTP pipeline, and the client that resource
//! modules build on.
//!
//! # Module Structure
//!
//! - [`auth`] - token credentials and caching
//! - [`client`] - the core [`client::ArmClient`] with URL builders and
//!   request helpers
//! - [`http`] - the HTTP pipeline and buffered responses
//!
//! # Example
//!
//! ```ignore
//! use aznet::arm::client::ArmClient;
//!
//! async fn example(client: &ArmClient) -> aznet::Result<()> {
//!     let vnets = client.virtual_networks().list("my-rg").await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
