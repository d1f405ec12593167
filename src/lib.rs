//! Client library for the Azure Network Resource Manager REST API.
//!
//! The crate is organized around a small set of layers:
//!
//! - [`arm`] - authentication, the shared HTTP pipeline, and the core
//!   [`ArmClient`] with its URL builders
//! - [`poller`] - the long-running-operation poller returned by every
//!   `begin_*` method
//! - [`resources`] - per-resource-type clients and their typed models
//! - [`config`] - explicit client configuration (endpoint, subscription,
//!   API version); there is no process-wide state
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use aznet::{ArmClient, ArmConfig, PollUntilDoneOptions};
//! use aznet::arm::auth::ClientSecretCredential;
//!
//! async fn example() -> aznet::Result<()> {
//!     let credential = Arc::new(ClientSecretCredential::from_env()?);
//!     let client = ArmClient::new(ArmConfig::from_env()?, credential)?;
//!     let tables = client.route_tables().list("my-rg").await?;
//!     Ok(())
//! }
//! ```

pub mod arm;
pub mod config;
pub mod error;
pub mod poller;
pub mod resources;

pub use arm::client::ArmClient;
pub use config::ArmConfig;
pub use error::{Error, Result};
pub use poller::{CancellationToken, OperationStatus, PollUntilDoneOptions, Poller};

/// Default API version sent with every request unless overridden in
/// [`ArmConfig`].
pub const DEFAULT_API_VERSION: &str = "2023-06-01";
