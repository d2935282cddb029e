// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Network and storage core for the Statsig client SDK.
//!
//! This crate provides the request layer that higher-level clients build on.
//! Requests carry SDK identity metadata, run under a per-attempt deadline, are
//! retried a bounded number of times, and never return an error to the caller.
//!
//! # Features
//!
//! - **Deadlines**: every attempt is aborted after `network_timeout_ms`
//! - **Bounded retry**: immediate resend by default, optional backoff
//! - **Encoding**: optional base64 + reversal obfuscation of POST bodies
//! - **Beacons**: one-way delivery for process teardown
//! - **Storage**: durable file storage with an in-memory fallback breaker
//!
//! # Example
//!
//! ```ignore
//! use statsig_client_core::{NetworkCore, PostArgs, RequestArgs, StatsigOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut options = StatsigOptions::from_file("statsig.toml")?;
//!     options.apply_env_overrides()?;
//!
//!     let network = NetworkCore::builder().options(options).build()?;
//!     let url = network.options().network_config.initialize_url();
//!
//!     let mut data = serde_json::Map::new();
//!     data.insert("user".into(), serde_json::json!({ "userID": "a-user" }));
//!
//!     let args = RequestArgs::new("client-key", url).with_retries(2);
//!     if let Some(response) = network.post(PostArgs::new(args, data).encodable(true)).await {
//!         println!("{} {:?}", response.code, response.body);
//!     }
//!     Ok(())
//! }
//! ```

mod beacon;
mod capabilities;
mod diagnostics;
mod encoding;
mod endpoints;
mod error;
mod events;
mod executor;
mod identity;
mod metadata;
mod network;
mod options;
mod request;
mod request_builder;
mod transport;

pub use beacon::{BeaconSender, ReqwestBeacon, SharedBeaconSender};
pub use capabilities::{HostCapabilities, NO_ENCODE_ENV};
pub use diagnostics::Diagnostics;
pub use encoding::{decode_body, encode_body, PayloadEncoder, SharedPayloadEncoder, StatsigEncoding};
pub use endpoints::{Endpoint, NetworkDefault, NetworkParam};
pub use error::{ConfigError, NetworkError, Result};
pub use events::{ClientEvent, ClientEventObserver, NoOpObserver, SharedEventObserver};
pub use executor::TransportExecutor;
pub use identity::{stable_id_storage_key, IdentitySource, SharedIdentitySource, StorageIdentity};
pub use metadata::{keys as metadata_keys, MetadataProvider, StatsigMetadata, DEFAULT_SDK_TYPE, SDK_VERSION};
pub use network::{NetworkCore, NetworkCoreBuilder};
pub use options::{ContentType, NetworkConfig, StatsigOptions, DEFAULT_TIMEOUT_MS};
pub use request::{
	BeaconArgs, HttpMethod, NetworkPriority, PostArgs, RequestArgs, RequestDescriptor,
	ResponseEnvelope,
};
pub use request_builder::RequestBuilder;
pub use transport::{ReqwestTransport, SharedTransport, Transport, TransportRequest, TransportResponse};

// Re-export storage types for convenience
pub use statsig_common_storage::{
	ActiveSelector, FileStorageProvider, InMemoryStorageProvider, SharedStorageProvider,
	StorageError, StorageGateway, StorageProvider,
};
