// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The network facade used by higher-level SDK clients.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use statsig_common_storage::StorageGateway;
use tracing::{debug, info, warn};

use crate::beacon::{ReqwestBeacon, SharedBeaconSender};
use crate::capabilities::HostCapabilities;
use crate::diagnostics::Diagnostics;
use crate::encoding::{SharedPayloadEncoder, StatsigEncoding};
use crate::endpoints::NetworkParam;
use crate::error::ConfigError;
use crate::events::SharedEventObserver;
use crate::executor::TransportExecutor;
use crate::identity::{SharedIdentitySource, StorageIdentity};
use crate::metadata::{MetadataProvider, SDK_VERSION};
use crate::options::StatsigOptions;
use crate::request::{
	ensure_valid_sdk_key, BeaconArgs, HttpMethod, PostArgs, RequestArgs, RequestDescriptor,
	ResponseEnvelope,
};
use crate::request_builder::RequestBuilder;
use crate::transport::{ReqwestTransport, SharedTransport};

const CONTENT_TYPE: &str = "Content-Type";

/// Builder for constructing a [`NetworkCore`].
pub struct NetworkCoreBuilder {
	options: StatsigOptions,
	transport: Option<SharedTransport>,
	observer: Option<SharedEventObserver>,
	beacon: Option<SharedBeaconSender>,
	probe_beacon: bool,
	encoder: Option<SharedPayloadEncoder>,
	capabilities: Option<HostCapabilities>,
	metadata: Option<Arc<MetadataProvider>>,
	identity: Option<SharedIdentitySource>,
	storage: Option<Arc<StorageGateway>>,
	diagnostics: Option<Arc<Diagnostics>>,
}

impl NetworkCoreBuilder {
	pub fn new() -> Self {
		Self {
			options: StatsigOptions::default(),
			transport: None,
			observer: None,
			beacon: None,
			probe_beacon: true,
			encoder: None,
			capabilities: None,
			metadata: None,
			identity: None,
			storage: None,
			diagnostics: None,
		}
	}

	pub fn options(mut self, options: StatsigOptions) -> Self {
		self.options = options;
		self
	}

	/// Replaces the default reqwest transport.
	pub fn transport(mut self, transport: SharedTransport) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Receives an `error` event for every request that exhausts its retries.
	pub fn observer(mut self, observer: SharedEventObserver) -> Self {
		self.observer = Some(observer);
		self
	}

	/// Replaces the default beacon primitive.
	pub fn beacon(mut self, beacon: SharedBeaconSender) -> Self {
		self.beacon = Some(beacon);
		self
	}

	/// Reports beacons as unsupported.
	pub fn without_beacon(mut self) -> Self {
		self.beacon = None;
		self.probe_beacon = false;
		self
	}

	pub fn encoder(mut self, encoder: SharedPayloadEncoder) -> Self {
		self.encoder = Some(encoder);
		self
	}

	/// Skips probing and uses the given capabilities.
	pub fn capabilities(mut self, capabilities: HostCapabilities) -> Self {
		self.capabilities = Some(capabilities);
		self
	}

	pub fn metadata(mut self, metadata: Arc<MetadataProvider>) -> Self {
		self.metadata = Some(metadata);
		self
	}

	pub fn identity(mut self, identity: SharedIdentitySource) -> Self {
		self.identity = Some(identity);
		self
	}

	pub fn storage(mut self, storage: Arc<StorageGateway>) -> Self {
		self.storage = Some(storage);
		self
	}

	pub fn diagnostics(mut self, diagnostics: Arc<Diagnostics>) -> Self {
		self.diagnostics = Some(diagnostics);
		self
	}

	pub fn build(self) -> Result<NetworkCore, ConfigError> {
		self.options.validate()?;

		let http_client = statsig_common_http::builder()
			.build()
			.map_err(|e| ConfigError::HttpClient(e.to_string()))?;

		let storage = self.storage.unwrap_or_else(|| {
			Arc::new(match &self.options.storage_dir {
				Some(dir) => StorageGateway::probe_dir(dir),
				None => StorageGateway::probe_default(),
			})
		});
		if self.options.disable_storage {
			storage.set_disabled(true);
		}

		let identity = self
			.identity
			.unwrap_or_else(|| Arc::new(StorageIdentity::new(Arc::clone(&storage))));
		let metadata = self.metadata.unwrap_or_default();
		let diagnostics = self.diagnostics.unwrap_or_default();

		let beacon = match self.beacon {
			Some(beacon) => Some(beacon),
			None if self.probe_beacon => {
				ReqwestBeacon::probe().map(|beacon| Arc::new(beacon) as SharedBeaconSender)
			}
			None => None,
		};
		let capabilities = self
			.capabilities
			.unwrap_or_else(|| HostCapabilities::probe(beacon.is_some()));

		let transport = self
			.transport
			.unwrap_or_else(|| Arc::new(ReqwestTransport::with_client(http_client)));

		let request_builder = Arc::new(RequestBuilder::new(Arc::clone(&metadata), identity));
		let network_config = &self.options.network_config;
		let executor = TransportExecutor::new(
			transport,
			Arc::clone(&request_builder),
			network_config.network_timeout(),
			network_config.retry_config(),
			Arc::clone(&diagnostics),
		)
		.with_observer(self.observer)
		.with_prevent_all_network_traffic(network_config.prevent_all_network_traffic);

		info!(
			sdk_version = SDK_VERSION,
			timeout_ms = network_config.network_timeout_ms,
			storage = %storage.provider_name(),
			beacon = capabilities.beacon,
			"network core initialized"
		);

		Ok(NetworkCore {
			options: self.options,
			executor,
			request_builder,
			encoder: self.encoder.unwrap_or_else(|| Arc::new(StatsigEncoding)),
			beacon,
			capabilities,
			storage,
		})
	}
}

impl Default for NetworkCoreBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Resilient request layer: deadline, bounded retry, optional body encoding
/// and teardown beacons. No call returns an error; failures resolve to
/// `None` or `false`.
///
/// # Example
///
/// ```ignore
/// use statsig_client_core::{NetworkCore, PostArgs, RequestArgs};
///
/// let network = NetworkCore::builder().build()?;
/// let url = network.options().network_config.initialize_url();
/// let response = network
///     .post(PostArgs::new(RequestArgs::new("client-key", url).with_retries(2), data).encodable(true))
///     .await;
/// ```
pub struct NetworkCore {
	options: StatsigOptions,
	executor: TransportExecutor,
	request_builder: Arc<RequestBuilder>,
	encoder: SharedPayloadEncoder,
	beacon: Option<SharedBeaconSender>,
	capabilities: HostCapabilities,
	storage: Arc<StorageGateway>,
}

impl NetworkCore {
	pub fn builder() -> NetworkCoreBuilder {
		NetworkCoreBuilder::new()
	}

	pub fn options(&self) -> &StatsigOptions {
		&self.options
	}

	pub fn metadata(&self) -> &Arc<MetadataProvider> {
		self.request_builder.metadata()
	}

	pub fn storage(&self) -> &Arc<StorageGateway> {
		&self.storage
	}

	pub fn diagnostics(&self) -> &Arc<Diagnostics> {
		self.executor.diagnostics()
	}

	pub fn capabilities(&self) -> HostCapabilities {
		self.capabilities
	}

	pub fn set_prevent_all_network_traffic(&self, prevent: bool) {
		self.executor.set_prevent_all_network_traffic(prevent);
	}

	/// Flags later requests as keepalive during process teardown.
	pub fn set_unloading(&self, unloading: bool) {
		self.executor.set_unloading(unloading);
	}

	pub async fn post(&self, args: PostArgs) -> Option<ResponseEnvelope> {
		if !ensure_valid_sdk_key(&args.request.sdk_key) {
			return None;
		}

		let body = match self
			.request_builder
			.populated_body(&args.request.sdk_key, &args.data)
			.await
		{
			Ok(body) => body,
			Err(e) => {
				warn!(url = %args.request.url, error = %e, "failed to build request body");
				return None;
			}
		};

		let mut params = self.merged_params(&args.request.params);
		let body = self.attempt_to_encode(&args, body, &mut params);

		let descriptor = self.descriptor(HttpMethod::Post, args.request, params, Some(body));
		self.executor.execute(descriptor).await
	}

	pub async fn get(&self, args: RequestArgs) -> Option<ResponseEnvelope> {
		let params = self.merged_params(&args.params);
		let descriptor = self.descriptor(HttpMethod::Get, args, params, None);
		self.executor.execute(descriptor).await
	}

	/// Like [`post`](Self::post), deserializing the response body.
	pub async fn post_json<T: DeserializeOwned>(&self, args: PostArgs) -> Option<T> {
		let url = args.request.url.clone();
		let body = self.post(args).await?.body?;
		match serde_json::from_str(&body) {
			Ok(value) => Some(value),
			Err(e) => {
				warn!(url = %url, error = %e, "failed to parse response body");
				None
			}
		}
	}

	pub fn is_beacon_supported(&self) -> bool {
		self.capabilities.beacon && self.beacon.is_some()
	}

	/// Sends `args` once through the beacon primitive. Returns the primitive's
	/// result, or `false` if the request could not be attempted.
	pub async fn beacon(&self, args: BeaconArgs) -> bool {
		if !ensure_valid_sdk_key(&args.sdk_key) {
			return false;
		}
		let Some(sender) = self.beacon.as_ref().filter(|_| self.capabilities.beacon) else {
			warn!(url = %args.url, "beacon is not supported on this host");
			return false;
		};
		if self.executor.is_network_traffic_prevented() {
			debug!(url = %args.url, "network traffic prevented, skipping beacon");
			return false;
		}

		let params = self.merged_params(&args.params);
		let url = match self
			.request_builder
			.populated_url(&args.sdk_key, &args.url, &params)
			.await
		{
			Ok(url) => url,
			Err(e) => {
				warn!(url = %args.url, error = %e, "failed to build beacon URL");
				return false;
			}
		};
		let body = match self
			.request_builder
			.populated_body(&args.sdk_key, &args.data)
			.await
		{
			Ok(body) => body,
			Err(e) => {
				warn!(url = %args.url, error = %e, "failed to build beacon body");
				return false;
			}
		};

		sender.send_beacon(url, body)
	}

	/// Waits up to `timeout` for accepted beacons to be attempted. Call this
	/// last during teardown.
	pub async fn flush_beacons(&self, timeout: Duration) -> bool {
		let Some(sender) = self.beacon.clone() else {
			return true;
		};
		match tokio::task::spawn_blocking(move || sender.flush(timeout)).await {
			Ok(flushed) => flushed,
			Err(e) => {
				warn!(error = %e, "beacon flush task failed");
				false
			}
		}
	}

	/// Config params first, then caller params. Reserved names are filtered
	/// later by the request builder.
	fn merged_params(&self, params: &BTreeMap<String, String>) -> BTreeMap<String, String> {
		let mut merged = self.options.network_config.params.clone();
		merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
		merged
	}

	/// Config headers, then caller headers, then `Content-Type` for POST.
	fn merged_headers(
		&self,
		method: HttpMethod,
		headers: &BTreeMap<String, String>,
	) -> BTreeMap<String, String> {
		let mut merged = self.options.network_config.headers.clone();
		merged.extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));

		if method == HttpMethod::Post {
			merged.retain(|name, _| !name.eq_ignore_ascii_case(CONTENT_TYPE));
			merged.insert(
				CONTENT_TYPE.to_string(),
				self.options.network_config.content_type.as_str().to_string(),
			);
		}
		merged
	}

	fn attempt_to_encode(
		&self,
		args: &PostArgs,
		body: String,
		params: &mut BTreeMap<String, String>,
	) -> String {
		if !args.is_statsig_encodable
			|| !self.capabilities.can_encode()
			|| self.options.disable_statsig_encoding
		{
			return body;
		}

		match self.encoder.encode(&body) {
			Ok(encoded) => {
				params.insert(NetworkParam::StatsigEncoded.as_str().to_string(), "1".to_string());
				encoded
			}
			Err(e) => {
				warn!(url = %args.request.url, error = %e, "request encoding failed");
				body
			}
		}
	}

	fn descriptor(
		&self,
		method: HttpMethod,
		args: RequestArgs,
		params: BTreeMap<String, String>,
		body: Option<String>,
	) -> RequestDescriptor {
		RequestDescriptor {
			headers: self.merged_headers(method, &args.headers),
			sdk_key: args.sdk_key,
			url: args.url,
			method,
			params,
			body,
			priority: args.priority,
			retries_remaining: i32::try_from(args.retries).unwrap_or(i32::MAX),
		}
	}
}

impl std::fmt::Debug for NetworkCore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NetworkCore")
			.field("options", &self.options)
			.field("executor", &self.executor)
			.field("capabilities", &self.capabilities)
			.field("storage", &self.storage)
			.finish_non_exhaustive()
	}
}
