// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! URL and body assembly for outbound requests.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use url::Url;

use crate::endpoints::NetworkParam;
use crate::error::Result;
use crate::identity::SharedIdentitySource;
use crate::metadata::{keys, MetadataProvider};

const STATSIG_METADATA_KEY: &str = "statsigMetadata";

/// Builds fully-qualified URLs and metadata-enriched bodies.
#[derive(Clone)]
pub struct RequestBuilder {
	metadata: Arc<MetadataProvider>,
	identity: SharedIdentitySource,
}

impl RequestBuilder {
	pub fn new(metadata: Arc<MetadataProvider>, identity: SharedIdentitySource) -> Self {
		Self { metadata, identity }
	}

	pub fn metadata(&self) -> &Arc<MetadataProvider> {
		&self.metadata
	}

	/// Appends the reserved parameters (`k`, `st`, `sv`, `t`, `sid`) to `url`
	/// along with `params`. Reserved names in `params` or in the URL's own
	/// query string are dropped.
	pub async fn populated_url(
		&self,
		sdk_key: &str,
		url: &str,
		params: &BTreeMap<String, String>,
	) -> Result<Url> {
		let mut url = Url::parse(url)?;
		let session_id = self.identity.session_id(sdk_key).await;

		let mut query: Vec<(String, String)> = url
			.query_pairs()
			.filter(|(name, _)| !NetworkParam::is_reserved(name))
			.map(|(name, value)| (name.into_owned(), value.into_owned()))
			.collect();
		query.extend(
			params
				.iter()
				.filter(|(name, _)| !NetworkParam::is_reserved(name))
				.map(|(name, value)| (name.clone(), value.clone())),
		);

		let reserved = [
			(NetworkParam::SdkKey, sdk_key.to_string()),
			(NetworkParam::SdkType, self.metadata.sdk_type()),
			(NetworkParam::SdkVersion, self.metadata.sdk_version()),
			(NetworkParam::Time, Utc::now().timestamp_millis().to_string()),
			(NetworkParam::SessionId, session_id),
		];

		{
			let mut pairs = url.query_pairs_mut();
			pairs.clear();
			for (param, value) in &reserved {
				pairs.append_pair(param.as_str(), value);
			}
			for (name, value) in &query {
				pairs.append_pair(name, value);
			}
		}

		Ok(url)
	}

	/// Serializes `data` with a `statsigMetadata` object holding the metadata
	/// snapshot plus the stable ID, session ID and SDK type.
	pub async fn populated_body(&self, sdk_key: &str, data: &Map<String, Value>) -> Result<String> {
		let stable_id = self.identity.stable_id(sdk_key).await;
		let session_id = self.identity.session_id(sdk_key).await;

		let mut statsig_metadata = self.metadata.to_json_object();
		statsig_metadata.insert(keys::STABLE_ID.to_string(), Value::String(stable_id));
		statsig_metadata.insert(keys::SESSION_ID.to_string(), Value::String(session_id));
		statsig_metadata.insert(
			keys::SDK_TYPE.to_string(),
			Value::String(self.metadata.sdk_type()),
		);

		let mut body = data.clone();
		body.insert(
			STATSIG_METADATA_KEY.to_string(),
			Value::Object(statsig_metadata),
		);

		Ok(serde_json::to_string(&body)?)
	}
}

impl std::fmt::Debug for RequestBuilder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RequestBuilder")
			.field("metadata", &self.metadata)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use crate::identity::IdentitySource;
	use async_trait::async_trait;
	use std::collections::HashMap;

	pub(crate) struct FixedIdentity;

	#[async_trait]
	impl IdentitySource for FixedIdentity {
		async fn stable_id(&self, _sdk_key: &str) -> String {
			"stable-123".to_string()
		}

		async fn session_id(&self, _sdk_key: &str) -> String {
			"session-456".to_string()
		}
	}

	pub(crate) fn fixed_builder() -> RequestBuilder {
		RequestBuilder::new(Arc::new(MetadataProvider::new()), Arc::new(FixedIdentity))
	}

	fn query_map(url: &Url) -> HashMap<String, String> {
		url.query_pairs().into_owned().collect()
	}

	#[tokio::test]
	async fn test_url_contains_reserved_params() {
		let builder = fixed_builder();
		let url = builder
			.populated_url("client-key", "https://example.com/v1/initialize", &BTreeMap::new())
			.await
			.unwrap();

		let query = query_map(&url);
		assert_eq!(query["k"], "client-key");
		assert_eq!(query["st"], crate::metadata::DEFAULT_SDK_TYPE);
		assert_eq!(query["sv"], crate::metadata::SDK_VERSION);
		assert_eq!(query["sid"], "session-456");
		assert!(query["t"].parse::<i64>().unwrap() > 0);
		assert_eq!(url.path(), "/v1/initialize");
	}

	#[tokio::test]
	async fn test_caller_params_cannot_override_reserved() {
		let builder = fixed_builder();
		let params = BTreeMap::from([
			("k".to_string(), "spoofed".to_string()),
			("sid".to_string(), "spoofed".to_string()),
			("ec".to_string(), "4".to_string()),
		]);

		let url = builder
			.populated_url("client-key", "https://example.com/v1/rgstr?k=old&x=1", &params)
			.await
			.unwrap();

		let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
		assert_eq!(pairs.iter().filter(|(k, _)| k == "k").count(), 1);

		let query = query_map(&url);
		assert_eq!(query["k"], "client-key");
		assert_eq!(query["sid"], "session-456");
		assert_eq!(query["ec"], "4");
		assert_eq!(query["x"], "1");
	}

	#[tokio::test]
	async fn test_sdk_type_follows_metadata() {
		let builder = fixed_builder();
		builder
			.metadata()
			.add([(keys::SDK_TYPE, Some("custom-sdk"))]);

		let url = builder
			.populated_url("client-key", "https://example.com", &BTreeMap::new())
			.await
			.unwrap();
		assert_eq!(query_map(&url)["st"], "custom-sdk");
	}

	#[tokio::test]
	async fn test_invalid_url_is_an_error() {
		let builder = fixed_builder();
		let result = builder
			.populated_url("client-key", "not a url", &BTreeMap::new())
			.await;
		assert!(matches!(result, Err(crate::NetworkError::InvalidUrl(_))));
	}

	#[tokio::test]
	async fn test_body_includes_statsig_metadata() {
		let builder = fixed_builder();
		builder
			.metadata()
			.add([(keys::APP_VERSION, Some("1.2.3")), (keys::LOCALE, None)]);

		let mut data = Map::new();
		data.insert("events".to_string(), serde_json::json!([{"eventName": "click"}]));

		let body = builder.populated_body("client-key", &data).await.unwrap();
		let parsed: Value = serde_json::from_str(&body).unwrap();

		assert_eq!(parsed["events"][0]["eventName"], "click");
		let meta = &parsed["statsigMetadata"];
		assert_eq!(meta["stableID"], "stable-123");
		assert_eq!(meta["sessionID"], "session-456");
		assert_eq!(meta["sdkType"], crate::metadata::DEFAULT_SDK_TYPE);
		assert_eq!(meta["sdkVersion"], crate::metadata::SDK_VERSION);
		assert_eq!(meta["appVersion"], "1.2.3");
		assert!(meta.get("locale").is_none());
	}
}
