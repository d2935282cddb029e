// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client options.
//!
//! Options can be built in code, parsed from TOML, and then layered with
//! environment overrides:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `STATSIG_NETWORK_TIMEOUT_MS` | `network_config.network_timeout_ms` |
//! | `STATSIG_PREVENT_ALL_NETWORK_TRAFFIC` | `network_config.prevent_all_network_traffic` |
//! | `STATSIG_DISABLE_STORAGE` | `disable_storage` |
//! | `STATSIG_DISABLE_ENCODING` | `disable_statsig_encoding` |

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use statsig_common_http::RetryConfig;

use crate::endpoints::{Endpoint, NetworkDefault};
use crate::error::ConfigError;

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const ENV_TIMEOUT_MS: &str = "STATSIG_NETWORK_TIMEOUT_MS";
const ENV_PREVENT_TRAFFIC: &str = "STATSIG_PREVENT_ALL_NETWORK_TRAFFIC";
const ENV_DISABLE_STORAGE: &str = "STATSIG_DISABLE_STORAGE";
const ENV_DISABLE_ENCODING: &str = "STATSIG_DISABLE_ENCODING";

/// `Content-Type` sent with POST bodies.
///
/// `text/plain` avoids CORS preflight when requests pass through browser-like
/// proxies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
	#[default]
	Json,
	TextPlain,
}

impl ContentType {
	pub fn as_str(&self) -> &'static str {
		match self {
			ContentType::Json => "application/json",
			ContentType::TextPlain => "text/plain",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
	/// Base URL for initialize requests.
	pub api: String,
	/// Base URL for event logging.
	pub events_api: String,
	/// Per-attempt deadline.
	pub network_timeout_ms: u64,
	/// Kill switch: every request resolves to `None` without touching the network.
	pub prevent_all_network_traffic: bool,
	pub content_type: ContentType,
	/// Extra headers for every request. `Content-Type` cannot be overridden.
	pub headers: BTreeMap<String, String>,
	/// Extra query parameters for every request. Reserved parameters cannot be
	/// overridden.
	pub params: BTreeMap<String, String>,
	/// Delay before the first retry. Zero resends immediately.
	pub retry_base_delay_ms: u64,
	pub retry_max_delay_ms: u64,
	pub retry_jitter: bool,
}

impl Default for NetworkConfig {
	fn default() -> Self {
		Self {
			api: NetworkDefault::INITIALIZE_API.to_string(),
			events_api: NetworkDefault::EVENTS_API.to_string(),
			network_timeout_ms: DEFAULT_TIMEOUT_MS,
			prevent_all_network_traffic: false,
			content_type: ContentType::default(),
			headers: BTreeMap::new(),
			params: BTreeMap::new(),
			retry_base_delay_ms: 0,
			retry_max_delay_ms: 30_000,
			retry_jitter: false,
		}
	}
}

impl NetworkConfig {
	pub fn network_timeout(&self) -> Duration {
		Duration::from_millis(self.network_timeout_ms)
	}

	pub fn initialize_url(&self) -> String {
		Endpoint::Initialize.url(&self.api)
	}

	pub fn log_event_url(&self) -> String {
		Endpoint::Rgstr.url(&self.events_api)
	}

	/// Backoff policy. The retry budget itself comes from each request.
	pub fn retry_config(&self) -> RetryConfig {
		RetryConfig {
			max_retries: 0,
			base_delay: Duration::from_millis(self.retry_base_delay_ms),
			max_delay: Duration::from_millis(self.retry_max_delay_ms),
			jitter: self.retry_jitter,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsigOptions {
	pub network_config: NetworkConfig,
	/// Never obfuscate POST bodies, even when a request is marked encodable.
	pub disable_statsig_encoding: bool,
	/// Route storage to memory regardless of the durable provider.
	pub disable_storage: bool,
	/// Directory for durable storage. Defaults to `$XDG_DATA_HOME/statsig/storage`.
	pub storage_dir: Option<PathBuf>,
}

impl StatsigOptions {
	pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
		Self::parse(contents, Path::new("<inline>"))
	}

	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let contents = std::fs::read_to_string(path)?;
		Self::parse(&contents, path)
	}

	/// Applies `STATSIG_*` environment overrides on top of the current values.
	pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
		self.apply_overrides_from(|name| std::env::var(name).ok())
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.network_config.network_timeout_ms == 0 {
			return Err(ConfigError::invalid_value(
				"network_timeout_ms",
				"must be greater than zero",
			));
		}
		if url::Url::parse(&self.network_config.api).is_err() {
			return Err(ConfigError::invalid_value("api", "must be an absolute URL"));
		}
		if url::Url::parse(&self.network_config.events_api).is_err() {
			return Err(ConfigError::invalid_value(
				"events_api",
				"must be an absolute URL",
			));
		}
		Ok(())
	}

	fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
		let options: Self = toml::from_str(contents).map_err(|source| ConfigError::TomlParse {
			path: path.to_path_buf(),
			source,
		})?;
		options.validate()?;
		Ok(options)
	}

	fn apply_overrides_from(
		&mut self,
		lookup: impl Fn(&str) -> Option<String>,
	) -> Result<(), ConfigError> {
		if let Some(value) = lookup(ENV_TIMEOUT_MS) {
			self.network_config.network_timeout_ms = value
				.trim()
				.parse()
				.map_err(|_| ConfigError::invalid_value(ENV_TIMEOUT_MS, format!("not a number: {value}")))?;
		}
		if let Some(value) = lookup(ENV_PREVENT_TRAFFIC) {
			self.network_config.prevent_all_network_traffic = parse_bool(ENV_PREVENT_TRAFFIC, &value)?;
		}
		if let Some(value) = lookup(ENV_DISABLE_STORAGE) {
			self.disable_storage = parse_bool(ENV_DISABLE_STORAGE, &value)?;
		}
		if let Some(value) = lookup(ENV_DISABLE_ENCODING) {
			self.disable_statsig_encoding = parse_bool(ENV_DISABLE_ENCODING, &value)?;
		}
		self.validate()
	}
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		other => Err(ConfigError::invalid_value(
			field,
			format!("not a boolean: {other}"),
		)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	#[test]
	fn test_defaults() {
		let options = StatsigOptions::default();
		assert_eq!(options.network_config.network_timeout_ms, DEFAULT_TIMEOUT_MS);
		assert_eq!(
			options.network_config.network_timeout(),
			Duration::from_secs(10)
		);
		assert!(!options.network_config.prevent_all_network_traffic);
		assert!(!options.disable_statsig_encoding);
		assert_eq!(options.network_config.content_type, ContentType::Json);
		assert_eq!(
			options.network_config.initialize_url(),
			"https://featureassets.org/v1/initialize"
		);
		assert_eq!(
			options.network_config.log_event_url(),
			"https://prodregistryv2.org/v1/rgstr"
		);
	}

	#[test]
	fn test_default_retry_policy_is_immediate() {
		let retry = NetworkConfig::default().retry_config();
		assert!(retry.base_delay.is_zero());
	}

	#[test]
	fn test_parse_toml() {
		let options = StatsigOptions::from_toml_str(
			r#"
disable_statsig_encoding = true

[network_config]
network_timeout_ms = 2500
content_type = "text_plain"
api = "https://proxy.example.com/v1"

[network_config.headers]
X-Custom = "1"
"#,
		)
		.unwrap();

		assert!(options.disable_statsig_encoding);
		assert_eq!(options.network_config.network_timeout_ms, 2500);
		assert_eq!(options.network_config.content_type, ContentType::TextPlain);
		assert_eq!(
			options.network_config.initialize_url(),
			"https://proxy.example.com/v1/initialize"
		);
		assert_eq!(
			options.network_config.headers.get("X-Custom").map(String::as_str),
			Some("1")
		);
		// Untouched fields keep their defaults
		assert_eq!(
			options.network_config.events_api,
			NetworkDefault::EVENTS_API
		);
	}

	#[test]
	fn test_parse_error_reports_path() {
		let err = StatsigOptions::from_toml_str("network_config = 5").unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_zero_timeout_rejected() {
		let err = StatsigOptions::from_toml_str("[network_config]\nnetwork_timeout_ms = 0").unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { .. }));
	}

	#[test]
	fn test_from_file() {
		let tmp = tempfile::TempDir::new().unwrap();
		let path = tmp.path().join("statsig.toml");
		std::fs::write(&path, "disable_storage = true\n").unwrap();

		let options = StatsigOptions::from_file(&path).unwrap();
		assert!(options.disable_storage);
	}

	#[test]
	fn test_env_overrides() {
		let env: HashMap<&str, &str> = [
			(ENV_TIMEOUT_MS, "1500"),
			(ENV_PREVENT_TRAFFIC, "true"),
			(ENV_DISABLE_STORAGE, "1"),
		]
		.into_iter()
		.collect();

		let mut options = StatsigOptions::default();
		options
			.apply_overrides_from(|name| env.get(name).map(|v| v.to_string()))
			.unwrap();

		assert_eq!(options.network_config.network_timeout_ms, 1500);
		assert!(options.network_config.prevent_all_network_traffic);
		assert!(options.disable_storage);
		assert!(!options.disable_statsig_encoding);
	}

	#[test]
	fn test_env_override_rejects_garbage() {
		let mut options = StatsigOptions::default();
		let result = options.apply_overrides_from(|name| {
			(name == ENV_PREVENT_TRAFFIC).then(|| "maybe".to_string())
		});
		assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
	}
}
