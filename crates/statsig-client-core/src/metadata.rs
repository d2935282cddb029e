// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SDK identity facts attached to every outbound payload.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde_json::{Map, Value};

/// SDK version for identification.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Default SDK type. Higher-level clients overwrite it via [`MetadataProvider::add`].
pub const DEFAULT_SDK_TYPE: &str = "rust-client-core";

/// Well-known metadata keys.
pub mod keys {
	pub const SDK_VERSION: &str = "sdkVersion";
	pub const SDK_TYPE: &str = "sdkType";
	pub const STABLE_ID: &str = "stableID";
	pub const SESSION_ID: &str = "sessionID";
	pub const APP_VERSION: &str = "appVersion";
	pub const DEVICE_MODEL: &str = "deviceModel";
	pub const LOCALE: &str = "locale";
	pub const SYSTEM_NAME: &str = "systemName";
	pub const SYSTEM_VERSION: &str = "systemVersion";
}

/// Snapshot of all metadata. `None` values are kept as keys but are omitted
/// from serialized payloads.
pub type StatsigMetadata = BTreeMap<String, Option<String>>;

/// Additive key/value registry, one per client instance.
///
/// There is no removal operation: `add` only inserts or overwrites.
#[derive(Debug)]
pub struct MetadataProvider {
	metadata: RwLock<StatsigMetadata>,
}

impl MetadataProvider {
	pub fn new() -> Self {
		let mut metadata = StatsigMetadata::new();
		metadata.insert(keys::SDK_VERSION.to_string(), Some(SDK_VERSION.to_string()));
		metadata.insert(keys::SDK_TYPE.to_string(), Some(DEFAULT_SDK_TYPE.to_string()));

		Self {
			metadata: RwLock::new(metadata),
		}
	}

	/// Merges `additions`, overwriting keys that already exist.
	pub fn add<I, K, V>(&self, additions: I)
	where
		I: IntoIterator<Item = (K, Option<V>)>,
		K: Into<String>,
		V: Into<String>,
	{
		let mut metadata = self.metadata.write();
		for (key, value) in additions {
			metadata.insert(key.into(), value.map(Into::into));
		}
	}

	pub fn get(&self) -> StatsigMetadata {
		self.metadata.read().clone()
	}

	pub fn sdk_type(&self) -> String {
		self.value(keys::SDK_TYPE)
			.unwrap_or_else(|| DEFAULT_SDK_TYPE.to_string())
	}

	pub fn sdk_version(&self) -> String {
		self.value(keys::SDK_VERSION)
			.unwrap_or_else(|| SDK_VERSION.to_string())
	}

	/// Snapshot as a JSON object, skipping unset values.
	pub fn to_json_object(&self) -> Map<String, Value> {
		self.metadata
			.read()
			.iter()
			.filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), Value::String(v.clone()))))
			.collect()
	}

	fn value(&self, key: &str) -> Option<String> {
		self.metadata.read().get(key).cloned().flatten()
	}
}

impl Default for MetadataProvider {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_initialized_with_version_and_type() {
		let provider = MetadataProvider::new();
		let snapshot = provider.get();

		assert_eq!(
			snapshot.get(keys::SDK_VERSION).cloned().flatten().as_deref(),
			Some(SDK_VERSION)
		);
		assert_eq!(provider.sdk_type(), DEFAULT_SDK_TYPE);
		assert_eq!(provider.sdk_version(), SDK_VERSION);
	}

	#[test]
	fn test_add_overwrites_and_never_removes() {
		let provider = MetadataProvider::new();

		provider.add([(keys::APP_VERSION, Some("1.0.0"))]);
		provider.add([(keys::SDK_TYPE, Some("rust-precomputed-evaluations"))]);
		provider.add([(keys::LOCALE, None::<String>)]);

		let snapshot = provider.get();
		assert_eq!(snapshot.len(), 4);
		assert_eq!(provider.sdk_type(), "rust-precomputed-evaluations");
		assert_eq!(
			snapshot.get(keys::APP_VERSION).cloned().flatten().as_deref(),
			Some("1.0.0")
		);
		assert!(snapshot.contains_key(keys::LOCALE));
	}

	#[test]
	fn test_json_object_skips_unset_values() {
		let provider = MetadataProvider::new();
		provider.add([(keys::DEVICE_MODEL, None::<&str>)]);

		let obj = provider.to_json_object();
		assert!(!obj.contains_key(keys::DEVICE_MODEL));
		assert_eq!(obj[keys::SDK_VERSION], SDK_VERSION);
	}

	#[test]
	fn test_snapshot_is_detached() {
		let provider = MetadataProvider::new();
		let before = provider.get();
		provider.add([("extra", Some("x"))]);
		assert!(!before.contains_key("extra"));
	}

	proptest! {
		#[test]
		fn later_adds_win(
			key in "[a-zA-Z]{1,12}",
			first in "[a-z0-9]{1,10}",
			second in "[a-z0-9]{1,10}",
		) {
			let provider = MetadataProvider::new();
			let before = provider.get().len();
			provider.add([(key.clone(), Some(first))]);
			provider.add([(key.clone(), Some(second.clone()))]);

			let snapshot = provider.get();
			prop_assert_eq!(snapshot.get(&key).cloned().flatten(), Some(second));
			prop_assert!(snapshot.len() >= before);
		}
	}
}
