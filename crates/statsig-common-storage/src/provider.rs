// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// A string-keyed record store.
///
/// Keys are namespaced by callers and values are opaque strings (usually JSON).
/// Implement this trait to plug a custom persistence backend into
/// [`StorageGateway::set_provider`](crate::StorageGateway::set_provider).
#[async_trait]
pub trait StorageProvider: Send + Sync {
	/// Human readable provider name, e.g. `"InMemory"` or `"File"`.
	fn provider_name(&self) -> String;

	async fn get_item(&self, key: &str) -> Result<Option<String>>;

	/// Synchronous read. Providers without a synchronous path keep the default,
	/// which reports every key as absent.
	fn get_item_sync(&self, _key: &str) -> Result<Option<String>> {
		Ok(None)
	}

	async fn set_item(&self, key: &str, value: &str) -> Result<()>;

	async fn remove_item(&self, key: &str) -> Result<()>;

	async fn get_all_keys(&self) -> Result<Vec<String>>;
}

impl std::fmt::Debug for dyn StorageProvider {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StorageProvider")
			.field("name", &self.provider_name())
			.finish()
	}
}

pub type SharedStorageProvider = Arc<dyn StorageProvider>;
