// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::Result;
use crate::provider::StorageProvider;

/// Process-local provider. Always available; contents are lost on exit.
#[derive(Debug, Default)]
pub struct InMemoryStorageProvider {
	store: RwLock<HashMap<String, String>>,
}

impl InMemoryStorageProvider {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.store.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.store.read().is_empty()
	}
}

#[async_trait]
impl StorageProvider for InMemoryStorageProvider {
	fn provider_name(&self) -> String {
		"InMemory".to_string()
	}

	async fn get_item(&self, key: &str) -> Result<Option<String>> {
		self.get_item_sync(key)
	}

	fn get_item_sync(&self, key: &str) -> Result<Option<String>> {
		Ok(self.store.read().get(key).cloned())
	}

	async fn set_item(&self, key: &str, value: &str) -> Result<()> {
		self
			.store
			.write()
			.insert(key.to_string(), value.to_string());
		Ok(())
	}

	async fn remove_item(&self, key: &str) -> Result<()> {
		self.store.write().remove(key);
		Ok(())
	}

	async fn get_all_keys(&self) -> Result<Vec<String>> {
		Ok(self.store.read().keys().cloned().collect())
	}
}
