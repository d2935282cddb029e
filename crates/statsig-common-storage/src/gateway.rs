// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Storage routing with a permission breaker.
//!
//! The gateway holds two slots: an optional durable provider and an in-memory
//! fallback that is always present. Every operation resolves the active slot
//! first. A permission failure on a durable read trips the breaker, which
//! routes everything to memory for the rest of the process. Disabling storage
//! is a separate, reversible toggle that does not touch the durable slot.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::file::FileStorageProvider;
use crate::memory::InMemoryStorageProvider;
use crate::provider::SharedStorageProvider;

/// Which slot operations are currently routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveSelector {
	Durable,
	InMemory,
}

#[derive(Debug)]
struct ProviderState {
	durable: Option<SharedStorageProvider>,
	selector: ActiveSelector,
	disabled: bool,
	tripped: bool,
}

impl ProviderState {
	fn effective_selector(&self) -> ActiveSelector {
		if self.disabled || self.durable.is_none() {
			ActiveSelector::InMemory
		} else {
			self.selector
		}
	}
}

/// Entry point for all storage reads and writes.
///
/// Failures never escape the gateway: reads resolve to `None`, writes and
/// removals are logged and dropped, and key listing resolves to an empty list.
#[derive(Debug)]
pub struct StorageGateway {
	in_memory: Arc<InMemoryStorageProvider>,
	state: RwLock<ProviderState>,
}

impl StorageGateway {
	/// Creates a gateway over an optional durable provider.
	pub fn new(durable: Option<SharedStorageProvider>) -> Self {
		let selector = if durable.is_some() {
			ActiveSelector::Durable
		} else {
			ActiveSelector::InMemory
		};

		Self {
			in_memory: Arc::new(InMemoryStorageProvider::new()),
			state: RwLock::new(ProviderState {
				durable,
				selector,
				disabled: false,
				tripped: false,
			}),
		}
	}

	/// Creates a gateway with no durable provider.
	pub fn in_memory() -> Self {
		Self::new(None)
	}

	/// Probes the default XDG location and falls back to memory if it is not
	/// usable.
	pub fn probe_default() -> Self {
		match FileStorageProvider::from_xdg() {
			Ok(provider) => Self::new(Some(Arc::new(provider))),
			Err(e) => {
				warn!(error = %e, "durable storage unavailable, using in-memory storage");
				Self::in_memory()
			}
		}
	}

	/// Probes `dir` and falls back to memory if it is not usable.
	pub fn probe_dir(dir: impl Into<PathBuf>) -> Self {
		let dir = dir.into();
		match FileStorageProvider::probe(&dir) {
			Ok(provider) => Self::new(Some(Arc::new(provider))),
			Err(e) => {
				warn!(dir = %dir.display(), error = %e, "durable storage unavailable, using in-memory storage");
				Self::in_memory()
			}
		}
	}

	/// Replaces the durable slot with a custom provider and routes to it.
	///
	/// A tripped breaker applied to the previous provider, so installing a new
	/// one re-arms it. The disabled flag is left untouched.
	pub fn set_provider(&self, provider: SharedStorageProvider) {
		let mut state = self.state.write();
		info!(provider = %provider.provider_name(), "storage provider replaced");
		state.durable = Some(provider);
		state.selector = ActiveSelector::Durable;
		state.tripped = false;
	}

	/// Forces (`true`) or releases (`false`) in-memory routing.
	pub fn set_disabled(&self, disabled: bool) {
		let mut state = self.state.write();
		if state.disabled != disabled {
			debug!(disabled, "storage disabled flag changed");
		}
		state.disabled = disabled;
	}

	pub fn is_disabled(&self) -> bool {
		self.state.read().disabled
	}

	/// Permanently routes to memory. Returns `true` only for the call that
	/// actually tripped the breaker.
	pub fn downgrade(&self) -> bool {
		let mut state = self.state.write();
		if state.tripped {
			return false;
		}
		state.tripped = true;
		state.selector = ActiveSelector::InMemory;
		warn!("durable storage denied access, switching to in-memory storage");
		true
	}

	pub fn is_downgraded(&self) -> bool {
		self.state.read().tripped
	}

	pub fn active_selector(&self) -> ActiveSelector {
		self.state.read().effective_selector()
	}

	pub fn provider_name(&self) -> String {
		self.current().0.provider_name()
	}

	pub async fn get_item(&self, key: &str) -> Option<String> {
		let (provider, selector) = self.current();
		let result = provider.get_item(key).await;
		self.resolve_read(key, selector, result)
	}

	pub fn get_item_sync(&self, key: &str) -> Option<String> {
		let (provider, selector) = self.current();
		let result = provider.get_item_sync(key);
		self.resolve_read(key, selector, result)
	}

	pub async fn set_item(&self, key: &str, value: &str) {
		let (provider, _) = self.current();
		if let Err(e) = provider.set_item(key, value).await {
			warn!(key = %key, provider = %provider.provider_name(), error = %e, "failed to write storage item");
		}
	}

	pub async fn remove_item(&self, key: &str) {
		let (provider, _) = self.current();
		if let Err(e) = provider.remove_item(key).await {
			warn!(key = %key, provider = %provider.provider_name(), error = %e, "failed to remove storage item");
		}
	}

	pub async fn get_all_keys(&self) -> Vec<String> {
		let (provider, _) = self.current();
		match provider.get_all_keys().await {
			Ok(keys) => keys,
			Err(e) => {
				warn!(provider = %provider.provider_name(), error = %e, "failed to list storage keys");
				Vec::new()
			}
		}
	}

	fn current(&self) -> (SharedStorageProvider, ActiveSelector) {
		let state = self.state.read();
		match (state.effective_selector(), &state.durable) {
			(ActiveSelector::Durable, Some(durable)) => (Arc::clone(durable), ActiveSelector::Durable),
			_ => (
				Arc::clone(&self.in_memory) as SharedStorageProvider,
				ActiveSelector::InMemory,
			),
		}
	}

	fn resolve_read(
		&self,
		key: &str,
		selector: ActiveSelector,
		result: Result<Option<String>>,
	) -> Option<String> {
		match result {
			Ok(value) => value,
			Err(e) if e.is_permission_denied() && selector == ActiveSelector::Durable => {
				self.downgrade();
				None
			}
			Err(e) => {
				warn!(key = %key, error = %e, "failed to read storage item");
				None
			}
		}
	}
}

impl Default for StorageGateway {
	fn default() -> Self {
		Self::in_memory()
	}
}
