// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! JSON helpers on top of [`StorageGateway`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::gateway::StorageGateway;

/// Reads `key` and decodes it as JSON. Missing keys and undecodable values both
/// resolve to `None`.
pub async fn get_object_from_storage<T: DeserializeOwned>(
	storage: &StorageGateway,
	key: &str,
) -> Option<T> {
	let value = storage.get_item(key).await?;
	match serde_json::from_str::<Option<T>>(&value) {
		Ok(obj) => obj,
		Err(e) => {
			warn!(key = %key, error = %e, "failed to decode stored object");
			None
		}
	}
}

/// Encodes `obj` as JSON and writes it under `key`.
pub async fn set_object_in_storage<T: Serialize + ?Sized>(
	storage: &StorageGateway,
	key: &str,
	obj: &T,
) -> Result<()> {
	let value = serde_json::to_string(obj)?;
	storage.set_item(key, &value).await;
	Ok(())
}
