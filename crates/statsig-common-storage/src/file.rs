// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::provider::StorageProvider;

const VALUE_EXTENSION: &str = "value";
const PROBE_FILE: &str = ".probe";

/// Durable provider storing one file per key.
///
/// File names are the hex encoding of the key, so callers may use any
/// characters (dots, slashes, colons) in their namespaced keys.
#[derive(Debug, Clone)]
pub struct FileStorageProvider {
	dir: PathBuf,
}

impl FileStorageProvider {
	/// Creates a provider rooted at `dir` without touching the filesystem.
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	/// Creates a provider rooted at `dir` after verifying the directory can be
	/// created and written to.
	pub fn probe(dir: impl Into<PathBuf>) -> Result<Self> {
		let provider = Self::new(dir);
		std::fs::create_dir_all(&provider.dir)?;

		let probe = provider.dir.join(PROBE_FILE);
		std::fs::write(&probe, b"ok")?;
		std::fs::remove_file(&probe)?;

		debug!(dir = %provider.dir.display(), "durable storage probe succeeded");
		Ok(provider)
	}

	/// Probes the default location, `$XDG_DATA_HOME/statsig/storage`.
	pub fn from_xdg() -> Result<Self> {
		let data_dir = dirs::data_dir().ok_or_else(|| {
			StorageError::Unavailable("could not determine XDG data directory".to_string())
		})?;

		let provider = Self::probe(data_dir.join("statsig").join("storage"))?;
		info!(dir = %provider.dir.display(), "initialized durable storage");
		Ok(provider)
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	fn item_path(&self, key: &str) -> Result<PathBuf> {
		if key.is_empty() {
			return Err(StorageError::InvalidKey("key must not be empty".to_string()));
		}
		Ok(self
			.dir
			.join(format!("{}.{VALUE_EXTENSION}", hex::encode(key.as_bytes()))))
	}

	fn key_from_path(path: &Path) -> Option<String> {
		if path.extension().and_then(|e| e.to_str()) != Some(VALUE_EXTENSION) {
			return None;
		}
		let stem = path.file_stem()?.to_str()?;
		let bytes = hex::decode(stem).ok()?;
		String::from_utf8(bytes).ok()
	}
}

#[async_trait]
impl StorageProvider for FileStorageProvider {
	fn provider_name(&self) -> String {
		"File".to_string()
	}

	async fn get_item(&self, key: &str) -> Result<Option<String>> {
		let path = self.item_path(key)?;

		match tokio::fs::read_to_string(&path).await {
			Ok(value) => Ok(Some(value)),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	fn get_item_sync(&self, key: &str) -> Result<Option<String>> {
		let path = self.item_path(key)?;

		match std::fs::read_to_string(&path) {
			Ok(value) => Ok(Some(value)),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	async fn set_item(&self, key: &str, value: &str) -> Result<()> {
		tokio::fs::create_dir_all(&self.dir).await?;

		let path = self.item_path(key)?;
		// Unique per write so concurrent writers of one key never share a file.
		let tmp_path = path.with_extension(format!("{VALUE_EXTENSION}.{}.tmp", Uuid::new_v4()));

		tokio::fs::write(&tmp_path, value).await?;
		if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
			let _ = tokio::fs::remove_file(&tmp_path).await;
			return Err(e.into());
		}

		debug!(key = %key, path = %path.display(), "stored item on disk");
		Ok(())
	}

	async fn remove_item(&self, key: &str) -> Result<()> {
		let path = self.item_path(key)?;

		match tokio::fs::remove_file(&path).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}

	async fn get_all_keys(&self) -> Result<Vec<String>> {
		let mut entries = match tokio::fs::read_dir(&self.dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(e.into()),
		};

		let mut keys = Vec::new();
		while let Some(entry) = entries.next_entry().await? {
			let path = entry.path();
			match Self::key_from_path(&path) {
				Some(key) => keys.push(key),
				None => {
					if path.extension().and_then(|e| e.to_str()) == Some(VALUE_EXTENSION) {
						error!(path = %path.display(), "skipping undecodable storage file");
					}
				}
			}
		}

		Ok(keys)
	}
}
