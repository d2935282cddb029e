// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
	/// The backing store refused access. Trips the gateway breaker on reads.
	#[error("permission denied: {0}")]
	PermissionDenied(String),

	#[error("I/O error: {0}")]
	Io(std::io::Error),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("invalid storage key: {0}")]
	InvalidKey(String),

	#[error("storage unavailable: {0}")]
	Unavailable(String),
}

impl StorageError {
	pub fn is_permission_denied(&self) -> bool {
		matches!(self, Self::PermissionDenied(_))
	}
}

impl From<std::io::Error> for StorageError {
	fn from(e: std::io::Error) -> Self {
		if e.kind() == std::io::ErrorKind::PermissionDenied {
			Self::PermissionDenied(e.to_string())
		} else {
			Self::Io(e)
		}
	}
}

pub type Result<T> = std::result::Result<T, StorageError>;
