// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Host capabilities, probed once when the client is built.

use tracing::debug;

/// Setting this variable to any value other than `0`/`false` disables body
/// encoding for every client in the process.
pub const NO_ENCODE_ENV: &str = "STATSIG_NO_ENCODE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
	/// A base64 primitive is available.
	pub base64: bool,
	/// A fire-and-forget send primitive is available.
	pub beacon: bool,
	/// Encoding is switched off process-wide.
	pub no_encode_override: bool,
}

impl HostCapabilities {
	/// Probes the environment. `beacon` reflects whether a beacon sender could
	/// be created and is supplied by the caller.
	pub fn probe(beacon: bool) -> Self {
		let no_encode_override = Self::no_encode_from(std::env::var(NO_ENCODE_ENV).ok());
		let capabilities = Self {
			base64: true,
			beacon,
			no_encode_override,
		};
		debug!(
			base64 = capabilities.base64,
			beacon = capabilities.beacon,
			no_encode_override = capabilities.no_encode_override,
			"host capabilities probed"
		);
		capabilities
	}

	/// Whether the host allows body encoding at all.
	pub fn can_encode(&self) -> bool {
		self.base64 && !self.no_encode_override
	}

	fn no_encode_from(value: Option<String>) -> bool {
		match value {
			Some(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false"),
			None => false,
		}
	}
}

impl Default for HostCapabilities {
	fn default() -> Self {
		Self {
			base64: true,
			beacon: false,
			no_encode_override: false,
		}
	}
}
