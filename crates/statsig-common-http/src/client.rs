// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use reqwest::{Client, ClientBuilder};

const SDK_NAME: &str = "statsig-rust-client-core";
const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Creates a new HTTP client with the standard SDK User-Agent header.
pub fn new_client() -> reqwest::Result<Client> {
	builder().build()
}

/// Creates a new HTTP client builder with the standard SDK User-Agent header.
///
/// Use this when you need to customize the client (e.g., set a pool size).
///
/// # Example
/// ```ignore
/// let client = statsig_common_http::builder()
///     .pool_max_idle_per_host(4)
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Returns the standard SDK User-Agent string.
///
/// Format: `statsig-rust-client-core/{version}/{os}-{arch}`
pub fn user_agent() -> String {
	format!(
		"{SDK_NAME}/{SDK_VERSION}/{}-{}",
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_correct_format() {
		let ua = user_agent();
		assert!(ua.starts_with("statsig-rust-client-core/"));
		let parts: Vec<&str> = ua.split('/').collect();
		assert_eq!(parts.len(), 3);
		assert_eq!(parts[1], SDK_VERSION);
		assert!(parts[2].contains('-'));
	}

	#[test]
	fn new_client_builds() {
		assert!(new_client().is_ok());
	}
}
