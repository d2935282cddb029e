// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request and response value types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
	Get,
	Post,
}

impl HttpMethod {
	pub fn as_str(&self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
		}
	}
}

impl fmt::Display for HttpMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Scheduling hint handed to the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkPriority {
	High,
	Low,
	#[default]
	Auto,
}

/// Arguments shared by every request.
#[derive(Debug, Clone, Default)]
pub struct RequestArgs {
	pub sdk_key: String,
	pub url: String,
	pub priority: NetworkPriority,
	/// Additional attempts after the first one.
	pub retries: u32,
	pub params: BTreeMap<String, String>,
	pub headers: BTreeMap<String, String>,
}

impl RequestArgs {
	pub fn new(sdk_key: impl Into<String>, url: impl Into<String>) -> Self {
		Self {
			sdk_key: sdk_key.into(),
			url: url.into(),
			..Self::default()
		}
	}

	pub fn with_retries(mut self, retries: u32) -> Self {
		self.retries = retries;
		self
	}

	pub fn with_priority(mut self, priority: NetworkPriority) -> Self {
		self.priority = priority;
		self
	}

	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(name.into(), value.into());
		self
	}

	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());
		self
	}
}

/// A POST request. `data` is merged with `statsigMetadata` before sending.
#[derive(Debug, Clone, Default)]
pub struct PostArgs {
	pub request: RequestArgs,
	pub data: Map<String, Value>,
	/// Opt in to body obfuscation when the host and options allow it.
	pub is_statsig_encodable: bool,
}

impl PostArgs {
	pub fn new(request: RequestArgs, data: Map<String, Value>) -> Self {
		Self {
			request,
			data,
			is_statsig_encodable: false,
		}
	}

	pub fn encodable(mut self, encodable: bool) -> Self {
		self.is_statsig_encodable = encodable;
		self
	}
}

/// A teardown delivery: no retries, no encoding, no response.
#[derive(Debug, Clone, Default)]
pub struct BeaconArgs {
	pub sdk_key: String,
	pub url: String,
	pub params: BTreeMap<String, String>,
	pub data: Map<String, Value>,
}

impl BeaconArgs {
	pub fn new(sdk_key: impl Into<String>, url: impl Into<String>, data: Map<String, Value>) -> Self {
		Self {
			sdk_key: sdk_key.into(),
			url: url.into(),
			params: BTreeMap::new(),
			data,
		}
	}
}

/// One attempt's view of a logical request.
///
/// A retry is the same descriptor with `retries_remaining` decremented; every
/// other field is carried over unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
	pub sdk_key: String,
	pub url: String,
	pub method: HttpMethod,
	pub params: BTreeMap<String, String>,
	pub headers: BTreeMap<String, String>,
	pub body: Option<String>,
	pub priority: NetworkPriority,
	/// Never below `-1`.
	pub retries_remaining: i32,
}

impl RequestDescriptor {
	/// Descriptor for the attempt after this one.
	pub fn next_attempt(&self) -> Self {
		Self {
			retries_remaining: (self.retries_remaining - 1).max(-1),
			..self.clone()
		}
	}

	/// Descriptor for the zero-based `attempt` of this logical request.
	pub fn for_attempt(&self, attempt: u32) -> Self {
		let attempt = i32::try_from(attempt).unwrap_or(i32::MAX);
		Self {
			retries_remaining: self.retries_remaining.saturating_sub(attempt).max(-1),
			..self.clone()
		}
	}

	/// Retries this logical request may still issue.
	pub fn retry_budget(&self) -> u32 {
		u32::try_from(self.retries_remaining).unwrap_or(0)
	}
}

/// Result of a successful attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
	pub body: Option<String>,
	pub code: u16,
}

/// Returns false, with a warning, when no SDK key was supplied.
pub fn ensure_valid_sdk_key(sdk_key: &str) -> bool {
	if sdk_key.is_empty() {
		warn!("Unable to make request without an SDK key");
		return false;
	}
	true
}
