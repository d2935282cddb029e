// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the client core.
//!
//! These errors are internal currency. Public request operations resolve every
//! failure to a sentinel (`None` or `false`) before returning to the caller.

use std::path::PathBuf;

use statsig_common_http::RetryableError;
use thiserror::Error;

/// Failures of a single request attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
	/// No SDK key was supplied; the request is never sent.
	#[error("unable to make request without an SDK key")]
	MissingSdkKey,

	/// The server answered with a non-2xx status.
	#[error("NetworkError: {url} {message}")]
	Http {
		url: String,
		status: u16,
		message: String,
	},

	/// The transport failed before a response was received.
	#[error("transport error: {0}")]
	Transport(String),

	/// The attempt deadline expired and the request was aborted.
	#[error("{reason}")]
	Timeout { timeout_ms: u64, reason: String },

	/// All network traffic is switched off.
	#[error("network traffic is prevented by configuration")]
	TrafficPrevented,

	#[error("payload encoding failed: {0}")]
	Encoding(String),

	#[error("serialization error: {0}")]
	Serialization(String),

	#[error("invalid URL: {0}")]
	InvalidUrl(String),
}

impl RetryableError for NetworkError {
	fn is_retryable(&self) -> bool {
		matches!(
			self,
			Self::Http { .. } | Self::Transport(_) | Self::Timeout { .. }
		)
	}
}

impl From<serde_json::Error> for NetworkError {
	fn from(e: serde_json::Error) -> Self {
		Self::Serialization(e.to_string())
	}
}

impl From<url::ParseError> for NetworkError {
	fn from(e: url::ParseError) -> Self {
		Self::InvalidUrl(e.to_string())
	}
}

/// Errors raised while loading or validating [`StatsigOptions`](crate::StatsigOptions).
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },

	#[error("failed to build HTTP client: {0}")]
	HttpClient(String),
}

impl ConfigError {
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}
}

pub type Result<T> = std::result::Result<T, NetworkError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_network_failures_are_retryable() {
		let http = NetworkError::Http {
			url: "https://example.com".to_string(),
			status: 500,
			message: "boom".to_string(),
		};
		let timeout = NetworkError::Timeout {
			timeout_ms: 10,
			reason: "Timeout of 10ms expired.".to_string(),
		};
		assert!(http.is_retryable());
		assert!(timeout.is_retryable());
		assert!(NetworkError::Transport("reset".to_string()).is_retryable());
	}

	#[test]
	fn test_client_status_is_retryable_too() {
		let err = NetworkError::Http {
			url: "https://example.com".to_string(),
			status: 404,
			message: "No Text".to_string(),
		};
		assert!(err.is_retryable(), "non-2xx responses are all treated alike");
	}

	#[test]
	fn test_local_failures_are_not_retryable() {
		assert!(!NetworkError::MissingSdkKey.is_retryable());
		assert!(!NetworkError::TrafficPrevented.is_retryable());
		assert!(!NetworkError::InvalidUrl("x".to_string()).is_retryable());
		assert!(!NetworkError::Encoding("x".to_string()).is_retryable());
	}

	#[test]
	fn test_timeout_displays_reason() {
		let err = NetworkError::Timeout {
			timeout_ms: 250,
			reason: "Timeout of 250ms expired.".to_string(),
		};
		assert_eq!(err.to_string(), "Timeout of 250ms expired.");
	}

	#[test]
	fn test_http_error_message_includes_url_and_body() {
		let err = NetworkError::Http {
			url: "https://featureassets.org/v1/initialize".to_string(),
			status: 500,
			message: "internal".to_string(),
		};
		assert_eq!(
			err.to_string(),
			"NetworkError: https://featureassets.org/v1/initialize internal"
		);
	}
}
