// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reversible obfuscation of POST bodies.
//!
//! The transform is base64 followed by character reversal. It hides payloads
//! from naive inspection only and provides no confidentiality.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{NetworkError, Result};

pub trait PayloadEncoder: Send + Sync + 'static {
	fn encode(&self, body: &str) -> Result<String>;
}

pub type SharedPayloadEncoder = Arc<dyn PayloadEncoder>;

/// Default encoder: base64, then reverse.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsigEncoding;

impl PayloadEncoder for StatsigEncoding {
	fn encode(&self, body: &str) -> Result<String> {
		Ok(encode_body(body))
	}
}

pub fn encode_body(body: &str) -> String {
	STANDARD.encode(body.as_bytes()).chars().rev().collect()
}

/// Inverse of [`encode_body`].
pub fn decode_body(encoded: &str) -> Result<String> {
	let reversed: String = encoded.chars().rev().collect();
	let bytes = STANDARD
		.decode(reversed)
		.map_err(|e| NetworkError::Encoding(e.to_string()))?;
	String::from_utf8(bytes).map_err(|e| NetworkError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_known_value() {
		// base64("{}") is "e30="
		assert_eq!(encode_body("{}"), "=03e");
		assert_eq!(decode_body("=03e").unwrap(), "{}");
	}

	#[test]
	fn test_decode_rejects_garbage() {
		assert!(matches!(decode_body("!!not base64!!"), Err(NetworkError::Encoding(_))));
	}

	#[test]
	fn test_encoder_trait_matches_function() {
		let body = r#"{"events":[]}"#;
		assert_eq!(StatsigEncoding.encode(body).unwrap(), encode_body(body));
	}

	proptest! {
		#[test]
		fn prop_encoding_is_reversible(body in any::<String>()) {
			prop_assert_eq!(decode_body(&encode_body(&body)).unwrap(), body);
		}

		#[test]
		fn prop_encoded_body_is_ascii(body in any::<String>()) {
			prop_assert!(encode_body(&body).is_ascii());
		}
	}
}
