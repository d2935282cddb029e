// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Bounded retry loop.
//!
//! Attempts run strictly one after another: attempt `n + 1` is only issued once
//! attempt `n` has resolved. With the default configuration the next attempt is
//! sent immediately; a non-zero `base_delay` enables capped exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Classifies whether a failed attempt may be retried.
pub trait RetryableError {
	fn is_retryable(&self) -> bool;
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		self.is_timeout() || self.is_connect() || self.is_request() || self.is_body()
	}
}

/// Retry policy for a logical request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
	/// Number of additional attempts after the first one.
	pub max_retries: u32,
	/// Delay before the first retry. `Duration::ZERO` resends immediately.
	pub base_delay: Duration,
	/// Upper bound for any single delay.
	pub max_delay: Duration,
	/// Scale each delay by a random factor in `[0.5, 1.0)`.
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_retries: 0,
			base_delay: Duration::ZERO,
			max_delay: Duration::from_secs(30),
			jitter: false,
		}
	}
}

impl RetryConfig {
	/// Returns a copy of this policy with a different retry budget.
	pub fn with_max_retries(&self, max_retries: u32) -> Self {
		Self {
			max_retries,
			..self.clone()
		}
	}

	/// Total number of attempts this policy allows.
	pub fn max_attempts(&self) -> u32 {
		self.max_retries.saturating_add(1)
	}

	/// Delay to wait after the given (zero-based) failed attempt.
	pub fn delay_for(&self, attempt: u32) -> Duration {
		if self.base_delay.is_zero() {
			return Duration::ZERO;
		}

		let factor = 2u32.saturating_pow(attempt.min(16));
		let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);

		if self.jitter {
			delay.mul_f64(0.5 + fastrand::f64() * 0.5)
		} else {
			delay
		}
	}
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or the
/// retry budget is exhausted. The closure receives the zero-based attempt index.
pub async fn retry<T, E, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
	F: FnMut(u32) -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: RetryableError + Display,
{
	let mut attempt: u32 = 0;

	loop {
		match operation(attempt).await {
			Ok(value) => return Ok(value),
			Err(e) if attempt < config.max_retries && e.is_retryable() => {
				let delay = config.delay_for(attempt);
				debug!(
					attempt = attempt + 1,
					max_attempts = config.max_attempts(),
					delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
					error = %e,
					"attempt failed, retrying"
				);
				if !delay.is_zero() {
					tokio::time::sleep(delay).await;
				}
				attempt += 1;
			}
			Err(e) => {
				if e.is_retryable() {
					warn!(attempts = attempt + 1, error = %e, "retry budget exhausted");
				}
				return Err(e);
			}
		}
	}
}
