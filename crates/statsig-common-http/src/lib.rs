// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for the Statsig client SDK.
//!
//! This crate provides:
//! - A pre-configured HTTP client with a consistent User-Agent header
//! - A bounded retry loop (immediate resend by default, optional backoff)

mod client;
mod retry;

pub use client::{builder, new_client, user_agent};
pub use retry::{retry, RetryConfig, RetryableError};
