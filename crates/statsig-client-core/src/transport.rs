// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pluggable HTTP primitive used by the transport executor.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::trace;
use url::Url;

use crate::error::{NetworkError, Result};
use crate::request::{HttpMethod, NetworkPriority};

/// A fully-populated request handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct TransportRequest {
	pub method: HttpMethod,
	pub url: Url,
	pub headers: BTreeMap<String, String>,
	pub body: Option<String>,
	pub priority: NetworkPriority,
	/// The exchange should outlive the caller (process teardown).
	pub keepalive: bool,
	/// Cancelled when the attempt deadline expires.
	pub signal: CancellationToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
	pub status: u16,
	/// `None` when the body could not be read.
	pub body: Option<String>,
}

impl TransportResponse {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Performs a single HTTP exchange.
///
/// Any response, whatever its status, is `Ok`. `Err` is reserved for failures
/// where no response was received.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
	async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

pub type SharedTransport = Arc<dyn Transport>;

/// Default transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
	client: Client,
}

impl ReqwestTransport {
	pub fn new() -> reqwest::Result<Self> {
		Ok(Self::with_client(statsig_common_http::new_client()?))
	}

	pub fn with_client(client: Client) -> Self {
		Self { client }
	}

	async fn exchange(client: Client, request: TransportRequest) -> Result<TransportResponse> {
		let method = match request.method {
			HttpMethod::Get => reqwest::Method::GET,
			HttpMethod::Post => reqwest::Method::POST,
		};

		let mut builder = client.request(method, request.url);
		for (name, value) in &request.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}
		if let Some(body) = request.body {
			builder = builder.body(body);
		}

		let send = async {
			let response = builder
				.send()
				.await
				.map_err(|e| NetworkError::Transport(e.to_string()))?;
			let status = response.status().as_u16();
			let body = response.text().await.ok();
			Ok::<_, NetworkError>(TransportResponse { status, body })
		};

		tokio::select! {
			result = send => result,
			_ = request.signal.cancelled() => {
				Err(NetworkError::Transport("request aborted".to_string()))
			}
		}
	}
}

#[async_trait]
impl Transport for ReqwestTransport {
	async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
		trace!(
			method = %request.method,
			url = %request.url,
			priority = ?request.priority,
			keepalive = request.keepalive,
			"sending request"
		);

		if !request.keepalive {
			return Self::exchange(self.client.clone(), request).await;
		}

		// A keepalive exchange runs on its own task so it completes even if the
		// caller is dropped during teardown.
		let handle = tokio::spawn(Self::exchange(self.client.clone(), request));
		handle
			.await
			.map_err(|e| NetworkError::Transport(format!("keepalive task failed: {e}")))?
	}
}
