// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deadline-bounded attempts with bounded retry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use statsig_common_http::{retry, RetryConfig};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::diagnostics::Diagnostics;
use crate::error::{NetworkError, Result};
use crate::events::{ClientEvent, SharedEventObserver};
use crate::request::{ensure_valid_sdk_key, RequestDescriptor, ResponseEnvelope};
use crate::request_builder::RequestBuilder;
use crate::transport::{SharedTransport, TransportRequest};

const NO_TEXT: &str = "No Text";

/// Deadline for a single attempt. Exactly one is alive per in-flight attempt;
/// it is cleared when dropped.
struct DeadlineTimer {
	deadline: Instant,
	timeout: Duration,
	signal: CancellationToken,
	diagnostics: Arc<Diagnostics>,
}

impl DeadlineTimer {
	fn start(timeout: Duration, diagnostics: Arc<Diagnostics>) -> Self {
		diagnostics.timer_started();
		Self {
			deadline: Instant::now() + timeout,
			timeout,
			signal: CancellationToken::new(),
			diagnostics,
		}
	}

	fn signal(&self) -> CancellationToken {
		self.signal.clone()
	}

	async fn expired(&self) {
		tokio::time::sleep_until(self.deadline).await
	}

	/// Cancels the in-flight attempt and returns the recorded reason.
	fn abort(&self) -> NetworkError {
		self.signal.cancel();
		let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
		NetworkError::Timeout {
			timeout_ms,
			reason: format!("Timeout of {timeout_ms}ms expired."),
		}
	}
}

impl Drop for DeadlineTimer {
	fn drop(&mut self) {
		self.diagnostics.timer_cleared();
	}
}

/// Runs a [`RequestDescriptor`] to completion: one deadline per attempt,
/// immediate (or configured) retry, and a sentinel result.
pub struct TransportExecutor {
	transport: SharedTransport,
	request_builder: Arc<RequestBuilder>,
	timeout: Duration,
	retry_config: RetryConfig,
	observer: Option<SharedEventObserver>,
	diagnostics: Arc<Diagnostics>,
	prevent_all_network_traffic: AtomicBool,
	unloading: AtomicBool,
}

impl TransportExecutor {
	pub fn new(
		transport: SharedTransport,
		request_builder: Arc<RequestBuilder>,
		timeout: Duration,
		retry_config: RetryConfig,
		diagnostics: Arc<Diagnostics>,
	) -> Self {
		Self {
			transport,
			request_builder,
			timeout,
			retry_config,
			observer: None,
			diagnostics,
			prevent_all_network_traffic: AtomicBool::new(false),
			unloading: AtomicBool::new(false),
		}
	}

	pub fn with_observer(mut self, observer: Option<SharedEventObserver>) -> Self {
		self.observer = observer;
		self
	}

	pub fn with_prevent_all_network_traffic(self, prevent: bool) -> Self {
		self.set_prevent_all_network_traffic(prevent);
		self
	}

	pub fn set_prevent_all_network_traffic(&self, prevent: bool) {
		self.prevent_all_network_traffic.store(prevent, Ordering::SeqCst);
	}

	pub fn is_network_traffic_prevented(&self) -> bool {
		self.prevent_all_network_traffic.load(Ordering::SeqCst)
	}

	/// Marks the process as tearing down; later requests are sent keepalive.
	pub fn set_unloading(&self, unloading: bool) {
		self.unloading.store(unloading, Ordering::SeqCst);
	}

	pub fn is_unloading(&self) -> bool {
		self.unloading.load(Ordering::SeqCst)
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	pub fn diagnostics(&self) -> &Arc<Diagnostics> {
		&self.diagnostics
	}

	/// Executes `descriptor`, retrying failed attempts while its budget
	/// allows. Every failure resolves to `None`.
	pub async fn execute(&self, descriptor: RequestDescriptor) -> Option<ResponseEnvelope> {
		if !ensure_valid_sdk_key(&descriptor.sdk_key) {
			return None;
		}
		if self.is_network_traffic_prevented() {
			debug!(url = %descriptor.url, "network traffic prevented, skipping request");
			return None;
		}

		let config = self.retry_config.with_max_retries(descriptor.retry_budget());
		let result = retry(&config, |attempt| self.attempt(descriptor.for_attempt(attempt))).await;

		match result {
			Ok(response) => Some(response),
			Err(NetworkError::TrafficPrevented) => {
				debug!(url = %descriptor.url, "network traffic prevented mid-request");
				None
			}
			Err(e) => {
				error!(
					method = %descriptor.method,
					url = %descriptor.url,
					error = %e,
					"request failed"
				);
				if let Some(observer) = &self.observer {
					observer.on_event(&ClientEvent::Error { error: e });
				}
				None
			}
		}
	}

	async fn attempt(&self, descriptor: RequestDescriptor) -> Result<ResponseEnvelope> {
		if self.is_network_traffic_prevented() {
			return Err(NetworkError::TrafficPrevented);
		}

		let timer = DeadlineTimer::start(self.timeout, Arc::clone(&self.diagnostics));
		let outcome = tokio::select! {
			result = self.exchange(&descriptor, timer.signal()) => result,
			_ = timer.expired() => Err(timer.abort()),
		};
		drop(timer);
		self.diagnostics.mark();

		debug!(
			method = %descriptor.method,
			url = %descriptor.url,
			retries_remaining = descriptor.retries_remaining,
			ok = outcome.is_ok(),
			"attempt resolved"
		);
		outcome
	}

	async fn exchange(
		&self,
		descriptor: &RequestDescriptor,
		signal: CancellationToken,
	) -> Result<ResponseEnvelope> {
		let url = self
			.request_builder
			.populated_url(&descriptor.sdk_key, &descriptor.url, &descriptor.params)
			.await?;

		let request = TransportRequest {
			method: descriptor.method,
			url,
			headers: descriptor.headers.clone(),
			body: descriptor.body.clone(),
			priority: descriptor.priority,
			keepalive: self.is_unloading(),
			signal,
		};

		let response = self.transport.send(request).await?;
		if !response.is_success() {
			return Err(NetworkError::Http {
				url: descriptor.url.clone(),
				status: response.status,
				message: response.body.unwrap_or_else(|| NO_TEXT.to_string()),
			});
		}

		Ok(ResponseEnvelope {
			body: response.body,
			code: response.status,
		})
	}
}

impl std::fmt::Debug for TransportExecutor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TransportExecutor")
			.field("timeout", &self.timeout)
			.field("retry_config", &self.retry_config)
			.field("has_observer", &self.observer.is_some())
			.field("prevent_all_network_traffic", &self.is_network_traffic_prevented())
			.field("unloading", &self.is_unloading())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use crate::events::ClientEvent;
	use crate::request::{HttpMethod, NetworkPriority};
	use crate::request_builder::tests::fixed_builder;
	use crate::transport::{Transport, TransportResponse};
	use async_trait::async_trait;
	use parking_lot::Mutex;
	use std::collections::{BTreeMap, VecDeque};
	use std::sync::atomic::AtomicU32;

	/// Scripted transport. Replays `responses` in order, repeating the last.
	pub(crate) struct MockTransport {
		pub(crate) calls: AtomicU32,
		pub(crate) requests: Mutex<Vec<TransportRequest>>,
		responses: Mutex<VecDeque<Result<TransportResponse>>>,
		hang: bool,
	}

	impl MockTransport {
		pub(crate) fn new(responses: Vec<Result<TransportResponse>>) -> Self {
			Self {
				calls: AtomicU32::new(0),
				requests: Mutex::new(Vec::new()),
				responses: Mutex::new(responses.into()),
				hang: false,
			}
		}

		pub(crate) fn status(status: u16, body: Option<&str>) -> Self {
			Self::new(vec![Ok(TransportResponse {
				status,
				body: body.map(str::to_string),
			})])
		}

		pub(crate) fn hanging() -> Self {
			Self {
				hang: true,
				..Self::new(Vec::new())
			}
		}

		pub(crate) fn call_count(&self) -> u32 {
			self.calls.load(Ordering::SeqCst)
		}
	}

	#[async_trait]
	impl Transport for MockTransport {
		async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			let signal = request.signal.clone();
			self.requests.lock().push(request);

			if self.hang {
				signal.cancelled().await;
				return Err(NetworkError::Transport("aborted".to_string()));
			}

			let mut responses = self.responses.lock();
			if responses.len() > 1 {
				responses.pop_front().unwrap_or_else(|| Err(NetworkError::Transport("empty".into())))
			} else {
				responses
					.front()
					.cloned()
					.unwrap_or_else(|| Err(NetworkError::Transport("empty".into())))
			}
		}
	}

	pub(crate) fn recording_observer() -> (SharedEventObserver, Arc<Mutex<Vec<ClientEvent>>>) {
		let events = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&events);
		let observer: SharedEventObserver = Arc::new(move |event: &ClientEvent| {
			sink.lock().push(event.clone());
		});
		(observer, events)
	}

	fn executor(transport: Arc<MockTransport>) -> TransportExecutor {
		TransportExecutor::new(
			transport,
			Arc::new(fixed_builder()),
			Duration::from_millis(10_000),
			RetryConfig::default(),
			Arc::new(Diagnostics::new()),
		)
	}

	fn descriptor(sdk_key: &str, retries: i32) -> RequestDescriptor {
		RequestDescriptor {
			sdk_key: sdk_key.to_string(),
			url: "https://example.com/v1/initialize".to_string(),
			method: HttpMethod::Post,
			params: BTreeMap::new(),
			headers: BTreeMap::new(),
			body: Some("{}".to_string()),
			priority: NetworkPriority::Auto,
			retries_remaining: retries,
		}
	}

	#[tokio::test]
	async fn test_success_returns_envelope_without_retry() {
		let transport = Arc::new(MockTransport::status(200, Some(r#"{"ok":true}"#)));
		let executor = executor(Arc::clone(&transport));

		let response = executor.execute(descriptor("client-key", 3)).await.unwrap();

		assert_eq!(response.code, 200);
		assert_eq!(response.body.as_deref(), Some(r#"{"ok":true}"#));
		assert_eq!(transport.call_count(), 1);
		assert_eq!(executor.diagnostics().marks(), 1);
		assert_eq!(executor.diagnostics().active_timers(), 0);
	}

	#[tokio::test]
	async fn test_server_error_retries_then_emits_once() {
		let transport = Arc::new(MockTransport::status(500, Some("boom")));
		let (observer, events) = recording_observer();
		let executor = executor(Arc::clone(&transport)).with_observer(Some(observer));

		let response = executor.execute(descriptor("client-key", 2)).await;

		assert!(response.is_none());
		assert_eq!(transport.call_count(), 3);
		let events = events.lock();
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].name(), "error");
		let ClientEvent::Error { error } = &events[0];
		assert_eq!(
			error.to_string(),
			"NetworkError: https://example.com/v1/initialize boom"
		);
	}

	#[tokio::test]
	async fn test_unreadable_body_uses_placeholder() {
		let transport = Arc::new(MockTransport::status(503, None));
		let (observer, events) = recording_observer();
		let executor = executor(transport).with_observer(Some(observer));

		assert!(executor.execute(descriptor("client-key", 0)).await.is_none());
		let ClientEvent::Error { error } = &events.lock()[0];
		assert!(matches!(error, NetworkError::Http { status: 503, message, .. } if message == "No Text"));
	}

	#[tokio::test]
	async fn test_recovers_on_later_attempt() {
		let transport = Arc::new(MockTransport::new(vec![
			Err(NetworkError::Transport("reset".into())),
			Ok(TransportResponse {
				status: 200,
				body: Some("ok".into()),
			}),
		]));
		let (observer, events) = recording_observer();
		let executor = executor(Arc::clone(&transport)).with_observer(Some(observer));

		let response = executor.execute(descriptor("client-key", 1)).await.unwrap();
		assert_eq!(response.body.as_deref(), Some("ok"));
		assert_eq!(transport.call_count(), 2);
		assert!(events.lock().is_empty());
		assert_eq!(executor.diagnostics().marks(), 2);
	}

	#[tokio::test]
	async fn test_empty_sdk_key_never_sends() {
		let transport = Arc::new(MockTransport::status(200, None));
		let (observer, events) = recording_observer();
		let executor = executor(Arc::clone(&transport)).with_observer(Some(observer));

		assert!(executor.execute(descriptor("", 2)).await.is_none());
		assert_eq!(transport.call_count(), 0);
		assert!(events.lock().is_empty());
	}

	#[tokio::test]
	async fn test_kill_switch_short_circuits() {
		let transport = Arc::new(MockTransport::status(200, None));
		let (observer, events) = recording_observer();
		let executor = executor(Arc::clone(&transport))
			.with_observer(Some(observer))
			.with_prevent_all_network_traffic(true);

		assert!(executor.execute(descriptor("client-key", 2)).await.is_none());
		assert_eq!(transport.call_count(), 0);
		assert!(events.lock().is_empty());
		assert_eq!(executor.diagnostics().timers_started(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_timeout_aborts_each_attempt() {
		let transport = Arc::new(MockTransport::hanging());
		let (observer, events) = recording_observer();
		let diagnostics = Arc::new(Diagnostics::new());
		let executor = TransportExecutor::new(
			Arc::clone(&transport) as SharedTransport,
			Arc::new(fixed_builder()),
			Duration::from_millis(250),
			RetryConfig::default(),
			Arc::clone(&diagnostics),
		)
		.with_observer(Some(observer));

		assert!(executor.execute(descriptor("client-key", 1)).await.is_none());

		assert_eq!(transport.call_count(), 2);
		assert!(transport
			.requests
			.lock()
			.iter()
			.all(|r| r.signal.is_cancelled()));
		assert_eq!(diagnostics.timers_started(), 2);
		assert_eq!(diagnostics.peak_active_timers(), 1);
		assert_eq!(diagnostics.active_timers(), 0);

		let events = events.lock();
		assert_eq!(events.len(), 1);
		let ClientEvent::Error { error } = &events[0];
		assert_eq!(error.to_string(), "Timeout of 250ms expired.");
	}

	#[tokio::test]
	async fn test_one_timer_alive_per_attempt() {
		let transport = Arc::new(MockTransport::status(500, None));
		let executor = executor(transport);

		executor.execute(descriptor("client-key", 4)).await;

		let diagnostics = executor.diagnostics();
		assert_eq!(diagnostics.timers_started(), 5);
		assert_eq!(diagnostics.peak_active_timers(), 1);
		assert_eq!(diagnostics.active_timers(), 0);
	}

	#[tokio::test]
	async fn test_unloading_sets_keepalive() {
		let transport = Arc::new(MockTransport::status(200, None));
		let executor = executor(Arc::clone(&transport));

		executor.execute(descriptor("client-key", 0)).await;
		executor.set_unloading(true);
		executor.execute(descriptor("client-key", 0)).await;

		let requests = transport.requests.lock();
		assert!(!requests[0].keepalive);
		assert!(requests[1].keepalive);
	}

	#[tokio::test]
	async fn test_url_is_populated_per_attempt() {
		let transport = Arc::new(MockTransport::status(200, None));
		let executor = executor(Arc::clone(&transport));

		executor.execute(descriptor("client-key", 0)).await;

		let requests = transport.requests.lock();
		let query: BTreeMap<String, String> = requests[0].url.query_pairs().into_owned().collect();
		assert_eq!(query["k"], "client-key");
		assert_eq!(query["sid"], "session-456");
	}
}
