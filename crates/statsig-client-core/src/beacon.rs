// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One-way delivery used at process teardown.

use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;

const BEACON_TIMEOUT: Duration = Duration::from_secs(10);
const WORKER_NAME: &str = "statsig-beacon";

/// Fire-and-forget send primitive.
///
/// `send_beacon` returns whether the payload was accepted for delivery. There
/// is no response.
pub trait BeaconSender: Send + Sync + 'static {
	fn send_beacon(&self, url: Url, body: String) -> bool;

	/// Blocks until every accepted beacon has been attempted or `timeout`
	/// elapses. Returns `false` on timeout.
	fn flush(&self, _timeout: Duration) -> bool {
		true
	}
}

pub type SharedBeaconSender = Arc<dyn BeaconSender>;

#[derive(Debug)]
enum BeaconMessage {
	Deliver { url: Url, body: String },
	Flush(std_mpsc::Sender<()>),
}

/// Beacon backed by a dedicated worker thread that owns its own runtime and
/// HTTP client.
///
/// Deliveries do not depend on the caller's runtime, so shutting that runtime
/// down does not abort them. The worker drains its queue and exits once every
/// handle is dropped.
#[derive(Debug, Clone)]
pub struct ReqwestBeacon {
	sender: mpsc::UnboundedSender<BeaconMessage>,
}

impl ReqwestBeacon {
	/// Starts the worker. Returns `None` if the worker thread, its runtime or
	/// its client cannot be created.
	pub fn probe() -> Option<Self> {
		let (sender, receiver) = mpsc::unbounded_channel();
		let (ready_tx, ready_rx) = std_mpsc::channel();

		let spawned = std::thread::Builder::new()
			.name(WORKER_NAME.to_string())
			.spawn(move || run_worker(receiver, ready_tx));
		if let Err(e) = spawned {
			warn!(error = %e, "failed to spawn beacon worker, beacon unsupported");
			return None;
		}

		match ready_rx.recv() {
			Ok(true) => Some(Self { sender }),
			_ => None,
		}
	}
}

impl BeaconSender for ReqwestBeacon {
	fn send_beacon(&self, url: Url, body: String) -> bool {
		match self.sender.send(BeaconMessage::Deliver { url, body }) {
			Ok(()) => true,
			Err(_) => {
				warn!("beacon worker has stopped, beacon dropped");
				false
			}
		}
	}

	fn flush(&self, timeout: Duration) -> bool {
		let (done_tx, done_rx) = std_mpsc::channel();
		if self.sender.send(BeaconMessage::Flush(done_tx)).is_err() {
			return false;
		}
		done_rx.recv_timeout(timeout).is_ok()
	}
}

fn run_worker(mut receiver: mpsc::UnboundedReceiver<BeaconMessage>, ready: std_mpsc::Sender<bool>) {
	let client = match statsig_common_http::builder().timeout(BEACON_TIMEOUT).build() {
		Ok(client) => client,
		Err(e) => {
			warn!(error = %e, "failed to build beacon client, beacon unsupported");
			let _ = ready.send(false);
			return;
		}
	};
	let runtime = match tokio::runtime::Builder::new_current_thread()
		.enable_all()
		.build()
	{
		Ok(runtime) => runtime,
		Err(e) => {
			warn!(error = %e, "failed to start beacon runtime, beacon unsupported");
			let _ = ready.send(false);
			return;
		}
	};
	let _ = ready.send(true);

	// Messages are handled in order, so a flush is acknowledged only after
	// every earlier delivery has resolved.
	runtime.block_on(async move {
		while let Some(message) = receiver.recv().await {
			match message {
				BeaconMessage::Deliver { url, body } => deliver(&client, url, body).await,
				BeaconMessage::Flush(done) => {
					let _ = done.send(());
				}
			}
		}
	});
	debug!("beacon worker stopped");
}

async fn deliver(client: &Client, url: Url, body: String) {
	match client
		.post(url.clone())
		.header("Content-Type", "text/plain")
		.body(body)
		.send()
		.await
	{
		Ok(response) => {
			debug!(url = %url, status = response.status().as_u16(), "beacon delivered");
		}
		Err(e) => {
			warn!(url = %url, error = %e, "beacon delivery failed");
		}
	}
}
