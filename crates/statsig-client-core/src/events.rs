// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client events surfaced to an external observer.

use std::sync::Arc;

use crate::error::NetworkError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
	/// A request failed after exhausting its retries.
	Error { error: NetworkError },
}

impl ClientEvent {
	pub fn name(&self) -> &'static str {
		match self {
			ClientEvent::Error { .. } => "error",
		}
	}
}

/// Receives [`ClientEvent`]s. Called inline, so implementations should not block.
pub trait ClientEventObserver: Send + Sync + 'static {
	fn on_event(&self, event: &ClientEvent);
}

pub type SharedEventObserver = Arc<dyn ClientEventObserver>;

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl ClientEventObserver for NoOpObserver {
	fn on_event(&self, _event: &ClientEvent) {}
}

impl<F> ClientEventObserver for F
where
	F: Fn(&ClientEvent) + Send + Sync + 'static,
{
	fn on_event(&self, event: &ClientEvent) {
		self(event)
	}
}
