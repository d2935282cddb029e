// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Counters recorded by the transport executor.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Diagnostics {
	marks: AtomicU64,
	active_timers: AtomicU64,
	peak_active_timers: AtomicU64,
	timers_started: AtomicU64,
}

impl Diagnostics {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one resolved attempt.
	pub fn mark(&self) {
		self.marks.fetch_add(1, Ordering::Relaxed);
	}

	pub fn marks(&self) -> u64 {
		self.marks.load(Ordering::Relaxed)
	}

	/// Deadline timers currently alive.
	pub fn active_timers(&self) -> u64 {
		self.active_timers.load(Ordering::SeqCst)
	}

	/// Largest number of deadline timers alive at once.
	pub fn peak_active_timers(&self) -> u64 {
		self.peak_active_timers.load(Ordering::SeqCst)
	}

	pub fn timers_started(&self) -> u64 {
		self.timers_started.load(Ordering::SeqCst)
	}

	pub(crate) fn timer_started(&self) {
		self.timers_started.fetch_add(1, Ordering::SeqCst);
		let active = self.active_timers.fetch_add(1, Ordering::SeqCst) + 1;
		self.peak_active_timers.fetch_max(active, Ordering::SeqCst);
	}

	pub(crate) fn timer_cleared(&self) {
		self.active_timers.fetch_sub(1, Ordering::SeqCst);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_timer_accounting() {
		let diagnostics = Diagnostics::new();
		diagnostics.timer_started();
		diagnostics.timer_started();
		diagnostics.timer_cleared();
		diagnostics.timer_started();

		assert_eq!(diagnostics.active_timers(), 2);
		assert_eq!(diagnostics.peak_active_timers(), 2);
		assert_eq!(diagnostics.timers_started(), 3);
	}

	#[test]
	fn test_marks() {
		let diagnostics = Diagnostics::new();
		diagnostics.mark();
		diagnostics.mark();
		assert_eq!(diagnostics.marks(), 2);
	}
}
