//! Always-on refresh counters, independent of the `metrics` feature.

// std
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
// self
use crate::_prelude::*;

/// Live counters owned by a [`RefreshCoordinator`](crate::refresh::RefreshCoordinator).
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	led: AtomicU64,
	refreshed: AtomicU64,
	ended: AtomicU64,
	joined: AtomicU64,
}
impl RefreshMetrics {
	/// Refresh cycles started (one per leader).
	pub fn attempts(&self) -> u64 {
		self.led.load(Relaxed)
	}

	/// Cycles that stored a new access token.
	pub fn successes(&self) -> u64 {
		self.refreshed.load(Relaxed)
	}

	/// Cycles that ended the session.
	pub fn failures(&self) -> u64 {
		self.ended.load(Relaxed)
	}

	/// Callers that waited on an in-flight cycle instead of starting one.
	pub fn coalesced(&self) -> u64 {
		self.joined.load(Relaxed)
	}

	/// Point-in-time copy of every counter.
	pub fn snapshot(&self) -> RefreshStats {
		RefreshStats {
			attempts: self.attempts(),
			successes: self.successes(),
			failures: self.failures(),
			coalesced: self.coalesced(),
		}
	}

	pub(crate) fn record_attempt(&self) {
		self.led.fetch_add(1, Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.refreshed.fetch_add(1, Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.ended.fetch_add(1, Relaxed);
	}

	pub(crate) fn record_coalesced(&self) {
		self.joined.fetch_add(1, Relaxed);
	}
}

/// Serializable view of [`RefreshMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshStats {
	/// Refresh cycles started.
	pub attempts: u64,
	/// Cycles that stored a new access token.
	pub successes: u64,
	/// Cycles that ended the session.
	pub failures: u64,
	/// Callers that joined an in-flight cycle.
	pub coalesced: u64,
}
