//! Navigation side channel: the hosting shell performs redirects requested by the core.

// self
use crate::_prelude::*;

/// Receives redirect requests (`/login`, `/dashboard`, ...) emitted by the client and the guard.
///
/// Redirects are events, not return values: the core asks, the shell decides how to navigate.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Requests navigation to `location`.
	fn redirect(&self, location: &str);
}
impl<F> Navigator for F
where
	F: Send + Sync + Fn(&str),
{
	fn redirect(&self, location: &str) {
		self(location)
	}
}

/// Navigator that drops every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNavigator;
impl Navigator for NoopNavigator {
	fn redirect(&self, _location: &str) {}
}

/// Navigator that records every request; clones share the same history.
///
/// Useful for shells that apply the last redirect after a request completes (server-side
/// rendering) and for tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingNavigator(Arc<Mutex<Vec<String>>>);
impl RecordingNavigator {
	/// Returns every recorded location, oldest first.
	pub fn history(&self) -> Vec<String> {
		self.0.lock().clone()
	}

	/// Returns the most recent location.
	pub fn last(&self) -> Option<String> {
		self.0.lock().last().cloned()
	}

	/// Number of recorded redirects.
	pub fn count(&self) -> usize {
		self.0.lock().len()
	}

	/// Drains the recorded history.
	pub fn take(&self) -> Vec<String> {
		std::mem::take(&mut *self.0.lock())
	}
}
impl Navigator for RecordingNavigator {
	fn redirect(&self, location: &str) {
		self.0.lock().push(location.to_owned());
	}
}
