//! Optional observability helpers for client flows.
//!
//! # Feature Flags
//!
//! - `tracing`: every flow runs inside an `authgate.flow` span (`flow`, `stage`, `outcome`), and
//!   terminated sessions emit a warning event.
//! - `metrics`: `authgate_flow_total{flow, outcome}` counts attempts and results;
//!   `authgate_redirect_total{flow, target}` counts redirects handed to the navigator.

mod counter;
mod span;

pub use counter::*;
pub use span::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the client and the guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// An outbound API call, including its refresh-and-retry cycle.
	Request,
	/// A refresh-token exchange led by this caller.
	Refresh,
	/// Login, registration, and logout helpers.
	Account,
	/// Route guard enforcement.
	Navigation,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Request => "request",
			FlowKind::Refresh => "refresh",
			FlowKind::Account => "account",
			FlowKind::Navigation => "navigation",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}

	/// Maps a result onto the success/failure labels.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		match result {
			Ok(_) => FlowOutcome::Success,
			Err(_) => FlowOutcome::Failure,
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Redirect destinations, used as a metric label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RedirectTarget {
	/// The login entry point.
	Login,
	/// The authenticated landing page.
	Home,
}
impl RedirectTarget {
	/// Returns a stable label suitable for metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RedirectTarget::Login => "login",
			RedirectTarget::Home => "home",
		}
	}
}

/// Runs `flow` inside a [`FlowSpan`], recording the attempt and the outcome.
pub(crate) async fn observe<T, E, Fut>(kind: FlowKind, stage: &'static str, flow: Fut) -> Result<T, E>
where
	Fut: Future<Output = Result<T, E>>,
{
	let span = FlowSpan::new(kind, stage);

	record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = span.instrument(flow).await;
	let outcome = FlowOutcome::of(&result);

	span.record(outcome);
	record_flow_outcome(kind, outcome);

	result
}

/// Emits a warning event when the `tracing` feature is enabled.
pub(crate) fn warn(kind: FlowKind, message: &str) {
	#[cfg(feature = "tracing")]
	{
		::tracing::warn!(flow = kind.as_str(), "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, message);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn observe_passes_results_through() {
		let ok: Result<u8, &str> = observe(FlowKind::Request, "observe_ok", async { Ok(7) }).await;
		let err: Result<u8, &str> =
			observe(FlowKind::Account, "observe_err", async { Err("rejected") }).await;

		assert_eq!(ok, Ok(7));
		assert_eq!(err, Err("rejected"));
		assert_eq!(FlowOutcome::of(&err), FlowOutcome::Failure);
	}
}
