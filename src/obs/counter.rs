//! Counters behind the `metrics` feature; no-ops otherwise.

// self
use crate::obs::{FlowKind, FlowOutcome, RedirectTarget};

#[cfg(feature = "metrics")] const FLOW_TOTAL: &str = "authgate_flow_total";
#[cfg(feature = "metrics")] const REDIRECT_TOTAL: &str = "authgate_redirect_total";

/// Increments `authgate_flow_total{flow, outcome}`.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(FLOW_TOTAL, "flow" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Increments `authgate_redirect_total{flow, target}` for every redirect handed to a navigator.
pub fn record_redirect(kind: FlowKind, target: RedirectTarget) {
	#[cfg(feature = "metrics")]
	metrics::counter!(REDIRECT_TOTAL, "flow" => kind.as_str(), "target" => target.as_str())
		.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, target);
}
