//! Span plumbing behind the `tracing` feature.

// std
#[cfg(not(feature = "tracing"))] use std::marker::PhantomData;
// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome},
};

/// Future returned by [`FlowSpan::instrument`].
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`].
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// One `authgate.flow` span per flow invocation, carrying `flow`, `stage`, and `outcome`.
///
/// Without the `tracing` feature only the flow kind is kept.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	kind: FlowKind,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for `kind` at the named call site.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		let span = tracing::info_span!(
			"authgate.flow",
			flow = kind.as_str(),
			stage,
			outcome = tracing::field::Empty
		);
		#[cfg(not(feature = "tracing"))]
		let _ = stage;

		Self {
			kind,
			#[cfg(feature = "tracing")]
			span,
		}
	}

	/// Flow kind this span belongs to.
	pub fn kind(&self) -> FlowKind {
		self.kind
	}

	/// Stamps the final outcome onto the span.
	pub fn record(&self, outcome: FlowOutcome) {
		#[cfg(feature = "tracing")]
		self.span.record("outcome", outcome.as_str());
		#[cfg(not(feature = "tracing"))]
		let _ = outcome;
	}

	/// Enters the span for a synchronous section; never hold the guard across `.await`.
	pub fn entered(&self) -> FlowSpanGuard<'_> {
		FlowSpanGuard {
			#[cfg(feature = "tracing")]
			_entered: self.span.enter(),
			#[cfg(not(feature = "tracing"))]
			_span: PhantomData,
		}
	}

	/// Attaches the span to `fut`.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Guard returned by [`FlowSpan::entered`].
pub struct FlowSpanGuard<'a> {
	#[cfg(feature = "tracing")]
	_entered: tracing::span::Entered<'a>,
	#[cfg(not(feature = "tracing"))]
	_span: PhantomData<&'a FlowSpan>,
}
impl Debug for FlowSpanGuard<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FlowSpanGuard")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn guard_and_record_work_with_any_feature_set() {
		let span = FlowSpan::new(FlowKind::Navigation, "guard_and_record");

		{
			let _entered = span.entered();

			span.record(FlowOutcome::Success);
		}

		assert_eq!(span.kind(), FlowKind::Navigation);
	}

	#[tokio::test]
	async fn instrumented_futures_keep_their_output() {
		let span = FlowSpan::new(FlowKind::Request, "instrumented_futures");

		assert_eq!(span.instrument(async { "done" }).await, "done");
	}
}
