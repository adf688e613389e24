// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"picker_broker_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a swallowed credential-strategy failure.
///
/// Strategy skips are the one place the broker recovers silently, so they get
/// their own counter and a debug event to keep the fall-through auditable.
pub fn record_strategy_skip(strategy: &'static str, reason: &str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(strategy, reason, "Credential-acquisition strategy skipped.");
	#[cfg(feature = "metrics")]
	metrics::counter!("picker_broker_strategy_skip_total", "strategy" => strategy).increment(1);

	let _ = (strategy, reason);
}
