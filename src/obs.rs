//! Optional observability helpers for broker flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `picker_broker.flow` with the `flow` and
//!   `stage` (call site) fields, plus debug events for swallowed strategy skips.
//! - Enable `metrics` to increment the `picker_broker_flow_total` counter for every
//!   attempt/success/failure (labeled by `flow` + `outcome`) and the
//!   `picker_broker_strategy_skip_total` counter (labeled by `strategy`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Broker flows observed by the instrumentation shims.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Library bootstrap (script injection + readiness poll + init).
	Bootstrap,
	/// Credential acquisition via the strategy chain.
	AcquireToken,
	/// Remote file-selection session, including result dispatch.
	Selection,
	/// Local-file upload path.
	LocalUpload,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Bootstrap => "bootstrap",
			FlowKind::AcquireToken => "acquire_token",
			FlowKind::Selection => "selection",
			FlowKind::LocalUpload => "local_upload",
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
	/// Entry to a broker helper.
	Attempt,
	/// Successful completion (including a cancelled selection).
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
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
