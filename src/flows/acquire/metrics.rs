// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::flows::AcquireStrategy;

/// Thread-safe counters for credential-acquisition outcomes.
///
/// The per-strategy adoption counters let callers and tests assert the
/// short-circuit properties of the chain without instrumenting collaborators.
#[derive(Debug, Default)]
pub struct AcquireMetrics {
	attempts: AtomicU64,
	failures: AtomicU64,
	cached: AtomicU64,
	backend: AtomicU64,
	silent: AtomicU64,
	interactive: AtomicU64,
}
impl AcquireMetrics {
	/// Returns the total number of acquisition attempts.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of acquisitions that exhausted the chain or failed
	/// to bootstrap.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Returns the number of acquisitions satisfied by the given strategy.
	pub fn adoptions(&self, strategy: AcquireStrategy) -> u64 {
		self.counter(strategy).load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_adoption(&self, strategy: AcquireStrategy) {
		self.counter(strategy).fetch_add(1, Ordering::Relaxed);
	}

	fn counter(&self, strategy: AcquireStrategy) -> &AtomicU64 {
		match strategy {
			AcquireStrategy::CachedCredential => &self.cached,
			AcquireStrategy::BackendIssued => &self.backend,
			AcquireStrategy::SilentReauthorize => &self.silent,
			AcquireStrategy::InteractiveReauthorize => &self.interactive,
		}
	}
}
