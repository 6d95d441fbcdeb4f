// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for refresh-grant calls.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl RefreshMetrics {
	/// Refresh grants sent to the token endpoint.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Refresh grants that produced stored tokens.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Refresh grants that failed and discarded the stored tokens.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_outcome(&self, succeeded: bool) {
		let counter = if succeeded { &self.success } else { &self.failure };

		counter.fetch_add(1, Ordering::Relaxed);
	}
}
