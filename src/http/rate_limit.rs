//! Rate-limit bookkeeping fed by `X-RateLimit-*` response headers.

// crates.io
use reqwest::header::HeaderMap;
// self
use crate::_prelude::*;

const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const LIMIT_HEADER: &str = "x-ratelimit-limit";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Last known rate-limit window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitState {
	/// Requests left in the current window.
	pub remaining: i64,
	/// Window size.
	pub limit: i64,
	/// Window reset in unix seconds.
	pub reset_time: i64,
}
impl RateLimitState {
	/// Overwrites each field whose header is present and numeric.
	pub fn update_from_headers(&mut self, headers: &HeaderMap) {
		let read = |name: &str| {
			headers
				.get(name)
				.and_then(|value| value.to_str().ok())
				.and_then(|raw| raw.trim().parse::<i64>().ok())
		};

		if let Some(remaining) = read(REMAINING_HEADER) {
			self.remaining = remaining;
		}
		if let Some(limit) = read(LIMIT_HEADER) {
			self.limit = limit;
		}
		if let Some(reset) = read(RESET_HEADER) {
			self.reset_time = reset;
		}
	}

	/// Returns `true` when the window has no requests left.
	pub fn is_exhausted(&self) -> bool {
		self.remaining <= 0
	}

	/// Time to wait before sending at `now`; `None` unless the budget is spent and the reset
	/// lies in the future.
	pub fn wait_at(&self, now: OffsetDateTime) -> Option<StdDuration> {
		if !self.is_exhausted() {
			return None;
		}

		let reset = OffsetDateTime::from_unix_timestamp(self.reset_time).ok()?;

		if reset <= now {
			return None;
		}

		StdDuration::try_from(reset - now).ok()
	}
}
impl Default for RateLimitState {
	fn default() -> Self {
		Self { remaining: 100, limit: 100, reset_time: 0 }
	}
}

/// Shared, lock-protected [`RateLimitState`] for one client.
#[derive(Debug, Default)]
pub struct RateLimitTracker(Mutex<RateLimitState>);
impl RateLimitTracker {
	/// Copy of the current state.
	pub fn snapshot(&self) -> RateLimitState {
		*self.0.lock()
	}

	/// Folds response headers into the state and returns the new snapshot.
	pub fn observe(&self, headers: &HeaderMap) -> RateLimitState {
		let mut state = self.0.lock();

		state.update_from_headers(headers);

		*state
	}

	/// Wait required before the next send at `now`.
	pub fn pending_wait(&self, now: OffsetDateTime) -> Option<StdDuration> {
		self.0.lock().wait_at(now)
	}
}
