//! Observability helpers for client operations.
//!
//! - Every token-lifecycle call and Web API request runs inside a `spotifyle_client.operation`
//!   span carrying `operation` and `stage` fields.
//! - Enable the `metrics` feature to increment `spotifyle_client_operation_total` for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod recorder;
mod span;

pub use recorder::*;
pub use span::*;

// self
use crate::_prelude::*;

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Authorization-code exchange.
	CodeExchange,
	/// Refresh-token grant.
	Refresh,
	/// Token revocation.
	Revoke,
	/// Web API request, including retries.
	ApiRequest,
}
impl Operation {
	/// Stable label for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::CodeExchange => "code_exchange",
			Operation::Refresh => "refresh",
			Operation::Revoke => "revoke",
			Operation::ApiRequest => "api_request",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded per operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to the operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure returned to the caller.
	Failure,
}
impl Outcome {
	/// Stable label for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}

	/// Success or failure label for `result`.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { Outcome::Success } else { Outcome::Failure }
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
