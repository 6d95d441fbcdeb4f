//! Client-level error types shared by the token manager, HTTP client, cache, and API surface.

// self
use crate::{_prelude::*, http::RequestContext};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token lifecycle failure; the user must re-authenticate.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Spotify Web API or transport failure.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// HTTP 429 persisted through every retry.
	#[error(transparent)]
	RateLimit(#[from] RateLimitError),
	/// Token storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Response cache failure.
	#[error(transparent)]
	Cache(#[from] crate::cache::CacheError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// HTTP status attached to the failure, when one exists.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api(e) => Some(e.status),
			Self::RateLimit(_) => Some(429),
			Self::Auth(AuthError::RefreshFailed { source } | AuthError::ExchangeFailed { source }) =>
				source.status(),
			_ => None,
		}
	}

	/// Returns `true` when the caller must send the user through authorization again.
	pub fn requires_reauthentication(&self) -> bool {
		matches!(self, Self::Auth(_))
	}
}

/// Token lifecycle failures.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Nothing is stored for the user.
	#[error("No tokens found for user. Re-authentication required.")]
	NoTokens,
	/// Stored tokens cannot be refreshed.
	#[error("No refresh token available. Re-authentication required.")]
	MissingRefreshToken,
	/// Refresh grant failed; stored tokens were discarded.
	#[error("Token refresh failed: {source}")]
	RefreshFailed {
		/// Token endpoint failure.
		source: TokenRequestError,
	},
	/// Authorization-code exchange failed.
	#[error("Code exchange failed: {source}")]
	ExchangeFailed {
		/// Token endpoint failure.
		source: TokenRequestError,
	},
	/// Callback `state` does not match the value issued with the authorize URL.
	#[error("Authorization state does not match the issued value.")]
	StateMismatch,
}

/// Failures raised while calling the accounts token endpoint.
#[derive(Debug, ThisError)]
pub enum TokenRequestError {
	/// Endpoint answered with a non-2xx status.
	#[error("{description}")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// `error_description` from the body, or `HTTP {status}`.
		description: String,
	},
	/// Endpoint could not be reached.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Endpoint returned a 2xx body that is not a token response.
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
	/// Tokens could not be persisted.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
}
impl TokenRequestError {
	/// HTTP status attached to the failure, when one exists.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. } | Self::Parse { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Spotify Web API failure with the originating request context.
#[derive(Clone, Debug, ThisError)]
#[error("{message}")]
pub struct ApiError {
	/// Human-readable message.
	pub message: String,
	/// HTTP status code; `0` when no response was received.
	pub status: u16,
	/// Machine-readable code (Spotify error status or one of the associated constants).
	pub code: Option<String>,
	/// Request that produced the failure, credentials stripped.
	pub context: Option<RequestContext>,
}
impl ApiError {
	/// Code used when the transport never produced a response.
	pub const NETWORK_ERROR: &'static str = "NETWORK_ERROR";
	/// Code used for unexpected failures wrapped by the API surface.
	pub const REQUEST_ERROR: &'static str = "REQUEST_ERROR";
	/// Code used when a 2xx body could not be decoded.
	pub const PARSE_ERROR: &'static str = "PARSE_ERROR";

	/// Creates an error from its parts.
	pub fn new(
		message: impl Into<String>,
		status: u16,
		code: Option<String>,
		context: Option<RequestContext>,
	) -> Self {
		Self { message: message.into(), status, code, context: context.map(RequestContext::redacted) }
	}

	/// Transport failure after retries were exhausted.
	pub fn network(message: impl Into<String>, context: Option<RequestContext>) -> Self {
		Self::new(message, 0, Some(Self::NETWORK_ERROR.into()), context)
	}

	/// Unexpected failure surfaced by the API surface.
	pub fn request(message: impl Into<String>, context: Option<RequestContext>) -> Self {
		Self::new(message, 0, Some(Self::REQUEST_ERROR.into()), context)
	}

	/// Returns `true` when the code matches `code`.
	pub fn has_code(&self, code: &str) -> bool {
		self.code.as_deref() == Some(code)
	}

	/// Returns `true` for 5xx statuses.
	pub fn is_server_error(&self) -> bool {
		self.status >= 500
	}
}

/// HTTP 429 persisted past the retry budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("Rate limit exceeded. Retry after {retry_after} seconds.")]
pub struct RateLimitError {
	/// Seconds the server asked the client to wait.
	pub retry_after: u64,
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A required field is empty.
	#[error("Configuration field `{field}` must not be empty.")]
	MissingField {
		/// Field name.
		field: &'static str,
	},
	/// A required environment variable is unset.
	#[error("Environment variable `{name}` is not set.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
	/// A configured URL does not parse.
	#[error("Configuration field `{field}` is not a valid URL.")]
	InvalidUrl {
		/// Field name.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoint path cannot be appended to the base URL.
	#[error("Endpoint `{endpoint}` cannot be joined onto the base URL.")]
	InvalidEndpoint {
		/// Endpoint path.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Header name or value is not valid HTTP.
	#[error("Header `{name}` is not a valid HTTP header.")]
	InvalidHeader {
		/// Header name.
		name: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	Body {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// Identifier failed validation.
	#[error("Identifier is invalid.")]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures; no HTTP response was received.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error: {source}")]
	Network {
		/// Transport-specific network error.
		source: BoxError,
	},
	/// Request exceeded its timeout.
	#[error("Request timed out after {timeout_ms} ms.")]
	Timeout {
		/// Configured timeout in milliseconds.
		timeout_ms: u64,
	},
	/// Outbound request could not be assembled.
	#[error("Request could not be constructed: {source}")]
	Request {
		/// Construction failure.
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a request construction failure.
	pub fn request(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Request { source: Box::new(src) }
	}
}
