//! Stored Spotify token set and refresh results.

pub mod secret;

// self
use crate::{_prelude::*, auth::{ScopeSet, secret::TokenSecret}};

/// Seconds before expiry at which stored tokens are treated as stale.
pub const REFRESH_BUFFER_SECS: i64 = 300;

/// Current wall-clock time in unix seconds.
pub fn unix_now() -> i64 {
	OffsetDateTime::now_utc().unix_timestamp()
}

/// Tokens persisted for one application user.
///
/// Serialized with camelCase keys (`accessToken`, `refreshToken`, `expiresAt`, `scope`) so stored
/// records stay readable by other Spotifyle services.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotifyTokens {
	/// Bearer credential for the Web API.
	pub access_token: TokenSecret,
	/// Credential for the refresh grant, when Spotify issued one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Absolute expiry in unix seconds.
	pub expires_at: i64,
	/// Granted scopes, space-delimited.
	#[serde(default)]
	pub scope: String,
}
impl SpotifyTokens {
	/// Builds a token set from raw parts.
	pub fn new(
		access_token: impl Into<String>,
		refresh_token: Option<&str>,
		expires_at: i64,
		scope: impl Into<String>,
	) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: refresh_token.map(TokenSecret::new),
			expires_at,
			scope: scope.into(),
		}
	}

	/// Returns `true` when the token is inside the refresh buffer at `now` (unix seconds).
	pub fn needs_refresh_at(&self, now: i64) -> bool {
		self.expires_at <= now.saturating_add(REFRESH_BUFFER_SECS)
	}

	/// Returns `true` when the token is inside the refresh buffer right now.
	pub fn needs_refresh(&self) -> bool {
		self.needs_refresh_at(unix_now())
	}

	/// Remaining lifetime in seconds at `now`, floored at zero.
	pub fn lifetime_at(&self, now: i64) -> i64 {
		self.expires_at.saturating_sub(now).max(0)
	}

	/// Expiry as a UTC timestamp, if it is representable.
	pub fn expires_at_datetime(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp(self.expires_at).ok()
	}

	/// Parsed granted scopes.
	pub fn scopes(&self) -> ScopeSet {
		ScopeSet::parse(&self.scope)
	}

	/// Returns `true` when every `required` scope was granted.
	pub fn has_scopes<I, S>(&self, required: I) -> bool
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.scopes().contains_all(required)
	}
}
impl Debug for SpotifyTokens {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SpotifyTokens")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.field("scope", &self.scope)
			.finish()
	}
}

/// Outcome of [`TokenManager::get_valid_access_token`](crate::flows::TokenManager::get_valid_access_token).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenRefreshResult {
	/// Current token set.
	pub tokens: SpotifyTokens,
	/// `true` when this call performed the refresh grant.
	pub was_refreshed: bool,
}
impl TokenRefreshResult {
	/// Wraps tokens served from storage without a refresh.
	pub fn stored(tokens: SpotifyTokens) -> Self {
		Self { tokens, was_refreshed: false }
	}

	/// Wraps tokens minted by a refresh grant.
	pub fn refreshed(tokens: SpotifyTokens) -> Self {
		Self { tokens, was_refreshed: true }
	}
}
