//! Client configuration: OAuth credentials, accounts endpoints, and request policy.

// std
use std::env;
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	error::ConfigError,
};

/// Spotify Web API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";
/// Spotify accounts service root hosting the authorize, token, and revoke endpoints.
pub const DEFAULT_ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com/";
/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: [&str; 6] = [
	"user-read-email",
	"user-read-private",
	"user-top-read",
	"user-read-recently-played",
	"playlist-read-private",
	"playlist-read-collaborative",
];

/// Accounts-service endpoints used by the token lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpotifyEndpoints {
	/// Browser authorization endpoint.
	pub authorize: Url,
	/// Token endpoint for the authorization-code and refresh grants.
	pub token: Url,
	/// Token revocation endpoint.
	pub revoke: Url,
}
impl SpotifyEndpoints {
	/// Production Spotify accounts endpoints.
	pub fn spotify() -> Result<Self, ConfigError> {
		let accounts = Url::parse(DEFAULT_ACCOUNTS_BASE_URL)
			.map_err(|source| ConfigError::InvalidUrl { field: "accounts_base_url", source })?;

		Self::under(&accounts)
	}

	/// Endpoints laid out like Spotify's (`authorize`, `api/token`, `api/token/revoke`) under
	/// an arbitrary accounts root.
	pub fn under(accounts: &Url) -> Result<Self, ConfigError> {
		let mut root = accounts.clone();

		if !root.path().ends_with('/') {
			let path = format!("{}/", root.path());

			root.set_path(&path);
		}

		let join = |field: &'static str, path: &str| {
			root.join(path).map_err(|source| ConfigError::InvalidUrl { field, source })
		};

		Ok(Self {
			authorize: join("authorize_url", "authorize")?,
			token: join("token_url", "api/token")?,
			revoke: join("revoke_url", "api/token/revoke")?,
		})
	}
}

/// Immutable client configuration shared by the token manager and API client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: TokenSecret,
	/// Redirect URI registered with Spotify, sent verbatim.
	pub redirect_uri: String,
	/// Requested scopes in configured order.
	pub scopes: Vec<String>,
	/// Web API base URL without a trailing slash.
	pub base_url: String,
	/// Accounts-service endpoints.
	pub endpoints: SpotifyEndpoints,
}
impl ClientConfig {
	/// Starts a builder with the mandatory credentials.
	pub fn builder(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> ClientConfigBuilder {
		ClientConfigBuilder::new(client_id.into(), client_secret.into())
	}

	/// Reads configuration from the process environment.
	///
	/// Required: `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET`, `SPOTIFY_REDIRECT_URI`.
	/// Optional: `SPOTIFY_SCOPES` (space or comma separated), `SPOTIFY_API_BASE_URL`.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Same as [`ClientConfig::from_env`] but resolves variables through `lookup`.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let required = |name: &'static str| {
			lookup(name).filter(|value| !value.trim().is_empty()).ok_or(ConfigError::MissingEnv { name })
		};
		let mut builder =
			Self::builder(required("SPOTIFY_CLIENT_ID")?, required("SPOTIFY_CLIENT_SECRET")?)
				.redirect_uri(required("SPOTIFY_REDIRECT_URI")?);

		if let Some(scopes) = lookup("SPOTIFY_SCOPES") {
			builder = builder.scopes(
				scopes
					.split(|c: char| c == ',' || c.is_whitespace())
					.filter(|scope| !scope.is_empty())
					.map(str::to_owned),
			);
		}
		if let Some(base_url) = lookup("SPOTIFY_API_BASE_URL").filter(|v| !v.trim().is_empty()) {
			builder = builder.base_url(base_url);
		}

		builder.build()
	}

	/// Requested scopes joined with spaces, as sent to the authorize endpoint.
	pub fn scope_param(&self) -> String {
		self.scopes.join(" ")
	}
}

/// Builder for [`ClientConfig`].
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
	client_id: String,
	client_secret: TokenSecret,
	redirect_uri: Option<String>,
	scopes: Vec<String>,
	base_url: Option<String>,
	endpoints: Option<SpotifyEndpoints>,
}
impl ClientConfigBuilder {
	fn new(client_id: String, client_secret: String) -> Self {
		Self {
			client_id,
			client_secret: TokenSecret::new(client_secret),
			redirect_uri: None,
			scopes: Vec::new(),
			base_url: None,
			endpoints: None,
		}
	}

	/// Sets the redirect URI registered with Spotify.
	pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
		self.redirect_uri = Some(uri.into());

		self
	}

	/// Appends one requested scope.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scopes.push(scope.into());

		self
	}

	/// Replaces the requested scopes.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Overrides the Web API base URL.
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = Some(url.into());

		self
	}

	/// Overrides the accounts-service endpoints.
	pub fn endpoints(mut self, endpoints: SpotifyEndpoints) -> Self {
		self.endpoints = Some(endpoints);

		self
	}

	/// Validates and produces a [`ClientConfig`].
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::MissingField { field: "client_id" });
		}
		if self.client_secret.expose().trim().is_empty() {
			return Err(ConfigError::MissingField { field: "client_secret" });
		}

		let redirect_uri = self
			.redirect_uri
			.filter(|uri| !uri.trim().is_empty())
			.ok_or(ConfigError::MissingField { field: "redirect_uri" })?;

		Url::parse(&redirect_uri)
			.map_err(|source| ConfigError::InvalidUrl { field: "redirect_uri", source })?;

		let scopes = if self.scopes.is_empty() {
			DEFAULT_SCOPES.iter().map(|scope| (*scope).to_owned()).collect()
		} else {
			ScopeSet::new(self.scopes.iter().cloned())?;

			self.scopes
		};
		let base_url = self
			.base_url
			.unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned())
			.trim_end_matches('/')
			.to_owned();

		Url::parse(&base_url)
			.map_err(|source| ConfigError::InvalidUrl { field: "base_url", source })?;

		let endpoints = match self.endpoints {
			Some(endpoints) => endpoints,
			None => SpotifyEndpoints::spotify()?,
		};

		Ok(ClientConfig {
			client_id: self.client_id,
			client_secret: self.client_secret,
			redirect_uri,
			scopes,
			base_url,
			endpoints,
		})
	}
}

/// Per-client request policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiOptions {
	/// Retries after the first attempt; a request makes at most `1 + retries` calls.
	pub retries: u32,
	/// Per-attempt timeout.
	pub timeout: StdDuration,
	/// Wait for the rate-limit window to reset before sending when the budget is spent.
	pub rate_limit: bool,
	/// Backoff and Retry-After defaults.
	pub retry_policy: RetryPolicy,
}
impl ApiOptions {
	/// Sets the retry budget.
	pub fn with_retries(mut self, retries: u32) -> Self {
		self.retries = retries;

		self
	}

	/// Sets the per-attempt timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Enables or disables rate-limit pre-waiting.
	pub fn with_rate_limit(mut self, enabled: bool) -> Self {
		self.rate_limit = enabled;

		self
	}

	/// Replaces the retry policy.
	pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
		self.retry_policy = policy;

		self
	}
}
impl Default for ApiOptions {
	fn default() -> Self {
		Self {
			retries: 3,
			timeout: StdDuration::from_secs(10),
			rate_limit: true,
			retry_policy: RetryPolicy::default(),
		}
	}
}

/// Exponential backoff parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Delay before the first retry.
	pub base_delay: StdDuration,
	/// Upper bound on any single backoff delay.
	pub max_delay: StdDuration,
	/// Wait applied to a 429 without a usable `Retry-After` header.
	pub default_retry_after: StdDuration,
}
impl RetryPolicy {
	/// Backoff before retry number `attempt` (1-based): `min(base * 2^(attempt-1), max)`.
	pub fn backoff_delay(&self, attempt: u32) -> StdDuration {
		let exponent = attempt.saturating_sub(1).min(31);

		self.base_delay.saturating_mul(1_u32 << exponent).min(self.max_delay)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			base_delay: StdDuration::from_millis(1_000),
			max_delay: StdDuration::from_secs(30),
			default_retry_after: StdDuration::from_secs(60),
		}
	}
}
