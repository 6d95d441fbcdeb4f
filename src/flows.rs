//! Spotify token lifecycle: authorize URLs, code exchange, refresh, and revocation.

pub mod authorize;
pub mod common;
pub mod exchange;
pub mod refresh;
pub mod revoke;

pub use authorize::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::{SpotifyTokens, UserId, unix_now},
	config::ClientConfig,
	http::{HttpTransport, ReqwestTransport},
	store::TokenStore,
};

/// Owns the per-user token lifecycle against Spotify's accounts service.
///
/// Stored tokens are served until they enter the five-minute refresh buffer. Refreshes for one
/// user are single-flight: concurrent callers wait on a per-user guard and reuse the tokens the
/// first caller stored. A failed refresh deletes the stored tokens so callers re-authenticate.
#[derive(Clone)]
pub struct TokenManager {
	/// Credentials and endpoints.
	pub config: Arc<ClientConfig>,
	/// Token persistence.
	pub store: Arc<dyn TokenStore>,
	/// Transport used for accounts-service calls.
	pub transport: Arc<dyn HttpTransport>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh_guards: Arc<Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>>,
}
impl TokenManager {
	/// Creates a manager using the reqwest transport.
	pub fn new(config: impl Into<Arc<ClientConfig>>, store: Arc<dyn TokenStore>) -> Self {
		Self::with_transport(config, store, Arc::new(ReqwestTransport::default()))
	}

	/// Creates a manager that sends accounts-service calls through `transport`.
	pub fn with_transport(
		config: impl Into<Arc<ClientConfig>>,
		store: Arc<dyn TokenStore>,
		transport: Arc<dyn HttpTransport>,
	) -> Self {
		Self {
			config: config.into(),
			store,
			transport,
			refresh_metrics: Default::default(),
			refresh_guards: Default::default(),
		}
	}

	/// Returns `true` when usable tokens exist, refreshing them if needed.
	///
	/// Every failure, including a failed refresh, yields `false`.
	pub async fn has_valid_tokens(&self, user: &UserId) -> bool {
		match self.get_valid_access_token(user).await {
			Ok(_) => true,
			Err(e) => {
				tracing::debug!(user = %user, error = %e, "No usable Spotify tokens.");

				false
			},
		}
	}

	/// Returns `true` when `tokens` were granted every scope in `required`.
	pub fn validate_token_scope(&self, tokens: &SpotifyTokens, required: &[&str]) -> bool {
		tokens.has_scopes(required)
	}

	/// Seconds until `tokens` expire, floored at zero.
	pub fn token_lifetime(&self, tokens: &SpotifyTokens) -> i64 {
		tokens.lifetime_at(unix_now())
	}
}
impl Debug for TokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("client_id", &self.config.client_id)
			.field("token_endpoint", &self.config.endpoints.token.as_str())
			.field("refresh_metrics", &self.refresh_metrics)
			.finish()
	}
}
