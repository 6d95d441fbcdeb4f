//! Access-token retrieval with single-flight refresh.
//!
//! [`TokenManager::get_valid_access_token`] serves stored tokens while they are outside the
//! refresh buffer. Otherwise it takes the user's guard, re-reads storage (another caller may
//! have refreshed meanwhile), and performs `grant_type=refresh_token` at most once.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{SpotifyTokens, TokenRefreshResult, UserId, unix_now},
	error::{AuthError, TokenRequestError},
	flows::{TokenManager, common::{self, UserLease}},
	obs::{self, Operation, OperationSpan, Outcome},
};

impl TokenManager {
	/// Returns usable tokens for `user`, refreshing them when they are inside the buffer.
	///
	/// Fails with [`AuthError::NoTokens`] when nothing is stored and
	/// [`AuthError::MissingRefreshToken`] when stale tokens cannot be refreshed; neither case
	/// touches the network.
	pub async fn get_valid_access_token(&self, user: &UserId) -> Result<TokenRefreshResult> {
		let span = OperationSpan::new(Operation::Refresh, "get_valid_access_token");

		span.instrument(async move {
			let current = self.stored_tokens(user).await?;

			if !current.needs_refresh() {
				return Ok(TokenRefreshResult::stored(current));
			}

			let _lease = UserLease::acquire(self, user).await;
			let current = self.stored_tokens(user).await?;

			if !current.needs_refresh() {
				return Ok(TokenRefreshResult::stored(current));
			}

			let refresh_token =
				current.refresh_token.as_ref().ok_or(AuthError::MissingRefreshToken)?;

			self.refresh_locked(user, refresh_token.expose()).await
		})
		.await
	}

	/// Exchanges `refresh_token` for new tokens and stores them for `user`.
	///
	/// On failure the stored tokens are deleted and [`AuthError::RefreshFailed`] is returned.
	pub async fn refresh_access_token(
		&self,
		user: &UserId,
		refresh_token: &str,
	) -> Result<TokenRefreshResult> {
		let _lease = UserLease::acquire(self, user).await;

		self.refresh_locked(user, refresh_token).await
	}

	async fn stored_tokens(&self, user: &UserId) -> Result<SpotifyTokens> {
		self.store.get(user).await?.ok_or_else(|| AuthError::NoTokens.into())
	}

	// Caller holds the user's lease.
	async fn refresh_locked(&self, user: &UserId, refresh_token: &str) -> Result<TokenRefreshResult> {
		const KIND: Operation = Operation::Refresh;

		let span = OperationSpan::new(KIND, "refresh_access_token");

		obs::record_outcome(KIND, Outcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = span.instrument(self.perform_refresh(user, refresh_token)).await;

		obs::record_outcome(KIND, Outcome::of(&result));
		self.refresh_metrics.record_outcome(result.is_ok());

		match result {
			Ok(tokens) => {
				tracing::debug!(
					user = %user,
					expires_at = tokens.expires_at,
					"Refreshed Spotify tokens."
				);

				Ok(TokenRefreshResult::refreshed(tokens))
			},
			Err(source) => {
				tracing::warn!(
					user = %user,
					error = %source,
					"Token refresh failed; discarding stored tokens."
				);

				if let Err(e) = self.store.delete(user).await {
					tracing::warn!(user = %user, error = %e, "Failed to discard stale tokens.");
				}

				Err(AuthError::RefreshFailed { source }.into())
			},
		}
	}

	async fn perform_refresh(
		&self,
		user: &UserId,
		refresh_token: &str,
	) -> Result<SpotifyTokens, TokenRequestError> {
		let issued_at = unix_now();
		let response = common::request_token(
			self,
			&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)],
		)
		.await?;
		let tokens = response.into_tokens(issued_at, Some(refresh_token));

		self.store.set(user, tokens.clone()).await?;

		Ok(tokens)
	}
}
