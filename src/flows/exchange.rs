//! Authorization-code exchange.

// self
use crate::{
	_prelude::*,
	auth::{SpotifyTokens, UserId, unix_now},
	error::{AuthError, TokenRequestError},
	flows::{TokenManager, common},
	obs::{self, Operation, OperationSpan, Outcome},
};

impl TokenManager {
	/// Exchanges an authorization `code` for tokens and stores them for `user`.
	///
	/// The configured redirect URI is sent verbatim. A response without a refresh token stores
	/// tokens that cannot be refreshed later.
	pub async fn exchange_code_for_tokens(&self, user: &UserId, code: &str) -> Result<SpotifyTokens> {
		const KIND: Operation = Operation::CodeExchange;

		let span = OperationSpan::new(KIND, "exchange_code_for_tokens");

		obs::record_outcome(KIND, Outcome::Attempt);

		let result = span.instrument(self.perform_exchange(user, code)).await;

		obs::record_outcome(KIND, Outcome::of(&result));

		result.map_err(|source| {
			tracing::warn!(user = %user, error = %source, "Authorization code exchange failed.");

			AuthError::ExchangeFailed { source }.into()
		})
	}

	async fn perform_exchange(
		&self,
		user: &UserId,
		code: &str,
	) -> Result<SpotifyTokens, TokenRequestError> {
		let issued_at = unix_now();
		let response = common::request_token(
			self,
			&[
				("grant_type", "authorization_code"),
				("code", code),
				("redirect_uri", &self.config.redirect_uri),
			],
		)
		.await?;
		let tokens = response.into_tokens(issued_at, None);

		self.store.set(user, tokens.clone()).await?;

		Ok(tokens)
	}
}
