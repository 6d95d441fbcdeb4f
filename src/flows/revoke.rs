//! Token revocation.

// self
use crate::{
	_prelude::*,
	auth::UserId,
	error::TokenRequestError,
	flows::{TokenManager, common::{self, UserLease}},
	obs::{self, Operation, OperationSpan, Outcome},
};

impl TokenManager {
	/// Revokes and deletes the tokens stored for `user`.
	///
	/// A failed revocation call is logged and the tokens are still deleted. Nothing is sent when
	/// no tokens are stored. Waits for an in-flight refresh of the same user, so the refreshed
	/// tokens are the ones revoked.
	pub async fn revoke_tokens(&self, user: &UserId) -> Result<()> {
		const KIND: Operation = Operation::Revoke;

		let _lease = UserLease::acquire(self, user).await;
		let Some(tokens) = self.store.get(user).await? else {
			return Ok(());
		};
		let span = OperationSpan::new(KIND, "revoke_tokens");

		if let Some(refresh_token) = &tokens.refresh_token {
			obs::record_outcome(KIND, Outcome::Attempt);

			let result = span.instrument(self.revoke_token(refresh_token.expose())).await;

			obs::record_outcome(KIND, Outcome::of(&result));

			if let Err(e) = result {
				tracing::warn!(user = %user, error = %e, "Failed to revoke Spotify tokens.");
			}
		}

		self.store.delete(user).await?;

		Ok(())
	}

	async fn revoke_token(&self, refresh_token: &str) -> Result<(), TokenRequestError> {
		let response = common::post_form(
			self,
			&self.config.endpoints.revoke,
			&[("token", refresh_token), ("token_type_hint", "refresh_token")],
		)
		.await?;

		if response.status.is_success() {
			return Ok(());
		}

		let status = response.status.as_u16();

		Err(TokenRequestError::Rejected {
			status,
			description: format!("Failed to revoke token: HTTP {status}"),
		})
	}
}
