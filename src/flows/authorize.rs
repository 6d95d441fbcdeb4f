//! Authorize-URL construction and state round-tripping.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{_prelude::*, error::AuthError, flows::TokenManager};

const STATE_LEN: usize = 32;

/// Authorize URL paired with the `state` it carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationRequest {
	/// URL the user's browser should visit.
	pub url: Url,
	/// Opaque value Spotify echoes back to the redirect URI.
	pub state: String,
}
impl AuthorizationRequest {
	/// Checks the `state` returned to the redirect handler.
	pub fn validate_state(&self, returned_state: &str) -> Result<(), AuthError> {
		if returned_state == self.state { Ok(()) } else { Err(AuthError::StateMismatch) }
	}
}

impl TokenManager {
	/// Builds the authorize URL.
	///
	/// Query order is `response_type`, `client_id`, `scope`, `redirect_uri`, `show_dialog`, then
	/// `state` when a non-empty one is supplied.
	pub fn authorization_url(&self, state: Option<&str>) -> Url {
		let config = &self.config;
		let mut url = config.endpoints.authorize.clone();

		{
			let mut pairs = url.query_pairs_mut();

			pairs
				.append_pair("response_type", "code")
				.append_pair("client_id", &config.client_id)
				.append_pair("scope", &config.scope_param())
				.append_pair("redirect_uri", &config.redirect_uri)
				.append_pair("show_dialog", "false");

			if let Some(state) = state.filter(|s| !s.is_empty()) {
				pairs.append_pair("state", state);
			}
		}

		url
	}

	/// Builds the authorize URL with a fresh random `state`.
	pub fn authorization_request(&self) -> AuthorizationRequest {
		let state = random_state();

		AuthorizationRequest { url: self.authorization_url(Some(&state)), state }
	}
}

fn random_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::*,
		store::{MemoryStore, TokenStore},
	};

	fn manager() -> TokenManager {
		let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());

		TokenManager::with_transport(
			mock_config("http://127.0.0.1:9"),
			store,
			Arc::new(ScriptedTransport::default()),
		)
	}

	#[test]
	fn authorize_url_has_fixed_parameter_order() {
		let url = manager().authorization_url(Some("abc"));

		assert_eq!(
			url.as_str(),
			"http://127.0.0.1:9/authorize?response_type=code&client_id=test-client-id\
			 &scope=user-read-email+user-top-read\
			 &redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fcallback%2Fspotify\
			 &show_dialog=false&state=abc"
		);
	}

	#[test]
	fn empty_state_is_omitted() {
		let url = manager().authorization_url(Some(""));

		assert!(url.query_pairs().all(|(key, _)| key != "state"));
	}

	#[test]
	fn generated_state_round_trips() {
		let request = manager().authorization_request();

		assert_eq!(request.state.len(), STATE_LEN);
		assert!(request.url.query_pairs().any(|(k, v)| k == "state" && v == request.state));
		assert!(request.validate_state(&request.state.clone()).is_ok());
		assert!(matches!(request.validate_state("forged"), Err(AuthError::StateMismatch)));
	}
}
