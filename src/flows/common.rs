//! Shared accounts-service plumbing: client authentication, form posts, token responses, and
//! per-user guards.

// crates.io
use async_lock::MutexGuardArc;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::{
	Method,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue},
};
use url::form_urlencoded::Serializer;
// self
use crate::{
	_prelude::*,
	auth::{SpotifyTokens, UserId},
	error::{TokenRequestError, TransportError},
	flows::TokenManager,
	http::{HttpRequest, HttpResponse},
};

const ACCOUNTS_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Successful token endpoint payload.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
	/// New access token.
	pub access_token: String,
	/// Usually `Bearer`.
	#[serde(default)]
	pub token_type: Option<String>,
	/// Granted scopes, space-delimited.
	#[serde(default)]
	pub scope: String,
	/// Lifetime in seconds.
	pub expires_in: i64,
	/// Rotated refresh token, when Spotify issued one.
	#[serde(default)]
	pub refresh_token: Option<String>,
}
impl TokenResponse {
	/// Converts the payload into stored tokens issued at `issued_at` (unix seconds).
	///
	/// When the response omits a refresh token, `fallback_refresh` is kept.
	pub fn into_tokens(self, issued_at: i64, fallback_refresh: Option<&str>) -> SpotifyTokens {
		let refresh = self.refresh_token.as_deref().or(fallback_refresh);

		SpotifyTokens::new(
			self.access_token,
			refresh,
			issued_at.saturating_add(self.expires_in),
			self.scope,
		)
	}
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenResponse")
			.field("token_type", &self.token_type)
			.field("scope", &self.scope)
			.field("expires_in", &self.expires_in)
			.field("refresh_token_issued", &self.refresh_token.is_some())
			.finish()
	}
}

#[derive(Deserialize)]
struct TokenErrorBody {
	#[serde(default)]
	error_description: Option<String>,
}

/// `Basic base64(client_id:client_secret)` credential.
pub fn basic_credentials(client_id: &str, client_secret: &str) -> String {
	format!("Basic {}", STANDARD.encode(format!("{client_id}:{client_secret}")))
}

/// `application/x-www-form-urlencoded` body for `params`.
pub fn form_body(params: &[(&str, &str)]) -> String {
	Serializer::new(String::new()).extend_pairs(params).finish()
}

/// Exclusive hold on one user's token lifecycle.
///
/// Refreshes and revocations for the same user run one at a time. Dropping the lease releases
/// the lock and removes the user's map entry once no other caller is waiting on it.
pub(crate) struct UserLease<'a> {
	manager: &'a TokenManager,
	user: &'a UserId,
	mutex: Arc<AsyncMutex<()>>,
	held: Option<MutexGuardArc<()>>,
}
impl<'a> UserLease<'a> {
	/// Waits for exclusive access to `user`.
	pub(crate) async fn acquire(manager: &'a TokenManager, user: &'a UserId) -> Self {
		let mutex = {
			let mut guards = manager.refresh_guards.lock();

			guards.entry(user.to_owned()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
		};
		let held = mutex.lock_arc().await;

		Self { manager, user, mutex, held: Some(held) }
	}
}
impl Drop for UserLease<'_> {
	fn drop(&mut self) {
		drop(self.held.take());

		let mut guards = self.manager.refresh_guards.lock();
		// The map and this lease own the only references.
		let idle = Arc::strong_count(&self.mutex) == 2
			&& guards.get(self.user).is_some_and(|mutex| Arc::ptr_eq(mutex, &self.mutex));

		if idle {
			guards.remove(self.user);
		}
	}
}

/// Number of users with a live lease or waiters.
#[cfg(test)]
pub(crate) fn tracked_users(manager: &TokenManager) -> usize {
	manager.refresh_guards.lock().len()
}

/// POSTs a client-authenticated form to `endpoint`.
pub(crate) async fn post_form(
	manager: &TokenManager,
	endpoint: &Url,
	params: &[(&str, &str)],
) -> Result<HttpResponse, TransportError> {
	let config = &manager.config;
	let mut credentials = HeaderValue::from_str(&basic_credentials(
		&config.client_id,
		config.client_secret.expose(),
	))
	.map_err(TransportError::request)?;

	credentials.set_sensitive(true);

	let request = HttpRequest::new(Method::POST, endpoint.clone())
		.with_header(AUTHORIZATION, credentials)
		.with_header(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"))
		.with_body(form_body(params))
		.with_timeout(ACCOUNTS_TIMEOUT);

	manager.transport.execute(request).await
}

/// Calls the token endpoint and decodes a successful [`TokenResponse`].
pub(crate) async fn request_token(
	manager: &TokenManager,
	params: &[(&str, &str)],
) -> Result<TokenResponse, TokenRequestError> {
	let response = post_form(manager, &manager.config.endpoints.token, params).await?;
	let status = response.status.as_u16();

	if !response.status.is_success() {
		let description = serde_json::from_slice::<TokenErrorBody>(&response.body)
			.ok()
			.and_then(|body| body.error_description)
			.unwrap_or_else(|| format!("HTTP {status}"));

		return Err(TokenRequestError::Rejected { status, description });
	}

	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| TokenRequestError::Parse { source, status })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::{ScriptedOutcome, ScriptedTransport, mock_config, tokens_expiring_in, user},
		store::{MemoryStore, TokenStore},
	};

	fn manager_with(outcomes: impl IntoIterator<Item = ScriptedOutcome>) -> TokenManager {
		TokenManager::with_transport(
			mock_config("https://accounts.spotify.test"),
			Arc::new(MemoryStore::default()),
			Arc::new(ScriptedTransport::new(outcomes)),
		)
	}

	#[tokio::test]
	async fn released_leases_leave_no_entry() {
		let manager = manager_with(Vec::new());
		let alice = user("alice");
		let lease = UserLease::acquire(&manager, &alice).await;

		assert_eq!(tracked_users(&manager), 1);

		drop(lease);

		assert_eq!(tracked_users(&manager), 0);
	}

	#[tokio::test]
	async fn waiting_callers_keep_the_entry_alive() {
		let manager = manager_with(Vec::new());
		let alice = user("alice");
		let first = UserLease::acquire(&manager, &alice).await;
		let second = UserLease::acquire(&manager, &alice);

		tokio::pin!(second);

		assert!(
			tokio::time::timeout(StdDuration::from_millis(20), &mut second).await.is_err(),
			"A second lease must wait for the first."
		);

		drop(first);

		assert_eq!(tracked_users(&manager), 1);

		let second = second.await;

		assert_eq!(tracked_users(&manager), 1);

		drop(second);

		assert_eq!(tracked_users(&manager), 0);
	}

	#[tokio::test]
	async fn finished_refreshes_release_the_entry() {
		let manager = manager_with([ScriptedOutcome::json(
			200,
			r#"{"access_token":"new","expires_in":3600,"scope":"s"}"#,
		)]);
		let alice = user("alice");

		manager
			.store
			.set(&alice, tokens_expiring_in("stale", Some("refresh-1"), -10))
			.await
			.expect("Seeding tokens should succeed.");

		let result = manager.get_valid_access_token(&alice).await.expect("Refresh should succeed.");

		assert!(result.was_refreshed);
		assert_eq!(tracked_users(&manager), 0);
	}

	#[test]
	fn basic_credentials_encode_raw_pair() {
		assert_eq!(
			basic_credentials("test-client-id", "test-client-secret"),
			"Basic dGVzdC1jbGllbnQtaWQ6dGVzdC1jbGllbnQtc2VjcmV0"
		);
	}

	#[test]
	fn form_body_encodes_reserved_characters() {
		assert_eq!(
			form_body(&[
				("grant_type", "authorization_code"),
				("redirect_uri", "http://localhost:3000/cb?x=1"),
			]),
			"grant_type=authorization_code&redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcb%3Fx%3D1"
		);
	}

	#[test]
	fn missing_refresh_token_keeps_fallback() {
		let response: TokenResponse = serde_json::from_str(
			r#"{"access_token":"new","token_type":"Bearer","expires_in":3600,"scope":"a b"}"#,
		)
		.expect("Token response fixture should parse.");
		let tokens = response.clone().into_tokens(1_000, Some("old-refresh"));

		assert_eq!(tokens.expires_at, 4_600);
		assert_eq!(tokens.refresh_token.as_ref().map(|t| t.expose()), Some("old-refresh"));
		assert!(response.into_tokens(1_000, None).refresh_token.is_none());
	}
}
