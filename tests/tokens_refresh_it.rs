// crates.io
use httpmock::prelude::*;
// self
use spotifyle_client::{
	_preludet::*,
	error::{AuthError, TokenRequestError},
	store::TokenStore,
};

const BASIC_AUTH: &str = "Basic dGVzdC1jbGllbnQtaWQ6dGVzdC1jbGllbnQtc2VjcmV0";

#[tokio::test]
async fn fresh_tokens_are_served_without_network() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_token_manager(&server.base_url());
	let alice = user("alice");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(500);
		})
		.await;

	store
		.set(&alice, tokens_expiring_in("fresh-access", Some("refresh-1"), 3_600))
		.await
		.expect("Seeding tokens should succeed.");

	let result =
		manager.get_valid_access_token(&alice).await.expect("Fresh tokens should be served.");

	assert!(!result.was_refreshed);
	assert_eq!(result.tokens.access_token.expose(), "fresh-access");

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn expired_tokens_refresh_and_keep_the_old_refresh_token() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_token_manager(&server.base_url());
	let alice = user("alice");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/token")
				.header("authorization", BASIC_AUTH)
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("refresh_token", "refresh-1");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"new\",\"token_type\":\"Bearer\",\"expires_in\":3600,\"scope\":\"s\"}");
		})
		.await;

	store
		.set(&alice, tokens_expiring_in("old-access", Some("refresh-1"), -3_600))
		.await
		.expect("Seeding tokens should succeed.");

	let result =
		manager.get_valid_access_token(&alice).await.expect("Stale tokens should refresh.");

	mock.assert_calls_async(1).await;

	assert!(result.was_refreshed);
	assert_eq!(result.tokens.access_token.expose(), "new");
	assert_eq!(result.tokens.scope, "s");

	let stored = store
		.get(&alice)
		.await
		.expect("Store read should succeed.")
		.expect("Refreshed tokens should be stored.");

	assert_eq!(stored.access_token.expose(), "new");
	assert_eq!(stored.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-1"));
	assert!(!stored.needs_refresh());
}

#[tokio::test]
async fn tokens_inside_the_buffer_are_refreshed() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_token_manager(&server.base_url());
	let alice = user("alice");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"rotated\",\"refresh_token\":\"refresh-2\",\"expires_in\":3600,\"scope\":\"user-top-read\"}",
			);
		})
		.await;

	store
		.set(&alice, tokens_expiring_in("near-expiry", Some("refresh-1"), 120))
		.await
		.expect("Seeding tokens should succeed.");

	let result = manager.get_valid_access_token(&alice).await.expect("Refresh should succeed.");

	mock.assert_calls_async(1).await;

	assert!(result.was_refreshed);
	assert_eq!(
		result.tokens.refresh_token.as_ref().map(|secret| secret.expose()),
		Some("refresh-2")
	);
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_token_manager(&server.base_url());
	let manager = Arc::new(manager);
	let alice = user("alice");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(StdDuration::from_millis(50))
				.body("{\"access_token\":\"shared\",\"expires_in\":3600,\"scope\":\"s\"}");
		})
		.await;

	store
		.set(&alice, tokens_expiring_in("stale", Some("refresh-1"), -10))
		.await
		.expect("Seeding tokens should succeed.");

	let tasks: Vec<_> = (0..4)
		.map(|_| {
			let manager = manager.clone();
			let alice = alice.clone();

			tokio::spawn(async move { manager.get_valid_access_token(&alice).await })
		})
		.collect();
	let mut refreshed = 0;

	for task in tasks {
		let result = task
			.await
			.expect("Refresh task should not panic.")
			.expect("Every caller should receive tokens.");

		assert_eq!(result.tokens.access_token.expose(), "shared");

		if result.was_refreshed {
			refreshed += 1;
		}
	}

	mock.assert_calls_async(1).await;

	assert_eq!(refreshed, 1);
}

#[tokio::test]
async fn missing_refresh_token_fails_without_network() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_token_manager(&server.base_url());
	let alice = user("alice");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(200);
		})
		.await;

	store
		.set(&alice, tokens_expiring_in("stale", None, -10))
		.await
		.expect("Seeding tokens should succeed.");

	let err = manager
		.get_valid_access_token(&alice)
		.await
		.expect_err("Tokens without a refresh token cannot be refreshed.");

	assert!(matches!(err, Error::Auth(AuthError::MissingRefreshToken)));
	assert!(err.requires_reauthentication());

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn unknown_users_have_no_tokens() {
	let server = MockServer::start_async().await;
	let (manager, _) = build_test_token_manager(&server.base_url());
	let err = manager
		.get_valid_access_token(&user("ghost"))
		.await
		.expect_err("Unknown users should have no tokens.");

	assert!(matches!(err, Error::Auth(AuthError::NoTokens)));
	assert!(!manager.has_valid_tokens(&user("ghost")).await);
}

#[tokio::test]
async fn failed_refresh_deletes_stored_tokens() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_token_manager(&server.base_url());
	let alice = user("alice");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"Refresh token revoked\"}");
		})
		.await;

	store
		.set(&alice, tokens_expiring_in("stale", Some("revoked"), -10))
		.await
		.expect("Seeding tokens should succeed.");

	let err = manager
		.get_valid_access_token(&alice)
		.await
		.expect_err("A rejected refresh should fail.");

	mock.assert_calls_async(1).await;

	match &err {
		Error::Auth(AuthError::RefreshFailed {
			source: TokenRequestError::Rejected { status, description },
		}) => {
			assert_eq!(*status, 400);
			assert_eq!(description, "Refresh token revoked");
		},
		other => panic!("Unexpected refresh failure: {other:?}."),
	}

	assert_eq!(err.to_string(), "Token refresh failed: Refresh token revoked");
	assert!(store.get(&alice).await.expect("Store read should succeed.").is_none());
	assert_eq!(manager.refresh_metrics.failures(), 1);
}

#[tokio::test]
async fn failed_refresh_without_description_reports_status() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_token_manager(&server.base_url());
	let alice = user("alice");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(503).body("unavailable");
		})
		.await;
	store
		.set(&alice, tokens_expiring_in("stale", Some("refresh-1"), -10))
		.await
		.expect("Seeding tokens should succeed.");

	let err = manager
		.refresh_access_token(&alice, "refresh-1")
		.await
		.expect_err("A 503 refresh should fail.");

	assert_eq!(err.to_string(), "Token refresh failed: HTTP 503");
	assert_eq!(err.status(), Some(503));
	assert!(store.is_empty());
}

#[tokio::test]
async fn revoke_waits_for_an_in_flight_refresh() {
	let server = MockServer::start_async().await;
	let (manager, store) = build_test_token_manager(&server.base_url());
	let manager = Arc::new(manager);
	let alice = user("alice");
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(StdDuration::from_millis(400))
				.body("{\"access_token\":\"refreshed\",\"expires_in\":3600,\"scope\":\"s\"}");
		})
		.await;
	let revoke = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/token/revoke")
				.form_urlencoded_tuple("token", "refresh-1");
			then.status(200);
		})
		.await;

	store
		.set(&alice, tokens_expiring_in("stale", Some("refresh-1"), -10))
		.await
		.expect("Seeding tokens should succeed.");

	let refreshing = {
		let manager = manager.clone();
		let alice = alice.clone();

		tokio::spawn(async move { manager.get_valid_access_token(&alice).await })
	};

	tokio::time::sleep(StdDuration::from_millis(100)).await;
	manager.revoke_tokens(&alice).await.expect("Revocation should succeed.");

	let refreshed = refreshing
		.await
		.expect("Refresh task should not panic.")
		.expect("The in-flight refresh should complete.");

	assert!(refreshed.was_refreshed);

	refresh.assert_calls_async(1).await;
	revoke.assert_calls_async(1).await;

	assert!(store.get(&alice).await.expect("Store read should succeed.").is_none());
	assert!(!manager.has_valid_tokens(&alice).await);
}
