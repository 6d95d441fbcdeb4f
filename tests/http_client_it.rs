// crates.io
use httpmock::prelude::*;
// self
use spotifyle_client::{
	_preludet::*,
	config::ApiOptions,
	error::ApiError,
	http::{HttpMethod, ReqwestTransport, RequestContext, SpotifyHttpClient},
};

fn client(server: &MockServer, options: ApiOptions) -> SpotifyHttpClient {
	SpotifyHttpClient::new(server.url("/v1"), options, Arc::new(ReqwestTransport::default()))
}

#[tokio::test]
async fn persistent_server_errors_spend_the_retry_budget() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me");
			then.status(500)
				.header("content-type", "application/json")
				.body("{\"error\":{\"status\":500,\"message\":\"Server error\"}}");
		})
		.await;
	let err = client(&server, fast_options(2))
		.request(RequestContext::get("/me"))
		.await
		.expect_err("Persistent 500s should fail.");

	mock.assert_calls_async(3).await;

	match err {
		Error::Api(e) => {
			assert_eq!(e.status, 500);
			assert_eq!(e.message, "Server error");
			assert_eq!(e.code.as_deref(), Some("500"));
		},
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn client_errors_are_not_retried() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/tracks/missing");
			then.status(404)
				.header("content-type", "application/json")
				.body("{\"error\":{\"status\":404,\"message\":\"Non existing id\"}}");
		})
		.await;
	let err = client(&server, fast_options(3))
		.request(RequestContext::get("/tracks/missing"))
		.await
		.expect_err("404 should fail.");

	mock.assert_calls_async(1).await;

	assert!(matches!(err, Error::Api(ref e) if e.status == 404));
}

#[tokio::test]
async fn rate_limits_retry_after_the_advertised_delay() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me");
			then.status(429).header("retry-after", "0");
		})
		.await;
	let err = client(&server, fast_options(1))
		.request(RequestContext::get("/me"))
		.await
		.expect_err("Persistent 429s should fail.");

	mock.assert_calls_async(2).await;

	assert!(matches!(err, Error::RateLimit(ref e) if e.retry_after == 0));
	assert_eq!(err.status(), Some(429));
}

#[tokio::test]
async fn timeouts_surface_as_network_errors() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me");
			then.status(200).delay(StdDuration::from_millis(500)).body("{}");
		})
		.await;
	let options = fast_options(1).with_timeout(StdDuration::from_millis(50));
	let err = client(&server, options)
		.request(RequestContext::get("/me"))
		.await
		.expect_err("Slow responses should time out.");

	mock.assert_calls_async(2).await;

	match err {
		Error::Api(e) => {
			assert_eq!(e.status, 0);
			assert!(e.has_code(ApiError::NETWORK_ERROR));
		},
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn successful_responses_expose_data_and_rate_limit_headers() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/me/top/artists")
				.query_param("limit", "20")
				.query_param("time_range", "medium_term")
				.header("authorization", "Bearer access-1")
				.header("accept", "application/json");
			then.status(200)
				.header("content-type", "application/json")
				.header("x-ratelimit-remaining", "42")
				.header("x-ratelimit-limit", "100")
				.header("x-ratelimit-reset", "1700000000")
				.body("{\"items\":[],\"total\":0}");
		})
		.await;
	let client = client(&server, fast_options(0));
	let context = RequestContext::get("/me/top/artists")
		.with_param("limit", 20_u32)
		.with_param("time_range", "medium_term")
		.with_bearer("access-1".into());
	let response = client.request(context).await.expect("Request should succeed.");

	mock.assert_calls_async(1).await;

	assert_eq!(response.status, 200);
	assert_eq!(response.data.as_json().and_then(|body| body.get("total")), Some(&Value::from(0)));
	assert_eq!(response.rate_limit.remaining, 42);
	assert_eq!(client.rate_limit_state().limit, 100);
	assert_eq!(client.rate_limit_state().reset_time, 1_700_000_000);
}

#[tokio::test]
async fn post_bodies_are_sent_as_json() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v1/playlists/p1/tracks")
				.header("content-type", "application/json")
				.json_body(serde_json::json!({ "uris": ["spotify:track:1"] }));
			then.status(201).header("content-type", "application/json").body("{\"snapshot_id\":\"s\"}");
		})
		.await;
	let context = RequestContext::new(HttpMethod::Post, "/playlists/p1/tracks")
		.with_body(serde_json::json!({ "uris": ["spotify:track:1"] }));
	let response = client(&server, fast_options(0))
		.request_json::<Value>(context)
		.await
		.expect("Post should succeed.");

	mock.assert_calls_async(1).await;

	assert_eq!(response.status, 201);
	assert_eq!(response.data["snapshot_id"], "s");
}

#[tokio::test]
async fn plain_text_errors_keep_the_body_as_message() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me");
			then.status(403).header("content-type", "text/plain").body("Forbidden for this app");
		})
		.await;

	let err = client(&server, fast_options(0))
		.request(RequestContext::get("/me"))
		.await
		.expect_err("403 should fail.");

	assert!(matches!(err, Error::Api(ref e) if e.status == 403 && e.message == "Forbidden for this app"));
}
