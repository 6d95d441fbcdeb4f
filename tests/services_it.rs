// crates.io
use httpmock::prelude::*;
// self
use spotifyle_client::{
	_preludet::*,
	api::TimeRange,
	auth::UserId,
	services::UserDataService,
	store::TokenStore,
};

async fn seeded_service(server: &MockServer) -> (UserDataService, UserId) {
	let (client, store) = build_test_client(&server.base_url(), fast_options(0));
	let alice = user("alice");

	store
		.set(&alice, tokens_expiring_in("access-1", Some("refresh-1"), 3_600))
		.await
		.expect("Seeding tokens should succeed.");

	(UserDataService::new(client), alice)
}

fn artists_page(genres: &[&str], count: usize) -> String {
	let items: Vec<Value> = (0..count)
		.map(|i| {
			serde_json::json!({
				"id": format!("a{i}"),
				"name": format!("Artist {i}"),
				"genres": [genres[i % genres.len()]],
			})
		})
		.collect();

	serde_json::json!({ "items": items, "total": count, "limit": 10, "offset": 0 }).to_string()
}

fn tracks_page(count: usize) -> String {
	let items: Vec<Value> = (0..count)
		.map(|i| serde_json::json!({ "id": format!("t{i}"), "name": format!("Track {i}") }))
		.collect();

	serde_json::json!({ "items": items, "total": count, "limit": 10, "offset": 0 }).to_string()
}

#[tokio::test]
async fn top_artists_clamp_the_limit() {
	let server = MockServer::start_async().await;
	let (service, alice) = seeded_service(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/me/top/artists")
				.query_param("limit", "50")
				.query_param("time_range", "long_term");
			then.status(200)
				.header("content-type", "application/json")
				.body(artists_page(&["rock"], 2));
		})
		.await;
	let top = service
		.top_artists(&alice, TimeRange::LongTerm, 500)
		.await
		.expect("Top artists should load.");

	mock.assert_calls_async(1).await;

	assert_eq!(top.items.len(), 2);
	assert_eq!(top.time_range, TimeRange::LongTerm);
}

#[tokio::test]
async fn recent_tracks_carry_cursors() {
	let server = MockServer::start_async().await;
	let (service, alice) = seeded_service(&server).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me/player/recently-played").query_param("limit", "5");
			then.status(200).header("content-type", "application/json").body(
				serde_json::json!({
					"items": [{
						"track": {
							"id": "t1",
							"name": "Song",
							"duration_ms": 1000,
							"artists": [{ "id": "a1", "name": "Band" }],
							"album": { "id": "al1", "name": "Record" },
						},
						"played_at": "2024-01-01T00:00:00Z",
					}],
					"next": "https://api.spotify.com/v1/me/player/recently-played?before=1",
					"cursors": { "after": "2", "before": "1" },
				})
				.to_string(),
			);
		})
		.await;

	let recent = service.recent_tracks(&alice, 5).await.expect("Recent tracks should load.");

	assert!(recent.has_more);
	assert_eq!(recent.before.as_deref(), Some("1"));
	assert_eq!(recent.tracks[0].track.artists[0].name, "Band");
	assert_eq!(recent.tracks[0].track.album.name, "Record");
	assert_eq!(recent.tracks[0].played_at, "2024-01-01T00:00:00Z");
}

#[tokio::test]
async fn artist_details_keep_ten_top_tracks() {
	let server = MockServer::start_async().await;
	let (service, alice) = seeded_service(&server).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/artists/a1");
			then.status(200).header("content-type", "application/json").body(
				"{\"id\":\"a1\",\"name\":\"Band\",\"genres\":[\"rock\"],\"popularity\":80,\"followers\":{\"total\":42}}",
			);
		})
		.await;

	let top_tracks = server
		.mock_async(|when, then| {
			let tracks: Vec<Value> = (0..12)
				.map(|i| serde_json::json!({ "id": format!("t{i}"), "name": "Hit", "popularity": 90 }))
				.collect();

			when.method(GET).path("/v1/artists/a1/top-tracks").query_param("market", "US");
			then.status(200)
				.header("content-type", "application/json")
				.body(serde_json::json!({ "tracks": tracks }).to_string());
		})
		.await;
	let details = service.artist_details(&alice, "a1").await.expect("Artist details should load.");

	top_tracks.assert_calls_async(1).await;

	assert_eq!(details.followers, 42);
	assert_eq!(details.popularity, 80);
	assert_eq!(details.top_tracks.len(), 10);
	assert_eq!(details.top_tracks[0].popularity, 90);
}

#[tokio::test]
async fn rich_history_is_valid_for_games() {
	let server = MockServer::start_async().await;
	let (service, alice) = seeded_service(&server).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me/top/artists").query_param("limit", "10");
			then.status(200)
				.header("content-type", "application/json")
				.body(artists_page(&["rock", "jazz", "folk"], 6));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me/top/tracks").query_param("limit", "10");
			then.status(200).header("content-type", "application/json").body(tracks_page(6));
		})
		.await;

	let validation = service.validate_user_data_for_games(&alice).await;

	assert!(validation.is_valid);
	assert!(validation.issues.is_empty());
	assert!(validation.recommendations.is_empty());
}

#[tokio::test]
async fn thin_history_collects_issues() {
	let server = MockServer::start_async().await;
	let (service, alice) = seeded_service(&server).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me/top/artists");
			then.status(200)
				.header("content-type", "application/json")
				.body(artists_page(&["rock"], 2));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me/top/tracks");
			then.status(200).header("content-type", "application/json").body(tracks_page(8));
		})
		.await;

	let validation = service.validate_user_data_for_games(&alice).await;

	assert!(!validation.is_valid);
	assert_eq!(validation.issues, ["Insufficient artist data"]);
	assert_eq!(validation.recommendations.len(), 2);
}

#[tokio::test]
async fn upstream_failures_make_validation_unavailable() {
	let server = MockServer::start_async().await;
	let (service, alice) = seeded_service(&server).await;

	for path in ["/v1/me/top/artists", "/v1/me/top/tracks"] {
		server
			.mock_async(|when, then| {
				when.method(GET).path(path);
				then.status(401)
					.header("content-type", "application/json")
					.body("{\"error\":{\"status\":401,\"message\":\"The access token expired\"}}");
			})
			.await;
	}

	let validation = service.validate_user_data_for_games(&alice).await;

	assert!(!validation.is_valid);
	assert_eq!(validation.issues, ["Unable to access Spotify data"]);
}
