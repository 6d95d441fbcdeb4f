// crates.io
use httpmock::prelude::*;
// self
use spotifyle_client::{
	_preludet::*,
	api::{ApiParams, PlayableItem, SearchParams, SearchType, SpotifyClient, TimeRange},
	auth::UserId,
	cache::{CacheService, MemoryCacheStorage},
	error::AuthError,
	store::TokenStore,
};

const ARTIST_JSON: &str = "{\"id\":\"0OdUWJ0sBjDrqHygGUXeCF\",\"name\":\"Band of Horses\",\"genres\":[\"indie folk\"],\"popularity\":59,\"followers\":{\"href\":null,\"total\":1000}}";

async fn seeded_client(server: &MockServer) -> (SpotifyClient, UserId) {
	let (client, store) = build_test_client(&server.base_url(), fast_options(0));
	let alice = user("alice");

	store
		.set(&alice, tokens_expiring_in("access-1", Some("refresh-1"), 3_600))
		.await
		.expect("Seeding tokens should succeed.");

	(client, alice)
}

#[tokio::test]
async fn top_tracks_send_defaults_and_bearer() {
	let server = MockServer::start_async().await;
	let (client, alice) = seeded_client(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/me/top/tracks")
				.query_param("limit", "20")
				.query_param("time_range", "medium_term")
				.header("authorization", "Bearer access-1");
			then.status(200).header("content-type", "application/json").body(
				"{\"items\":[{\"id\":\"t1\",\"name\":\"Song\",\"popularity\":70}],\"total\":1,\"limit\":20,\"offset\":0}",
			);
		})
		.await;
	let page = client
		.get_top_tracks(&alice, &ApiParams::default())
		.await
		.expect("Top tracks should load.");

	mock.assert_calls_async(1).await;

	assert_eq!(page.total, 1);
	assert_eq!(page.items[0].name, "Song");
	assert_eq!(page.items[0].popularity, Some(70));
}

#[tokio::test]
async fn caller_parameters_override_defaults() {
	let server = MockServer::start_async().await;
	let (client, alice) = seeded_client(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/me/top/artists")
				.query_param("limit", "50")
				.query_param("time_range", "short_term")
				.query_param("offset", "10");
			then.status(200).header("content-type", "application/json").body("{\"items\":[]}");
		})
		.await;
	let params = ApiParams::default().limit(50).offset(10).time_range(TimeRange::ShortTerm);

	client.get_top_artists(&alice, &params).await.expect("Top artists should load.");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn search_joins_types() {
	let server = MockServer::start_async().await;
	let (client, alice) = seeded_client(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/search")
				.query_param("q", "horses")
				.query_param("type", "artist,track");
			then.status(200)
				.header("content-type", "application/json")
				.body(format!("{{\"artists\":{{\"items\":[{ARTIST_JSON}],\"total\":1}}}}"));
		})
		.await;
	let results = client
		.search(&alice, &SearchParams::new("horses", [SearchType::Artist, SearchType::Track]))
		.await
		.expect("Search should succeed.");

	mock.assert_calls_async(1).await;

	let artists = results.artists.expect("Artist results should be present.");

	assert_eq!(artists.items[0].genres, ["indie folk"]);
	assert!(results.tracks.is_none());
}

#[tokio::test]
async fn batch_reads_send_comma_joined_ids() {
	let server = MockServer::start_async().await;
	let (client, alice) = seeded_client(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/audio-features").query_param("ids", "a,b");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"audio_features\":[{\"id\":\"a\",\"tempo\":120.5,\"key\":5},null]}");
		})
		.await;
	let features = client
		.get_audio_features_for_tracks(&alice, &["a", "b"])
		.await
		.expect("Audio features should load.");

	mock.assert_calls_async(1).await;

	assert_eq!(features.audio_features.len(), 2);
	assert_eq!(features.audio_features[0].as_ref().map(|f| f.tempo), Some(120.5));
	assert!(features.audio_features[1].is_none());
}

#[tokio::test]
async fn playlist_tracks_decode_mixed_items() {
	let server = MockServer::start_async().await;
	let (client, alice) = seeded_client(&server).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/playlists/p1/tracks").query_param("limit", "20");
			then.status(200).header("content-type", "application/json").body(
				"{\"items\":[{\"track\":{\"type\":\"track\",\"id\":\"t1\",\"name\":\"Song\"}},{\"track\":{\"type\":\"episode\",\"id\":\"e1\",\"name\":\"Pod\"}}],\"total\":2}",
			);
		})
		.await;

	let page = client
		.get_playlist_tracks(&alice, "p1", &ApiParams::default())
		.await
		.expect("Playlist tracks should load.");

	assert!(matches!(&page.items[0].track, Some(PlayableItem::Track(track)) if track.id == "t1"));
	assert!(matches!(&page.items[1].track, Some(PlayableItem::Episode(_))));
}

#[tokio::test]
async fn expired_tokens_refresh_before_the_request() {
	let server = MockServer::start_async().await;
	let (client, store) = build_test_client(&server.base_url(), fast_options(0));
	let alice = user("alice");
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-2\",\"expires_in\":3600,\"scope\":\"user-read-email\"}");
		})
		.await;
	let profile = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me").header("authorization", "Bearer access-2");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"alice\",\"display_name\":\"Alice\"}");
		})
		.await;

	store
		.set(&alice, tokens_expiring_in("access-1", Some("refresh-1"), -60))
		.await
		.expect("Seeding tokens should succeed.");

	let me = client.get_current_user(&alice).await.expect("Profile should load.");

	refresh.assert_calls_async(1).await;
	profile.assert_calls_async(1).await;

	assert_eq!(me.display_name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn missing_tokens_fail_with_auth_error() {
	let server = MockServer::start_async().await;
	let (client, _) = build_test_client(&server.base_url(), fast_options(0));
	let err = client
		.get_artist(&user("ghost"), "0OdUWJ0sBjDrqHygGUXeCF")
		.await
		.expect_err("Requests without tokens should fail.");

	assert!(matches!(err, Error::Auth(AuthError::NoTokens)));
}

#[tokio::test]
async fn cached_reads_skip_the_network_until_revoked() {
	let server = MockServer::start_async().await;
	let (client, alice) = seeded_client(&server).await;
	let client = client.with_cache(CacheService::new(Arc::new(MemoryCacheStorage::default())));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/artists/0OdUWJ0sBjDrqHygGUXeCF");
			then.status(200).header("content-type", "application/json").body(ARTIST_JSON);
		})
		.await;
	let revoke = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token/revoke");
			then.status(200);
		})
		.await;

	for _ in 0..3 {
		let artist = client
			.get_artist(&alice, "0OdUWJ0sBjDrqHygGUXeCF")
			.await
			.expect("Artist should load.");

		assert_eq!(artist.name, "Band of Horses");
	}

	mock.assert_calls_async(1).await;

	client.revoke_tokens(&alice).await.expect("Revocation should succeed.");

	revoke.assert_calls_async(1).await;

	let stats = client
		.cache()
		.expect("Cache should be attached.")
		.stats()
		.await
		.expect("Stats should be readable.");

	assert_eq!(stats.entries, 0);
	assert!(!client.has_valid_tokens(&alice).await);
}
