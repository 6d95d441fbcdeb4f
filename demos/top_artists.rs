//! Exchanges a code against a mock accounts service, then reads the user's top artists and
//! checks whether their history can feed a game.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use spotifyle_client::{
	api::{SpotifyClient, TimeRange},
	auth::UserId,
	cache::{CacheService, MemoryCacheStorage},
	config::{ApiOptions, ClientConfig, SpotifyEndpoints},
	services::UserDataService,
	store::{MemoryStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":3600,\"refresh_token\":\"demo-refresh\",\"scope\":\"user-top-read\"}",
			);
		})
		.await;
	let top_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me/top/artists");
			then.status(200).header("content-type", "application/json").body(
				"{\"items\":[{\"id\":\"a1\",\"name\":\"Band of Horses\",\"genres\":[\"indie folk\"]}],\"total\":1,\"limit\":20,\"offset\":0}",
			);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me/top/tracks");
			then.status(200).header("content-type", "application/json").body("{\"items\":[]}");
		})
		.await;

	let config = ClientConfig::builder("demo-client", "demo-secret")
		.redirect_uri("http://localhost:3000/api/auth/callback/spotify")
		.scopes(["user-top-read"])
		.base_url(server.url("/v1"))
		.endpoints(SpotifyEndpoints::under(&Url::parse(&server.base_url())?)?)
		.build()?;
	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
	let cache = CacheService::new(Arc::new(MemoryCacheStorage::default()));
	let client = SpotifyClient::new(config, store, ApiOptions::default()).with_cache(cache);
	let user = UserId::new("demo-user")?;

	client.exchange_code_for_tokens(&user, "demo-code").await?;

	let service = UserDataService::new(client);

	// The second read is served from the cache.
	for _ in 0..2 {
		let top = service.top_artists(&user, TimeRange::MediumTerm, 20).await?;

		for artist in &top.items {
			println!("{} ({}).", artist.name, artist.genres.join(", "));
		}
	}

	let validation = service.validate_user_data_for_games(&user).await;

	println!("Ready for games: {}; issues: {:?}.", validation.is_valid, validation.issues);

	token_mock.assert_async().await;
	// One read for the listing, one for the ten-item validation sample.
	top_mock.assert_calls_async(2).await;

	Ok(())
}
