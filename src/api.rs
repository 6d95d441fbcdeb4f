//! Typed Spotify Web API surface keyed by application user.
//!
//! Every read resolves a valid access token through the [`TokenManager`], sends the request
//! through the retrying [`SpotifyHttpClient`], and returns the decoded payload. With a
//! [`CacheService`] attached, reads are memoized under user-scoped keys.

pub mod model;
pub mod params;

pub use model::*;
pub use params::*;

// self
use crate::{
	_prelude::*,
	auth::{SpotifyTokens, UserId},
	cache::{CacheService, CacheTtl},
	config::{ApiOptions, ClientConfig},
	error::ApiError,
	flows::{AuthorizationRequest, TokenManager},
	http::{
		HttpTransport, QueryParams, RateLimitState, ReqwestTransport, RequestContext,
		SpotifyHttpClient,
	},
	store::TokenStore,
};

const DEFAULT_MARKET: &str = "US";

/// Spotify Web API client.
///
/// Auth, API, and rate-limit errors pass through unchanged. Anything else (storage, cache, or
/// configuration failures) surfaces as an [`ApiError`] with code `REQUEST_ERROR`.
#[derive(Clone)]
pub struct SpotifyClient {
	http: Arc<SpotifyHttpClient>,
	tokens: TokenManager,
	cache: Option<CacheService>,
}
impl SpotifyClient {
	/// Creates a client using the reqwest transport.
	pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>, options: ApiOptions) -> Self {
		Self::with_transport(config, store, options, Arc::new(ReqwestTransport::default()))
	}

	/// Creates a client whose accounts and Web API calls go through `transport`.
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn TokenStore>,
		options: ApiOptions,
		transport: Arc<dyn HttpTransport>,
	) -> Self {
		let http = SpotifyHttpClient::new(config.base_url.clone(), options, transport.clone());
		let tokens = TokenManager::with_transport(config, store, transport);

		Self { http: Arc::new(http), tokens, cache: None }
	}

	/// Memoizes reads through `cache`.
	pub fn with_cache(mut self, cache: CacheService) -> Self {
		self.cache = Some(cache);

		self
	}

	/// Client configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.tokens.config
	}

	/// Token lifecycle manager.
	pub fn token_manager(&self) -> &TokenManager {
		&self.tokens
	}

	/// Underlying Web API client.
	pub fn http_client(&self) -> &SpotifyHttpClient {
		&self.http
	}

	/// Attached response cache.
	pub fn cache(&self) -> Option<&CacheService> {
		self.cache.as_ref()
	}

	/// Last observed rate-limit window.
	pub fn rate_limit_state(&self) -> RateLimitState {
		self.http.rate_limit_state()
	}

	/// Authorize URL, optionally carrying `state`.
	pub fn authorization_url(&self, state: Option<&str>) -> Url {
		self.tokens.authorization_url(state)
	}

	/// Authorize URL with a freshly generated `state`.
	pub fn authorization_request(&self) -> AuthorizationRequest {
		self.tokens.authorization_request()
	}

	/// Exchanges an authorization code and stores the tokens for `user`.
	pub async fn exchange_code_for_tokens(&self, user: &UserId, code: &str) -> Result<SpotifyTokens> {
		self.tokens.exchange_code_for_tokens(user, code).await
	}

	/// Returns `true` when usable tokens exist for `user`.
	pub async fn has_valid_tokens(&self, user: &UserId) -> bool {
		self.tokens.has_valid_tokens(user).await
	}

	/// Revokes the tokens of `user` and drops their cached responses.
	pub async fn revoke_tokens(&self, user: &UserId) -> Result<()> {
		self.tokens.revoke_tokens(user).await?;

		let Some(cache) = &self.cache else {
			return Ok(());
		};

		if let Err(e) = cache.invalidate_user(user).await {
			tracing::warn!(user = %user, error = %e, "Failed to invalidate cached user data.");
		}

		Ok(())
	}

	/// `GET /me`.
	pub async fn get_current_user(&self, user: &UserId) -> Result<User> {
		self.cached(user, RequestContext::get("/me"), CacheTtl::USER_PROFILE).await
	}

	/// `GET /users/{id}`.
	pub async fn get_user(&self, user: &UserId, target_user_id: &str) -> Result<User> {
		self.cached(
			user,
			RequestContext::get(format!("/users/{target_user_id}")),
			CacheTtl::USER_PROFILE,
		)
		.await
	}

	/// `GET /me/top/artists`, defaulting to 20 items over the medium term.
	pub async fn get_top_artists(&self, user: &UserId, params: &ApiParams) -> Result<Paging<Artist>> {
		let query = top_items_defaults().merge(params.to_query());

		self.cached(
			user,
			RequestContext::get("/me/top/artists").with_params(query),
			CacheTtl::USER_TOP_ITEMS,
		)
		.await
	}

	/// `GET /me/top/tracks`, defaulting to 20 items over the medium term.
	pub async fn get_top_tracks(&self, user: &UserId, params: &ApiParams) -> Result<Paging<Track>> {
		let query = top_items_defaults().merge(params.to_query());

		self.cached(
			user,
			RequestContext::get("/me/top/tracks").with_params(query),
			CacheTtl::USER_TOP_ITEMS,
		)
		.await
	}

	/// `GET /me/player/recently-played`, defaulting to 20 items.
	pub async fn get_recently_played(
		&self,
		user: &UserId,
		params: &ApiParams,
	) -> Result<RecentlyPlayed> {
		self.cached(
			user,
			RequestContext::get("/me/player/recently-played").with_params(paged(params)),
			CacheTtl::USER_RECENT_TRACKS,
		)
		.await
	}

	/// `GET /search`.
	pub async fn search(&self, user: &UserId, params: &SearchParams) -> Result<SearchResults> {
		self.cached(
			user,
			RequestContext::get("/search").with_params(params.to_query()),
			CacheTtl::SEARCH_RESULTS,
		)
		.await
	}

	/// `GET /artists/{id}`.
	pub async fn get_artist(&self, user: &UserId, artist_id: &str) -> Result<Artist> {
		self.cached(user, RequestContext::get(format!("/artists/{artist_id}")), CacheTtl::ARTIST_INFO)
			.await
	}

	/// `GET /artists?ids=...`.
	pub async fn get_artists(&self, user: &UserId, artist_ids: &[&str]) -> Result<Artists> {
		self.cached(
			user,
			RequestContext::get("/artists").with_param("ids", artist_ids),
			CacheTtl::ARTIST_INFO,
		)
		.await
	}

	/// `GET /artists/{id}/albums`, defaulting to 20 items.
	pub async fn get_artist_albums(
		&self,
		user: &UserId,
		artist_id: &str,
		params: &ApiParams,
	) -> Result<Paging<Album>> {
		self.cached(
			user,
			RequestContext::get(format!("/artists/{artist_id}/albums")).with_params(paged(params)),
			CacheTtl::ALBUM_INFO,
		)
		.await
	}

	/// `GET /artists/{id}/top-tracks`; the market defaults to `US`.
	pub async fn get_artist_top_tracks(
		&self,
		user: &UserId,
		artist_id: &str,
		market: Option<&str>,
	) -> Result<Tracks> {
		self.cached(
			user,
			RequestContext::get(format!("/artists/{artist_id}/top-tracks"))
				.with_param("market", market.unwrap_or(DEFAULT_MARKET)),
			CacheTtl::ARTIST_TOP_TRACKS,
		)
		.await
	}

	/// `GET /artists/{id}/related-artists`.
	pub async fn get_related_artists(&self, user: &UserId, artist_id: &str) -> Result<Artists> {
		self.cached(
			user,
			RequestContext::get(format!("/artists/{artist_id}/related-artists")),
			CacheTtl::RELATED_ARTISTS,
		)
		.await
	}

	/// `GET /tracks/{id}`.
	pub async fn get_track(&self, user: &UserId, track_id: &str, market: Option<&str>) -> Result<Track> {
		self.cached(
			user,
			RequestContext::get(format!("/tracks/{track_id}")).with_params(market_only(market)),
			CacheTtl::TRACK_INFO,
		)
		.await
	}

	/// `GET /tracks?ids=...`.
	pub async fn get_tracks(
		&self,
		user: &UserId,
		track_ids: &[&str],
		market: Option<&str>,
	) -> Result<Tracks> {
		let query = QueryParams::new().with("ids", track_ids).merge(market_only(market));

		self.cached(user, RequestContext::get("/tracks").with_params(query), CacheTtl::TRACK_INFO)
			.await
	}

	/// `GET /audio-features/{id}`.
	pub async fn get_audio_features(&self, user: &UserId, track_id: &str) -> Result<AudioFeatures> {
		self.cached(
			user,
			RequestContext::get(format!("/audio-features/{track_id}")),
			CacheTtl::AUDIO_FEATURES,
		)
		.await
	}

	/// `GET /audio-features?ids=...`.
	pub async fn get_audio_features_for_tracks(
		&self,
		user: &UserId,
		track_ids: &[&str],
	) -> Result<AudioFeaturesList> {
		self.cached(
			user,
			RequestContext::get("/audio-features").with_param("ids", track_ids),
			CacheTtl::AUDIO_FEATURES,
		)
		.await
	}

	/// `GET /albums/{id}`.
	pub async fn get_album(&self, user: &UserId, album_id: &str, market: Option<&str>) -> Result<Album> {
		self.cached(
			user,
			RequestContext::get(format!("/albums/{album_id}")).with_params(market_only(market)),
			CacheTtl::ALBUM_INFO,
		)
		.await
	}

	/// `GET /albums/{id}/tracks`, defaulting to 20 items.
	pub async fn get_album_tracks(
		&self,
		user: &UserId,
		album_id: &str,
		params: &ApiParams,
	) -> Result<Paging<Track>> {
		self.cached(
			user,
			RequestContext::get(format!("/albums/{album_id}/tracks")).with_params(paged(params)),
			CacheTtl::ALBUM_INFO,
		)
		.await
	}

	/// `GET /me/playlists`, defaulting to 20 items.
	pub async fn get_current_user_playlists(
		&self,
		user: &UserId,
		params: &ApiParams,
	) -> Result<Paging<Playlist>> {
		self.cached(
			user,
			RequestContext::get("/me/playlists").with_params(paged(params)),
			CacheTtl::USER_PLAYLISTS,
		)
		.await
	}

	/// `GET /playlists/{id}`.
	pub async fn get_playlist(
		&self,
		user: &UserId,
		playlist_id: &str,
		params: &ApiParams,
	) -> Result<Playlist> {
		self.cached(
			user,
			RequestContext::get(format!("/playlists/{playlist_id}")).with_params(params.to_query()),
			CacheTtl::USER_PLAYLISTS,
		)
		.await
	}

	/// `GET /playlists/{id}/tracks`, defaulting to 20 items.
	pub async fn get_playlist_tracks(
		&self,
		user: &UserId,
		playlist_id: &str,
		params: &ApiParams,
	) -> Result<Paging<PlaylistItem>> {
		self.cached(
			user,
			RequestContext::get(format!("/playlists/{playlist_id}/tracks")).with_params(paged(params)),
			CacheTtl::USER_PLAYLISTS,
		)
		.await
	}

	async fn cached<T>(&self, user: &UserId, context: RequestContext, ttl: Duration) -> Result<T>
	where
		T: Serialize + DeserializeOwned,
	{
		let Some(cache) = &self.cache else {
			return self.authenticated(user, context).await;
		};
		let key = cache.generate_user_key(user, &context.endpoint, Some(&context.params));
		let error_context = context.clone();

		cache
			.get_or_set(&key, || self.authenticated(user, context), Some(ttl))
			.await
			.map_err(|e| wrap_unexpected(e, &error_context))
	}

	async fn authenticated<T>(&self, user: &UserId, context: RequestContext) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let access = self
			.tokens
			.get_valid_access_token(user)
			.await
			.map_err(|e| wrap_unexpected(e, &context))?
			.tokens
			.access_token;
		let error_context = context.clone();

		self.http
			.request_json(context.with_bearer(access))
			.await
			.map(|response| response.data)
			.map_err(|e| wrap_unexpected(e, &error_context))
	}
}
impl Debug for SpotifyClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SpotifyClient")
			.field("http", &self.http)
			.field("tokens", &self.tokens)
			.field("cache", &self.cache)
			.finish()
	}
}

fn top_items_defaults() -> QueryParams {
	QueryParams::new().with("limit", DEFAULT_LIMIT).with("time_range", TimeRange::default().as_str())
}

fn paged(params: &ApiParams) -> QueryParams {
	QueryParams::new().with("limit", DEFAULT_LIMIT).merge(params.to_query())
}

fn market_only(market: Option<&str>) -> QueryParams {
	let mut query = QueryParams::new();

	query.set_opt("market", market);

	query
}

fn wrap_unexpected(error: Error, context: &RequestContext) -> Error {
	match error {
		Error::Auth(_) | Error::Api(_) | Error::RateLimit(_) => error,
		other => ApiError::request(other.to_string(), Some(context.clone())).into(),
	}
}
