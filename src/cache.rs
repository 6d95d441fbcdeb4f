//! TTL response cache with namespaced, parameter-hashed keys.
//!
//! Keys are `{prefix}user:{user}:{endpoint}[:{hash}]` for per-user data and
//! `{prefix}{kind}:{id}[:{hash}]` for shared data, where `hash` is derived from the query
//! parameters sorted by key. Entries are valid while their expiry lies strictly in the future.

pub mod memory;

pub use memory::*;

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::UserId, http::QueryParams};

const PARAM_HASH_LEN: usize = 16;

/// Boxed future returned by [`CacheStorage`] methods.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Current wall-clock time in unix milliseconds.
pub fn unix_now_ms() -> i64 {
	i64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
}

/// Stored value with its absolute expiry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T = Value> {
	/// Cached payload.
	pub data: T,
	/// Expiry in unix milliseconds.
	pub expires_at: i64,
	/// Full key, prefix included.
	pub key: String,
}
impl<T> CacheEntry<T> {
	/// Entry for `data` that expires `ttl` after `now_ms`.
	pub fn new(key: impl Into<String>, data: T, ttl: Duration, now_ms: i64) -> Self {
		let ttl_ms = i64::try_from(ttl.whole_milliseconds()).unwrap_or(i64::MAX);

		Self { data, expires_at: now_ms.saturating_add(ttl_ms), key: key.into() }
	}

	/// Returns `true` while the expiry lies after `now_ms`.
	pub fn is_valid_at(&self, now_ms: i64) -> bool {
		self.expires_at > now_ms
	}
}

/// Backend contract for cached entries.
///
/// Implementations must never return an expired entry from [`CacheStorage::get`] or report one
/// from [`CacheStorage::has`].
pub trait CacheStorage
where
	Self: Send + Sync,
{
	/// Live entry for `key`, if any.
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<CacheEntry>>;

	/// Stores `entry` under its key.
	fn set(&self, entry: CacheEntry) -> CacheFuture<'_, ()>;

	/// Removes `key`.
	fn delete<'a>(&'a self, key: &'a str) -> CacheFuture<'a, ()>;

	/// Removes every entry.
	fn clear(&self) -> CacheFuture<'_, ()>;

	/// Returns `true` when a live entry exists for `key`.
	fn has<'a>(&'a self, key: &'a str) -> CacheFuture<'a, bool>;

	/// Removes every entry whose key starts with `prefix` and returns how many were removed.
	fn delete_prefix<'a>(&'a self, prefix: &'a str) -> CacheFuture<'a, usize>;

	/// Number of stored entries, live or not yet swept.
	fn entry_count(&self) -> CacheFuture<'_, usize>;
}

/// Cache failures.
#[derive(Debug, ThisError)]
pub enum CacheError {
	/// Value could not be converted to JSON.
	#[error("Cached value for `{key}` could not be encoded.")]
	Encode {
		/// Full cache key.
		key: String,
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// Stored JSON does not match the requested type.
	#[error("Cached value for `{key}` could not be decoded.")]
	Decode {
		/// Full cache key.
		key: String,
		/// Structured decoding failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Backend-level failure.
	#[error("Cache backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Recommended TTLs per kind of Spotify data.
#[derive(Clone, Copy, Debug)]
pub struct CacheTtl;
impl CacheTtl {
	/// Current user's profile.
	pub const USER_PROFILE: Duration = Duration::minutes(5);
	/// Top artists and tracks.
	pub const USER_TOP_ITEMS: Duration = Duration::hours(1);
	/// Recently played tracks.
	pub const USER_RECENT_TRACKS: Duration = Duration::minutes(3);
	/// Playlists and their tracks.
	pub const USER_PLAYLISTS: Duration = Duration::minutes(30);
	/// Track metadata.
	pub const TRACK_INFO: Duration = Duration::days(1);
	/// Artist metadata.
	pub const ARTIST_INFO: Duration = Duration::days(1);
	/// Album metadata and tracks.
	pub const ALBUM_INFO: Duration = Duration::days(1);
	/// Audio features never change for a track.
	pub const AUDIO_FEATURES: Duration = Duration::weeks(1);
	/// Search results.
	pub const SEARCH_RESULTS: Duration = Duration::minutes(30);
	/// Artist top tracks.
	pub const ARTIST_TOP_TRACKS: Duration = Duration::days(1);
	/// Related artists.
	pub const RELATED_ARTISTS: Duration = Duration::days(1);
}

/// Cache tuning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheOptions {
	/// TTL applied when a call supplies none.
	pub ttl: Duration,
	/// Namespace prepended to every key.
	pub key_prefix: String,
}
impl Default for CacheOptions {
	fn default() -> Self {
		Self { ttl: Duration::minutes(5), key_prefix: "spotify:".into() }
	}
}

/// Entry counts reported by [`CacheService::stats`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheStats {
	/// Entries currently held by the backend.
	pub entries: usize,
}

/// Read-through cache over a [`CacheStorage`] backend.
#[derive(Clone)]
pub struct CacheService {
	storage: Arc<dyn CacheStorage>,
	options: CacheOptions,
}
impl CacheService {
	/// Service with default options.
	pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
		Self::with_options(storage, CacheOptions::default())
	}

	/// Service with explicit options.
	pub fn with_options(storage: Arc<dyn CacheStorage>, options: CacheOptions) -> Self {
		Self { storage, options }
	}

	/// Active options.
	pub fn options(&self) -> &CacheOptions {
		&self.options
	}

	/// Returns the cached value for `key` or runs `fetcher` and caches its result.
	///
	/// Fetcher errors propagate and nothing is cached. A hit whose JSON no longer matches `T`
	/// counts as a miss.
	pub async fn get_or_set<T, F, Fut, E>(
		&self,
		key: &str,
		fetcher: F,
		ttl: Option<Duration>,
	) -> Result<T, E>
	where
		T: Serialize + DeserializeOwned,
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<T, E>>,
		E: From<CacheError>,
	{
		let full_key = self.build_key(key);

		if let Some(entry) = self.storage.get(&full_key).await? {
			match serde_path_to_error::deserialize(entry.data) {
				Ok(value) => {
					tracing::trace!(key = %full_key, "Cache hit.");

					return Ok(value);
				},
				Err(e) => {
					tracing::debug!(key = %full_key, error = %e, "Discarding undecodable cache entry.");
				},
			}
		}

		let value = fetcher().await?;

		self.store(full_key, &value, ttl).await?;

		Ok(value)
	}

	/// Cached value for `key`.
	pub async fn get<T>(&self, key: &str) -> Result<Option<T>, CacheError>
	where
		T: DeserializeOwned,
	{
		let full_key = self.build_key(key);

		match self.storage.get(&full_key).await? {
			Some(entry) => serde_path_to_error::deserialize(entry.data)
				.map(Some)
				.map_err(|source| CacheError::Decode { key: full_key, source }),
			None => Ok(None),
		}
	}

	/// Caches `value` under `key`; `None` or a non-positive TTL uses the default.
	pub async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<(), CacheError>
	where
		T: Serialize,
	{
		self.store(self.build_key(key), value, ttl).await
	}

	/// Removes `key`.
	pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
		self.storage.delete(&self.build_key(key)).await
	}

	/// Removes every entry.
	pub async fn clear(&self) -> Result<(), CacheError> {
		self.storage.clear().await
	}

	/// Returns `true` when a live entry exists for `key`.
	pub async fn has(&self, key: &str) -> Result<bool, CacheError> {
		self.storage.has(&self.build_key(key)).await
	}

	/// Removes every per-user entry for `user` and returns how many were removed.
	pub async fn invalidate_user(&self, user: &UserId) -> Result<usize, CacheError> {
		let prefix = self.build_key(&format!("user:{user}:"));
		let removed = self.storage.delete_prefix(&prefix).await?;

		tracing::debug!(user = %user, removed, "Invalidated cached user data.");

		Ok(removed)
	}

	/// Backend entry counts.
	pub async fn stats(&self) -> Result<CacheStats, CacheError> {
		Ok(CacheStats { entries: self.storage.entry_count().await? })
	}

	/// Key for per-user data (prefix not included).
	pub fn generate_user_key(
		&self,
		user: &UserId,
		endpoint: &str,
		params: Option<&QueryParams>,
	) -> String {
		with_param_hash(format!("user:{user}:{endpoint}"), params)
	}

	/// Key for shared data such as artists or tracks (prefix not included).
	pub fn generate_key(&self, kind: &str, id: &str, params: Option<&QueryParams>) -> String {
		with_param_hash(format!("{kind}:{id}"), params)
	}

	async fn store<T>(&self, full_key: String, value: &T, ttl: Option<Duration>) -> Result<(), CacheError>
	where
		T: Serialize,
	{
		let data = serde_json::to_value(value)
			.map_err(|source| CacheError::Encode { key: full_key.clone(), source })?;
		let ttl = ttl.filter(|ttl| ttl.is_positive()).unwrap_or(self.options.ttl);

		self.storage.set(CacheEntry::new(full_key, data, ttl, unix_now_ms())).await
	}

	fn build_key(&self, key: &str) -> String {
		format!("{}{key}", self.options.key_prefix)
	}
}
impl Debug for CacheService {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CacheService").field("options", &self.options).finish()
	}
}

fn with_param_hash(base: String, params: Option<&QueryParams>) -> String {
	match params.filter(|params| !params.is_empty()) {
		Some(params) => format!("{base}:{}", param_hash(params)),
		None => base,
	}
}

fn param_hash(params: &QueryParams) -> String {
	let digest = Sha256::digest(params.canonical().as_bytes());
	let mut encoded = URL_SAFE_NO_PAD.encode(digest);

	encoded.truncate(PARAM_HASH_LEN);

	encoded
}
