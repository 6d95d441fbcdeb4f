//! Token persistence contract and built-in stores.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{SpotifyTokens, UserId},
};

/// Boxed future returned by [`TokenStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Per-user token storage.
///
/// Implementations must tolerate concurrent calls; the token manager serializes refreshes for
/// one user but reads and writes for different users may interleave freely.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Tokens stored for `user`, if any.
	fn get<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<SpotifyTokens>>;

	/// Stores or replaces the tokens for `user`.
	fn set<'a>(&'a self, user: &'a UserId, tokens: SpotifyTokens) -> StoreFuture<'a, ()>;

	/// Removes the tokens for `user`; a no-op when nothing is stored.
	fn delete<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
