//! Thread-safe in-memory [`TokenStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{SpotifyTokens, UserId},
	store::{StoreFuture, TokenStore},
};

type TokenMap = Arc<RwLock<HashMap<UserId, SpotifyTokens>>>;

/// Process-local token store; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(TokenMap);
impl MemoryStore {
	/// Removes every stored token set.
	pub fn clear(&self) {
		self.0.write().clear();
	}

	/// Number of users with stored tokens.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl TokenStore for MemoryStore {
	fn get<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<SpotifyTokens>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(user).cloned()) })
	}

	fn set<'a>(&'a self, user: &'a UserId, tokens: SpotifyTokens) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(user.to_owned(), tokens);

			Ok(())
		})
	}

	fn delete<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().remove(user);

			Ok(())
		})
	}
}
