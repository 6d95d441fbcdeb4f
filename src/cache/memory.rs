//! In-process [`CacheStorage`] with lazy eviction and an optional background sweeper.

// std
use std::sync::Weak;
// crates.io
use tokio::task::JoinHandle;
// self
use crate::{
	_prelude::*,
	cache::{CacheEntry, CacheError, CacheFuture, CacheStorage, unix_now_ms},
};

type Entries = HashMap<String, CacheEntry>;

/// Interval used by [`MemoryCacheStorage::spawn_sweeper`] callers that have no preference.
pub const DEFAULT_SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(60);

/// Thread-safe map of cache entries.
///
/// Expired entries are dropped when read. Long-running processes should also call
/// [`MemoryCacheStorage::spawn_sweeper`] so entries that are never read again get reclaimed.
#[derive(Clone, Debug, Default)]
pub struct MemoryCacheStorage(Arc<RwLock<Entries>>);
impl MemoryCacheStorage {
	/// Number of stored entries, including expired ones not yet swept.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Raw entry for `key`, expired or not.
	pub fn peek(&self, key: &str) -> Option<CacheEntry> {
		self.0.read().get(key).cloned()
	}

	/// Removes every expired entry and returns how many were removed.
	pub fn sweep_expired(&self) -> usize {
		sweep(&self.0, unix_now_ms())
	}

	/// Spawns a task on the current tokio runtime that sweeps expired entries every `interval`.
	///
	/// The task stops when the returned handle or every clone of this storage is dropped.
	pub fn spawn_sweeper(&self, interval: StdDuration) -> SweeperHandle {
		let entries = Arc::downgrade(&self.0);
		let task = tokio::spawn(run_sweeper(entries, interval));

		SweeperHandle(task)
	}

	fn live(&self, key: &str) -> Option<CacheEntry> {
		let now = unix_now_ms();

		{
			let entries = self.0.read();

			match entries.get(key) {
				Some(entry) if entry.is_valid_at(now) => return Some(entry.clone()),
				Some(_) => {},
				None => return None,
			}
		}

		let mut entries = self.0.write();

		if entries.get(key).is_some_and(|entry| !entry.is_valid_at(now)) {
			entries.remove(key);
		}

		None
	}
}
impl CacheStorage for MemoryCacheStorage {
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<CacheEntry>> {
		Box::pin(async move { Ok(self.live(key)) })
	}

	fn set(&self, entry: CacheEntry) -> CacheFuture<'_, ()> {
		Box::pin(async move {
			self.0.write().insert(entry.key.clone(), entry);

			Ok(())
		})
	}

	fn delete<'a>(&'a self, key: &'a str) -> CacheFuture<'a, ()> {
		Box::pin(async move {
			self.0.write().remove(key);

			Ok(())
		})
	}

	fn clear(&self) -> CacheFuture<'_, ()> {
		Box::pin(async move {
			self.0.write().clear();

			Ok(())
		})
	}

	fn has<'a>(&'a self, key: &'a str) -> CacheFuture<'a, bool> {
		Box::pin(async move { Ok(self.live(key).is_some()) })
	}

	fn delete_prefix<'a>(&'a self, prefix: &'a str) -> CacheFuture<'a, usize> {
		Box::pin(async move {
			let mut entries = self.0.write();
			let before = entries.len();

			entries.retain(|key, _| !key.starts_with(prefix));

			Ok::<_, CacheError>(before - entries.len())
		})
	}

	fn entry_count(&self) -> CacheFuture<'_, usize> {
		Box::pin(async move { Ok(self.len()) })
	}
}

/// Owns a background sweep task; dropping it stops the task.
#[derive(Debug)]
pub struct SweeperHandle(JoinHandle<()>);
impl SweeperHandle {
	/// Stops the task.
	pub fn stop(self) {}

	/// Returns `true` once the task has exited.
	pub fn is_finished(&self) -> bool {
		self.0.is_finished()
	}
}
impl Drop for SweeperHandle {
	fn drop(&mut self) {
		self.0.abort();
	}
}

async fn run_sweeper(entries: Weak<RwLock<Entries>>, interval: StdDuration) {
	let mut ticker = tokio::time::interval(interval);

	// The first tick completes immediately.
	ticker.tick().await;

	loop {
		ticker.tick().await;

		let Some(entries) = entries.upgrade() else {
			break;
		};
		let removed = sweep(&entries, unix_now_ms());

		if removed > 0 {
			tracing::trace!(removed, "Swept expired cache entries.");
		}
	}
}

fn sweep(entries: &RwLock<Entries>, now_ms: i64) -> usize {
	let mut entries = entries.write();
	let before = entries.len();

	entries.retain(|_, entry| entry.is_valid_at(now_ms));

	before - entries.len()
}
