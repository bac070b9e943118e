use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use moka::sync::Cache;

use crate::compiler::{CompiledQuery, UserId, Viewer};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
	query: String,
	viewer: Option<UserId>,
}

impl CacheKey {
	pub fn new(query: &str, viewer: &Viewer) -> Self {
		Self {
			query: query.to_string(),
			viewer: viewer.id,
		}
	}

	/// Stable within one process, for logs and external caches.
	pub fn fingerprint(&self) -> u64 {
		let mut hasher = DefaultHasher::new();
		self.hash(&mut hasher);
		hasher.finish()
	}
}

/// Compiled queries by (query text, viewer), bounded to `capacity` entries. Any change to the
/// tag namespace must be followed by [`QueryCache::invalidate`], since compiled predicates
/// embed tag ids.
#[derive(Debug, Clone)]
pub struct QueryCache {
	entries: Cache<CacheKey, Arc<CompiledQuery>>,
}

impl Default for QueryCache {
	fn default() -> Self {
		Self::new(4096)
	}
}

impl QueryCache {
	pub fn new(capacity: u64) -> Self {
		let entries = Cache::builder().max_capacity(capacity.max(1)).build();
		Self { entries }
	}

	pub fn get(&self, key: &CacheKey) -> Option<Arc<CompiledQuery>> {
		self.entries.get(key)
	}

	pub fn insert(&self, key: CacheKey, compiled: Arc<CompiledQuery>) {
		self.entries.insert(key, compiled);
	}

	pub fn invalidate(&self) {
		log::debug!("invalidating {} cached queries", self.entries.entry_count());
		self.entries.invalidate_all();
	}

	pub fn len(&self) -> usize {
		self.entries.run_pending_tasks();
		self.entries.entry_count() as usize
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
