//! In-memory tag and preference store, persisted as a MessagePack snapshot.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::compiler::{PreferenceStore, RatingVisibility, TagId, TagResolver, UserId, Viewer};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Snapshot {
	next_id: TagId,
	// keys are lowercase
	tags: BTreeMap<String, TagId>,
	aliases: BTreeMap<String, TagId>,
	preferences: BTreeMap<UserId, RatingVisibility>,
	anonymous: RatingVisibility,
}

impl Snapshot {
	fn resolve(&self, name: &str) -> Option<TagId> {
		let name = name.to_lowercase();
		self.tags
			.get(&name)
			.or_else(|| self.aliases.get(&name))
			.copied()
	}

	fn is_taken(&self, name: &str) -> bool {
		self.tags.contains_key(name) || self.aliases.contains_key(name)
	}
}

#[derive(Debug)]
pub struct MemoryStore {
	inner: RwLock<Snapshot>,
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::with_snapshot(Snapshot {
			anonymous: RatingVisibility::hide_all(),
			..Snapshot::default()
		})
	}
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn with_snapshot(snapshot: Snapshot) -> Self {
		Self {
			inner: RwLock::new(snapshot),
		}
	}

	fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
		self.inner.read().unwrap_or_else(PoisonError::into_inner)
	}

	fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
		self.inner.write().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn create_tag(&self, name: &str) -> anyhow::Result<TagId> {
		let name = name.to_lowercase();
		let mut inner = self.write();
		if inner.is_taken(&name) {
			anyhow::bail!("tag or alias '{}' already exists", name);
		}
		let id = inner.next_id;
		inner.next_id += 1;
		inner.tags.insert(name, id);
		Ok(id)
	}

	pub fn rename_tag(&self, from: &str, to: &str) -> anyhow::Result<()> {
		let (from, to) = (from.to_lowercase(), to.to_lowercase());
		let mut inner = self.write();
		if inner.is_taken(&to) {
			anyhow::bail!("tag or alias '{}' already exists", to);
		}
		let id = match inner.tags.remove(&from) {
			Some(id) => id,
			None => anyhow::bail!("no tag named '{}'", from),
		};
		inner.tags.insert(to, id);
		Ok(())
	}

	/// Makes `alias` resolve to the id of the existing tag `target`.
	pub fn add_alias(&self, alias: &str, target: &str) -> anyhow::Result<()> {
		let alias = alias.to_lowercase();
		let mut inner = self.write();
		if inner.is_taken(&alias) {
			anyhow::bail!("tag or alias '{}' already exists", alias);
		}
		let id = match inner.resolve(target) {
			Some(id) => id,
			None => anyhow::bail!("alias target '{}' does not exist", target),
		};
		inner.aliases.insert(alias, id);
		Ok(())
	}

	pub fn set_preferences(&self, user: UserId, visibility: RatingVisibility) {
		self.write().preferences.insert(user, visibility);
	}

	pub fn set_anonymous_preferences(&self, visibility: RatingVisibility) {
		self.write().anonymous = visibility;
	}

	pub fn save(&self, mut output: impl Write) -> anyhow::Result<()> {
		let inner = self.read();
		inner.serialize(&mut rmp_serde::Serializer::new(&mut output))?;
		log::debug!(
			"saved {} tags, {} aliases, {} preferences",
			inner.tags.len(),
			inner.aliases.len(),
			inner.preferences.len()
		);
		Ok(())
	}

	pub fn load(input: impl Read) -> anyhow::Result<Self> {
		let snapshot: Snapshot = rmp_serde::from_read(input)?;
		log::debug!(
			"loaded {} tags, {} aliases, {} preferences",
			snapshot.tags.len(),
			snapshot.aliases.len(),
			snapshot.preferences.len()
		);
		Ok(Self::with_snapshot(snapshot))
	}
}

#[async_trait]
impl TagResolver for MemoryStore {
	async fn resolve(&self, name: &str) -> anyhow::Result<Option<TagId>> {
		Ok(self.read().resolve(name))
	}
}

#[async_trait]
impl PreferenceStore for MemoryStore {
	async fn rating_visibility(&self, viewer: &Viewer) -> anyhow::Result<RatingVisibility> {
		let inner = self.read();
		let visibility = match viewer.id {
			Some(id) => inner.preferences.get(&id).copied().unwrap_or(inner.anonymous),
			None => inner.anonymous,
		};
		Ok(visibility)
	}
}

#[cfg(test)]
#[path = "tests/store.rs"]
mod store_test;
