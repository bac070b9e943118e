use super::*;
use crate::tests;
use std::io::Cursor;

#[test]
fn resolves_case_insensitively() -> anyhow::Result<()> {
	let store = MemoryStore::new();
	let id = store.create_tag("Blue-Eyes")?;
	let inner = store.read();
	assert_eq!(inner.resolve("blue-eyes"), Some(id));
	assert_eq!(inner.resolve("BLUE-EYES"), Some(id));
	assert_eq!(inner.resolve("blue"), None);
	Ok(())
}

#[test]
fn aliases_follow_their_target() -> anyhow::Result<()> {
	let store = MemoryStore::new();
	let cat = store.create_tag("cat")?;
	store.add_alias("kitty", "cat")?;
	store.add_alias("neko", "KITTY")?;
	store.rename_tag("cat", "felis")?;

	let inner = store.read();
	assert_eq!(inner.resolve("kitty"), Some(cat));
	assert_eq!(inner.resolve("neko"), Some(cat));
	assert_eq!(inner.resolve("felis"), Some(cat));
	assert_eq!(inner.resolve("cat"), None);
	Ok(())
}

#[test]
fn rejects_collisions() -> anyhow::Result<()> {
	let store = MemoryStore::new();
	store.create_tag("cat")?;
	store.create_tag("dog")?;
	store.add_alias("kitty", "cat")?;

	assert!(store.create_tag("CAT").is_err());
	assert!(store.create_tag("kitty").is_err());
	assert!(store.add_alias("dog", "cat").is_err());
	assert!(store.add_alias("puppy", "wolf").is_err());
	assert!(store.rename_tag("cat", "dog").is_err());
	assert!(store.rename_tag("wolf", "fox").is_err());
	Ok(())
}

#[test]
fn snapshot() -> anyhow::Result<()> {
	let store = tests::fixture()?;
	let mut buf = Cursor::new(vec![]);
	store.save(&mut buf)?;
	buf.set_position(0);

	let loaded = MemoryStore::load(&mut buf)?;
	assert_eq!(*store.read(), *loaded.read());
	assert_eq!(loaded.create_tag("owl")?, 3);
	Ok(())
}

#[test]
fn truncated_snapshot_is_an_error() -> anyhow::Result<()> {
	let store = tests::fixture()?;
	let mut buf = vec![];
	store.save(&mut buf)?;
	buf.truncate(buf.len() / 2);
	assert!(MemoryStore::load(Cursor::new(buf)).is_err());
	Ok(())
}

#[test]
fn collaborators() -> anyhow::Result<()> {
	tests::async_basic!({
		let store = tests::fixture()?;
		assert_eq!(store.resolve("Kitty").await?, Some(0));
		assert_eq!(store.resolve("owl").await?, None);

		let alice = store.rating_visibility(&Viewer::user(tests::ALICE)).await?;
		assert_eq!(alice, RatingVisibility::default());
		let stranger = store.rating_visibility(&Viewer::user(99)).await?;
		assert_eq!(stranger, RatingVisibility::hide_all());
		let anonymous = store.rating_visibility(&Viewer::anonymous()).await?;
		assert_eq!(anonymous, RatingVisibility::hide_all());
		Ok(())
	})
}
