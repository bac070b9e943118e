use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::compiler::Order;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
	/// Ordering used when the query has no `sort:` term.
	pub default_order: Order,
	/// Append `status = ok` when the query does not constrain `status:`.
	pub hide_deleted: bool,
	/// Compile `<` as greater-than, the way the first version of the language did.
	pub legacy_less_than: bool,
	/// Upper bound for each batch of tag or preference lookups.
	pub lookup_timeout: Option<Duration>,
}

impl Default for CompilerConfig {
	fn default() -> Self {
		Self {
			default_order: Order::default(),
			hide_deleted: true,
			legacy_less_than: true,
			lookup_timeout: None,
		}
	}
}

impl CompilerConfig {
	/// Defaults overridden by `TAGSEARCH_HIDE_DELETED`, `TAGSEARCH_LEGACY_LESS_THAN` and
	/// `TAGSEARCH_LOOKUP_TIMEOUT_MS`.
	pub fn from_env() -> anyhow::Result<Self> {
		Self::from_vars(|name| std::env::var(name).ok())
	}

	fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
		let mut config = Self::default();
		if let Some(value) = var("TAGSEARCH_HIDE_DELETED") {
			config.hide_deleted = value
				.parse()
				.with_context(|| format!("TAGSEARCH_HIDE_DELETED={:?}", value))?;
		}
		if let Some(value) = var("TAGSEARCH_LEGACY_LESS_THAN") {
			config.legacy_less_than = value
				.parse()
				.with_context(|| format!("TAGSEARCH_LEGACY_LESS_THAN={:?}", value))?;
		}
		if let Some(value) = var("TAGSEARCH_LOOKUP_TIMEOUT_MS") {
			let millis: u64 = value
				.parse()
				.with_context(|| format!("TAGSEARCH_LOOKUP_TIMEOUT_MS={:?}", value))?;
			config.lookup_timeout = Some(Duration::from_millis(millis));
		}
		log::debug!("compiler config: {:?}", config);
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |name| map.get(name).cloned()
	}

	#[test]
	fn defaults() -> anyhow::Result<()> {
		assert_eq!(CompilerConfig::from_vars(vars(&[]))?, CompilerConfig::default());
		Ok(())
	}

	#[test]
	fn overrides() -> anyhow::Result<()> {
		let config = CompilerConfig::from_vars(vars(&[
			("TAGSEARCH_HIDE_DELETED", "false"),
			("TAGSEARCH_LEGACY_LESS_THAN", "false"),
			("TAGSEARCH_LOOKUP_TIMEOUT_MS", "250"),
		]))?;
		assert!(!config.hide_deleted);
		assert!(!config.legacy_less_than);
		assert_eq!(config.lookup_timeout, Some(Duration::from_millis(250)));
		Ok(())
	}

	#[test]
	fn rejects_garbage() {
		let err = CompilerConfig::from_vars(vars(&[("TAGSEARCH_LOOKUP_TIMEOUT_MS", "soon")]))
			.unwrap_err();
		assert!(err.to_string().contains("TAGSEARCH_LOOKUP_TIMEOUT_MS"));
	}
}
