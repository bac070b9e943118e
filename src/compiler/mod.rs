//! Turns a parsed query into a [`CompiledQuery`] for the storage layer.
//!
//! Tag names are resolved up front, all distinct names concurrently, and the predicate is then
//! assembled in a single synchronous walk that mirrors the tree. Tags that do not exist are not
//! errors: `cat` becomes [`Predicate::False`] and `-cat` becomes [`Predicate::True`].

mod fields;
mod predicate;

pub use predicate::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CompilerConfig;
use crate::parser::{Ast, Node, NodeKind};

/// Maps a tag name to its id. Lookups are case-insensitive and aliases resolve to their target.
#[async_trait]
pub trait TagResolver: Send + Sync {
	async fn resolve(&self, name: &str) -> anyhow::Result<Option<TagId>>;
}

/// Which restricted ratings a viewer hides unless the query asks for a rating explicitly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingVisibility {
	pub hide_unsafe: bool,
	pub hide_explicit: bool,
}

impl RatingVisibility {
	pub fn hide_all() -> Self {
		Self {
			hide_unsafe: true,
			hide_explicit: true,
		}
	}
}

#[async_trait]
pub trait PreferenceStore: Send + Sync {
	async fn rating_visibility(&self, viewer: &Viewer) -> anyhow::Result<RatingVisibility>;
}

#[async_trait]
impl<T: TagResolver + ?Sized> TagResolver for Arc<T> {
	async fn resolve(&self, name: &str) -> anyhow::Result<Option<TagId>> {
		(**self).resolve(name).await
	}
}

#[async_trait]
impl<T: PreferenceStore + ?Sized> PreferenceStore for Arc<T> {
	async fn rating_visibility(&self, viewer: &Viewer) -> anyhow::Result<RatingVisibility> {
		(**self).rating_visibility(viewer).await
	}
}

/// The account a query runs for; `None` is an anonymous visitor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewer {
	pub id: Option<UserId>,
}

impl Viewer {
	pub fn anonymous() -> Self {
		Self { id: None }
	}

	pub fn user(id: UserId) -> Self {
		Self { id: Some(id) }
	}
}

#[derive(thiserror::Error, Debug)]
pub enum CompileError {
	#[error("invalid search field '{0}'")]
	InvalidField(String),
	#[error("invalid value '{value}' for search field '{field}'")]
	InvalidValue { field: String, value: String },
	#[error("search field '{field}' expects a number, found '{value}'")]
	NotNumeric { field: String, value: String },
	#[error("invalid sort key '{0}'")]
	InvalidSortKey(String),
	#[error("lookup failed: {0}")]
	Lookup(#[source] anyhow::Error),
	#[error("lookup did not finish within {0:?}")]
	TimedOut(Duration),
}

impl CompileError {
	/// Lookup failures may go away on their own, query errors never do.
	pub fn is_retryable(&self) -> bool {
		matches!(self, CompileError::Lookup(_) | CompileError::TimedOut(_))
	}
}

pub struct QueryCompiler<R, P> {
	resolver: R,
	preferences: P,
	config: CompilerConfig,
}

impl<R: TagResolver, P: PreferenceStore> QueryCompiler<R, P> {
	pub fn new(resolver: R, preferences: P, config: CompilerConfig) -> Self {
		Self {
			resolver,
			preferences,
			config,
		}
	}

	pub fn config(&self) -> &CompilerConfig {
		&self.config
	}

	pub async fn compile(&self, ast: &Ast<'_>, viewer: &Viewer) -> Result<CompiledQuery, CompileError> {
		let tags = self.lookup(self.resolve_tags(ast)).await?;

		let mut compilation = Compilation::new(&tags, &self.config);
		let mut parts: Vec<Predicate> = compilation.node(ast.root())?.into_iter().collect();

		if !compilation.rating_constrained {
			let visibility = self
				.lookup(self.preferences.rating_visibility(viewer))
				.await?;
			parts.extend(compilation.rating_exclusions(visibility));
		}
		if !compilation.status_constrained && self.config.hide_deleted {
			parts.push(compilation.status_ok());
		}

		Ok(CompiledQuery {
			predicate: Predicate::all(parts),
			params: compilation.params,
			order: compilation.order.unwrap_or(self.config.default_order),
			rating_constrained: compilation.rating_constrained,
			status_constrained: compilation.status_constrained,
		})
	}

	async fn resolve_tags(&self, ast: &Ast<'_>) -> anyhow::Result<HashMap<String, Option<TagId>>> {
		let names: BTreeSet<String> = ast
			.iter()
			.filter(|node| matches!(node.kind, NodeKind::Tag | NodeKind::NotTag))
			.map(|node| node.value().to_lowercase())
			.collect();
		log::debug!("resolving {} distinct tags", names.len());
		let ids =
			futures::future::try_join_all(names.iter().map(|name| self.resolver.resolve(name)))
				.await?;
		Ok(names.into_iter().zip(ids).collect())
	}

	async fn lookup<T>(
		&self,
		future: impl Future<Output = anyhow::Result<T>>,
	) -> Result<T, CompileError> {
		let result = match self.config.lookup_timeout {
			Some(limit) => tokio::time::timeout(limit, future)
				.await
				.map_err(|_| CompileError::TimedOut(limit))?,
			None => future.await,
		};
		result.map_err(CompileError::Lookup)
	}
}

/// Per-query state threaded through the walk.
struct Compilation<'c> {
	tags: &'c HashMap<String, Option<TagId>>,
	config: &'c CompilerConfig,
	params: Vec<Param>,
	order: Option<Order>,
	rating_constrained: bool,
	status_constrained: bool,
}

impl<'c> Compilation<'c> {
	fn new(tags: &'c HashMap<String, Option<TagId>>, config: &'c CompilerConfig) -> Self {
		Self {
			tags,
			config,
			params: vec![],
			order: None,
			rating_constrained: false,
			status_constrained: false,
		}
	}

	fn param(&mut self, param: Param) -> usize {
		self.params.push(param);
		self.params.len() - 1
	}

	fn text(&mut self, text: &str) -> usize {
		self.param(Param::Text(text.to_string()))
	}

	/// `None` when the node only affects compiler state, as `sort:` does.
	fn node(&mut self, node: &Node) -> Result<Option<Predicate>, CompileError> {
		let predicate = match node.kind {
			NodeKind::And => Predicate::all(self.children(node)?),
			NodeKind::Or => Predicate::any(self.children(node)?),
			NodeKind::Tag => match self.tag_id(node.value()) {
				Some(id) => Predicate::HasTag {
					param: self.param(Param::Id(id)),
				},
				None => Predicate::False,
			},
			NodeKind::NotTag => match self.tag_id(node.value()) {
				Some(id) => Predicate::HasTag {
					param: self.param(Param::Id(id)),
				}
				.negate(),
				None => Predicate::True,
			},
			NodeKind::Meta => match node.meta_parts() {
				Some((field, operator, value)) => {
					return self.meta(field.value(), operator.value(), value.value())
				}
				None => {
					debug_assert!(false, "meta node without its three parts");
					return Ok(None);
				}
			},
			// consumed through their Meta parent
			NodeKind::MetaField | NodeKind::MetaOperator | NodeKind::MetaValue => return Ok(None),
		};
		Ok(Some(predicate))
	}

	fn children(&mut self, node: &Node) -> Result<Vec<Predicate>, CompileError> {
		let mut parts = Vec::with_capacity(node.children.len());
		for child in &node.children {
			parts.extend(self.node(child)?);
		}
		Ok(parts)
	}

	fn tag_id(&self, name: &str) -> Option<TagId> {
		self.tags.get(&name.to_lowercase()).copied().flatten()
	}

	fn rating_exclusions(&mut self, visibility: RatingVisibility) -> Vec<Predicate> {
		let mut hidden = vec![];
		if visibility.hide_unsafe {
			hidden.push(Rating::Unsafe);
		}
		if visibility.hide_explicit {
			hidden.push(Rating::Explicit);
		}
		hidden
			.into_iter()
			.map(|rating| Predicate::Compare {
				column: Column::Rating,
				comparator: Comparator::NotEqual,
				param: self.text(rating.as_str()),
			})
			.collect()
	}

	fn status_ok(&mut self) -> Predicate {
		Predicate::Compare {
			column: Column::Status,
			comparator: Comparator::Equal,
			param: self.text(PostStatus::Ok.as_str()),
		}
	}
}

#[cfg(test)]
mod tests;
