use std::sync::Arc;

use crate::cache::{CacheKey, QueryCache};
use crate::compiler::{CompileError, CompiledQuery, PreferenceStore, QueryCompiler, TagResolver, Viewer};
use crate::parser::{self, ParseError, TokenKind};

#[derive(thiserror::Error, Debug)]
pub enum SearchError {
	/// The query text is malformed; `near` and `position` locate the offending token.
	#[error("malformed query near {near:?} at {position}: {message}")]
	Syntax {
		message: String,
		near: String,
		kind: TokenKind,
		position: usize,
	},
	#[error(transparent)]
	Compile(#[from] CompileError),
}

impl SearchError {
	pub fn is_retryable(&self) -> bool {
		match self {
			SearchError::Syntax { .. } => false,
			SearchError::Compile(err) => err.is_retryable(),
		}
	}
}

impl From<ParseError<'_>> for SearchError {
	fn from(err: ParseError<'_>) -> Self {
		let token = err.token();
		SearchError::Syntax {
			message: err.message(),
			near: token.value.to_string(),
			kind: token.kind,
			position: token.position,
		}
	}
}

/// Parses and compiles queries, reusing earlier results for the same text and viewer.
pub struct Searcher<R, P> {
	compiler: QueryCompiler<R, P>,
	cache: QueryCache,
}

impl<R: TagResolver, P: PreferenceStore> Searcher<R, P> {
	pub fn new(compiler: QueryCompiler<R, P>, cache: QueryCache) -> Self {
		Self { compiler, cache }
	}

	pub async fn search(&self, query: &str, viewer: &Viewer) -> Result<Arc<CompiledQuery>, SearchError> {
		let key = CacheKey::new(query, viewer);
		if let Some(compiled) = self.cache.get(&key) {
			log::trace!("query cache hit {:016x}", key.fingerprint());
			return Ok(compiled);
		}
		log::debug!("compiling {:?} for {:?}", query, viewer);

		let ast = parser::parse(query)?;
		let compiled = Arc::new(self.compiler.compile(&ast, viewer).await?);
		self.cache.insert(key, Arc::clone(&compiled));
		Ok(compiled)
	}

	/// Call after a tag is created, renamed or its id reused.
	pub fn invalidate(&self) {
		self.cache.invalidate();
	}

	pub fn cache(&self) -> &QueryCache {
		&self.cache
	}
}
