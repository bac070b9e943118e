//! Tag search query language: `tokenize` → `build` → `QueryCompiler::compile`.
//!
//! ```text
//! {cat ~ dog} -fox rating:general user:>10 sort:id_asc
//! ```

pub mod cache;
pub mod compiler;
pub mod config;
pub mod parser;
pub mod search;
pub mod store;

#[cfg(test)]
mod tests;

pub use cache::{CacheKey, QueryCache};
pub use compiler::{
	CompileError, CompiledQuery, PreferenceStore, Predicate, QueryCompiler, RatingVisibility,
	TagResolver, Viewer,
};
pub use config::CompilerConfig;
pub use parser::{parse, Ast, Node, NodeKind, ParseError, Token, TokenKind};
pub use search::{SearchError, Searcher};
pub use store::MemoryStore;
