mod ast;
mod builder;
mod data;
mod lexer;

pub use ast::{Ast, Node, NodeKind, Nodes};
pub use builder::{build, AstBuilder};
pub use data::{ParseError, Result, Token, TokenKind};
pub use lexer::{tokenize, Tokenizer};

/// Tokenizes and builds `query` in one step.
pub fn parse(query: &str) -> Result<Ast> {
	build(&tokenize(query))
}
