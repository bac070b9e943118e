use std::fmt;

pub type Result<'a, T> = std::result::Result<T, ParseError<'a>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
	Word,
	OrStart,
	OrContinue,
	OrEnd,
	Not,
	Meta,
	Operator,
	End,
	/// Synthetic token of a structural node that has no source text.
	Default,
}

impl fmt::Display for TokenKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			TokenKind::Word => "WORD",
			TokenKind::OrStart => "OR_START",
			TokenKind::OrContinue => "OR_CONTINUE",
			TokenKind::OrEnd => "OR_END",
			TokenKind::Not => "NOT",
			TokenKind::Meta => "META",
			TokenKind::Operator => "OPERATOR",
			TokenKind::End => "END",
			TokenKind::Default => "DEFAULT",
		};
		f.write_str(name)
	}
}

/// A lexical unit. `value` borrows the query text, `position` is the byte offset of its first
/// character (synthetic tokens report the position of the construct they belong to).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
	pub kind: TokenKind,
	pub value: &'a str,
	pub position: usize,
}

impl<'a> Token<'a> {
	pub fn new(kind: TokenKind, value: &'a str, position: usize) -> Self {
		Self {
			kind,
			value,
			position,
		}
	}

	pub fn synthetic(value: &'a str, position: usize) -> Self {
		Self::new(TokenKind::Default, value, position)
	}

	pub fn is(&self, kind: TokenKind) -> bool {
		self.kind == kind
	}
}

impl fmt::Display for Token<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.kind {
			TokenKind::End => write!(f, "end of query"),
			_ => write!(f, "{} '{}' at {}", self.kind, self.value, self.position),
		}
	}
}

/// Grammar violations. Every variant carries the token at which the violation was detected.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError<'a> {
	#[error("query contains no tags or search terms")]
	EmptyQuery { token: Token<'a> },
	#[error("unexpected {token}")]
	UnexpectedToken { token: Token<'a> },
	#[error("'{{' is never closed with '}}'")]
	UnterminatedOr { token: Token<'a> },
	#[error("'{{}}' contains no terms")]
	EmptyOr { token: Token<'a> },
	#[error("'{{' ... '}}' needs at least two terms separated by '~'")]
	SingleTermOr { token: Token<'a> },
	#[error("'~' is missing a term near {token}")]
	DanglingContinuation { token: Token<'a> },
	#[error("terms inside '{{' ... '}}' must be separated by '~', found {token}")]
	MissingOrContinue { token: Token<'a> },
	#[error("'}}' without a matching '{{' at {}", .token.position)]
	StrayOrEnd { token: Token<'a> },
	#[error("'{{' ... '}}' blocks cannot be nested")]
	NestedOr { token: Token<'a> },
	#[error("search fields are not allowed inside '{{' ... '}}', found {token}")]
	MetaInOr { token: Token<'a> },
	#[error("'-' must be followed by a tag, found another '-' at {}", .token.position)]
	DoubleNegation { token: Token<'a> },
	#[error("'-' must be followed by a tag, found {token}")]
	NegationWithoutTag { token: Token<'a> },
	#[error("search fields cannot be negated, found {token}")]
	NegatedMeta { token: Token<'a> },
	#[error("':' is missing its field name at {}", .token.position)]
	MissingMetaField { token: Token<'a> },
	#[error("search field is missing its value, found {token}")]
	MissingMetaValue { token: Token<'a> },
	#[error("search field values cannot be negated, found {token}")]
	NegatedMetaValue { token: Token<'a> },
}

impl<'a> ParseError<'a> {
	pub fn token(&self) -> Token<'a> {
		match self {
			ParseError::EmptyQuery { token }
			| ParseError::UnexpectedToken { token }
			| ParseError::UnterminatedOr { token }
			| ParseError::EmptyOr { token }
			| ParseError::SingleTermOr { token }
			| ParseError::DanglingContinuation { token }
			| ParseError::MissingOrContinue { token }
			| ParseError::StrayOrEnd { token }
			| ParseError::NestedOr { token }
			| ParseError::MetaInOr { token }
			| ParseError::DoubleNegation { token }
			| ParseError::NegationWithoutTag { token }
			| ParseError::NegatedMeta { token }
			| ParseError::MissingMetaField { token }
			| ParseError::MissingMetaValue { token }
			| ParseError::NegatedMetaValue { token } => *token,
		}
	}

	pub fn message(&self) -> String {
		self.to_string()
	}
}
