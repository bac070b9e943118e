use super::ast::*;
use super::data::*;

/// Implicit "=" used when a search field is written without an operator.
const DEFAULT_OPERATOR: &str = "=";

/// Turns a token sequence into an [`Ast`].
///
/// ```text
/// query   := term+ END
/// term    := tag | not | or | meta
/// tag     := WORD
/// not     := NOT WORD
/// or      := OR_START orTerm (OR_CONTINUE orTerm)+ OR_END
/// orTerm  := tag | not
/// meta    := WORD META [OPERATOR] WORD
/// ```
pub fn build<'a>(tokens: &[Token<'a>]) -> Result<'a, Ast<'a>> {
	AstBuilder::new(tokens).build()
}

pub struct AstBuilder<'t, 'a> {
	tokens: &'t [Token<'a>],
	position: usize,
}

impl<'t, 'a> AstBuilder<'t, 'a> {
	pub fn new(tokens: &'t [Token<'a>]) -> Self {
		Self {
			tokens,
			position: 0,
		}
	}

	pub fn build(mut self) -> Result<'a, Ast<'a>> {
		let mut terms = vec![];
		loop {
			let token = self.peek();
			match token.kind {
				TokenKind::End => break,
				TokenKind::OrEnd => return Err(ParseError::StrayOrEnd { token }),
				_ => terms.push(self.term()?),
			}
		}
		let end = self.peek();
		let root = match terms.len() {
			0 => return Err(ParseError::EmptyQuery { token: end }),
			1 => terms.remove(0),
			_ => {
				let position = terms[0].token.position;
				Node::branch(NodeKind::And, Token::synthetic("", position), terms)
			}
		};
		Ok(Ast::new(root))
	}

	// The token stream always ends with End, so running past it keeps returning End.
	fn peek(&self) -> Token<'a> {
		self.peek_at(0)
	}

	fn peek_at(&self, offset: usize) -> Token<'a> {
		match self.tokens.get(self.position + offset) {
			Some(token) => *token,
			None => self.end_token(),
		}
	}

	fn end_token(&self) -> Token<'a> {
		let position = self
			.tokens
			.last()
			.map(|t| t.position + t.value.len())
			.unwrap_or(0);
		Token::new(TokenKind::End, "", position)
	}

	fn advance(&mut self) -> Token<'a> {
		let token = self.peek();
		if self.position < self.tokens.len() {
			self.position += 1;
		}
		token
	}

	fn term(&mut self) -> Result<'a, Node<'a>> {
		let token = self.peek();
		match token.kind {
			TokenKind::Word if self.peek_at(1).is(TokenKind::Meta) => self.meta(),
			TokenKind::Word => Ok(self.tag()),
			TokenKind::Not => self.not(),
			TokenKind::OrStart => self.or(),
			TokenKind::Meta => Err(ParseError::MissingMetaField { token }),
			_ => Err(ParseError::UnexpectedToken { token }),
		}
	}

	fn tag(&mut self) -> Node<'a> {
		Node::leaf(NodeKind::Tag, self.advance())
	}

	fn not(&mut self) -> Result<'a, Node<'a>> {
		self.advance();
		let token = self.peek();
		match token.kind {
			TokenKind::Word => {
				self.advance();
				let next = self.peek();
				if next.is(TokenKind::Meta) {
					return Err(ParseError::NegatedMeta { token: next });
				}
				Ok(Node::leaf(NodeKind::NotTag, token))
			}
			TokenKind::Not => Err(ParseError::DoubleNegation { token }),
			_ => Err(ParseError::NegationWithoutTag { token }),
		}
	}

	fn or(&mut self) -> Result<'a, Node<'a>> {
		let start = self.advance();
		let mut terms = vec![];
		loop {
			let token = self.peek();
			match token.kind {
				TokenKind::OrEnd if terms.is_empty() => return Err(ParseError::EmptyOr { token }),
				TokenKind::OrContinue | TokenKind::OrEnd => {
					return Err(ParseError::DanglingContinuation { token })
				}
				_ => terms.push(self.or_term()?),
			}

			let token = self.advance();
			match token.kind {
				TokenKind::OrContinue => continue,
				TokenKind::OrEnd if terms.len() < 2 => {
					return Err(ParseError::SingleTermOr { token })
				}
				TokenKind::OrEnd => break,
				TokenKind::End => return Err(ParseError::UnterminatedOr { token }),
				TokenKind::OrStart => return Err(ParseError::NestedOr { token }),
				_ => return Err(ParseError::MissingOrContinue { token }),
			}
		}
		Ok(Node::branch(NodeKind::Or, start, terms))
	}

	fn or_term(&mut self) -> Result<'a, Node<'a>> {
		let token = self.peek();
		match token.kind {
			TokenKind::Word if self.peek_at(1).is(TokenKind::Meta) => {
				Err(ParseError::MetaInOr { token })
			}
			TokenKind::Word => Ok(self.tag()),
			TokenKind::Not => self.not().map_err(|err| match err {
				ParseError::NegatedMeta { token } => ParseError::MetaInOr { token },
				err => err,
			}),
			TokenKind::OrStart => Err(ParseError::NestedOr { token }),
			TokenKind::Meta => Err(ParseError::MetaInOr { token }),
			TokenKind::End => Err(ParseError::UnterminatedOr { token }),
			_ => Err(ParseError::UnexpectedToken { token }),
		}
	}

	fn meta(&mut self) -> Result<'a, Node<'a>> {
		let field = self.advance();
		let colon = self.advance();
		let operator = if self.peek().is(TokenKind::Operator) {
			self.advance()
		} else {
			Token::synthetic(DEFAULT_OPERATOR, colon.position)
		};
		let token = self.peek();
		let value = match token.kind {
			TokenKind::Word => self.advance(),
			TokenKind::Not => return Err(ParseError::NegatedMetaValue { token }),
			_ => return Err(ParseError::MissingMetaValue { token }),
		};
		Ok(Node::branch(
			NodeKind::Meta,
			colon,
			vec![
				Node::leaf(NodeKind::MetaField, field),
				Node::leaf(NodeKind::MetaOperator, operator),
				Node::leaf(NodeKind::MetaValue, value),
			],
		))
	}
}
