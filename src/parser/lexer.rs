use super::data::*;

const SYMBOLS: [(char, TokenKind); 5] = [
	('{', TokenKind::OrStart),
	('~', TokenKind::OrContinue),
	('}', TokenKind::OrEnd),
	('-', TokenKind::Not),
	(':', TokenKind::Meta),
];

const OPERATORS: [char; 4] = ['>', '<', '=', '!'];

/// Splits a query into tokens. Never fails: malformed queries are rejected by the builder.
/// The last token yielded is always a single `End`.
pub fn tokenize(query: &str) -> Vec<Token> {
	Tokenizer::from(query).collect()
}

pub struct Tokenizer<'a> {
	tail: &'a str,
	position: usize,
	after_meta: bool,
	finished: bool,
}

impl<'a> From<&'a str> for Tokenizer<'a> {
	fn from(input: &'a str) -> Self {
		Self {
			tail: input,
			position: 0,
			after_meta: false,
			finished: false,
		}
	}
}

impl<'a> Iterator for Tokenizer<'a> {
	type Item = Token<'a>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.finished {
			return None;
		}
		self.skip_whitespace();
		let position = self.position;
		if self.tail.is_empty() {
			self.finished = true;
			return Some(Token::new(TokenKind::End, "", position));
		}
		if std::mem::take(&mut self.after_meta) {
			if let Some(value) = self.next_operator() {
				return Some(Token::new(TokenKind::Operator, value, position));
			}
		}
		let token = match self.next_symbol() {
			Some((kind, value)) => {
				self.after_meta = kind == TokenKind::Meta;
				Token::new(kind, value, position)
			}
			None => Token::new(TokenKind::Word, self.next_word(), position),
		};
		Some(token)
	}
}

impl<'a> Tokenizer<'a> {
	fn skip_whitespace(&mut self) {
		self.advance_bytes(self.try_chars(|c| c.is_whitespace()));
	}

	fn next_symbol(&mut self) -> Option<(TokenKind, &'a str)> {
		let c = self.tail.chars().next()?;
		let (_, kind) = SYMBOLS.iter().find(|(symbol, _)| *symbol == c)?;
		Some((*kind, self.advance_bytes(c.len_utf8())))
	}

	fn next_operator(&mut self) -> Option<&'a str> {
		let c = self.tail.chars().next()?;
		if OPERATORS.contains(&c) {
			Some(self.advance_bytes(c.len_utf8()))
		} else {
			None
		}
	}

	// '-' only starts a token at a word boundary, inside a word it is part of the tag name
	fn next_word(&mut self) -> &'a str {
		self.advance_bytes(self.try_chars(|&c| !c.is_whitespace() && !"{~}:".contains(c)))
	}

	fn try_chars(&self, f: impl FnMut(&char) -> bool) -> usize {
		self.tail.chars().take_while(f).map(char::len_utf8).sum()
	}

	fn advance_bytes(&mut self, count: usize) -> &'a str {
		let (word, tail) = self.tail.split_at(count);
		self.position += count;
		self.tail = tail;
		word
	}
}
