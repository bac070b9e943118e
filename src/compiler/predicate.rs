use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type TagId = u64;
pub type UserId = u64;

/// A positional parameter. `$1` in the rendered predicate is `params[0]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Param {
	Id(u64),
	Text(String),
}

impl fmt::Display for Param {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Param::Id(id) => write!(f, "{}", id),
			Param::Text(text) => write!(f, "{:?}", text),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
	AccountId,
	Rating,
	Status,
	Md5,
	Extension,
	FileType,
	Title,
	Description,
	Context,
}

impl Column {
	pub fn name(self) -> &'static str {
		match self {
			Column::AccountId => "account_id",
			Column::Rating => "rating",
			Column::Status => "status",
			Column::Md5 => "md5",
			Column::Extension => "extension",
			Column::FileType => "file_type",
			Column::Title => "title",
			Column::Description => "description",
			Column::Context => "context",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
	Equal,
	GreaterThan,
	LessThan,
	NotEqual,
}

impl Comparator {
	pub fn symbol(self) -> &'static str {
		match self {
			Comparator::Equal => "=",
			Comparator::GreaterThan => ">",
			Comparator::LessThan => "<",
			Comparator::NotEqual => "<>",
		}
	}
}

/// Boolean condition over posts. Leaves refer to positional parameters by index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predicate {
	True,
	False,
	And(Vec<Predicate>),
	Or(Vec<Predicate>),
	Not(Box<Predicate>),
	/// Post carries the tag whose id is the parameter.
	HasTag { param: usize },
	Compare {
		column: Column,
		comparator: Comparator,
		param: usize,
	},
	/// Case-insensitive substring match.
	Contains { column: Column, param: usize },
	/// Post is a child of the post whose id is the parameter.
	ChildOf { param: usize },
	/// Post is a parent of the post whose id is the parameter.
	ParentOf { param: usize },
	InPool { param: usize },
}

impl Predicate {
	/// Conjunction; a single part is returned as is and no parts at all is a tautology.
	pub fn all(mut parts: Vec<Predicate>) -> Predicate {
		match parts.len() {
			0 => Predicate::True,
			1 => parts.remove(0),
			_ => Predicate::And(parts),
		}
	}

	/// Disjunction; a single part is returned as is and no parts at all never matches.
	pub fn any(mut parts: Vec<Predicate>) -> Predicate {
		match parts.len() {
			0 => Predicate::False,
			1 => parts.remove(0),
			_ => Predicate::Or(parts),
		}
	}

	pub fn negate(self) -> Predicate {
		Predicate::Not(Box::new(self))
	}
}

fn join(f: &mut fmt::Formatter<'_>, parts: &[Predicate], separator: &str) -> fmt::Result {
	f.write_str("(")?;
	for (i, part) in parts.iter().enumerate() {
		if i > 0 {
			f.write_str(separator)?;
		}
		write!(f, "{}", part)?;
	}
	f.write_str(")")
}

impl fmt::Display for Predicate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Predicate::True => f.write_str("TRUE"),
			Predicate::False => f.write_str("FALSE"),
			Predicate::And(parts) => join(f, parts, " AND "),
			Predicate::Or(parts) => join(f, parts, " OR "),
			Predicate::Not(inner) => write!(f, "NOT {}", inner),
			Predicate::HasTag { param } => write!(
				f,
				"id IN (SELECT post_id FROM post_tags WHERE tag_id = ${})",
				param + 1
			),
			Predicate::Compare {
				column,
				comparator,
				param,
			} => write!(f, "{} {} ${}", column.name(), comparator.symbol(), param + 1),
			Predicate::Contains { column, param } => {
				write!(f, "{} ILIKE '%' || ${} || '%'", column.name(), param + 1)
			}
			Predicate::ChildOf { param } => write!(
				f,
				"id IN (SELECT child_id FROM post_relations WHERE parent_id = ${})",
				param + 1
			),
			Predicate::ParentOf { param } => write!(
				f,
				"id IN (SELECT parent_id FROM post_relations WHERE child_id = ${})",
				param + 1
			),
			Predicate::InPool { param } => write!(
				f,
				"id IN (SELECT post_id FROM pool_entries WHERE pool_id = ${})",
				param + 1
			),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
	General,
	Unsafe,
	Explicit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostStatus {
	Ok,
	Deleted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
	Image,
	Video,
}

macro_rules! keyword_enum {
	($name:ident { $($variant:ident => $text:literal),* $(,)? }) => {
		impl $name {
			pub fn as_str(self) -> &'static str {
				match self {
					$($name::$variant => $text),*
				}
			}
		}

		impl FromStr for $name {
			type Err = ();

			fn from_str(value: &str) -> Result<Self, Self::Err> {
				$(if value.eq_ignore_ascii_case($text) {
					return Ok($name::$variant);
				})*
				Err(())
			}
		}
	};
}

keyword_enum!(Rating {
	General => "general",
	Unsafe => "unsafe",
	Explicit => "explicit",
});

keyword_enum!(PostStatus {
	Ok => "ok",
	Deleted => "deleted",
});

keyword_enum!(FileType {
	Image => "image",
	Video => "video",
});

keyword_enum!(SortKey {
	Id => "id",
	Size => "size",
	Duration => "duration",
	Width => "width",
	Height => "height",
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
	Id,
	Size,
	Duration,
	Width,
	Height,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
	Ascending,
	Descending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
	pub key: SortKey,
	pub direction: Direction,
}

impl Default for Order {
	fn default() -> Self {
		Self {
			key: SortKey::Id,
			direction: Direction::Descending,
		}
	}
}

/// Accepts `key`, `key_asc` and `key_desc`; a bare key sorts descending.
impl FromStr for Order {
	type Err = ();

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		let lower = value.to_ascii_lowercase();
		let (key, direction) = if let Some(key) = lower.strip_suffix("_asc") {
			(key, Direction::Ascending)
		} else if let Some(key) = lower.strip_suffix("_desc") {
			(key, Direction::Descending)
		} else {
			(lower.as_str(), Direction::Descending)
		};
		Ok(Self {
			key: key.parse()?,
			direction,
		})
	}
}

impl fmt::Display for Order {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let direction = match self.direction {
			Direction::Ascending => "ASC",
			Direction::Descending => "DESC",
		};
		write!(f, "{} {}", self.key.as_str(), direction)
	}
}

/// Result of compiling one query for one viewer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledQuery {
	pub predicate: Predicate,
	pub params: Vec<Param>,
	pub order: Order,
	pub rating_constrained: bool,
	pub status_constrained: bool,
}

impl fmt::Display for CompiledQuery {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "WHERE {}", self.predicate)?;
		writeln!(f, "ORDER BY {}", self.order)?;
		for (i, param) in self.params.iter().enumerate() {
			writeln!(f, "${} = {}", i + 1, param)?;
		}
		Ok(())
	}
}
