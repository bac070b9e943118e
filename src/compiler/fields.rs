use std::str::FromStr;

use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
	User,
	Rating,
	Status,
	Md5,
	Extension,
	Parent,
	Child,
	Type,
	Title,
	Description,
	Context,
	Contains,
	Pool,
	Sort,
}

impl FromStr for Field {
	type Err = CompileError;

	fn from_str(name: &str) -> Result<Self, Self::Err> {
		let field = match name.to_ascii_lowercase().as_str() {
			"user" => Field::User,
			"rating" => Field::Rating,
			"status" => Field::Status,
			"md5" => Field::Md5,
			"extension" => Field::Extension,
			"parent" => Field::Parent,
			"child" => Field::Child,
			"type" => Field::Type,
			"title" => Field::Title,
			"description" => Field::Description,
			"context" => Field::Context,
			"contains" => Field::Contains,
			"pool" => Field::Pool,
			"sort" => Field::Sort,
			_ => return Err(CompileError::InvalidField(name.to_string())),
		};
		Ok(field)
	}
}

impl Compilation<'_> {
	pub(super) fn meta(
		&mut self,
		field: &str,
		operator: &str,
		value: &str,
	) -> Result<Option<Predicate>, CompileError> {
		let predicate = match field.parse::<Field>()? {
			Field::User => Predicate::Compare {
				column: Column::AccountId,
				comparator: self.comparator(operator),
				param: self.id(field, value)?,
			},
			Field::Rating => {
				let rating: Rating = keyword(field, value)?;
				self.rating_constrained = true;
				self.equals(Column::Rating, rating.as_str())
			}
			Field::Status => {
				let status: PostStatus = keyword(field, value)?;
				self.status_constrained = true;
				self.equals(Column::Status, status.as_str())
			}
			Field::Md5 => self.compare(Column::Md5, operator, value),
			Field::Extension => self.compare(Column::Extension, operator, value),
			Field::Parent => Predicate::ChildOf {
				param: self.id(field, value)?,
			},
			Field::Child => Predicate::ParentOf {
				param: self.id(field, value)?,
			},
			Field::Type => {
				let file_type: FileType = keyword(field, value)?;
				self.equals(Column::FileType, file_type.as_str())
			}
			Field::Title => self.contains(Column::Title, value),
			Field::Description => self.contains(Column::Description, value),
			Field::Context => self.contains(Column::Context, value),
			Field::Contains => Predicate::Or(vec![
				self.contains(Column::Title, value),
				self.contains(Column::Description, value),
				self.contains(Column::Context, value),
			]),
			Field::Pool => Predicate::InPool {
				param: self.id(field, value)?,
			},
			Field::Sort => {
				let order = value
					.parse()
					.map_err(|_| CompileError::InvalidSortKey(value.to_string()))?;
				self.order = Some(order);
				return Ok(None);
			}
		};
		Ok(Some(predicate))
	}

	/// `<` compiles to greater-than while `legacy_less_than` is set.
	fn comparator(&self, operator: &str) -> Comparator {
		match operator {
			"=" => Comparator::Equal,
			">" => Comparator::GreaterThan,
			"<" if self.config.legacy_less_than => {
				log::warn!("'<' compiled as greater-than (legacy_less_than is enabled)");
				Comparator::GreaterThan
			}
			"<" => Comparator::LessThan,
			// the builder only produces `= > < !`
			_ => Comparator::NotEqual,
		}
	}

	fn id(&mut self, field: &str, value: &str) -> Result<usize, CompileError> {
		let not_numeric = || CompileError::NotNumeric {
			field: field.to_string(),
			value: value.to_string(),
		};
		if !value.bytes().all(|b| b.is_ascii_digit()) {
			return Err(not_numeric());
		}
		let id = value.parse::<u64>().map_err(|_| not_numeric())?;
		Ok(self.param(Param::Id(id)))
	}

	fn compare(&mut self, column: Column, operator: &str, value: &str) -> Predicate {
		Predicate::Compare {
			column,
			comparator: self.comparator(operator),
			param: self.text(value),
		}
	}

	fn equals(&mut self, column: Column, value: &str) -> Predicate {
		Predicate::Compare {
			column,
			comparator: Comparator::Equal,
			param: self.text(value),
		}
	}

	fn contains(&mut self, column: Column, value: &str) -> Predicate {
		Predicate::Contains {
			column,
			param: self.text(value),
		}
	}
}

fn keyword<T: FromStr>(field: &str, value: &str) -> Result<T, CompileError> {
	value.parse().map_err(|_| CompileError::InvalidValue {
		field: field.to_string(),
		value: value.to_string(),
	})
}
