use std::fmt;

use super::data::Token;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
	And,
	Or,
	Tag,
	NotTag,
	Meta,
	MetaField,
	MetaOperator,
	MetaValue,
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			NodeKind::And => "AND",
			NodeKind::Or => "OR",
			NodeKind::Tag => "TAG",
			NodeKind::NotTag => "NOT_TAG",
			NodeKind::Meta => "META",
			NodeKind::MetaField => "META_FIELD",
			NodeKind::MetaOperator => "META_OPERATOR",
			NodeKind::MetaValue => "META_VALUE",
		};
		f.write_str(name)
	}
}

/// A node of the query tree.
///
/// `Tag`, `NotTag` and the three meta parts are leaves. `Meta` always has exactly the children
/// field, operator, value in that order. `And` has at least one child and `Or` at least two.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node<'a> {
	pub kind: NodeKind,
	pub token: Token<'a>,
	pub children: Vec<Node<'a>>,
	pub depth: usize,
}

impl<'a> Node<'a> {
	pub fn leaf(kind: NodeKind, token: Token<'a>) -> Self {
		Self::branch(kind, token, vec![])
	}

	pub fn branch(kind: NodeKind, token: Token<'a>, children: Vec<Node<'a>>) -> Self {
		Self {
			kind,
			token,
			children,
			depth: 0,
		}
	}

	pub fn value(&self) -> &'a str {
		self.token.value
	}

	/// Field, operator and value of a `Meta` node.
	pub fn meta_parts(&self) -> Option<(&Node<'a>, &Node<'a>, &Node<'a>)> {
		match (self.kind, self.children.as_slice()) {
			(NodeKind::Meta, [field, operator, value]) => Some((field, operator, value)),
			_ => None,
		}
	}

	pub(super) fn set_depth(&mut self, depth: usize) {
		self.depth = depth;
		for child in &mut self.children {
			child.set_depth(depth + 1);
		}
	}
}

/// A parsed query. Owns its root exclusively and is never modified after building.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ast<'a> {
	root: Node<'a>,
}

impl<'a> Ast<'a> {
	pub(super) fn new(mut root: Node<'a>) -> Self {
		root.set_depth(0);
		Self { root }
	}

	pub fn root(&self) -> &Node<'a> {
		&self.root
	}

	/// Depth-first pre-order walk over every node: the root, then each child subtree in order.
	/// Every call starts a fresh walk.
	pub fn iter(&self) -> Nodes<'_, 'a> {
		Nodes {
			stack: vec![&self.root],
		}
	}
}

impl<'t, 'a> IntoIterator for &'t Ast<'a> {
	type Item = &'t Node<'a>;
	type IntoIter = Nodes<'t, 'a>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

pub struct Nodes<'t, 'a> {
	stack: Vec<&'t Node<'a>>,
}

impl<'t, 'a> Iterator for Nodes<'t, 'a> {
	type Item = &'t Node<'a>;

	fn next(&mut self) -> Option<Self::Item> {
		let node = self.stack.pop()?;
		self.stack.extend(node.children.iter().rev());
		Some(node)
	}
}

impl fmt::Display for Ast<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for node in self {
			let indent = node.depth * 2;
			match node.kind {
				NodeKind::And | NodeKind::Or | NodeKind::Meta => {
					writeln!(f, "{:indent$}{}", "", node.kind, indent = indent)?
				}
				_ => writeln!(
					f,
					"{:indent$}{} {}",
					"",
					node.kind,
					node.value(),
					indent = indent
				)?,
			}
		}
		Ok(())
	}
}
