use super::*;
use crate::parser;
use crate::tests::{self, ALICE, BOB};
use std::sync::atomic::{AtomicUsize, Ordering};

async fn compile_as(
	query: &str,
	viewer: Viewer,
	config: CompilerConfig,
) -> anyhow::Result<Result<CompiledQuery, CompileError>> {
	let store = tests::fixture()?;
	let ast = parser::parse(query).map_err(|err| anyhow::anyhow!("{}", err))?;
	Ok(tests::compiler(&store, config).compile(&ast, &viewer).await)
}

/// Compiles for Alice, who hides no ratings, with deleted posts visible.
async fn compile_plain(query: &str) -> anyhow::Result<Result<CompiledQuery, CompileError>> {
	let config = CompilerConfig {
		hide_deleted: false,
		..CompilerConfig::default()
	};
	compile_as(query, Viewer::user(ALICE), config).await
}

fn compare(column: Column, comparator: Comparator, param: usize) -> Predicate {
	Predicate::Compare {
		column,
		comparator,
		param,
	}
}

fn text(value: &str) -> Param {
	Param::Text(value.to_string())
}

#[test]
fn tags() -> anyhow::Result<()> {
	tests::async_basic!({
		let compiled = compile_plain("cat -dog kitty").await??;
		assert_eq!(
			compiled.predicate,
			Predicate::And(vec![
				Predicate::HasTag { param: 0 },
				Predicate::HasTag { param: 1 }.negate(),
				Predicate::HasTag { param: 2 },
			])
		);
		assert_eq!(compiled.params, vec![Param::Id(0), Param::Id(1), Param::Id(0)]);
		assert_eq!(compiled.order, Order::default());
		Ok(())
	})
}

#[test]
fn unknown_tags() -> anyhow::Result<()> {
	tests::async_basic!({
		let compiled = compile_plain("owl").await??;
		assert_eq!(compiled.predicate, Predicate::False);
		assert!(compiled.params.is_empty());

		let compiled = compile_plain("-owl").await??;
		assert_eq!(compiled.predicate, Predicate::True);

		let compiled = compile_plain("{owl ~ Cat}").await??;
		assert_eq!(
			compiled.predicate,
			Predicate::Or(vec![Predicate::False, Predicate::HasTag { param: 0 }])
		);
		Ok(())
	})
}

#[test]
fn implicit_filters() -> anyhow::Result<()> {
	tests::async_basic!({
		let compiled = compile_as("cat", Viewer::anonymous(), CompilerConfig::default())
			.await??;
		assert_eq!(
			compiled.predicate,
			Predicate::And(vec![
				Predicate::HasTag { param: 0 },
				compare(Column::Rating, Comparator::NotEqual, 1),
				compare(Column::Rating, Comparator::NotEqual, 2),
				compare(Column::Status, Comparator::Equal, 3),
			])
		);
		assert_eq!(
			compiled.params,
			vec![Param::Id(0), text("unsafe"), text("explicit"), text("ok")]
		);
		assert!(!compiled.rating_constrained);
		assert!(!compiled.status_constrained);

		let compiled = compile_as("cat", Viewer::user(BOB), CompilerConfig::default())
			.await??;
		assert_eq!(
			compiled.params,
			vec![Param::Id(0), text("explicit"), text("ok")]
		);
		Ok(())
	})
}

#[test]
fn explicit_rating_and_status() -> anyhow::Result<()> {
	tests::async_basic!({
		let compiled = compile_as(
			"rating:general status:Deleted",
			Viewer::anonymous(),
			CompilerConfig::default(),
		)
		.await??;
		assert_eq!(
			compiled.predicate,
			Predicate::And(vec![
				compare(Column::Rating, Comparator::Equal, 0),
				compare(Column::Status, Comparator::Equal, 1),
			])
		);
		assert_eq!(compiled.params, vec![text("general"), text("deleted")]);
		assert!(compiled.rating_constrained);
		assert!(compiled.status_constrained);
		Ok(())
	})
}

#[test]
fn fields() -> anyhow::Result<()> {
	tests::async_basic!({
		let cases = [
			(
				"user:7",
				compare(Column::AccountId, Comparator::Equal, 0),
				vec![Param::Id(7)],
			),
			(
				"user:!7",
				compare(Column::AccountId, Comparator::NotEqual, 0),
				vec![Param::Id(7)],
			),
			(
				"md5:abc123",
				compare(Column::Md5, Comparator::Equal, 0),
				vec![text("abc123")],
			),
			(
				"extension:>png",
				compare(Column::Extension, Comparator::GreaterThan, 0),
				vec![text("png")],
			),
			("parent:12", Predicate::ChildOf { param: 0 }, vec![Param::Id(12)]),
			("child:12", Predicate::ParentOf { param: 0 }, vec![Param::Id(12)]),
			("pool:3", Predicate::InPool { param: 0 }, vec![Param::Id(3)]),
			(
				"TYPE:Video",
				compare(Column::FileType, Comparator::Equal, 0),
				vec![text("video")],
			),
			(
				"title:sunset",
				Predicate::Contains {
					column: Column::Title,
					param: 0,
				},
				vec![text("sunset")],
			),
			(
				"description:sunset",
				Predicate::Contains {
					column: Column::Description,
					param: 0,
				},
				vec![text("sunset")],
			),
			(
				"context:sunset",
				Predicate::Contains {
					column: Column::Context,
					param: 0,
				},
				vec![text("sunset")],
			),
			(
				"contains:sunset",
				Predicate::Or(vec![
					Predicate::Contains {
						column: Column::Title,
						param: 0,
					},
					Predicate::Contains {
						column: Column::Description,
						param: 1,
					},
					Predicate::Contains {
						column: Column::Context,
						param: 2,
					},
				]),
				vec![text("sunset"), text("sunset"), text("sunset")],
			),
		];
		for (query, predicate, params) in cases {
			let compiled = compile_plain(query).await??;
			assert_eq!(compiled.predicate, predicate, "query {:?}", query);
			assert_eq!(compiled.params, params, "query {:?}", query);
		}
		Ok(())
	})
}

#[test]
fn less_than() -> anyhow::Result<()> {
	tests::async_basic!({
		let compiled = compile_plain("user:<5").await??;
		assert_eq!(
			compiled.predicate,
			compare(Column::AccountId, Comparator::GreaterThan, 0)
		);

		let config = CompilerConfig {
			hide_deleted: false,
			legacy_less_than: false,
			..CompilerConfig::default()
		};
		let compiled = compile_as("user:<5", Viewer::user(ALICE), config)
			.await??;
		assert_eq!(
			compiled.predicate,
			compare(Column::AccountId, Comparator::LessThan, 0)
		);
		Ok(())
	})
}

#[test]
fn sort() -> anyhow::Result<()> {
	tests::async_basic!({
		let compiled = compile_plain("sort:size_asc").await??;
		assert_eq!(compiled.predicate, Predicate::True);
		assert_eq!(
			compiled.order,
			Order {
				key: SortKey::Size,
				direction: Direction::Ascending,
			}
		);

		let compiled = compile_plain("cat sort:width sort:height_asc").await??;
		assert_eq!(compiled.predicate, Predicate::HasTag { param: 0 });
		assert_eq!(compiled.order.key, SortKey::Height);
		Ok(())
	})
}

#[test]
fn semantic_errors() -> anyhow::Result<()> {
	tests::async_basic!({
		let cases: [(&str, fn(&CompileError) -> bool); 10] = [
			("width:>1160", |e| matches!(e, CompileError::InvalidField(f) if f == "width")),
			("rating:questionable", |e| matches!(e, CompileError::InvalidValue { .. })),
			("status:hidden", |e| matches!(e, CompileError::InvalidValue { .. })),
			("type:audio", |e| matches!(e, CompileError::InvalidValue { .. })),
			("user:alice", |e| matches!(e, CompileError::NotNumeric { .. })),
			("pool:x1", |e| matches!(e, CompileError::NotNumeric { .. })),
			("user:+5", |e| matches!(e, CompileError::NotNumeric { value, .. } if value == "+5")),
			("parent:1.5", |e| matches!(e, CompileError::NotNumeric { .. })),
			("child:99999999999999999999", |e| matches!(e, CompileError::NotNumeric { .. })),
			("sort:score", |e| matches!(e, CompileError::InvalidSortKey(k) if k == "score")),
		];
		for (query, check) in cases {
			let err = match compile_plain(query).await? {
				Ok(compiled) => anyhow::bail!("{:?} compiled to {:?}", query, compiled),
				Err(err) => err,
			};
			assert!(check(&err), "query {:?} failed with {:?}", query, err);
			assert!(!err.is_retryable());
		}
		Ok(())
	})
}

struct FailingResolver;

#[async_trait]
impl TagResolver for FailingResolver {
	async fn resolve(&self, _name: &str) -> anyhow::Result<Option<TagId>> {
		anyhow::bail!("tag store unavailable")
	}
}

struct SlowResolver;

#[async_trait]
impl TagResolver for SlowResolver {
	async fn resolve(&self, _name: &str) -> anyhow::Result<Option<TagId>> {
		tokio::time::sleep(Duration::from_secs(5)).await;
		Ok(None)
	}
}

#[derive(Default)]
struct CountingResolver {
	calls: AtomicUsize,
}

#[async_trait]
impl TagResolver for CountingResolver {
	async fn resolve(&self, name: &str) -> anyhow::Result<Option<TagId>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		Ok(Some(name.len() as TagId))
	}
}

#[test]
fn lookup_failures_are_retryable() -> anyhow::Result<()> {
	tests::async_basic!({
		let store = tests::fixture()?;
		let ast = parser::parse("cat").map_err(|err| anyhow::anyhow!("{}", err))?;

		let compiler = QueryCompiler::new(FailingResolver, Arc::clone(&store), CompilerConfig::default());
		let err = compiler.compile(&ast, &Viewer::anonymous()).await.unwrap_err();
		assert!(matches!(err, CompileError::Lookup(_)));
		assert!(err.is_retryable());

		let config = CompilerConfig {
			lookup_timeout: Some(Duration::from_millis(20)),
			..CompilerConfig::default()
		};
		let compiler = QueryCompiler::new(SlowResolver, store, config);
		let err = compiler.compile(&ast, &Viewer::anonymous()).await.unwrap_err();
		assert!(matches!(err, CompileError::TimedOut(_)));
		assert!(err.is_retryable());
		Ok(())
	})
}

#[test]
fn distinct_tags_are_resolved_once() -> anyhow::Result<()> {
	tests::async_basic!({
		let store = tests::fixture()?;
		let resolver = Arc::new(CountingResolver::default());
		let compiler = QueryCompiler::new(Arc::clone(&resolver), store, CompilerConfig::default());

		let ast = parser::parse("cat CAT {cat ~ -dog} -Dog user:1")
			.map_err(|err| anyhow::anyhow!("{}", err))?;
		let compiled = compiler.compile(&ast, &Viewer::user(ALICE)).await?;
		assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
		assert_eq!(
			&compiled.params[..5],
			&[Param::Id(3), Param::Id(3), Param::Id(3), Param::Id(3), Param::Id(3)]
		);
		Ok(())
	})
}
