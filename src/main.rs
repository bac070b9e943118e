use anyhow::Context;
use clap::{Parser as ClapParser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tagsearch::compiler::UserId;
use tagsearch::{parser, CompilerConfig, MemoryStore, QueryCompiler, SearchError, Viewer};

#[derive(ClapParser, Debug)]
#[command(name = "tagsearch")]
#[command(about = "Parse and compile tag search queries against a tag snapshot")]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Write a snapshot containing the given tags
	Init {
		snapshot: PathBuf,
		#[arg(required = true)]
		tags: Vec<String>,
	},

	/// Print the syntax tree and compiled query
	Search {
		snapshot: PathBuf,

		/// Account id to search as (anonymous if omitted)
		#[arg(short, long)]
		viewer: Option<UserId>,

		#[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
		query: Vec<String>,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	match Cli::parse().command {
		Commands::Init { snapshot, tags } => init(&snapshot, &tags),
		Commands::Search {
			snapshot,
			viewer,
			query,
		} => {
			let viewer = viewer.map(Viewer::user).unwrap_or_default();
			search(&snapshot, &viewer, &query.join(" ")).await
		}
	}
}

fn init(path: &Path, tags: &[String]) -> anyhow::Result<()> {
	let store = MemoryStore::new();
	for tag in tags {
		store.create_tag(tag)?;
	}
	let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
	store.save(file)?;
	log::info!("wrote {} tags to {}", tags.len(), path.display());
	Ok(())
}

async fn search(path: &Path, viewer: &Viewer, query: &str) -> anyhow::Result<()> {
	let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
	let store = Arc::new(MemoryStore::load(file)?);

	let ast = parser::parse(query).map_err(SearchError::from)?;
	print!("{}", ast);

	let compiler = QueryCompiler::new(Arc::clone(&store), store, CompilerConfig::from_env()?);
	let compiled = compiler.compile(&ast, viewer).await?;
	print!("{}", compiled);
	Ok(())
}
