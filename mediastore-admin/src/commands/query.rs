use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use mediastore_core::{
    filter_to_json, Content, ContentQuery, ContentQueryExecutor, ContentStore, MemoryStore,
    QueryCompiler, QueryParamParser, ResultTrimmer, StoreConfig,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Query given as `attribute[-operator]=values` parameters
#[derive(Args, Debug, Default)]
pub struct QueryArgs {
    /// Query parameter, e.g. version.duration-greaterThan=600 (repeatable)
    #[arg(short = 'w', long = "where")]
    pub params: Vec<String>,
}

impl QueryArgs {
    pub fn parse_query(&self) -> Result<ContentQuery> {
        QueryParamParser::new()
            .parse_pairs(self.params.iter().map(String::as_str))
            .context("Invalid query")
    }
}

#[derive(Subcommand)]
pub enum QueryCommands {
    /// Print the store filter compiled from a query
    Compile {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Trim content read from a JSON file
    Trim {
        /// Input file holding a JSON array of content
        #[arg(short, long)]
        input: PathBuf,
        #[command(flatten)]
        query: QueryArgs,
        /// Keep top-level content even when nothing in it matched
        #[arg(long)]
        keep_non_matching: bool,
    },
    /// Load content from a JSON file and run a discover query over it
    Discover {
        /// Input file holding a JSON array of content
        #[arg(short, long)]
        input: PathBuf,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Load content from a JSON file and fetch it by uri, curie or alias
    Uri {
        /// Input file holding a JSON array of content
        #[arg(short, long)]
        input: PathBuf,
        /// Uris to fetch, in the order results should be returned
        #[arg(required = true)]
        uris: Vec<String>,
        #[command(flatten)]
        query: QueryArgs,
    },
}

pub fn execute_query_command(config: &StoreConfig, command: QueryCommands) -> Result<()> {
    match command {
        QueryCommands::Compile { query } => {
            let filter = QueryCompiler::new().compile(&query.parse_query()?)?;
            print_json(&filter_to_json(&filter))
        }

        QueryCommands::Trim { input, query, keep_non_matching } => {
            let query = query.parse_query()?;
            let contents = load_contents(&input)?;
            let trimmed = ResultTrimmer::new().trim(contents, &query, !keep_non_matching);
            print_json(&trimmed)
        }

        QueryCommands::Discover { input, query } => {
            let query = query.parse_query()?;
            let executor = load_executor(config, &input)?;
            print_json(&executor.discover(&query)?)
        }

        QueryCommands::Uri { input, uris, query } => {
            let query = query.parse_query()?;
            let executor = load_executor(config, &input)?;
            print_json(&executor.execute_uri_query(&uris, &query)?)
        }
    }
}

/// Read a JSON array of content
pub fn load_contents(path: &Path) -> Result<Vec<Content>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    let contents: Vec<Content> = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse content from: {}", path.display()))?;
    info!(path = %path.display(), count = contents.len(), "Loaded content");
    Ok(contents)
}

fn load_executor(config: &StoreConfig, path: &Path) -> Result<ContentQueryExecutor> {
    let store = MemoryStore::new();
    let content_store = ContentStore::in_memory(&store);
    for content in load_contents(path)? {
        content_store
            .write(&content)
            .with_context(|| format!("Failed to store {}", content.canonical_uri()))?;
    }
    ContentQueryExecutor::from_config(content_store, config)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediastore_core::{Item, ItemKind, Publisher};
    use tempfile::TempDir;

    fn write_contents(dir: &TempDir) -> PathBuf {
        let mut item = Item::new("http://bbc/ep1", ItemKind::Episode);
        item.described.publisher = Some(Publisher::Bbc);
        let contents = vec![Content::from(item)];

        let path = dir.path().join("contents.json");
        std::fs::write(&path, serde_json::to_string(&contents).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_parse_query_args() {
        let args = QueryArgs {
            params: vec!["version.duration-greaterThan=600".to_string(), "limit=5".to_string()],
        };
        let query = args.parse_query().unwrap();
        assert_eq!(query.constraints().len(), 1);
        assert_eq!(query.selection().limit, Some(5));

        let bad = QueryArgs {
            params: vec!["version.colour=red".to_string()],
        };
        assert!(bad.parse_query().is_err());
    }

    #[test]
    fn test_load_contents_and_uri_query() {
        let dir = TempDir::new().unwrap();
        let path = write_contents(&dir);

        assert_eq!(load_contents(&path).unwrap().len(), 1);

        let executor = load_executor(&StoreConfig::default(), &path).unwrap();
        let found = executor
            .execute_uri_query(&["http://bbc/ep1".to_string()], &ContentQuery::default())
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_load_contents_errors() {
        let dir = TempDir::new().unwrap();
        assert!(load_contents(&dir.path().join("missing.json")).is_err());

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_contents(&path).is_err());
    }
}
