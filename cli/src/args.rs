//! Command-line arguments

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "embedsearch")]
#[command(about = "Embed sentences and search them with a local or managed vector index")]
#[command(version)]
pub struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Exact flat L2 index in this process
    Local(LocalArgs),
    /// Managed cloud index (cosine)
    Remote(RemoteArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbedderKind {
    /// Pre-trained sentence model via fastembed
    Fastembed,
    /// Offline vocabulary embedder built from the corpus and query
    BagOfWords,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Pinecone REST API (needs PINECONE_API_KEY)
    Pinecone,
    /// In-process HNSW service, nothing leaves the machine
    InMemory,
}

fn parse_top_k(s: &str) -> Result<usize, String> {
    let k: usize = s.parse().map_err(|e| format!("{e}"))?;
    if k == 0 {
        return Err("must be at least 1".to_string());
    }
    Ok(k)
}

/// Options shared by both subcommands
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Query sentence (defaults to the demo query)
    #[arg(long, short)]
    pub query: Option<String>,

    /// Number of neighbours to retrieve
    #[arg(long, short = 'k', default_value_t = 3, value_parser = parse_top_k)]
    pub top_k: usize,

    /// Text file with one document per line (defaults to the demo corpus)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = EmbedderKind::Fastembed)]
    pub embedder: EmbedderKind,

    /// Sentence model name
    #[arg(long, default_value = "all-MiniLM-L6-v2")]
    pub model: String,

    /// Model cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct LocalArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RemoteArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, value_enum, default_value_t = Backend::Pinecone)]
    pub backend: Backend,

    #[arg(long, default_value = "exampleindex")]
    pub index_name: String,

    /// cosine, euclidean or dotproduct
    #[arg(long, default_value = "cosine")]
    pub metric: String,

    #[arg(long, default_value = "aws")]
    pub cloud: String,

    #[arg(long, default_value = "us-east-1")]
    pub region: String,

    #[arg(long, default_value = "")]
    pub namespace: String,

    /// Only match documents whose text equals this value
    #[arg(long)]
    pub filter_text: Option<String>,

    /// Readiness polls before giving up
    #[arg(long, default_value_t = 30)]
    pub max_wait_attempts: u32,

    /// First delay between readiness polls, in seconds
    #[arg(long, default_value_t = 2.0)]
    pub poll_interval_secs: f64,

    /// Environment file holding PINECONE_API_KEY (defaults to ./.env)
    #[arg(long)]
    pub env_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_defaults() {
        let cli = Cli::try_parse_from(["embedsearch", "local"]).unwrap();
        let Command::Local(args) = cli.command else {
            panic!("expected local subcommand");
        };
        assert!(args.common.query.is_none());
        assert_eq!(args.common.top_k, 3);
        assert_eq!(args.common.embedder, EmbedderKind::Fastembed);
        assert_eq!(args.common.model, "all-MiniLM-L6-v2");
        assert!(!cli.verbose);
    }

    #[test]
    fn test_remote_defaults() {
        let cli = Cli::try_parse_from(["embedsearch", "remote"]).unwrap();
        let Command::Remote(args) = cli.command else {
            panic!("expected remote subcommand");
        };
        assert_eq!(args.backend, Backend::Pinecone);
        assert_eq!(args.index_name, "exampleindex");
        assert_eq!(args.metric, "cosine");
        assert_eq!(args.region, "us-east-1");
        assert_eq!(args.max_wait_attempts, 30);
        assert_eq!(args.poll_interval_secs, 2.0);
    }

    #[test]
    fn test_remote_overrides() {
        let cli = Cli::try_parse_from([
            "embedsearch",
            "-v",
            "remote",
            "--backend",
            "in-memory",
            "--embedder",
            "bag-of-words",
            "-q",
            "what is a vector?",
            "-k",
            "5",
            "--filter-text",
            "Pinecone is a vector database.",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Command::Remote(args) = cli.command else {
            panic!("expected remote subcommand");
        };
        assert_eq!(args.backend, Backend::InMemory);
        assert_eq!(args.common.embedder, EmbedderKind::BagOfWords);
        assert_eq!(args.common.query.as_deref(), Some("what is a vector?"));
        assert_eq!(args.common.top_k, 5);
        assert_eq!(
            args.filter_text.as_deref(),
            Some("Pinecone is a vector database.")
        );
    }

    #[test]
    fn test_unknown_embedder_rejected() {
        assert!(Cli::try_parse_from(["embedsearch", "local", "--embedder", "word2vec"]).is_err());
    }

    #[test]
    fn test_zero_top_k_rejected() {
        assert!(Cli::try_parse_from(["embedsearch", "local", "-k", "0"]).is_err());
        assert!(Cli::try_parse_from(["embedsearch", "remote", "--top-k", "0"]).is_err());
        assert!(Cli::try_parse_from(["embedsearch", "local", "-k", "-2"]).is_err());
    }
}
