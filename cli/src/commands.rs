//! Subcommand handlers

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use embedsearch_store::corpus::{DEFAULT_LOCAL_QUERY, DEFAULT_REMOTE_QUERY};
use embedsearch_store::embedding::SentenceModel;
use embedsearch_store::remote::MetadataFilter;
use embedsearch_store::{
    run_local, run_remote, BagOfWordsEmbedder, CancelFlag, Corpus, Embedder, FastEmbedConfig,
    InMemoryVectorService, Metric, PineconeClient, PineconeConfig, RemoteSettings, RetryPolicy,
    SearchConfig, VectorEngine, VectorService,
};

use crate::args::{Backend, CommonArgs, EmbedderKind, LocalArgs, RemoteArgs};

fn load_corpus(common: &CommonArgs, demo: fn() -> Corpus) -> Result<Corpus> {
    match &common.corpus {
        Some(path) => Corpus::from_file(path)
            .with_context(|| format!("Failed to read corpus from {}", path.display())),
        None => Ok(demo()),
    }
}

fn build_embedder(common: &CommonArgs, corpus: &Corpus, query: &str) -> Result<VectorEngine> {
    let engine = match common.embedder {
        EmbedderKind::Fastembed => {
            let model: SentenceModel = common.model.parse()?;
            let config = FastEmbedConfig {
                model,
                cache_dir: common.cache_dir.clone(),
                ..FastEmbedConfig::default()
            };
            VectorEngine::with_fastembed(config).context("Failed to load embedding model")?
        }
        EmbedderKind::BagOfWords => {
            let mut texts = corpus.texts();
            texts.push(query);
            VectorEngine::from_embedder(Arc::new(BagOfWordsEmbedder::from_texts(texts)?))
        }
    };

    tracing::info!(
        "Embedder {} ready ({} dimensions)",
        engine.model_name(),
        engine.dimension()
    );
    Ok(engine)
}

/// Load an explicit environment file over whatever `./.env` already set
fn load_env_file(path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        dotenvy::from_path_override(path)
            .with_context(|| format!("Failed to load environment file {}", path.display()))?;
    }
    Ok(())
}

fn retry_policy(args: &RemoteArgs) -> Result<RetryPolicy> {
    let initial_delay = Duration::try_from_secs_f64(args.poll_interval_secs)
        .with_context(|| format!("Invalid poll interval: {}", args.poll_interval_secs))?;
    Ok(RetryPolicy {
        initial_delay,
        max_delay: RetryPolicy::default().max_delay.max(initial_delay),
        max_attempts: args.max_wait_attempts,
        ..RetryPolicy::default()
    })
}

/// Flat L2 search over the local corpus
pub fn local<W: Write>(args: &LocalArgs, out: &mut W) -> Result<()> {
    let common = &args.common;
    let query = common.query.as_deref().unwrap_or(DEFAULT_LOCAL_QUERY);
    let corpus = load_corpus(common, Corpus::faiss_demo)?;

    let engine = build_embedder(common, &corpus, query)?;
    writeln!(out, "Embedding model loaded.")?;

    let config = SearchConfig::new(query, common.top_k);
    let hits = run_local(&engine, &corpus, &config, out)?;
    tracing::debug!("Local search returned {} hits", hits.len());
    Ok(())
}

/// Managed index search, against Pinecone or the in-process service
pub fn remote<W: Write>(args: &RemoteArgs, cancel: &CancelFlag, out: &mut W) -> Result<()> {
    let common = &args.common;
    let query = common.query.as_deref().unwrap_or(DEFAULT_REMOTE_QUERY);
    let metric: Metric = args.metric.parse()?;
    let retry = retry_policy(args)?;
    let corpus = load_corpus(common, Corpus::pinecone_demo)?;

    let service: Box<dyn VectorService> = match args.backend {
        Backend::Pinecone => {
            load_env_file(args.env_file.as_deref())?;
            let config = PineconeConfig::from_env()
                .context("Set PINECONE_API_KEY in the environment or a .env file")?;
            Box::new(PineconeClient::new(config))
        }
        Backend::InMemory => Box::new(InMemoryVectorService::new()),
    };
    writeln!(out, "Vector service initialized.")?;

    let engine = build_embedder(common, &corpus, query)?;
    writeln!(out, "Embedding model loaded.")?;

    let settings = RemoteSettings {
        index_name: args.index_name.clone(),
        metric,
        cloud: args.cloud.clone(),
        region: args.region.clone(),
        namespace: args.namespace.clone(),
        retry,
        filter: args
            .filter_text
            .as_ref()
            .map(|text| MetadataFilter::eq("text", text.as_str())),
        ..RemoteSettings::default()
    };

    let config = SearchConfig::new(query, common.top_k);
    let matches = run_remote(
        &engine,
        service.as_ref(),
        &corpus,
        &config,
        &settings,
        cancel,
        out,
    )?;
    tracing::debug!("Remote query returned {} matches", matches.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{Cli, Command};
    use clap::Parser;
    use tempfile::NamedTempFile;

    fn parse(argv: &[&str]) -> Command {
        Cli::try_parse_from(argv.iter().copied()).unwrap().command
    }

    #[test]
    fn test_local_bag_of_words_demo() {
        let Command::Local(args) = parse(&["embedsearch", "local", "--embedder", "bag-of-words"])
        else {
            panic!("expected local subcommand");
        };

        let mut out = Vec::new();
        local(&args, &mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Embedding model loaded.\n"));
        assert!(printed.contains("Converted 5 texts to embeddings."));
        assert!(printed.contains("Rank: 1\nText: FAISS is a library for efficient similarity search."));
        assert!(!printed.contains("Rank: 4"));
    }

    #[test]
    fn test_local_corpus_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "rust compiles to native code").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "python is interpreted").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let Command::Local(args) = parse(&[
            "embedsearch",
            "local",
            "--embedder",
            "bag-of-words",
            "--corpus",
            &path,
            "-q",
            "native rust",
        ]) else {
            panic!("expected local subcommand");
        };

        let mut out = Vec::new();
        local(&args, &mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Converted 2 texts to embeddings."));
        assert!(printed.contains("Rank: 1\nText: rust compiles to native code"));
    }

    #[test]
    fn test_local_missing_corpus_file() {
        let Command::Local(args) = parse(&[
            "embedsearch",
            "local",
            "--corpus",
            "/nonexistent/corpus.txt",
        ]) else {
            panic!("expected local subcommand");
        };

        let err = local(&args, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("Failed to read corpus"));
    }

    #[test]
    fn test_remote_in_memory_demo() {
        let Command::Remote(args) = parse(&[
            "embedsearch",
            "remote",
            "--backend",
            "in-memory",
            "--embedder",
            "bag-of-words",
            "--poll-interval-secs",
            "0.001",
        ]) else {
            panic!("expected remote subcommand");
        };

        let mut out = Vec::new();
        remote(&args, &CancelFlag::new(), &mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Created new index: exampleindex"));
        assert!(printed.contains("Inserted 9 vectors into the index."));
        assert!(printed.contains("Text: Pinecone is a vector database."));
    }

    #[test]
    fn test_remote_rejects_unknown_metric() {
        let Command::Remote(args) = parse(&[
            "embedsearch",
            "remote",
            "--backend",
            "in-memory",
            "--metric",
            "manhattan",
        ]) else {
            panic!("expected remote subcommand");
        };

        let err = remote(&args, &CancelFlag::new(), &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("unknown metric"));
    }

    #[test]
    fn test_negative_poll_interval_rejected() {
        let Command::Remote(args) = parse(&[
            "embedsearch",
            "remote",
            "--backend",
            "in-memory",
            "--poll-interval-secs=-1",
        ]) else {
            panic!("expected remote subcommand");
        };

        assert!(retry_policy(&args).is_err());
    }

    #[test]
    fn test_env_file_overrides_existing_variables() {
        let var = "EMBEDSEARCH_TEST_ENV_FILE_OVERRIDE";
        std::env::set_var(var, "from-dotenv");

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{var}=from-env-file").unwrap();

        load_env_file(Some(file.path())).unwrap();
        assert_eq!(std::env::var(var).unwrap(), "from-env-file");
        std::env::remove_var(var);
    }

    #[test]
    fn test_missing_env_file_is_an_error() {
        let err = load_env_file(Some(Path::new("/nonexistent/.env"))).unwrap_err();
        assert!(err.to_string().contains("Failed to load environment file"));
    }
}
