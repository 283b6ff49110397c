//! Embedsearch command-line entry point
//!
//! Two subcommands:
//! - `local`: embed a corpus, search it with an exact flat L2 index
//! - `remote`: embed a corpus, upsert it to a managed cosine index and query it

mod args;
mod commands;

use clap::Parser;
use embedsearch_store::CancelFlag;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use args::{Cli, Command};

fn main() {
    // Pick up PINECONE_API_KEY and friends from ./.env when present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_filter = if cli.verbose {
        "embedsearch=debug,embedsearch_store=debug"
    } else {
        "embedsearch=info,embedsearch_store=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    // First Ctrl-C stops the readiness wait, a second one exits
    if let Err(e) = ctrlc::set_handler(move || {
        if on_interrupt.is_cancelled() {
            std::process::exit(130);
        }
        tracing::warn!("Interrupted; cancelling (press Ctrl-C again to exit)");
        on_interrupt.cancel();
    }) {
        tracing::warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let mut stdout = std::io::stdout().lock();
    let result = match &cli.command {
        Command::Local(args) => commands::local(args, &mut stdout),
        Command::Remote(args) => commands::remote(args, &cancel, &mut stdout),
    };

    if let Err(e) = result {
        tracing::error!("An error occurred: {:#}", e);
        std::process::exit(1);
    }
}
