//! # Clause Lens CLI (`clens`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `clens serve` | Start the HTTP service |
//! | `clens parse <file>` | Run the response normalizer on a saved LLM reply |
//!
//! `serve` reads its configuration from the environment: `GEMINI_API_KEY`
//! (required), `PORT` (default 3000), `GEMINI_MODEL` (default
//! `gemini-1.5-flash`). Startup fails with a clear error when the API
//! key is absent.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

use clause_lens::config::Config;
use clause_lens::normalize::normalize;
use clause_lens::server;

/// Clause Lens — an LLM-backed legal document analysis and Q&A service.
#[derive(Parser)]
#[command(
    name = "clens",
    about = "Clause Lens — an LLM-backed legal document analysis and Q&A service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service.
    Serve {
        /// Listen port; overrides the PORT environment variable.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run the response normalizer on a saved LLM reply and print the
    /// resulting analysis JSON. Reads stdin when no file is given.
    ///
    /// Useful for diagnosing why a particular reply fell back to the
    /// raw-response variant.
    Parse {
        /// File containing the reply text; stdin if omitted.
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let mut config = Config::from_env()?;
            if let Some(port) = port {
                config.port = port;
            }
            server::run(config).await
        }
        Commands::Parse { file } => {
            let reply = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read stdin")?;
                    buf
                }
            };
            let analysis = normalize(&reply);
            println!("{}", serde_json::to_string_pretty(&analysis)?);
            Ok(())
        }
    }
}
