//! MCP server for Japanese kanji conversion.
//!
//! Run with `kanjiconv-mcp --dict-dir /path/to/dictionaries`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kanjiconv_mcp::{McpServer, ServerConfig, ServerContext};

/// MCP server for Japanese kanji conversion.
///
/// Exposes hiragana, katakana and romaji conversion as MCP tools.
/// Communicates via JSON-RPC 2.0 over stdin/stdout.
#[derive(Parser)]
#[command(name = "kanjiconv-mcp")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory containing reading lexicons
    /// (sudachi-<tier>.tsv, unidic.tsv, custom_readings.tsv).
    #[arg(long, value_name = "PATH", env = "KANJICONV_DICT_DIR")]
    dict_dir: Option<PathBuf>,

    /// Seconds a single conversion may take. 0 disables the limit.
    #[arg(long, value_name = "SECS", default_value_t = 30, env = "KANJICONV_TIMEOUT_SECS")]
    timeout_secs: u64,

    /// Do not build the default converters at startup.
    #[arg(long)]
    no_preseed: bool,

    /// Enable debug logging to stderr.
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Set up logging; stdout carries the protocol
    let filter = if args.verbose {
        EnvFilter::new("kanjiconv_mcp=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Validate arguments
    if let Some(dir) = &args.dict_dir {
        if !dir.is_dir() {
            eprintln!("Error: Dictionary directory '{}' does not exist", dir.display());
            std::process::exit(1);
        }
    }

    let config = ServerConfig {
        dict_dir: args.dict_dir,
        timeout: (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs)),
        preseed: !args.no_preseed,
    };

    tracing::info!("Starting kanjiconv MCP server...");
    if config.dict_dir.is_none() {
        tracing::warn!("No dictionary directory given, kanji will not be converted");
    }

    let context = ServerContext::with_lexicons(config);
    if let Err(e) = context.warm().await {
        tracing::warn!(error = %e, "Failed to build default converters");
    }

    // Run the server
    let mut server = McpServer::new(context);
    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "Server error");
        eprintln!("Error: Server error: {}", e);
        std::process::exit(1);
    }
}
