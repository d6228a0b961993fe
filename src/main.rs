use anyhow::{Context, Result};
use clap::Parser;
use evidex::{
    config::{CacheBackend, Config, OnError},
    logging, ocr, ContentExtractor,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "evidex")]
#[command(about = "Turn a folder of mixed evidence documents into text")]
#[command(version)]
struct Cli {
    /// Directory to extract (defaults to extraction.directory from the config)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Config file (default: config/evidex.toml, ./evidex.toml or ~/.config/evidex/settings.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Bypass the result cache
    #[arg(long)]
    no_cache: bool,

    /// Keep going when a file fails and list the failures at the end
    #[arg(long)]
    skip_failures: bool,

    /// Files extracted concurrently (overrides config)
    #[arg(long)]
    workers: Option<usize>,

    /// Print the whole corpus as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if cli.no_cache {
        config.cache.backend = CacheBackend::None;
    }
    if cli.skip_failures {
        config.extraction.on_error = OnError::Skip;
    }
    if let Some(workers) = cli.workers {
        config.extraction.workers = workers;
    }

    for tool in [&config.ocr.executable, &config.pdf.executable] {
        if !ocr::command_available(tool) {
            tracing::warn!(tool = %tool, "Tool not found; images and PDFs will fail to extract");
        }
    }

    let extractor = ContentExtractor::from_config(&config)?;
    let corpus = extractor
        .get_all_docs_as_text(cli.dir.as_deref())
        .await
        .context("Failed to extract documents")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&corpus)?);
    } else {
        for doc in corpus.iter() {
            println!("=== {} ===", doc.file_name);
            println!("{}", doc.text);
        }
        if !corpus.failures().is_empty() {
            eprintln!("\n{} file(s) skipped:", corpus.failures().len());
            for failure in corpus.failures() {
                eprintln!("  {}: {}", failure.file_name, failure.reason);
            }
        }
    }

    if let Some(cache) = extractor.cache() {
        let stats = cache.stats();
        tracing::debug!(hits = stats.hits, misses = stats.misses, "Cache stats");
    }

    Ok(())
}
