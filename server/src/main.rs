use anyhow::{Context, Result};
use clap::Parser;
use posindex::{read_documents, Corpus, IndexConfig};
use server::build_app;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Documents to index at startup (JSON/JSONL file or directory)
    #[arg(long)]
    input: Option<String>,
    /// JSON file with index settings (max_word_delta, language, stop_words)
    #[arg(long)]
    config: Option<String>,
    /// Maximum number of skipped words between neighbouring phrase terms
    #[arg(long)]
    max_word_delta: Option<u32>,
    /// Stemming language
    #[arg(long)]
    language: Option<String>,
    /// Extra stop words, comma-separated
    #[arg(long, value_delimiter = ',')]
    stop_words: Vec<String>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => IndexConfig::from_json_file(path).with_context(|| format!("reading config {path}"))?,
        None => IndexConfig::default(),
    };
    if let Some(delta) = args.max_word_delta {
        config.max_word_delta = delta;
    }
    if let Some(language) = &args.language {
        config.language = language.clone();
    }
    config.stop_words.extend(args.stop_words.iter().cloned());

    let corpus = Corpus::new(&config)?;
    if let Some(input) = &args.input {
        let docs = read_documents(input).with_context(|| format!("reading {input}"))?;
        corpus.add_all(docs)?;
    }
    tracing::info!(num_docs = corpus.num_docs(), num_terms = corpus.num_terms(), max_word_delta = config.max_word_delta, "corpus ready");

    let app = build_app(Arc::new(corpus), std::env::var("ADMIN_TOKEN").ok());
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
