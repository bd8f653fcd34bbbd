use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use posindex::{read_documents, Corpus, DocId, IndexConfig};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build an in-memory positional index and run phrase queries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IndexArgs {
    /// Input path (JSON/JSONL file or a directory of them)
    #[arg(long)]
    input: String,
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
}

#[derive(Subcommand)]
enum Commands {
    /// Index the input and print the documents matching each phrase
    Search {
        #[command(flatten)]
        index: IndexArgs,
        /// Phrase to look up (repeatable)
        #[arg(long, required = true)]
        phrase: Vec<String>,
        /// Maximum hits printed per phrase
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Index the input and print corpus statistics
    Stats {
        #[command(flatten)]
        index: IndexArgs,
    },
}

#[derive(Serialize)]
struct PhraseResult<'a> {
    phrase: &'a str,
    total_hits: usize,
    hits: Vec<HitSummary>,
}

#[derive(Serialize)]
struct HitSummary {
    doc_id: DocId,
    external_id: String,
    title: String,
}

#[derive(Serialize)]
struct Stats {
    num_docs: u32,
    num_terms: usize,
    max_word_delta: u32,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { index, phrase, limit } => {
            let corpus = build_corpus(&index)?;
            for p in &phrase {
                let (total_hits, hits) = corpus.search(p, limit)?;
                let hits = hits
                    .into_iter()
                    .map(|h| HitSummary { doc_id: h.doc_id, external_id: h.meta.external_id, title: h.meta.title })
                    .collect();
                println!("{}", serde_json::to_string(&PhraseResult { phrase: p, total_hits, hits })?);
            }
            Ok(())
        }
        Commands::Stats { index } => {
            let corpus = build_corpus(&index)?;
            let stats = Stats { num_docs: corpus.num_docs(), num_terms: corpus.num_terms(), max_word_delta: corpus.max_word_delta() };
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
    }
}

fn resolve_config(args: &IndexArgs) -> Result<IndexConfig> {
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
    Ok(config)
}

fn build_corpus(args: &IndexArgs) -> Result<Corpus> {
    let config = resolve_config(args)?;
    let corpus = Corpus::new(&config)?;
    let docs = read_documents(&args.input).with_context(|| format!("reading {}", args.input))?;
    corpus.add_all(docs)?;
    tracing::info!(num_docs = corpus.num_docs(), num_terms = corpus.num_terms(), "ingested documents");
    Ok(corpus)
}
