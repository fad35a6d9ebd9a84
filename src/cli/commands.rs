//! Subcommand implementations.

#![allow(clippy::print_stdout)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::chunk::Chunker;
use crate::chunk::qa::parse_qa_pairs;
use crate::config::RagConfig;
use crate::embed::{EmbeddingProvider, OpenAiEmbedder};
use crate::ingest::{IngestReport, Ingester};
use crate::llm::LlmProvider;
use crate::llm::client::create_provider;
use crate::rerank::LlmReranker;
use crate::session::{ChatSession, RetrievalStrategy};
use crate::store::{MemoryStore, VectorStore};

use super::parser::{Cli, Command, CorpusKind, Strategy, Variant};

/// Characters of chunk text shown per line in the pretty listing.
const PREVIEW_CHARS: usize = 80;

/// Dispatches a parsed CLI invocation.
///
/// # Errors
///
/// Returns any configuration, I/O, or collaborator error the
/// subcommand hits.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Chat {
            variant,
            faq,
            story,
            chunk_size,
            overlap_percent,
        } => run_chat(variant, faq, story, chunk_size, overlap_percent).await,
        Command::Ingest {
            file,
            kind,
            chunk_size,
            overlap_percent,
            limit,
        } => run_ingest(&file, kind, chunk_size, overlap_percent, limit).await,
        Command::Chunk {
            file,
            strategy,
            chunk_size,
            overlap_percent,
            json,
        } => run_chunk(&file, strategy, chunk_size, overlap_percent, json),
    }
}

async fn run_chat(
    variant: Variant,
    faq: Option<PathBuf>,
    story: Option<PathBuf>,
    chunk_size: usize,
    overlap_percent: f64,
) -> anyhow::Result<()> {
    let config = RagConfig::from_env()?;
    let provider: Arc<dyn LlmProvider> = Arc::from(create_provider(&config)?);
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OpenAiEmbedder::new(&config));
    let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());

    let ingester = Ingester::new(Arc::clone(&embedder), Arc::clone(&store));
    if let Some(path) = faq {
        let text = read_corpus(&path)?;
        let report = ingester.ingest_faq(&text, None).await?;
        print_report("FAQ", &report);
    }
    if let Some(path) = story {
        let text = read_corpus(&path)?;
        let chunker = Chunker::new(chunk_size, overlap_percent)?;
        let overlap = variant == Variant::HybridOverlap;
        let report = ingester.ingest_story(&text, &chunker, overlap, None).await?;
        print_report("story", &report);
    }

    let strategy = match variant {
        Variant::TopOne => RetrievalStrategy::top_one(),
        Variant::MultiHit => RetrievalStrategy::multi_hit(),
        Variant::Reranked => RetrievalStrategy::reranked_multi_hit(),
        Variant::HybridOverlap => RetrievalStrategy::hybrid_overlap(),
    };
    let mut session = ChatSession::new(
        Arc::clone(&provider),
        embedder,
        store,
        &config,
        strategy,
    );
    if variant == Variant::Reranked {
        session = session.with_reranker(Arc::new(LlmReranker::new(provider, &config)));
    }

    println!("ragcore chat ({variant:?}). Type 'exit' to quit.\n");
    let stdin = std::io::stdin();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        let answer = session.ask(input).await?;
        println!("Assistant: {answer}\n");
    }
    Ok(())
}

async fn run_ingest(
    file: &Path,
    kind: CorpusKind,
    chunk_size: usize,
    overlap_percent: f64,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let config = RagConfig::from_env()?;
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OpenAiEmbedder::new(&config));
    let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
    let ingester = Ingester::new(embedder, store);

    let text = read_corpus(file)?;
    let report = match kind {
        CorpusKind::Faq => ingester.ingest_faq(&text, limit).await?,
        CorpusKind::Story => {
            let chunker = Chunker::new(chunk_size, overlap_percent)?;
            ingester.ingest_story(&text, &chunker, false, limit).await?
        }
        CorpusKind::StoryOverlap => {
            let chunker = Chunker::new(chunk_size, overlap_percent)?;
            ingester.ingest_story(&text, &chunker, true, limit).await?
        }
    };
    print_report(&format!("{kind:?}"), &report);
    Ok(())
}

fn run_chunk(
    file: &Path,
    strategy: Strategy,
    chunk_size: usize,
    overlap_percent: f64,
    json: bool,
) -> anyhow::Result<()> {
    let text = read_corpus(file)?;

    match strategy {
        Strategy::Qa => {
            let pairs = parse_qa_pairs(&text);
            if json {
                println!("{}", serde_json::to_string_pretty(&pairs)?);
            } else {
                println!("Parsed {} Q/A pairs", pairs.len());
                for pair in &pairs {
                    let number = pair
                        .question_number
                        .as_deref()
                        .map(|n| format!("{n}. "))
                        .unwrap_or_default();
                    println!("[{}] {number}{}", pair.id, pair.question);
                    println!("    -> {}", pair.answer);
                }
            }
        }
        Strategy::Fixed | Strategy::Overlap => {
            let chunker = Chunker::new(chunk_size, overlap_percent)?;
            let chunks: Vec<crate::chunk::Chunk> = match strategy {
                Strategy::Fixed => chunker.fixed(&text).collect(),
                _ => chunker.overlapping(&text).collect(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
            } else {
                println!("Number of chunks: {}", chunks.len());
                for chunk in &chunks {
                    let preview: String = chunk.text.chars().take(PREVIEW_CHARS).collect();
                    let ellipsis = if chunk.text.chars().count() > PREVIEW_CHARS {
                        "..."
                    } else {
                        ""
                    };
                    println!(
                        "Chunk {} [{}..{}]: {preview:?}{ellipsis}",
                        chunk.id, chunk.start_offset, chunk.end_offset
                    );
                }
            }
        }
    }
    Ok(())
}

fn read_corpus(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_report(label: &str, report: &IngestReport) {
    println!(
        "Ingested {label}: {} processed, {} inserted, {} deduplicated",
        report.processed, report.inserted, report.deduplicated
    );
}
