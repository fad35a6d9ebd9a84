//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "ragcore-rs",
    version,
    about = "Retrieval-augmented chat over a small corpus"
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive chat REPL over an in-memory corpus.
    Chat {
        /// Deployment variant.
        #[arg(long, value_enum, default_value_t = Variant::TopOne)]
        variant: Variant,
        /// FAQ file to ingest at startup ("Q: ... / A: ..." format).
        #[arg(long)]
        faq: Option<PathBuf>,
        /// Story file to ingest at startup.
        #[arg(long)]
        story: Option<PathBuf>,
        /// Chunk size in characters for story ingestion.
        #[arg(long, default_value_t = 2000)]
        chunk_size: usize,
        /// Overlap fraction for story ingestion (0 <= f < 1).
        #[arg(long, default_value_t = 0.5)]
        overlap_percent: f64,
    },
    /// Ingest a corpus file into a fresh in-memory store, reporting
    /// chunk, insert, and dedup counts. Validates the corpus format
    /// and the embedding credentials.
    Ingest {
        /// File to ingest.
        file: PathBuf,
        /// Corpus kind.
        #[arg(long, value_enum, default_value_t = CorpusKind::Faq)]
        kind: CorpusKind,
        /// Chunk size in characters (story kinds).
        #[arg(long, default_value_t = 2000)]
        chunk_size: usize,
        /// Overlap fraction (story-overlap kind).
        #[arg(long, default_value_t = 0.5)]
        overlap_percent: f64,
        /// Only process the first N chunks.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Inspect chunker output for a file without embedding anything.
    Chunk {
        /// File to chunk.
        file: PathBuf,
        /// Chunking strategy.
        #[arg(long, value_enum, default_value_t = Strategy::Fixed)]
        strategy: Strategy,
        /// Chunk size in characters.
        #[arg(long, default_value_t = 200)]
        chunk_size: usize,
        /// Overlap fraction (overlap strategy).
        #[arg(long, default_value_t = 0.25)]
        overlap_percent: f64,
        /// Emit JSON instead of a pretty listing.
        #[arg(long)]
        json: bool,
    },
}

/// Deployment variants from the original chatbot lineup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// Vector search, single best FAQ match.
    TopOne,
    /// Vector search, top-15 FAQ matches.
    MultiHit,
    /// Vector search top-15, LLM-reranked down to 3.
    Reranked,
    /// Hybrid keyword/vector search over overlapping story chunks.
    HybridOverlap,
}

/// Chunking strategies for the `chunk` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Fixed-size span chunks.
    Fixed,
    /// Overlapping span chunks.
    Overlap,
    /// Question/answer pair parsing.
    Qa,
}

/// Corpus kinds for the `ingest` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CorpusKind {
    /// FAQ document ("Q: ... / A: ..." format).
    Faq,
    /// Story text, fixed-size chunks.
    Story,
    /// Story text, overlapping chunks.
    StoryOverlap,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_chat_defaults() {
        let cli = Cli::try_parse_from(["ragcore-rs", "chat"]).unwrap_or_else(|_| unreachable!());
        match cli.command {
            Command::Chat {
                variant,
                chunk_size,
                ..
            } => {
                assert_eq!(variant, Variant::TopOne);
                assert_eq!(chunk_size, 2000);
            }
            other => panic!("expected chat command, got {other:?}"),
        }
    }

    #[test]
    fn test_chunk_args() {
        let cli = Cli::try_parse_from([
            "ragcore-rs",
            "chunk",
            "faq.txt",
            "--strategy",
            "qa",
            "--json",
        ])
        .unwrap_or_else(|_| unreachable!());
        match cli.command {
            Command::Chunk { strategy, json, .. } => {
                assert_eq!(strategy, Strategy::Qa);
                assert!(json);
            }
            other => panic!("expected chunk command, got {other:?}"),
        }
    }

    #[test]
    fn test_ingest_args() {
        let cli = Cli::try_parse_from([
            "ragcore-rs",
            "ingest",
            "story.txt",
            "--kind",
            "story-overlap",
            "--limit",
            "5",
        ])
        .unwrap_or_else(|_| unreachable!());
        match cli.command {
            Command::Ingest { kind, limit, .. } => {
                assert_eq!(kind, CorpusKind::StoryOverlap);
                assert_eq!(limit, Some(5));
            }
            other => panic!("expected ingest command, got {other:?}"),
        }
    }
}
