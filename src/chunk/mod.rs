//! Text chunking strategies for ingestion.
//!
//! Two span-based policies over a single text buffer:
//!
//! - **Fixed-size**: slice `[start, start + chunk_size)` in characters,
//!   advancing by `chunk_size`. Words and sentences get cut at chunk
//!   boundaries; that is the point of this strategy, not a bug.
//! - **Overlapping**: same slicing, but the start advances by
//!   `chunk_size - overlap_size` so consecutive chunks share a tail,
//!   preserving context across boundaries.
//!
//! Both produce a lazy, finite, restartable [`Iterator`] of [`Chunk`]s.
//! Whitespace-only slices are suppressed; chunk ids start at 1 and
//! increment only when a chunk is emitted. Slicing operates on `char`s
//! and never splits a UTF-8 code point.
//!
//! The parser for "Question/Answer" formatted documents lives in
//! [`qa`].

pub mod qa;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// The splitting policy that produced a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Fixed-size slicing with no overlap.
    Fixed,
    /// Overlapping slicing; records how many characters each chunk
    /// shares with its predecessor.
    Overlap {
        /// Characters shared with the preceding chunk.
        overlap_size: usize,
    },
}

/// A contiguous span of source text treated as one retrievable unit.
///
/// Offsets are character offsets into the source document and are
/// monotonically non-decreasing across the produced sequence. `text`
/// is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Sequential id, starting at 1.
    pub id: u64,
    /// The chunk text.
    pub text: String,
    /// Character offset of the first character in the source document.
    pub start_offset: usize,
    /// Character offset one past the last character.
    pub end_offset: usize,
    /// The strategy that produced this chunk.
    pub strategy: ChunkStrategy,
}

/// Span chunker with validated configuration.
///
/// `overlap_size` is `floor(chunk_size * overlap_percent)`.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap_size: usize,
}

impl Chunker {
    /// Creates a chunker.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidChunkSize`] when `chunk_size` is zero
    /// and [`RagError::InvalidOverlap`] when `overlap_percent` is
    /// outside `[0, 1)` — at 1.0 or above the overlapping scan would
    /// never advance.
    pub fn new(chunk_size: usize, overlap_percent: f64) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::InvalidChunkSize { chunk_size });
        }
        if !(0.0..1.0).contains(&overlap_percent) {
            return Err(RagError::InvalidOverlap {
                percent: overlap_percent,
            });
        }
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let overlap_size = (chunk_size as f64 * overlap_percent) as usize;
        Ok(Self {
            chunk_size,
            overlap_size,
        })
    }

    /// The configured chunk size in characters.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters shared between consecutive overlapping chunks.
    #[must_use]
    pub const fn overlap_size(&self) -> usize {
        self.overlap_size
    }

    /// Fixed-size chunks over `text`.
    #[must_use]
    pub fn fixed<'a>(&self, text: &'a str) -> SpanChunks<'a> {
        SpanChunks {
            text,
            chunk_size: self.chunk_size,
            step: self.chunk_size,
            strategy: ChunkStrategy::Fixed,
            start_byte: 0,
            start_char: 0,
            next_id: 1,
        }
    }

    /// Overlapping chunks over `text`.
    #[must_use]
    pub fn overlapping<'a>(&self, text: &'a str) -> SpanChunks<'a> {
        SpanChunks {
            text,
            chunk_size: self.chunk_size,
            step: self.chunk_size - self.overlap_size,
            strategy: ChunkStrategy::Overlap {
                overlap_size: self.overlap_size,
            },
            start_byte: 0,
            start_char: 0,
            next_id: 1,
        }
    }
}

/// Lazy iterator over span chunks.
///
/// Cloning restarts nothing — a clone continues from the same
/// position. To restart, call [`Chunker::fixed`] or
/// [`Chunker::overlapping`] again; construction is free.
#[derive(Debug, Clone)]
pub struct SpanChunks<'a> {
    text: &'a str,
    chunk_size: usize,
    step: usize,
    strategy: ChunkStrategy,
    start_byte: usize,
    start_char: usize,
    next_id: u64,
}

/// Byte index just past the first `n_chars` characters of `s`.
fn byte_len_of_chars(s: &str, n_chars: usize) -> usize {
    s.char_indices().nth(n_chars).map_or(s.len(), |(i, _)| i)
}

impl Iterator for SpanChunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        while self.start_byte < self.text.len() {
            let rest = &self.text[self.start_byte..];
            let slice = &rest[..byte_len_of_chars(rest, self.chunk_size)];

            let start_char = self.start_char;
            let advance = byte_len_of_chars(rest, self.step);
            self.start_byte += advance;
            self.start_char += rest[..advance].chars().count();

            // Whitespace-only slices are suppressed, not emitted.
            if slice.trim().is_empty() {
                continue;
            }

            let id = self.next_id;
            self.next_id += 1;
            return Some(Chunk {
                id,
                text: slice.to_string(),
                start_offset: start_char,
                end_offset: start_char + slice.chars().count(),
                strategy: self.strategy,
            });
        }
        None
    }
}
