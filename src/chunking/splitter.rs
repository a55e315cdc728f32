//! Recursive, separator-aware text splitting.
//!
//! Text is split on the first separator that occurs in it. Pieces that fit
//! the chunk size are merged greedily, carrying up to `chunk_overlap` tokens
//! from the end of one chunk into the next. Pieces that are still too large
//! are split again with the remaining, finer separators.

use super::tokens::TokenCounter;
use crate::error::{PaddockError, Result};
use std::sync::Arc;

/// Separators in priority order: paragraphs, lines, sentences, words, characters.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " ", ""];

/// Token-bounded recursive splitter.
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
    counter: Arc<dyn TokenCounter>,
}

impl RecursiveSplitter {
    /// Create a splitter measuring length with `counter`.
    pub fn new(chunk_size: usize, chunk_overlap: usize, counter: Arc<dyn TokenCounter>) -> Result<Self> {
        if chunk_size == 0 {
            return Err(PaddockError::Chunking("chunk size must be greater than 0".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(PaddockError::Chunking(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            counter,
        })
    }

    /// Replace the separator list.
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Length of `text` in tokens.
    pub fn length(&self, text: &str) -> usize {
        self.counter.count(text)
    }

    /// Split text into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // Pick the first separator present in the text; "" always matches.
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut good_splits: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if self.length(piece) < self.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }

            if remaining.is_empty() {
                final_chunks.push(piece.to_string());
            } else {
                final_chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Greedily merge small pieces into chunks, keeping an overlap window.
    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut current: std::collections::VecDeque<(&str, usize)> = std::collections::VecDeque::new();
        let mut total = 0usize;

        for &split in splits {
            let len = self.length(split);

            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    tracing::warn!(
                        "Created a chunk of {} tokens, longer than the configured {}",
                        total,
                        self.chunk_size
                    );
                }

                if !current.is_empty() {
                    if let Some(doc) = join_pieces(current.iter().map(|(s, _)| *s)) {
                        docs.push(doc);
                    }

                    while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                        match current.pop_front() {
                            Some((_, front_len)) => total -= front_len,
                            None => break,
                        }
                    }
                }
            }

            current.push_back((split, len));
            total += len;
        }

        if let Some(doc) = join_pieces(current.iter().map(|(s, _)| *s)) {
            docs.push(doc);
        }

        docs
    }
}

/// Split on `separator`, attaching each separator to the start of the following piece.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut last = 0;
    for (idx, _) in text.match_indices(separator) {
        pieces.push(&text[last..idx]);
        last = idx;
    }
    pieces.push(&text[last..]);

    pieces.into_iter().filter(|p| !p.is_empty()).collect()
}

fn join_pieces<'a>(pieces: impl Iterator<Item = &'a str>) -> Option<String> {
    let joined: String = pieces.collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
