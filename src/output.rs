//! Output types for reformat results.

use crate::docx::Document;
use crate::error::SkippedSeparator;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One song as it appears in the generated Table of Contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongEntry {
    /// 1-indexed position in the TOC.
    pub ordinal: usize,
    /// Trimmed title text.
    pub title: String,
    /// Bookmark the TOC entry links to.
    pub bookmark: String,
    /// 1-indexed position of the separator in the input document.
    pub separator_paragraph: usize,
    /// 1-indexed position of the title in the input document.
    pub title_paragraph: usize,
}

/// Statistics about one reformat run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReformatStats {
    /// Top-level paragraphs in the input.
    pub input_paragraphs: usize,
    /// Top-level paragraphs in the output.
    pub output_paragraphs: usize,
    /// Separator lines found.
    pub separators: usize,
    /// Songs linked from the TOC.
    pub songs: usize,
    /// Separators that produced no song.
    pub skipped_separators: usize,
    /// Bookmarks created (songs plus the top anchor).
    pub bookmarks_created: usize,
    /// Hyperlinks created (TOC entries plus back links).
    pub links_created: usize,
    /// Runs carrying the designated font after the font pass.
    pub runs_styled: usize,
    /// Wall-clock time of the reformat in milliseconds.
    pub processing_time_ms: u64,
}

/// Complete result of [`crate::reformat()`].
#[derive(Debug, Clone)]
pub struct ReformatOutput {
    /// The modified document.
    pub document: Document,
    /// Songs in TOC order.
    pub songs: Vec<SongEntry>,
    /// Separators that produced no song.
    pub skipped: Vec<SkippedSeparator>,
    pub stats: ReformatStats,
}

impl ReformatOutput {
    /// The serialisable part of the output.
    pub fn report(&self) -> ReformatReport {
        ReformatReport {
            input: None,
            output: None,
            songs: self.songs.clone(),
            skipped: self.skipped.clone(),
            stats: self.stats.clone(),
        }
    }
}

/// What [`crate::reformat_file`] and [`crate::inspect`] return: everything
/// about the run except the document itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReformatReport {
    pub input: Option<PathBuf>,
    /// `None` for inspect runs, which write nothing.
    pub output: Option<PathBuf>,
    pub songs: Vec<SongEntry>,
    pub skipped: Vec<SkippedSeparator>,
    pub stats: ReformatStats,
}
