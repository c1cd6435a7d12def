//! Error types for the bansuri-songbook library.
//!
//! Two distinct kinds of failure exist:
//!
//! * [`SongbookError`] — **Fatal**: the reformat cannot proceed or its result
//!   cannot be trusted (missing input, corrupt container, a generated link
//!   that points nowhere). Returned as `Err(SongbookError)` from
//!   [`crate::reformat()`], [`crate::reformat_file`] and [`crate::inspect`].
//!   Nothing is written when one of these is returned.
//!
//! * [`SkippedSeparator`] — **Non-fatal**: a separator line had no title
//!   within the lookahead bound. Recorded in
//!   [`crate::output::ReformatOutput::skipped`] and logged; the rest of the
//!   document is still processed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the bansuri-songbook library.
#[derive(Debug, Error)]
pub enum SongbookError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a zip-based .docx container.
    #[error("File is not a .docx document: '{path}'\nFirst bytes: {magic:?}")]
    NotADocx { path: PathBuf, magic: [u8; 4] },

    // ── Container / XML errors ────────────────────────────────────────────
    /// The zip container could not be read or written.
    #[error("ZIP container error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// quick-xml rejected the markup.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The markup parsed but does not have the expected shape.
    #[error("Malformed part '{part}': {detail}")]
    MalformedXml { part: String, detail: String },

    /// A part the document needs is absent from the container.
    #[error("Part '{part}' is missing from the document container")]
    MissingPart { part: String },

    /// The WordprocessingML namespace is bound to an unexpected prefix.
    #[error(
        "Unsupported namespace layout: WordprocessingML is bound to prefix '{prefix}', expected 'w'"
    )]
    UnsupportedNamespace { prefix: String },

    // ── Verification errors ───────────────────────────────────────────────
    /// One or more generated hyperlinks have no matching bookmark.
    #[error("{} generated link(s) point at missing bookmarks: {}", anchors.len(), anchors.join(", "))]
    DanglingLinks { anchors: Vec<String> },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unclassified I/O failure while reading the input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A separator line that did not produce a song.
///
/// Stored in [`crate::output::ReformatOutput::skipped`]. The reformat still
/// succeeds; the separator simply gets no TOC entry (its page break is still
/// added).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SkippedSeparator {
    /// No non-empty paragraph within the lookahead bound.
    #[error("Separator at paragraph {paragraph}: no title within {lookahead} paragraphs")]
    NoTitle { paragraph: usize, lookahead: usize },

    /// The next non-empty paragraph is another separator.
    #[error("Separator at paragraph {paragraph}: followed by another separator at paragraph {next}")]
    FollowedBySeparator { paragraph: usize, next: usize },
}

impl SkippedSeparator {
    /// 1-indexed position of the separator in the input document.
    pub fn paragraph(&self) -> usize {
        match self {
            SkippedSeparator::NoTitle { paragraph, .. } => *paragraph,
            SkippedSeparator::FollowedBySeparator { paragraph, .. } => *paragraph,
        }
    }
}
