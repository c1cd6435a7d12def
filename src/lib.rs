//! # bansuri-songbook
//!
//! Reformat a Word songbook of bansuri (flute) notations into a navigable
//! document.
//!
//! Songs in the source document are delimited by separator lines such as
//! `=====****=====`, each followed by the song's title. The reformatter adds:
//!
//! - a centered "Table of Contents" heading at the top, bookmarked `Top`,
//!   with one numbered, clickable entry per song,
//! - a bookmark (`song_1`, `song_2`, …) on every title,
//! - a "Back to Table of Contents" link right after every title,
//! - a page break after every separator and after the TOC,
//! - one font (Georgia by default) on every run.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .docx
//!  │
//!  ├─ 1. Input   existence, permission, zip signature
//!  ├─ 2. Load    zip container → word/document.xml → block arena
//!  ├─ 3. Scan    separators and titles, kept as stable block handles
//!  ├─ 4. Edit    TOC block, bookmarks, back links, page breaks
//!  ├─ 5. Style   font on every run, tables included
//!  ├─ 6. Verify  every generated link resolves to a bookmark
//!  └─ 7. Output  atomic write of the rewritten container + report
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bansuri_songbook::{reformat_file, ReformatConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReformatConfig::default();
//!     let report = reformat_file("BansuriMusic.docx", "songs_reformatted.docx", &config)?;
//!     for song in &report.songs {
//!         println!("{}. {} → #{}", song.ordinal, song.title, song.bookmark);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `songbook` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! bansuri-songbook = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod docx;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod reformat;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ReformatConfig, ReformatConfigBuilder};
pub use docx::{Document, DocxPackage, LinkStyle};
pub use error::{SkippedSeparator, SongbookError};
pub use output::{ReformatOutput, ReformatReport, ReformatStats, SongEntry};
pub use progress::{NoopProgressCallback, ProgressCallback, ReformatProgressCallback};
pub use reformat::{inspect, reformat, reformat_file, reformat_package};
