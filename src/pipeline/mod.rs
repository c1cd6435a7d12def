//! Reformat stages.
//!
//! Each submodule implements one step of the transform; [`crate::reformat`]
//! chains them.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ scan ──▶ toc ──▶ style ──▶ verify
//! (path)   (songs)  (edits)  (fonts)  (links)
//! ```
//!
//! 1. [`input`]  — validate the local path and the zip signature
//! 2. [`scan`]   — read-only pass: find separators and their titles, recorded
//!    as block handles
//! 3. [`toc`]    — mutation pass: TOC block, bookmarks, back links, page breaks
//! 4. [`style`]  — apply the designated font to every run
//! 5. [`verify`] — every generated link must resolve to a bookmark

pub mod input;
pub mod scan;
pub mod style;
pub mod toc;
pub mod verify;
