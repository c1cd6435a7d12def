//! Font pass: every run of the output gets the designated font.

use crate::docx::Document;
use tracing::{debug, warn};

/// Result of the font pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleOutcome {
    /// Runs carrying the font afterwards.
    pub runs_styled: usize,
    /// Of those, runs nested in tables and other opaque blocks.
    pub nested_runs: usize,
}

/// Apply `font` to every run in `document`, including runs created by the
/// mutation pass.
pub fn apply_font(document: &mut Document, font: &str) -> StyleOutcome {
    let nested_runs = document.apply_font(font);

    let fonts = document.run_fonts();
    let runs_styled = fonts.iter().filter(|f| f.as_deref() == Some(font)).count();
    if runs_styled != fonts.len() {
        warn!(
            "{} of {} runs did not take font '{}'",
            fonts.len() - runs_styled,
            fonts.len(),
            font
        );
    }

    debug!("Applied font '{}' to {} runs ({} nested)", font, runs_styled, nested_runs);
    StyleOutcome {
        runs_styled,
        nested_runs,
    }
}
