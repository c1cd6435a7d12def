//! Mutation pass: Table of Contents, bookmarks, back links and page breaks.
//!
//! Works purely on the [`BlockId`]s recorded by the scan pass, so the order
//! of inserts below never shifts what a later step points at.

use crate::config::ReformatConfig;
use crate::docx::{Alignment, BlockId, Cursor, Document, Hyperlink, Paragraph};
use crate::error::SongbookError;
use crate::output::SongEntry;
use crate::pipeline::scan::ScanResult;
use tracing::{debug, info, warn};

/// What the mutation pass added.
#[derive(Debug, Clone)]
pub struct TocOutcome {
    /// The heading paragraph carrying the top anchor.
    pub heading: BlockId,
    /// Name of the top bookmark as written.
    pub top_bookmark: String,
    pub entries: Vec<SongEntry>,
    /// Every anchor a generated hyperlink points at.
    pub linked_anchors: Vec<String>,
    pub bookmarks_created: usize,
    pub links_created: usize,
}

/// Apply every structural edit for the songs in `scan`.
pub fn build_toc(
    document: &mut Document,
    scan: &ScanResult,
    config: &ReformatConfig,
) -> Result<TocOutcome, SongbookError> {
    let top = config.top_bookmark();
    if document.has_bookmark(&top) {
        warn!(
            "Input already has a '{}' bookmark; it looks reformatted and will get a second TOC",
            top
        );
    }

    let heading = insert_heading(document, config)?;
    let top_bookmark = document.add_bookmark(heading, &top)?;

    let total = scan.songs.len();
    let mut entries = Vec::with_capacity(total);
    let mut linked_anchors = Vec::with_capacity(total * 2);

    // TOC entries, then the page break that ends the TOC block.
    let mut cursor = Cursor::after(heading);
    for song in &scan.songs {
        let anchor = config.song_bookmark(song.ordinal);
        let mut entry = Paragraph::with_text(&format!("{}. ", song.ordinal));
        entry.push_hyperlink(Hyperlink::internal(&anchor, &song.title_text, &config.link_style));
        document.insert_at(&mut cursor, entry)?;
        linked_anchors.push(anchor);
    }
    let mut toc_break = Paragraph::new();
    toc_break.push_page_break();
    document.insert_at(&mut cursor, toc_break)?;

    for separator in &scan.separators {
        let paragraph = document.paragraph_mut(*separator).ok_or_else(|| {
            SongbookError::Internal(format!("separator {separator:?} is no longer a paragraph"))
        })?;
        paragraph.push_page_break();
    }

    for song in &scan.songs {
        let bookmark = document.add_bookmark(song.title, &config.song_bookmark(song.ordinal))?;

        let mut back = Paragraph::new();
        back.push_hyperlink(Hyperlink::internal(
            &top_bookmark,
            &config.back_link_text,
            &config.link_style,
        ));
        document.insert_paragraph_after(song.title, back)?;
        linked_anchors.push(top_bookmark.clone());

        debug!("Linked song {} '{}' as {}", song.ordinal, song.title_text, bookmark);
        if let Some(ref cb) = config.progress_callback {
            cb.on_song_linked(song.ordinal, total, &song.title_text);
        }

        entries.push(SongEntry {
            ordinal: song.ordinal,
            title: song.title_text.clone(),
            bookmark,
            separator_paragraph: song.separator_paragraph,
            title_paragraph: song.title_paragraph,
        });
    }

    info!(
        "Built TOC with {} entries; {} separators got page breaks",
        total,
        scan.separators.len()
    );

    Ok(TocOutcome {
        heading,
        top_bookmark,
        entries,
        linked_anchors,
        bookmarks_created: total + 1,
        links_created: total * 2,
    })
}

/// Centered, bold, underlined heading in front of the first paragraph.
fn insert_heading(
    document: &mut Document,
    config: &ReformatConfig,
) -> Result<BlockId, SongbookError> {
    let mut heading = Paragraph::with_text(&config.toc_heading);
    heading.set_alignment(Alignment::Center);
    for run in heading.runs_mut() {
        run.props_mut().set_bold(true);
        run.props_mut().set_underline("single");
    }

    match document.first_paragraph() {
        Some(first) => document.insert_paragraph_before(first, heading),
        None => Ok(document.push_front_paragraph(heading)),
    }
}
