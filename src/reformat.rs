//! Reformat entry points.
//!
//! [`reformat()`] works on a parsed [`Document`]; [`reformat_file`] wraps it
//! with container I/O and an atomic write; [`inspect`] runs the scan pass
//! only.

use crate::config::ReformatConfig;
use crate::docx::{Document, DocxPackage};
use crate::error::SongbookError;
use crate::output::{ReformatOutput, ReformatReport, ReformatStats, SongEntry};
use crate::pipeline::{input, scan, style, toc, verify};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Reformat a parsed document.
///
/// Runs the scan pass, the mutation pass, the font pass and link
/// verification, in that order.
///
/// # Returns
/// `Ok(ReformatOutput)` on success, even if some separators produced no song
/// (check `output.skipped`).
///
/// # Errors
/// - [`SongbookError::DanglingLinks`] if a generated link has no bookmark
/// - [`SongbookError::Internal`] if a recorded handle stopped pointing at a
///   paragraph
pub fn reformat(
    mut document: Document,
    config: &ReformatConfig,
) -> Result<ReformatOutput, SongbookError> {
    let start = Instant::now();

    // ── Step 1: Scan ─────────────────────────────────────────────────────
    let found = scan::scan(&document, config.lookahead);
    info!(
        "Scanned {} paragraphs: {} separators, {} songs",
        found.paragraphs,
        found.separators.len(),
        found.songs.len()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_scan_complete(found.paragraphs, found.songs.len(), found.skipped.len());
        for skip in &found.skipped {
            cb.on_separator_skipped(skip.paragraph(), &skip.to_string());
        }
    }

    // ── Step 2: TOC, bookmarks, back links, page breaks ──────────────────
    let outcome = toc::build_toc(&mut document, &found, config)?;

    // ── Step 3: Fonts ────────────────────────────────────────────────────
    let styled = style::apply_font(&mut document, &config.font);

    // ── Step 4: Every generated link must land ───────────────────────────
    verify::verify_links(&document, &outcome.linked_anchors)?;

    let stats = ReformatStats {
        input_paragraphs: found.paragraphs,
        output_paragraphs: document.paragraph_count(),
        separators: found.separators.len(),
        songs: outcome.entries.len(),
        skipped_separators: found.skipped.len(),
        bookmarks_created: outcome.bookmarks_created,
        links_created: outcome.links_created,
        runs_styled: styled.runs_styled,
        processing_time_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Reformat complete: {} songs, {} skipped separators, {}ms",
        stats.songs, stats.skipped_separators, stats.processing_time_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_reformat_complete(stats.songs, stats.runs_styled);
    }

    Ok(ReformatOutput {
        document,
        songs: outcome.entries,
        skipped: found.skipped,
        stats,
    })
}

/// Reformat the main document part of `package` in place.
pub fn reformat_package(
    package: &mut DocxPackage,
    config: &ReformatConfig,
) -> Result<ReformatOutput, SongbookError> {
    let part = package.main_part().to_string();
    let bytes = package
        .part(&part)
        .ok_or_else(|| SongbookError::MissingPart { part: part.clone() })?;
    let document = Document::from_xml(&part, bytes)?;

    let output = reformat(document, config)?;
    package.set_part(&part, output.document.to_xml()?);
    Ok(output)
}

/// Reformat a `.docx` file and write the result to `output_path`.
///
/// The output is written to a temporary file in the destination directory
/// and renamed into place, so a failed run never leaves a partial file.
/// `output_path` may equal `input_path`.
pub fn reformat_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ReformatConfig,
) -> Result<ReformatReport, SongbookError> {
    let input_path = input::resolve_input(input_path.as_ref())?;
    let output_path = output_path.as_ref();
    info!("Reformatting {}", input_path.display());

    let mut package = DocxPackage::open(&input_path)?;
    let output = reformat_package(&mut package, config)?;

    write_atomically(&package, output_path)?;
    info!("Wrote {}", output_path.display());

    let mut report = output.report();
    report.input = Some(input_path);
    report.output = Some(output_path.to_path_buf());
    Ok(report)
}

/// Scan a `.docx` file and report its songs without changing anything.
pub fn inspect(
    input_path: impl AsRef<Path>,
    config: &ReformatConfig,
) -> Result<ReformatReport, SongbookError> {
    let start = Instant::now();
    let input_path = input::resolve_input(input_path.as_ref())?;
    let package = DocxPackage::open(&input_path)?;
    let part = package.main_part();
    let bytes = package.part(part).ok_or_else(|| SongbookError::MissingPart {
        part: part.to_string(),
    })?;
    let document = Document::from_xml(part, bytes)?;
    let found = scan::scan(&document, config.lookahead);

    let songs: Vec<SongEntry> = found
        .songs
        .iter()
        .map(|s| SongEntry {
            ordinal: s.ordinal,
            title: s.title_text.clone(),
            bookmark: config.song_bookmark(s.ordinal),
            separator_paragraph: s.separator_paragraph,
            title_paragraph: s.title_paragraph,
        })
        .collect();

    let stats = ReformatStats {
        input_paragraphs: found.paragraphs,
        separators: found.separators.len(),
        songs: songs.len(),
        skipped_separators: found.skipped.len(),
        processing_time_ms: start.elapsed().as_millis() as u64,
        ..ReformatStats::default()
    };

    Ok(ReformatReport {
        input: Some(input_path),
        output: None,
        songs,
        skipped: found.skipped,
        stats,
    })
}

fn write_atomically(package: &DocxPackage, path: &Path) -> Result<(), SongbookError> {
    let write_failed = |source: std::io::Error| SongbookError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_failed)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_failed)?;
    package.write_to(tmp.as_file_mut())?;
    tmp.as_file().sync_all().map_err(write_failed)?;
    debug!("Persisting {} to {}", tmp.path().display(), path.display());
    tmp.persist(path).map_err(|e| write_failed(e.error))?;
    Ok(())
}
