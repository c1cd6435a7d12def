//! Input resolution: check that a user-supplied path is a readable `.docx`.
//!
//! The zip signature is checked up front so callers get `NotADocx` for a
//! renamed text file instead of an opaque zip error.

use crate::error::SongbookError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Local file header signature that opens every non-empty zip archive.
pub const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";

/// Validate existence, read permission and zip signature of `path`.
pub fn resolve_input(path: &Path) -> Result<PathBuf, SongbookError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(SongbookError::FileNotFound { path });
    }
    if path.is_dir() {
        return Err(SongbookError::NotADocx {
            path,
            magic: [0; 4],
        });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SongbookError::PermissionDenied { path });
        }
        Err(_) => return Err(SongbookError::FileNotFound { path }),
    };

    let mut magic = [0u8; 4];
    let mut filled = 0;
    while filled < magic.len() {
        match file.read(&mut magic[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    if magic != ZIP_MAGIC {
        return Err(SongbookError::NotADocx { path, magic });
    }

    debug!("Resolved local document: {}", path.display());
    Ok(path)
}

/// `<dir>/<stem>_reformatted.docx` next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{stem}_reformatted.docx"))
}
