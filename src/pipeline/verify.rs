//! Link verification: every anchor the reformatter linked must name a
//! bookmark in the finished document.

use crate::docx::{is_valid_bookmark_name, Document};
use crate::error::SongbookError;
use std::collections::BTreeSet;
use tracing::debug;

/// Fail with [`SongbookError::DanglingLinks`] if any of `anchors` has no
/// bookmark in `document`.
pub fn verify_links(document: &Document, anchors: &[String]) -> Result<(), SongbookError> {
    let missing: BTreeSet<&str> = anchors
        .iter()
        .map(String::as_str)
        .filter(|a| !document.has_bookmark(a))
        .collect();
    if !missing.is_empty() {
        return Err(SongbookError::DanglingLinks {
            anchors: missing.into_iter().map(str::to_string).collect(),
        });
    }

    if let Some(bad) = anchors.iter().find(|a| !is_valid_bookmark_name(a)) {
        return Err(SongbookError::Internal(format!(
            "generated bookmark name '{bad}' is not a valid Word identifier"
        )));
    }

    debug!("Verified {} generated links", anchors.len());
    Ok(())
}

/// Every internal link anchor in the document, generated or not, that has
/// no bookmark. Sorted and deduplicated.
pub fn unresolved_anchors(document: &Document) -> Vec<String> {
    document
        .link_anchors()
        .into_iter()
        .filter(|a| !document.has_bookmark(a))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
