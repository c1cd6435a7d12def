//! Scan pass: locate separator lines and the song title after each one.
//!
//! The pass is read-only. Everything it finds is recorded as [`BlockId`]
//! handles, which stay valid while the mutation pass inserts paragraphs.

use crate::docx::{BlockId, Document};
use crate::error::SkippedSeparator;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

static RE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[=*]+$").unwrap());

/// Whether `text` is a separator line such as `=====****=====`: after
/// trimming, only `=` and `*`, with at least one of each.
pub fn is_separator(text: &str) -> bool {
    let t = text.trim();
    RE_SEPARATOR.is_match(t) && t.contains('=') && t.contains('*')
}

/// A separator with the title found after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    /// 1-indexed, in document order.
    pub ordinal: usize,
    pub separator: BlockId,
    pub title: BlockId,
    /// Trimmed title text.
    pub title_text: String,
    /// 1-indexed paragraph positions in the scanned document, for reporting.
    pub separator_paragraph: usize,
    pub title_paragraph: usize,
}

/// Everything the scan pass found.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Top-level paragraphs scanned.
    pub paragraphs: usize,
    /// Every separator paragraph, song or not.
    pub separators: Vec<BlockId>,
    pub songs: Vec<Song>,
    pub skipped: Vec<SkippedSeparator>,
}

/// Walk the paragraphs front to back and pair each separator with the first
/// non-empty paragraph among the next `lookahead` paragraphs.
///
/// A separator whose window holds only blank paragraphs, or whose first
/// non-empty paragraph is another separator, yields no song.
pub fn scan(document: &Document, lookahead: usize) -> ScanResult {
    let paragraphs: Vec<(BlockId, String)> = document
        .paragraphs()
        .map(|(id, p)| (id, p.text()))
        .collect();

    let mut result = ScanResult {
        paragraphs: paragraphs.len(),
        ..ScanResult::default()
    };

    for (i, (separator, text)) in paragraphs.iter().enumerate() {
        if !is_separator(text) {
            continue;
        }
        result.separators.push(*separator);

        let window_end = (i + 1 + lookahead).min(paragraphs.len());
        let candidate = paragraphs[i + 1..window_end]
            .iter()
            .enumerate()
            .find(|(_, (_, t))| !t.trim().is_empty())
            .map(|(offset, entry)| (i + 1 + offset, entry));

        match candidate {
            Some((j, (_, next))) if is_separator(next) => {
                let skip = SkippedSeparator::FollowedBySeparator {
                    paragraph: i + 1,
                    next: j + 1,
                };
                warn!("{}", skip);
                result.skipped.push(skip);
            }
            Some((j, (title, title_text))) => {
                let song = Song {
                    ordinal: result.songs.len() + 1,
                    separator: *separator,
                    title: *title,
                    title_text: title_text.trim().to_string(),
                    separator_paragraph: i + 1,
                    title_paragraph: j + 1,
                };
                debug!(
                    "Song {} at paragraph {}: {:?}",
                    song.ordinal, song.title_paragraph, song.title_text
                );
                result.songs.push(song);
            }
            None => {
                let skip = SkippedSeparator::NoTitle {
                    paragraph: i + 1,
                    lookahead,
                };
                warn!("{}", skip);
                result.skipped.push(skip);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::model::W_NAMESPACE;

    fn doc(texts: &[&str]) -> Document {
        let body: String = texts
            .iter()
            .map(|t| {
                if t.is_empty() {
                    "<w:p/>".to_string()
                } else {
                    format!("<w:p><w:r><w:t xml:space=\"preserve\">{t}</w:t></w:r></w:p>")
                }
            })
            .collect();
        let xml = format!(r#"<w:document xmlns:w="{W_NAMESPACE}"><w:body>{body}</w:body></w:document>"#);
        Document::from_xml("word/document.xml", xml.as_bytes()).unwrap()
    }

    fn titles(result: &ScanResult) -> Vec<&str> {
        result.songs.iter().map(|s| s.title_text.as_str()).collect()
    }

    #[test]
    fn separator_pattern() {
        assert!(is_separator("=====****====="));
        assert!(is_separator("  *=  "));
        assert!(is_separator("=*"));
        assert!(!is_separator("====="));
        assert!(!is_separator("*****"));
        assert!(!is_separator("== ** =="));
        assert!(!is_separator("=====****===== Song"));
        assert!(!is_separator(""));
    }

    #[test]
    fn scenario_two_songs() {
        let d = doc(&["intro", "=====****=====", "Song A", "", "=====****=====", "", "Song B"]);
        let result = scan(&d, 5);
        assert_eq!(titles(&result), vec!["Song A", "Song B"]);
        assert_eq!(result.separators.len(), 2);
        assert!(result.skipped.is_empty());
        let first = &result.songs[0];
        assert_eq!((first.ordinal, first.separator_paragraph, first.title_paragraph), (1, 2, 3));
        assert_eq!(result.songs[1].title_paragraph, 7);
    }

    #[test]
    fn lookahead_boundary() {
        let with_blanks = |n: usize| {
            let mut texts = vec!["=====****====="];
            texts.extend(std::iter::repeat("").take(n));
            texts.push("Title");
            scan(&doc(&texts), 5)
        };
        assert_eq!(with_blanks(4).songs.len(), 1);
        assert_eq!(with_blanks(5).songs.len(), 0);
        let six = with_blanks(6);
        assert!(six.songs.is_empty());
        assert_eq!(
            six.skipped,
            vec![SkippedSeparator::NoTitle {
                paragraph: 1,
                lookahead: 5
            }]
        );
    }

    #[test]
    fn separator_at_end_of_document() {
        let result = scan(&doc(&["Song", "=*="]), 5);
        assert!(result.songs.is_empty());
        assert_eq!(result.separators.len(), 1);
        assert_eq!(result.skipped.len(), 1);
    }

    #[test]
    fn separator_is_never_a_title() {
        let result = scan(&doc(&["=*=", "", "=*=", "Song"]), 5);
        assert_eq!(titles(&result), vec!["Song"]);
        assert_eq!(result.songs[0].ordinal, 1);
        assert_eq!(
            result.skipped,
            vec![SkippedSeparator::FollowedBySeparator {
                paragraph: 1,
                next: 3
            }]
        );
    }

    #[test]
    fn whitespace_only_paragraphs_are_blank() {
        let result = scan(&doc(&["=*=", "   ", "  Padded Title  "]), 5);
        assert_eq!(titles(&result), vec!["Padded Title"]);
    }

    #[test]
    fn no_separators_no_songs() {
        let result = scan(&doc(&["just", "prose"]), 5);
        assert_eq!(result.paragraphs, 2);
        assert!(result.songs.is_empty() && result.skipped.is_empty() && result.separators.is_empty());
    }
}
