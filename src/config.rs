//! Configuration types for reformatting a songbook.
//!
//! All reformat behaviour is controlled through [`ReformatConfig`], built via
//! its [`ReformatConfigBuilder`]. Nothing is read from globals or the
//! environment by the library; the CLI maps its flags onto the builder.

use crate::docx::bookmark::{sanitize_bookmark_name, MAX_BOOKMARK_NAME_LEN};
use crate::docx::model::LinkStyle;
use crate::error::SongbookError;
use crate::progress::ProgressCallback;
use serde::Serialize;
use std::fmt;

/// Smallest accepted lookahead bound.
pub const MIN_LOOKAHEAD: usize = 1;
/// Largest accepted lookahead bound.
pub const MAX_LOOKAHEAD: usize = 50;

/// Configuration for one reformat run.
///
/// Built via [`ReformatConfig::builder()`] or using
/// [`ReformatConfig::default()`].
///
/// # Example
/// ```rust
/// use bansuri_songbook::ReformatConfig;
///
/// let config = ReformatConfig::builder()
///     .font("Cambria")
///     .lookahead(3)
///     .build()
///     .unwrap();
/// assert_eq!(config.lookahead, 3);
/// ```
#[derive(Clone, Serialize)]
pub struct ReformatConfig {
    /// Font applied to every run of the output. Default: `Georgia`.
    pub font: String,

    /// How many paragraphs after a separator are searched for a title.
    /// Range: 1–50. Default: 5.
    ///
    /// The candidates are the `lookahead` paragraphs directly following the
    /// separator, so with the default a title preceded by five blank
    /// paragraphs is out of reach.
    pub lookahead: usize,

    /// Text of the generated heading. Default: `Table of Contents`.
    pub toc_heading: String,

    /// Bookmark placed on the heading and targeted by every back link.
    /// Default: `Top`.
    pub top_anchor: String,

    /// Song bookmarks are named `<prefix>_<ordinal>`. Default: `song`.
    pub bookmark_prefix: String,

    /// Text of the link inserted after every title.
    /// Default: `Back to Table of Contents`.
    pub back_link_text: String,

    /// Color and underline of generated links.
    pub link_style: LinkStyle,

    /// Optional progress callback.
    #[serde(skip)]
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReformatConfig {
    fn default() -> Self {
        Self {
            font: "Georgia".to_string(),
            lookahead: 5,
            toc_heading: "Table of Contents".to_string(),
            top_anchor: "Top".to_string(),
            bookmark_prefix: "song".to_string(),
            back_link_text: "Back to Table of Contents".to_string(),
            link_style: LinkStyle::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReformatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReformatConfig")
            .field("font", &self.font)
            .field("lookahead", &self.lookahead)
            .field("toc_heading", &self.toc_heading)
            .field("top_anchor", &self.top_anchor)
            .field("bookmark_prefix", &self.bookmark_prefix)
            .field("back_link_text", &self.back_link_text)
            .field("link_style", &self.link_style)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ReformatProgressCallback>"),
            )
            .finish()
    }
}

impl ReformatConfig {
    /// Create a new builder for `ReformatConfig`.
    pub fn builder() -> ReformatConfigBuilder {
        ReformatConfigBuilder {
            config: Self::default(),
        }
    }

    /// Bookmark name for song `ordinal`, already sanitised.
    pub fn song_bookmark(&self, ordinal: usize) -> String {
        sanitize_bookmark_name(&format!("{}_{}", self.bookmark_prefix, ordinal))
    }

    /// The top anchor as it will appear in the document.
    pub fn top_bookmark(&self) -> String {
        sanitize_bookmark_name(&self.top_anchor)
    }

    /// Whether the top anchor has the shape `<prefix>_<digits>`.
    fn top_clashes_with_songs(&self) -> bool {
        let probe = self.song_bookmark(0);
        let stem = probe.trim_end_matches('0');
        self.top_bookmark()
            .strip_prefix(stem)
            .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
    }
}

/// Builder for [`ReformatConfig`].
#[derive(Debug)]
pub struct ReformatConfigBuilder {
    config: ReformatConfig,
}

impl ReformatConfigBuilder {
    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.config.font = font.into();
        self
    }

    pub fn lookahead(mut self, n: usize) -> Self {
        self.config.lookahead = n.clamp(MIN_LOOKAHEAD, MAX_LOOKAHEAD);
        self
    }

    pub fn toc_heading(mut self, text: impl Into<String>) -> Self {
        self.config.toc_heading = text.into();
        self
    }

    pub fn top_anchor(mut self, name: impl Into<String>) -> Self {
        self.config.top_anchor = name.into();
        self
    }

    pub fn bookmark_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.bookmark_prefix = prefix.into();
        self
    }

    pub fn back_link_text(mut self, text: impl Into<String>) -> Self {
        self.config.back_link_text = text.into();
        self
    }

    pub fn link_style(mut self, style: LinkStyle) -> Self {
        self.config.link_style = style;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReformatConfig, SongbookError> {
        let c = &self.config;
        if c.font.trim().is_empty() {
            return Err(SongbookError::InvalidConfig("Font name must not be empty".into()));
        }
        if !(MIN_LOOKAHEAD..=MAX_LOOKAHEAD).contains(&c.lookahead) {
            return Err(SongbookError::InvalidConfig(format!(
                "Lookahead must be {MIN_LOOKAHEAD}–{MAX_LOOKAHEAD}, got {}",
                c.lookahead
            )));
        }
        if c.toc_heading.trim().is_empty() {
            return Err(SongbookError::InvalidConfig("TOC heading must not be empty".into()));
        }
        if c.back_link_text.trim().is_empty() {
            return Err(SongbookError::InvalidConfig("Back-link text must not be empty".into()));
        }
        if c.top_anchor.trim().is_empty() {
            return Err(SongbookError::InvalidConfig("Top anchor must not be empty".into()));
        }
        // Room for "_<ordinal>" so song names never lose their number to truncation.
        if c.bookmark_prefix.is_empty() || c.bookmark_prefix.len() > MAX_BOOKMARK_NAME_LEN - 8 {
            return Err(SongbookError::InvalidConfig(format!(
                "Bookmark prefix must be 1–{} characters, got {:?}",
                MAX_BOOKMARK_NAME_LEN - 8,
                c.bookmark_prefix
            )));
        }
        if c.top_clashes_with_songs() {
            return Err(SongbookError::InvalidConfig(format!(
                "Top anchor {:?} clashes with song bookmarks named {}",
                c.top_anchor,
                c.song_bookmark(1)
            )));
        }
        if !is_hex_color(&c.link_style.color) {
            return Err(SongbookError::InvalidConfig(format!(
                "Link color must be six hex digits, got {:?}",
                c.link_style.color
            )));
        }
        Ok(self.config)
    }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 6 && s.chars().all(|c| c.is_ascii_hexdigit())
}
