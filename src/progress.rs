//! Progress-callback trait for reformat events.
//!
//! Inject an [`Arc<dyn ReformatProgressCallback>`] via
//! [`crate::config::ReformatConfigBuilder::progress_callback`] to receive
//! events as the reformatter scans the document and links each song.
//!
//! # Example
//!
//! ```rust
//! use bansuri_songbook::{ReformatConfig, ReformatProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     linked: AtomicUsize,
//! }
//!
//! impl ReformatProgressCallback for CountingCallback {
//!     fn on_song_linked(&self, ordinal: usize, total: usize, title: &str) {
//!         self.linked.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Song {}/{}: {}", ordinal, total, title);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     linked: AtomicUsize::new(0),
//! });
//!
//! let config = ReformatConfig::builder()
//!     .progress_callback(counter as Arc<dyn ReformatProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the reformatter as it works through a document.
///
/// Implementations must be `Send + Sync` so one callback can be shared with
/// other threads of the host. The reformatter itself only calls it from the
/// thread running the reformat. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait ReformatProgressCallback: Send + Sync {
    /// Called once the scan pass is done.
    ///
    /// # Arguments
    /// * `paragraphs` — top-level paragraphs in the input
    /// * `songs`      — songs found
    /// * `skipped`    — separators that produced no song
    fn on_scan_complete(&self, paragraphs: usize, songs: usize, skipped: usize) {
        let _ = (paragraphs, songs, skipped);
    }

    /// Called for each separator that produced no song.
    ///
    /// # Arguments
    /// * `paragraph` — 1-indexed position of the separator
    /// * `reason`    — human-readable explanation
    fn on_separator_skipped(&self, paragraph: usize, reason: &str) {
        let _ = (paragraph, reason);
    }

    /// Called after a song got its bookmark, TOC entry and back link.
    ///
    /// # Arguments
    /// * `ordinal` — 1-indexed song number
    /// * `total`   — number of songs
    /// * `title`   — title text
    fn on_song_linked(&self, ordinal: usize, total: usize, title: &str) {
        let _ = (ordinal, total, title);
    }

    /// Called once after the font pass and link verification.
    fn on_reformat_complete(&self, songs: usize, runs_styled: usize) {
        let _ = (songs, runs_styled);
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl ReformatProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReformatConfig`].
pub type ProgressCallback = Arc<dyn ReformatProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        linked: AtomicUsize,
        skipped: AtomicUsize,
        titles: Mutex<Vec<String>>,
        scanned_songs: AtomicUsize,
        completed_songs: AtomicUsize,
    }

    impl ReformatProgressCallback for TrackingCallback {
        fn on_scan_complete(&self, _paragraphs: usize, songs: usize, _skipped: usize) {
            self.scanned_songs.store(songs, Ordering::SeqCst);
        }

        fn on_separator_skipped(&self, _paragraph: usize, _reason: &str) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }

        fn on_song_linked(&self, _ordinal: usize, _total: usize, title: &str) {
            self.linked.fetch_add(1, Ordering::SeqCst);
            self.titles.lock().unwrap().push(title.to_string());
        }

        fn on_reformat_complete(&self, songs: usize, _runs_styled: usize) {
            self.completed_songs.store(songs, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_scan_complete(10, 2, 1);
        cb.on_separator_skipped(4, "no title");
        cb.on_song_linked(1, 2, "Song A");
        cb.on_reformat_complete(2, 30);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_scan_complete(7, 2, 1);
        tracker.on_separator_skipped(9, "no title within 5 paragraphs");
        tracker.on_song_linked(1, 2, "Song A");
        tracker.on_song_linked(2, 2, "Song B");
        tracker.on_reformat_complete(2, 12);

        assert_eq!(tracker.scanned_songs.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skipped.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.linked.load(Ordering::SeqCst), 2);
        assert_eq!(*tracker.titles.lock().unwrap(), vec!["Song A", "Song B"]);
        assert_eq!(tracker.completed_songs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_scan_complete(1, 0, 0);
        cb.on_reformat_complete(0, 1);
    }
}
