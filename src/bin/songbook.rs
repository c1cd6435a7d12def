//! CLI binary for bansuri-songbook.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ReformatConfig` and prints results.

use anyhow::{Context, Result};
use bansuri_songbook::pipeline::input::default_output_path;
use bansuri_songbook::{
    inspect, reformat_file, ProgressCallback, ReformatConfig, ReformatProgressCallback,
    ReformatReport,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while the document loads, then a
/// bar over the songs as they are linked.
struct CliProgressCallback {
    bar: ProgressBar,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening document…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            skipped: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} songs  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Linking");
    }
}

impl ReformatProgressCallback for CliProgressCallback {
    fn on_scan_complete(&self, paragraphs: usize, songs: usize, skipped: usize) {
        self.activate_bar(songs);
        self.bar.println(format!(
            "{} {}  {}",
            cyan("◆"),
            bold(&format!("Found {songs} songs in {paragraphs} paragraphs")),
            dim(&format!("{skipped} separators skipped")),
        ));
    }

    fn on_separator_skipped(&self, paragraph: usize, reason: &str) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Paragraph {:>4}  {}",
            yellow("⚠"),
            paragraph,
            dim(reason)
        ));
    }

    fn on_song_linked(&self, ordinal: usize, total: usize, title: &str) {
        let shown: String = if title.chars().count() > 60 {
            title.chars().take(59).chain(std::iter::once('…')).collect()
        } else {
            title.to_string()
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            green("✓"),
            ordinal,
            total,
            shown
        ));
        self.bar.set_message(shown);
        self.bar.inc(1);
    }

    fn on_reformat_complete(&self, songs: usize, runs_styled: usize) {
        self.bar.finish_and_clear();
        let skipped = self.skipped.load(Ordering::SeqCst);
        eprintln!(
            "{} {} songs linked, {} runs restyled{}",
            if skipped == 0 { green("✔") } else { cyan("⚠") },
            bold(&songs.to_string()),
            runs_styled,
            if skipped == 0 {
                String::new()
            } else {
                format!("  ({} separators skipped)", yellow(&skipped.to_string()))
            }
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Reformat next to the input (BansuriMusic_reformatted.docx)
  songbook BansuriMusic.docx

  # Explicit output path
  songbook BansuriMusic.docx -o songnotes/songs_reformatted.docx

  # List the songs that would be linked, write nothing
  songbook --inspect-only BansuriMusic.docx

  # Different font, wider title search
  songbook --font "Cambria" --lookahead 8 BansuriMusic.docx

  # Machine-readable report
  songbook --json BansuriMusic.docx > report.json

DOCUMENT LAYOUT:
  Songs are delimited by separator lines made only of '=' and '*'
  (at least one of each), e.g.  =====****=====
  The first non-empty paragraph within --lookahead paragraphs after a
  separator is the song title.

ENVIRONMENT VARIABLES:
  SONGBOOK_OUTPUT      Default for --output
  SONGBOOK_FONT        Default for --font
  SONGBOOK_LOOKAHEAD   Default for --lookahead
  RUST_LOG             Overrides the log filter (e.g. bansuri_songbook=debug)
"#;

/// Add a linked Table of Contents, per-song page breaks and one font to a songbook.
#[derive(Parser, Debug)]
#[command(
    name = "songbook",
    version,
    about = "Reformat a Word songbook of bansuri notations",
    long_about = "Reformat a Word (.docx) songbook of bansuri notations: adds a bookmarked \
Table of Contents linking to every song, a page break after every separator line, a link \
back to the TOC after every title, and one font throughout.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input .docx file.
    input: PathBuf,

    /// Output .docx file. Default: <input stem>_reformatted.docx next to the input.
    #[arg(short, long, env = "SONGBOOK_OUTPUT")]
    output: Option<PathBuf>,

    /// Font applied to every run.
    #[arg(long, env = "SONGBOOK_FONT", default_value = "Georgia")]
    font: String,

    /// Paragraphs searched after a separator for the title (1–50).
    #[arg(long, env = "SONGBOOK_LOOKAHEAD", default_value_t = 5,
          value_parser = clap::value_parser!(u16).range(1..=50))]
    lookahead: u16,

    /// Text of the TOC heading.
    #[arg(long, default_value = "Table of Contents")]
    toc_heading: String,

    /// Bookmark on the TOC heading, targeted by back links.
    #[arg(long, default_value = "Top")]
    top_anchor: String,

    /// Song bookmarks are named <prefix>_<n>.
    #[arg(long, default_value = "song")]
    bookmark_prefix: String,

    /// Text of the link after each title.
    #[arg(long, default_value = "Back to Table of Contents")]
    back_link_text: String,

    /// Scan and list songs only; write nothing.
    #[arg(long)]
    inspect_only: bool,

    /// Print the report as JSON on stdout.
    #[arg(long, env = "SONGBOOK_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "SONGBOOK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SONGBOOK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SONGBOOK_QUIET")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; -v always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ReformatProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let report = inspect(&cli.input, &config).context("Failed to inspect document")?;
        if cli.json {
            print_json(&report)?;
        } else if !cli.quiet {
            print_songs(&report);
        }
        return Ok(());
    }

    // ── Run reformat ─────────────────────────────────────────────────────
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));
    let report = reformat_file(&cli.input, &output_path, &config)
        .with_context(|| format!("Failed to reformat {}", cli.input.display()))?;

    if cli.json {
        print_json(&report)?;
    } else if !cli.quiet {
        if !show_progress {
            print_songs(&report);
        }
        eprintln!(
            "{}  {} songs  {}ms  →  {}",
            green("✔"),
            report.stats.songs,
            report.stats.processing_time_ms,
            bold(&output_path.display().to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `ReformatConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ReformatConfig> {
    let mut builder = ReformatConfig::builder()
        .font(cli.font.as_str())
        .lookahead(usize::from(cli.lookahead))
        .toc_heading(cli.toc_heading.as_str())
        .top_anchor(cli.top_anchor.as_str())
        .bookmark_prefix(cli.bookmark_prefix.as_str())
        .back_link_text(cli.back_link_text.as_str());

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_json(report: &ReformatReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialise report")?;
    println!("{json}");
    Ok(())
}

fn print_songs(report: &ReformatReport) {
    if let Some(ref input) = report.input {
        println!("File:        {}", input.display());
    }
    println!("Paragraphs:  {}", report.stats.input_paragraphs);
    println!("Separators:  {}", report.stats.separators);
    println!("Songs:       {}", report.songs.len());
    for song in &report.songs {
        println!(
            "  {:>3}. {}  {}",
            song.ordinal,
            song.title,
            dim(&format!("#{} (paragraph {})", song.bookmark, song.title_paragraph))
        );
    }
    for skip in &report.skipped {
        println!("  {} {}", yellow("skipped:"), skip);
    }
}
