//! CLI parsing and orchestration. Parses args, merges config, runs catalog -> document, writes
//! the output file (and optional run report). Maps errors to exit codes.

use crate::catalog::{load_catalog, CatalogError, SourceCatalog, DEFAULT_DOCUMENT_TITLE};
use crate::config;
use crate::fetch::{FetchError, FetchOptions, HttpFetcher};
use crate::formats::{create_file, sink_for, OutputFormat, SinkError};
use crate::model::Document;
use crate::run::{run as run_sections, RunOptions, RunReport};
use clap::Parser;
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const DEFAULT_OUTPUT_DIR: &str = "docs";
const DEFAULT_DELAY_SECS: u64 = 3;
const DEFAULT_SETTLE_SECS: u64 = 3;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Catalog(#[from] CatalogError),

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("No section produced any content ({failed} of {total} failed).")]
    NothingExtracted { failed: usize, total: usize },

    #[error("{0}")]
    Sink(#[from] SinkError),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) | CliRunError::Catalog(_) | CliRunError::Fetch(_) => 1,
            CliRunError::NothingExtracted { .. } => 2,
            CliRunError::Sink(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "docscrape")]
#[command(about = "Fetch documentation pages and assemble them into one offline document")]
#[command(
    after_help = "Config file keys (output_dir, document_title, format, user_agent, request_delay_secs, settle_delay_secs, timeout_secs, follow_iframes, snapshot_dir) are read from ./docscrape.toml or the user config dir. CLI flags override config."
)]
pub struct Args {
    /// Catalog file (TOML: optional `title`, then [[sections]] with `title` and `url`). Default: built-in Crawl4AI docs.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Output path. Default: docs/{Document_Title}.{ext}, intermediate directories created.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: docx, html, markdown, text, or json.
    #[arg(long, value_parser = OutputFormat::parse)]
    pub format: Option<OutputFormat>,

    /// Document title (overrides config and catalog).
    #[arg(long)]
    pub title: Option<String>,

    /// Minimum pause between sections in seconds (overrides config; default 3).
    #[arg(long)]
    pub delay: Option<u64>,

    /// Seconds to wait for a page to settle before reading it (overrides config; default 3).
    #[arg(long)]
    pub settle: Option<u64>,

    /// Request timeout in seconds (overrides config; default 30).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Save an HTML snapshot of every fetched page in this directory.
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,

    /// Do not fetch and inline iframe documents.
    #[arg(long)]
    pub no_iframes: bool,

    /// Write a JSON report of per-section outcomes to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the sections and output path without fetching anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Suppress progress output (errors only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug logging and the full error chain.
    #[arg(long)]
    pub verbose: bool,
}

/// Filter level when `RUST_LOG` is unset. Without `--verbose` the progress bar owns stderr,
/// so only errors are logged; section failures are listed in the closing summary instead.
fn default_log_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "error"
    }
}

/// Install the stderr `tracing` subscriber. `RUST_LOG` wins over the flags.
pub fn init_logging(quiet: bool, verbose: bool) {
    let level = default_log_level(verbose && !quiet);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Ignore the error if a subscriber was already installed (tests, embedding).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Turn a document title into a file stem: non-alphanumerics become `_`, runs collapse.
fn file_stem(title: &str) -> String {
    let mut s = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() {
            s.push(c);
        } else if !s.ends_with('_') {
            s.push('_');
        }
    }
    let s = s.trim_matches('_').to_string();
    if s.is_empty() {
        "document".to_string()
    } else {
        s
    }
}

fn default_output_path(dir: &Path, title: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("{}.{}", file_stem(title), format.extension()))
}

fn write_report(report: &RunReport, path: &Path) -> Result<(), SinkError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| SinkError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }
    let mut f = std::io::BufWriter::new(create_file(path)?);
    serde_json::to_writer_pretty(&mut f, report)?;
    writeln!(f)?;
    f.flush()?;
    Ok(())
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let started = Instant::now();
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;

    let (catalog, catalog_title) = match &args.catalog {
        Some(path) => load_catalog(path)?,
        None => (SourceCatalog::builtin(), None),
    };

    let format = match args.format {
        Some(f) => f,
        None => match config.as_ref().and_then(|c| c.format.as_deref()) {
            Some(s) => OutputFormat::parse(s).map_err(CliRunError::InvalidInput)?,
            None => OutputFormat::Docx,
        },
    };

    let title = args
        .title
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.document_title.clone()))
        .or(catalog_title)
        .unwrap_or_else(|| DEFAULT_DOCUMENT_TITLE.to_string());
    if title.trim().is_empty() {
        return Err(CliRunError::InvalidInput(
            "Document title must not be empty.".to_string(),
        ));
    }

    let output_path = match &args.output {
        Some(p) => p.clone(),
        None => {
            let dir = config
                .as_ref()
                .and_then(|c| c.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
            default_output_path(&dir, &title, format)
        }
    };

    if args.dry_run {
        for (i, (section, url)) in catalog.iter().enumerate() {
            eprintln!("{:>3}. {} <{}>", i + 1, section, url);
        }
        eprintln!("Sections: {}", catalog.len());
        eprintln!("Output: {}", output_path.display());
        return Ok(());
    }

    let delay_secs = args
        .delay
        .or_else(|| config.as_ref().and_then(|c| c.request_delay_secs))
        .unwrap_or(DEFAULT_DELAY_SECS);
    let settle_secs = args
        .settle
        .or_else(|| config.as_ref().and_then(|c| c.settle_delay_secs))
        .unwrap_or(DEFAULT_SETTLE_SECS);
    let timeout_secs = args
        .timeout
        .or_else(|| config.as_ref().and_then(|c| c.timeout_secs))
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let follow_iframes =
        !args.no_iframes && config.as_ref().and_then(|c| c.follow_iframes).unwrap_or(true);
    let user_agent = args
        .user_agent
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.user_agent.clone()));
    let snapshot_dir = args
        .snapshot_dir
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.snapshot_dir.clone()));

    let mut builder = HttpFetcher::builder().timeout_secs(timeout_secs);
    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }
    if let Some(dir) = snapshot_dir {
        builder = builder.snapshot_dir(dir);
    }
    let mut fetcher = builder.build()?;

    let progress_state: RefCell<Option<indicatif::ProgressBar>> = RefCell::new(None);
    let progress_cb = |n: usize, total: usize, section: &str| {
        let mut state = progress_state.borrow_mut();
        let pb = state.get_or_insert_with(|| {
            let bar = indicatif::ProgressBar::new(total as u64);
            if let Ok(style) = indicatif::ProgressStyle::default_bar()
                .template("{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})")
            {
                bar.set_style(
                    style
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                        .progress_chars("█▉▊▋▌▍▎▏ "),
                );
            }
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        pb.set_position(n.saturating_sub(1) as u64);
        pb.set_message(format!("Fetching {}", section));
    };
    let show_progress = !args.quiet && !args.verbose;
    let options = RunOptions {
        pacing: Duration::from_secs(delay_secs),
        fetch: FetchOptions {
            settle_delay: Duration::from_secs(settle_secs),
            follow_iframes,
            capture_snapshot: true,
        },
        progress: if show_progress {
            Some(&progress_cb as &dyn Fn(usize, usize, &str))
        } else {
            None
        },
    };

    let mut doc = Document::new(title);
    let report = run_sections(&catalog, &mut fetcher, &mut doc, &options);

    if let Some(pb) = progress_state.borrow_mut().take() {
        pb.disable_steady_tick();
        pb.finish_and_clear();
    }

    if let Some(path) = &args.report {
        write_report(&report, path)?;
    }

    let sink = sink_for(format);
    doc.finalize(sink.as_ref(), &output_path)?;

    if !args.quiet {
        for (section, failure) in report.failures() {
            eprintln!("✗ {}: {}", section.title, failure);
        }
        eprintln!(
            "Sections: {} done, {} failed",
            report.done_count(),
            report.failed_count()
        );
        eprintln!("Wrote {}", output_path.display());
        eprintln!(
            "Total execution time: {:.2} seconds",
            started.elapsed().as_secs_f64()
        );
    }

    if report.done_count() == 0 {
        return Err(CliRunError::NothingExtracted {
            failed: report.failed_count(),
            total: report.sections.len(),
        });
    }
    Ok(())
}
