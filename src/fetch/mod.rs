//! Page fetching. The [Fetcher] trait is what the orchestrator consumes; [HttpFetcher] is the
//! bundled blocking HTTP implementation.

mod client;
mod error;

pub use client::{HttpFetcher, HttpFetcherBuilder};
pub use error::FetchError;

use std::path::PathBuf;
use std::time::Duration;

/// Wait before reading the page body, so late content can settle.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Per-fetch options, shared by every section of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub settle_delay: Duration,
    /// Fetch `<iframe src>` documents and inline their bodies into the page.
    pub follow_iframes: bool,
    /// Keep a copy of the fetched HTML for diagnostics (if the fetcher has somewhere to put it).
    pub capture_snapshot: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            follow_iframes: true,
            capture_snapshot: true,
        }
    }
}

/// Outcome of a fetch that reached the server. `success == false` carries `error_message`
/// and is treated exactly like a [FetchError] by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub success: bool,
    pub html: String,
    pub error_message: String,
    /// Where the diagnostic snapshot was written, if one was.
    pub snapshot: Option<PathBuf>,
}

impl FetchResult {
    pub fn ok(html: impl Into<String>) -> Self {
        Self {
            success: true,
            html: html.into(),
            error_message: String::new(),
            snapshot: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            html: String::new(),
            error_message: message.into(),
            snapshot: None,
        }
    }
}

/// Turns a URL into rendered HTML.
pub trait Fetcher {
    fn fetch(&mut self, url: &str, options: &FetchOptions) -> Result<FetchResult, FetchError>;
}
