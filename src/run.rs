//! Section orchestration: fetch, extract, and append each catalog entry in order.
//!
//! Failures are isolated per section and recorded in the [RunReport]; the run never stops
//! early. Sections are processed one at a time with a minimum pause between them.

use crate::assemble::append;
use crate::catalog::SourceCatalog;
use crate::extract::extract;
use crate::fetch::{FetchOptions, Fetcher};
use crate::model::{Document, PageExtract};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Default pause between sections.
pub const DEFAULT_PACING: Duration = Duration::from_secs(3);

/// Why a section was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionFailure {
    /// Network/render fault or an explicit failure result from the fetcher.
    Fetch { message: String },
    /// No container or no usable blocks in the fetched page.
    NoContent { reason: String },
}

impl std::fmt::Display for SectionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionFailure::Fetch { message } => write!(f, "fetch failed: {}", message),
            SectionFailure::NoContent { reason } => write!(f, "no content: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionOutcome {
    Done { blocks: usize },
    Failed { failure: SectionFailure },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionReport {
    pub title: String,
    pub url: String,
    pub outcome: SectionOutcome,
}

/// Per-section outcomes, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub sections: Vec<SectionReport>,
}

impl RunReport {
    pub fn done_count(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| matches!(s.outcome, SectionOutcome::Done { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.sections.len() - self.done_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&SectionReport, &SectionFailure)> {
        self.sections.iter().filter_map(|s| match &s.outcome {
            SectionOutcome::Failed { failure } => Some((s, failure)),
            SectionOutcome::Done { .. } => None,
        })
    }
}

/// Options for a run: pacing interval, fetch options, and an optional progress callback
/// called with (1-based index, total, title) before each section.
pub struct RunOptions<'a> {
    pub pacing: Duration,
    pub fetch: FetchOptions,
    pub progress: Option<&'a dyn Fn(usize, usize, &str)>,
}

impl Default for RunOptions<'_> {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
            fetch: FetchOptions::default(),
            progress: None,
        }
    }
}

/// Enforces a minimum gap between the end of one section and the start of the next fetch.
#[derive(Debug)]
struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    fn wait(&self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
    }

    fn mark(&mut self) {
        self.last = Some(Instant::now());
    }
}

/// Process every catalog section in order, appending successful ones to `doc`.
pub fn run<F: Fetcher + ?Sized>(
    catalog: &SourceCatalog,
    fetcher: &mut F,
    doc: &mut Document,
    options: &RunOptions<'_>,
) -> RunReport {
    let total = catalog.len();
    let mut pacer = Pacer::new(options.pacing);
    let mut report = RunReport::default();

    for (i, (title, url)) in catalog.iter().enumerate() {
        if let Some(progress) = options.progress {
            progress(i + 1, total, title);
        }
        pacer.wait();
        let outcome = process_section(title, url, fetcher, doc, &options.fetch);
        pacer.mark();

        match &outcome {
            SectionOutcome::Done { blocks } => {
                tracing::info!(section = %title, blocks, "section done")
            }
            SectionOutcome::Failed { failure } => {
                tracing::warn!(section = %title, %url, "section failed: {}", failure)
            }
        }
        report.sections.push(SectionReport {
            title: title.to_string(),
            url: url.to_string(),
            outcome,
        });
    }
    report
}

fn process_section<F: Fetcher + ?Sized>(
    title: &str,
    url: &str,
    fetcher: &mut F,
    doc: &mut Document,
    fetch_options: &FetchOptions,
) -> SectionOutcome {
    tracing::info!(section = %title, %url, "fetching");
    let html = match fetcher.fetch(url, fetch_options) {
        Ok(result) if result.success => result.html,
        Ok(result) => {
            return failed(SectionFailure::Fetch {
                message: result.error_message,
            })
        }
        Err(e) => {
            return failed(SectionFailure::Fetch {
                message: e.to_string(),
            })
        }
    };

    tracing::debug!(section = %title, "extracting");
    let blocks = match extract(&html) {
        Ok(blocks) => blocks,
        Err(e) => {
            return failed(SectionFailure::NoContent {
                reason: e.to_string(),
            })
        }
    };

    let count = blocks.len();
    append(
        doc,
        PageExtract {
            title: title.to_string(),
            blocks,
        },
    );
    SectionOutcome::Done { blocks: count }
}

fn failed(failure: SectionFailure) -> SectionOutcome {
    SectionOutcome::Failed { failure }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{HEADING_COLOR, TITLE_COLOR};
    use crate::catalog::CatalogError;
    use crate::fetch::{FetchError, FetchResult};
    use crate::model::{Element, ParagraphStyle, Run};
    use std::collections::HashMap;

    /// Serves canned responses keyed by URL and records the order of requests.
    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<String, FetchResult>,
        requested: Vec<String>,
    }

    impl FakeFetcher {
        fn page(mut self, url: &str, result: FetchResult) -> Self {
            self.pages.insert(url.to_string(), result);
            self
        }
    }

    impl Fetcher for FakeFetcher {
        fn fetch(&mut self, url: &str, _: &FetchOptions) -> Result<FetchResult, FetchError> {
            self.requested.push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::InvalidUrl {
                    input: url.to_string(),
                    reason: "no such page".to_string(),
                })
        }
    }

    fn quick_options() -> RunOptions<'static> {
        RunOptions {
            pacing: Duration::ZERO,
            ..RunOptions::default()
        }
    }

    fn catalog(entries: &[(&str, &str)]) -> Result<SourceCatalog, CatalogError> {
        SourceCatalog::new(
            entries
                .iter()
                .map(|(t, u)| (t.to_string(), u.to_string())),
        )
    }

    #[test]
    fn failed_fetch_is_isolated_and_second_section_is_appended() -> Result<(), CatalogError> {
        let catalog = catalog(&[("Install", "https://a/1"), ("Usage", "https://a/2")])?;
        let mut fetcher = FakeFetcher::default()
            .page("https://a/1", FetchResult::failed("timeout"))
            .page(
                "https://a/2",
                FetchResult::ok("<body><h2>Basics</h2><p>Run it.</p></body>"),
            );
        let mut doc = Document::new("Docs");

        let report = run(&catalog, &mut fetcher, &mut doc, &quick_options());

        assert_eq!(
            report.sections[0].outcome,
            SectionOutcome::Failed {
                failure: SectionFailure::Fetch {
                    message: "timeout".to_string()
                }
            }
        );
        assert_eq!(report.sections[1].outcome, SectionOutcome::Done { blocks: 2 });
        assert_eq!(
            doc.elements,
            vec![
                Element::Heading {
                    level: 1,
                    text: "Usage".to_string(),
                    color: TITLE_COLOR
                },
                Element::Heading {
                    level: 2,
                    text: "Basics".to_string(),
                    color: HEADING_COLOR
                },
                Element::Paragraph {
                    style: ParagraphStyle::Normal,
                    runs: vec![Run::plain("Run it.")]
                },
            ]
        );
        assert_eq!(report.done_count(), 1);
        assert_eq!(report.failed_count(), 1);
        Ok(())
    }

    #[test]
    fn fetch_error_is_recorded_as_fetch_failure() -> Result<(), CatalogError> {
        let catalog = catalog(&[("Missing", "https://a/missing")])?;
        let mut fetcher = FakeFetcher::default();
        let mut doc = Document::new("Docs");
        let report = run(&catalog, &mut fetcher, &mut doc, &quick_options());
        assert!(matches!(
            &report.sections[0].outcome,
            SectionOutcome::Failed {
                failure: SectionFailure::Fetch { message }
            } if message.contains("no such page")
        ));
        assert!(doc.is_empty());
        Ok(())
    }

    #[test]
    fn no_content_does_not_disturb_following_sections() -> Result<(), CatalogError> {
        let catalog = catalog(&[
            ("One", "https://a/1"),
            ("Empty", "https://a/2"),
            ("Three", "https://a/3"),
        ])?;
        let mut fetcher = FakeFetcher::default()
            .page("https://a/1", FetchResult::ok("<body><p>first</p></body>"))
            .page("https://a/2", FetchResult::ok("<body><p></p><ul></ul></body>"))
            .page("https://a/3", FetchResult::ok("<body><p>third</p></body>"));
        let mut doc = Document::new("Docs");

        let report = run(&catalog, &mut fetcher, &mut doc, &quick_options());

        assert!(matches!(
            report.sections[1].outcome,
            SectionOutcome::Failed {
                failure: SectionFailure::NoContent { .. }
            }
        ));
        assert_eq!(fetcher.requested, vec!["https://a/1", "https://a/2", "https://a/3"]);
        let texts: Vec<String> = doc.elements.iter().map(Element::plain_text).collect();
        assert_eq!(texts, vec!["One", "first", "Three", "third"]);
        Ok(())
    }

    #[test]
    fn progress_reports_each_section_in_order() -> Result<(), CatalogError> {
        let catalog = catalog(&[("A", "https://a/1"), ("B", "https://a/2")])?;
        let mut fetcher = FakeFetcher::default();
        let mut doc = Document::new("Docs");
        let seen = std::cell::RefCell::new(Vec::new());
        let progress = |i: usize, total: usize, title: &str| {
            seen.borrow_mut().push(format!("{}/{} {}", i, total, title));
        };
        let options = RunOptions {
            pacing: Duration::ZERO,
            fetch: FetchOptions::default(),
            progress: Some(&progress),
        };
        run(&catalog, &mut fetcher, &mut doc, &options);
        assert_eq!(seen.into_inner(), vec!["1/2 A", "2/2 B"]);
        Ok(())
    }

    #[test]
    fn pacing_spaces_out_consecutive_fetches() -> Result<(), CatalogError> {
        let catalog = catalog(&[("A", "https://a/1"), ("B", "https://a/2"), ("C", "https://a/3")])?;
        let mut fetcher = FakeFetcher::default();
        let mut doc = Document::new("Docs");
        let options = RunOptions {
            pacing: Duration::from_millis(30),
            ..RunOptions::default()
        };
        let start = Instant::now();
        let report = run(&catalog, &mut fetcher, &mut doc, &options);
        assert_eq!(report.failed_count(), 3);
        // Two gaps between three sections; no pause before the first.
        assert!(start.elapsed() >= Duration::from_millis(60));
        Ok(())
    }

    #[test]
    fn report_serializes_outcomes() -> Result<(), Box<dyn std::error::Error>> {
        let report = RunReport {
            sections: vec![SectionReport {
                title: "A".to_string(),
                url: "https://a/1".to_string(),
                outcome: SectionOutcome::Failed {
                    failure: SectionFailure::NoContent {
                        reason: "empty".to_string(),
                    },
                },
            }],
        };
        let json = serde_json::to_string(&report)?;
        assert!(json.contains("\"status\":\"failed\""));
        assert!(json.contains("\"kind\":\"no_content\""));
        Ok(())
    }
}
