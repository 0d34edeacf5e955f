//! Source catalog: the ordered list of (section title, URL) pairs to assemble.
//!
//! Loaded from a TOML file (`title` plus `[[sections]]` with `title`/`url`) or taken from the
//! built-in Crawl4AI documentation list.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Title used for the output document when the catalog file does not set one.
pub const DEFAULT_DOCUMENT_TITLE: &str = "Crawl4AI Documentation";

const BUILTIN_SECTIONS: &[(&str, &str)] = &[
    ("Installation", "https://crawl4ai.com/mkdocs/basic/installation/"),
    ("Docker Deployment", "https://crawl4ai.com/mkdocs/basic/docker-deploymeny/"),
    ("Quick Start", "https://crawl4ai.com/mkdocs/basic/quickstart/"),
    ("Simple Crawling", "https://crawl4ai.com/mkdocs/basic/simple-crawling/"),
    ("Output Formats", "https://crawl4ai.com/mkdocs/basic/output-formats/"),
    ("Browser Configuration", "https://crawl4ai.com/mkdocs/basic/browser-config/"),
    ("Page Interaction", "https://crawl4ai.com/mkdocs/basic/page-interaction/"),
    ("Content Selection", "https://crawl4ai.com/mkdocs/basic/content-selection/"),
    ("Content Processing", "https://crawl4ai.com/mkdocs/advanced/content-processing/"),
    ("Magic Mode", "https://crawl4ai.com/mkdocs/advanced/magic-mode/"),
    ("Hooks & Auth", "https://crawl4ai.com/mkdocs/advanced/hooks-auth/"),
    ("Proxy & Security", "https://crawl4ai.com/mkdocs/advanced/proxy-security/"),
    ("Session Management", "https://crawl4ai.com/mkdocs/advanced/session-management/"),
    (
        "Advanced Session Management",
        "https://crawl4ai.com/mkdocs/advanced/session-management-advanced/",
    ),
    ("Extraction Overview", "https://crawl4ai.com/mkdocs/extraction/overview/"),
    ("LLM Strategy", "https://crawl4ai.com/mkdocs/extraction/llm/"),
    ("Json-CSS Extractor Basic", "https://crawl4ai.com/mkdocs/extraction/css/"),
    ("Json-CSS Extractor Advanced", "https://crawl4ai.com/mkdocs/extraction/css-advanced/"),
    ("Cosine Strategy", "https://crawl4ai.com/mkdocs/extraction/cosine/"),
    ("Chunking", "https://crawl4ai.com/mkdocs/extraction/chunking/"),
    ("Parameters Table", "https://crawl4ai.com/mkdocs/api/parameters/"),
    ("AsyncWebCrawler", "https://crawl4ai.com/mkdocs/api/async-webcrawler/"),
    ("AsyncWebCrawler.arun()", "https://crawl4ai.com/mkdocs/api/arun/"),
    ("CrawlResult", "CrawlResult"),
    ("Strategies", "https://crawl4ai.com/mkdocs/api/strategies/"),
];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Cannot read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Catalog has a section with an empty title (url: {url}).")]
    EmptyTitle { url: String },

    #[error("Catalog lists section '{title}' more than once.")]
    DuplicateTitle { title: String },

    #[error("Catalog has no sections.")]
    Empty,
}

/// Immutable, ordered mapping from unique section title to source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCatalog {
    entries: Vec<(String, String)>,
}

impl SourceCatalog {
    /// Build a catalog, rejecting empty or duplicate titles and empty input.
    pub fn new<I>(entries: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (title, url) in entries {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(CatalogError::EmptyTitle { url });
            }
            if !seen.insert(title.clone()) {
                return Err(CatalogError::DuplicateTitle { title });
            }
            out.push((title, url.trim().to_string()));
        }
        if out.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { entries: out })
    }

    /// The Crawl4AI documentation pages.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_SECTIONS
                .iter()
                .map(|(t, u)| (t.to_string(), u.to_string()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (title, url) pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, u)| (t.as_str(), u.as_str()))
    }
}

/// Catalog file contents.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CatalogFile {
    /// Output document title. Overridden by `--title`.
    pub title: Option<String>,
    #[serde(default)]
    pub sections: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    pub url: String,
}

/// Parse catalog TOML. `path` is only used in error messages.
pub fn parse_catalog(
    s: &str,
    path: &Path,
) -> Result<(SourceCatalog, Option<String>), CatalogError> {
    let file: CatalogFile = toml::from_str(s).map_err(|e| CatalogError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    let catalog = SourceCatalog::new(file.sections.into_iter().map(|e| (e.title, e.url)))?;
    let title = file
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    Ok((catalog, title))
}

/// Read and parse a catalog file. Returns the catalog and its optional document title.
pub fn load_catalog(path: &Path) -> Result<(SourceCatalog, Option<String>), CatalogError> {
    let s = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_catalog(&s, path)
}
