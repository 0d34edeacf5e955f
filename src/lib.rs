//! docscrape: fetch documentation pages and assemble them into one offline document
//! (DOCX by default; HTML, Markdown, plain text, or JSON on request).

pub mod assemble;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod docx;
pub mod extract;
pub mod fetch;
pub mod formats;
pub mod model;
pub mod run;

// Re-exports for CLI and consumers.
pub use assemble::{append, HEADING_COLOR, TITLE_COLOR};
pub use catalog::{load_catalog, CatalogError, SourceCatalog};
pub use docx::{write_docx, DocxSink};
pub use extract::{extract, normalize, ExtractError};
pub use fetch::{FetchError, FetchOptions, FetchResult, Fetcher, HttpFetcher, HttpFetcherBuilder};
pub use formats::{sink_for, DocumentSink, OutputFormat, SinkError};
pub use model::{ContentBlock, Document, Element, PageExtract};
pub use run::{run, RunOptions, RunReport, SectionFailure, SectionOutcome, SectionReport};
