//! Blocking HTTP fetcher with browser-like defaults, optional iframe inlining, and HTML
//! snapshots for diagnostics. One attempt per URL; pacing is the orchestrator's job.

use crate::fetch::{FetchError, FetchOptions, FetchResult, Fetcher};
use reqwest::Url;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; docscrape/0.1; +https://github.com/docscrape)";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_REDIRECTS: usize = 10;
/// Upper bound on iframes fetched per page.
const MAX_IFRAMES: usize = 8;
const MAX_SNAPSHOT_STEM: usize = 120;

/// Blocking HTTP implementation of [Fetcher].
#[derive(Debug)]
pub struct HttpFetcher {
    inner: reqwest::blocking::Client,
    snapshot_dir: Option<PathBuf>,
}

impl HttpFetcher {
    /// Build a fetcher with default User-Agent and timeout, and no snapshot directory.
    pub fn new() -> Result<Self, FetchError> {
        Self::builder().build()
    }

    pub fn builder() -> HttpFetcherBuilder {
        HttpFetcherBuilder::default()
    }

    /// GET `url`; non-2xx becomes a failed [FetchResult], transport errors a [FetchError].
    fn get_html(&self, url: &Url, settle_delay: Duration) -> Result<FetchResult, FetchError> {
        let response =
            self.inner
                .get(url.clone())
                .send()
                .map_err(|e| FetchError::Network {
                    url: url.to_string(),
                    source: e,
                })?;
        let status = response.status();
        if !status.is_success() {
            return Ok(FetchResult::failed(format!(
                "HTTP {} when fetching {}",
                status.as_u16(),
                url
            )));
        }
        if !settle_delay.is_zero() {
            std::thread::sleep(settle_delay);
        }
        let html = response.text().map_err(|e| FetchError::BodyRead {
            url: url.to_string(),
            source: e,
        })?;
        Ok(FetchResult::ok(html))
    }

    /// Fetch each iframe document and splice its body into `html` where the frame sits.
    fn inline_iframes(&self, page_url: &Url, html: String) -> String {
        replace_iframes(&html, page_url, |src| match self.get_html(src, Duration::ZERO) {
            Ok(r) if r.success => Some(r.html),
            Ok(r) => {
                tracing::warn!(frame = %src, "iframe skipped: {}", r.error_message);
                None
            }
            Err(e) => {
                tracing::warn!(frame = %src, "iframe skipped: {}", e);
                None
            }
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&mut self, url: &str, options: &FetchOptions) -> Result<FetchResult, FetchError> {
        let page_url = parse_http_url(url)?;
        let mut result = self.get_html(&page_url, options.settle_delay)?;
        if !result.success {
            return Ok(result);
        }
        if options.follow_iframes {
            result.html = self.inline_iframes(&page_url, result.html);
        }
        if options.capture_snapshot {
            if let Some(dir) = &self.snapshot_dir {
                match write_snapshot(dir, url, &result.html) {
                    Ok(path) => {
                        tracing::debug!(snapshot = %path.display(), "saved HTML snapshot");
                        result.snapshot = Some(path);
                    }
                    Err(e) => tracing::warn!(
                        dir = %dir.display(),
                        "could not write HTML snapshot for {}: {}",
                        url,
                        e
                    ),
                }
            }
        }
        Ok(result)
    }
}

/// Parse `input` and require an http(s) URL.
fn parse_http_url(input: &str) -> Result<Url, FetchError> {
    let url = Url::parse(input.trim()).map_err(|e| FetchError::InvalidUrl {
        input: input.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::UnsupportedScheme {
            scheme: other.to_string(),
            url: input.to_string(),
        }),
    }
}

/// Replace each `<iframe>` element with `<div class="iframe-content">` holding the body of the
/// framed document, in place. `fetch_frame` returns the framed HTML or None to leave the
/// iframe untouched. At most [MAX_IFRAMES] frames are fetched.
fn replace_iframes<F>(html: &str, base: &Url, mut fetch_frame: F) -> String
where
    F: FnMut(&Url) -> Option<String>,
{
    let spans = iframe_spans(html);
    if spans.is_empty() {
        return html.to_string();
    }
    let mut out = String::with_capacity(html.len());
    let mut copied = 0;
    let mut fetched = 0;
    for (start, end) in spans {
        if fetched == MAX_IFRAMES {
            break;
        }
        let Some(src) = iframe_src(&html[start..end], base) else {
            continue;
        };
        fetched += 1;
        if let Some(frame) = fetch_frame(&src) {
            out.push_str(&html[copied..start]);
            out.push_str("<div class=\"iframe-content\">");
            out.push_str(&body_inner_html(&frame));
            out.push_str("</div>");
            copied = end;
        }
    }
    out.push_str(&html[copied..]);
    out
}

/// Byte ranges of `<iframe ...>...</iframe>` elements (case-insensitive), in page order.
/// An iframe without a closing tag spans only its start tag.
fn iframe_spans(html: &str) -> Vec<(usize, usize)> {
    // ASCII lowercasing keeps byte offsets valid for the original string.
    let lower = html.to_ascii_lowercase();
    let mut spans = Vec::new();
    let mut pos = 0;
    while let Some(found) = lower[pos..].find("<iframe") {
        let start = pos + found;
        let name_end = start + "<iframe".len();
        match lower.as_bytes().get(name_end) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => {}
            _ => {
                pos = name_end;
                continue;
            }
        }
        let Some(open_end) = lower[name_end..].find('>').map(|i| name_end + i + 1) else {
            break;
        };
        let end = match lower[open_end..].find("</iframe") {
            Some(i) => {
                let close = open_end + i;
                lower[close..]
                    .find('>')
                    .map_or(html.len(), |j| close + j + 1)
            }
            None => open_end,
        };
        spans.push((start, end));
        pos = end;
    }
    spans
}

/// Absolute http(s) URL of the `src` of an iframe element's markup, resolved against `base`.
fn iframe_src(element: &str, base: &Url) -> Option<Url> {
    let sel = Selector::parse("iframe[src]").ok()?;
    let fragment = Html::parse_fragment(element);
    let src = fragment.select(&sel).next()?.value().attr("src")?;
    let url = base.join(src.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Inner HTML of `<body>`, or the whole input when there is no body element.
fn body_inner_html(html: &str) -> String {
    let doc = Html::parse_document(html);
    Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next().map(|b| b.inner_html()))
        .unwrap_or_else(|| html.to_string())
}

/// File name for a page snapshot: URL with non-alphanumerics collapsed to `_`.
fn snapshot_file_name(url: &str) -> String {
    let stripped = url
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let mut stem = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
            stem.push(c);
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let mut stem = stem.trim_matches('_').to_string();
    if stem.len() > MAX_SNAPSHOT_STEM {
        stem.truncate(MAX_SNAPSHOT_STEM);
    }
    if stem.is_empty() {
        stem = "page".to_string();
    }
    format!("{}.html", stem)
}

fn write_snapshot(dir: &Path, url: &str, html: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(snapshot_file_name(url));
    std::fs::write(&path, html)?;
    Ok(path)
}

/// Builder for [HttpFetcher] with optional User-Agent, timeout, and snapshot directory.
#[derive(Debug)]
pub struct HttpFetcherBuilder {
    user_agent: Option<String>,
    timeout_secs: u64,
    snapshot_dir: Option<PathBuf>,
}

impl Default for HttpFetcherBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            snapshot_dir: None,
        }
    }
}

impl HttpFetcherBuilder {
    /// Set a custom User-Agent. If not set, a browser-like default is used.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set request timeout in seconds. Default 30.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Directory for HTML snapshots. Without one, snapshot capture is a no-op.
    pub fn snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Result<HttpFetcher, FetchError> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let inner = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .timeout(Duration::from_secs(self.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(FetchError::Client)?;
        Ok(HttpFetcher {
            inner,
            snapshot_dir: self.snapshot_dir,
        })
    }
}
