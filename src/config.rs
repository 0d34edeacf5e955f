//! Optional config file loading. Search order: ./docscrape.toml, then
//! $XDG_CONFIG_HOME/docscrape/config.toml (or the platform config dir).

use serde::Deserialize;
use std::path::PathBuf;

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Default output directory when -o is not set. Paths are relative to CWD.
    pub output_dir: Option<PathBuf>,
    /// Title of the assembled document (overrides the catalog's title).
    pub document_title: Option<String>,
    /// Output format: docx (default), html, markdown, text, or json.
    pub format: Option<String>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Minimum pause in seconds between sections.
    pub request_delay_secs: Option<u64>,
    /// Seconds to wait after a response arrives before reading the page.
    pub settle_delay_secs: Option<u64>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Inline iframe documents into fetched pages (default: true).
    pub follow_iframes: Option<bool>,
    /// Directory for HTML snapshots of fetched pages. Unset means no snapshots.
    pub snapshot_dir: Option<PathBuf>,
}

/// Search order: (1) ./docscrape.toml, (2) <config dir>/docscrape/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("docscrape.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("docscrape").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config: Config = toml::from_str(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            tracing::debug!(config = %path.display(), "loaded config");
            return Ok(Some(config));
        }
    }
    Ok(None)
}
