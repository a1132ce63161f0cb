//! Dataset loading for paperscope.
//!
//! Tries an ordered list of candidate sources (local JSON files or http(s)
//! URLs), keeps the first that yields a paper document, and falls back to
//! generated sample data when nothing loads.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use paperscope_core::{Paper, normalize_all};
use serde_json::Value;
use thiserror::Error;

pub mod sample;

pub use sample::SampleOptions;

/// Candidate locations tried when nothing else is configured.
pub const DEFAULT_SOURCES: &[&str] = &[
    "data/papers-medium.json",
    "data/papers-simple.json",
    "data/papers.json",
];

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("document has no papers array")]
    MissingPapers,
    #[error("no data sources configured")]
    NoSources,
}

/// Where a paper document can be loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
}

impl DataSource {
    /// `http://` and `https://` strings become URLs, anything else a path.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            DataSource::Url(s.to_string())
        } else {
            DataSource::File(PathBuf::from(s))
        }
    }
}

impl FromStr for DataSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => f.write_str(url),
        }
    }
}

pub fn default_sources() -> Vec<DataSource> {
    DEFAULT_SOURCES.iter().map(|s| DataSource::parse(s)).collect()
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Upper bound on a single URL fetch.
    pub timeout: Duration,
    /// Generate sample papers when every source fails.
    pub sample_fallback: bool,
    pub sample: SampleOptions,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            sample_fallback: true,
            sample: SampleOptions::default(),
        }
    }
}

/// How a [`Dataset`] was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Source(DataSource),
    Sample,
    Empty,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Source(source) => write!(f, "{source}"),
            Origin::Sample => f.write_str("generated sample data"),
            Origin::Empty => f.write_str("no data"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub origin: Origin,
    pub papers: Vec<Paper>,
}

/// Pull the raw paper records out of a document: either `{"papers": [...]}`
/// or a bare array.
pub fn extract_records(doc: Value) -> Result<Vec<Value>, LoadError> {
    match doc {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => match map.remove("papers") {
            Some(Value::Array(records)) => Ok(records),
            _ => Err(LoadError::MissingPapers),
        },
        _ => Err(LoadError::MissingPapers),
    }
}

/// Read or fetch a single source and normalize its records.
pub async fn load_source(source: &DataSource, opts: &LoadOptions) -> Result<Vec<Paper>, LoadError> {
    let doc: Value = match source {
        DataSource::File(path) => {
            let content =
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| LoadError::Io {
                        path: path.clone(),
                        source,
                    })?;
            serde_json::from_str(&content)?
        }
        DataSource::Url(url) => fetch_json(url, opts.timeout).await?,
    };
    let records = extract_records(doc)?;
    Ok(normalize_all(&records))
}

async fn fetch_json(url: &str, timeout: Duration) -> Result<Value, LoadError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    // Decode through serde_json so malformed bodies surface as `Json`.
    let body = resp.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Try each source in order and return the first that loads.
pub async fn load_first_available(
    sources: &[DataSource],
    opts: &LoadOptions,
) -> Result<(DataSource, Vec<Paper>), LoadError> {
    let mut last_error = LoadError::NoSources;
    for source in sources {
        tracing::debug!(source = %source, "trying data source");
        match load_source(source, opts).await {
            Ok(papers) => {
                tracing::info!(source = %source, papers = papers.len(), "loaded papers");
                return Ok((source.clone(), papers));
            }
            Err(e) => {
                tracing::debug!(source = %source, error = %e, "data source failed");
                last_error = e;
            }
        }
    }
    Err(last_error)
}

/// Load from the first available source, falling back to sample data (or an
/// empty dataset when the fallback is disabled). Never fails.
pub async fn load_or_sample(sources: &[DataSource], opts: &LoadOptions) -> Dataset {
    match load_first_available(sources, opts).await {
        Ok((source, papers)) => Dataset {
            origin: Origin::Source(source),
            papers,
        },
        Err(e) if opts.sample_fallback => {
            tracing::warn!(error = %e, "could not load paper data, using generated sample data");
            let papers = sample::generate(&opts.sample);
            tracing::info!(papers = papers.len(), "generated sample papers");
            Dataset {
                origin: Origin::Sample,
                papers,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not load paper data");
            Dataset {
                origin: Origin::Empty,
                papers: Vec::new(),
            }
        }
    }
}
