//! Paper records and the normalizer that produces them from raw JSON.
//!
//! The source documents are loosely typed: the same field may be spelled
//! several ways, and figure/table/reference counts appear either as an
//! integer or as an array whose length is the count. Everything is resolved
//! here, once, so query code only ever sees a [`Paper`].

use serde::Serialize;
use serde_json::Value;

const NUMBER_KEYS: &[&str] = &["paper_number", "number"];
const PAGE_COUNT_KEYS: &[&str] = &["page_count", "pageCount", "pages"];
const FILE_SIZE_KEYS: &[&str] = &["file_size_kb", "fileSizeKb"];
const AFFILIATION_KEYS: &[&str] = &["affiliations", "institutions"];

/// One paper's metadata after normalization. Never mutated after ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Paper {
    /// Identity used for detail lookups. Uniqueness is assumed, not enforced.
    pub number: u64,
    pub filename: String,
    pub title: String,
    pub authors: Vec<String>,
    pub affiliations: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub keywords: Vec<String>,
    pub page_count: u64,
    pub file_size_kb: f64,
    pub figures: usize,
    pub tables: usize,
    pub references: usize,
}

impl Paper {
    /// Authors joined with a single space, as searched.
    pub fn joined_authors(&self) -> String {
        self.authors.join(" ")
    }

    /// Keywords joined with a single space, as searched.
    pub fn joined_keywords(&self) -> String {
        self.keywords.join(" ")
    }

    pub fn first_affiliation(&self) -> Option<&str> {
        self.affiliations.first().map(String::as_str)
    }
}

/// A count field as it appears in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tally {
    /// A plain integer count.
    Count(usize),
    /// An array; the count is its length.
    Items(usize),
    /// Missing, null, or not interpretable as a count.
    Absent,
}

impl Tally {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Array(items)) => Tally::Items(items.len()),
            Some(v) => match as_count(v).and_then(|n| usize::try_from(n).ok()) {
                Some(n) => Tally::Count(n),
                None => Tally::Absent,
            },
            None => Tally::Absent,
        }
    }

    pub fn resolve(self) -> Option<usize> {
        match self {
            Tally::Count(n) | Tally::Items(n) => Some(n),
            Tally::Absent => None,
        }
    }
}

/// Normalize one raw record. Never fails: anything absent or malformed
/// becomes an empty string, an empty sequence, or zero.
pub fn normalize(raw: &Value) -> Paper {
    if !raw.is_object() {
        return Paper::default();
    }

    Paper {
        number: field(raw, NUMBER_KEYS).and_then(as_count).unwrap_or(0),
        filename: field(raw, &["filename"]).map(as_text).unwrap_or_default(),
        title: field(raw, &["title"]).map(as_text).unwrap_or_default(),
        authors: field(raw, &["authors"]).map(as_strings).unwrap_or_default(),
        affiliations: field(raw, AFFILIATION_KEYS)
            .map(as_strings)
            .unwrap_or_default(),
        abstract_text: field(raw, &["abstract"]).map(as_text).unwrap_or_default(),
        keywords: field(raw, &["keywords"]).map(as_strings).unwrap_or_default(),
        page_count: field(raw, PAGE_COUNT_KEYS)
            .and_then(as_page_count)
            .unwrap_or(0),
        file_size_kb: field(raw, FILE_SIZE_KEYS).and_then(as_size).unwrap_or(0.0),
        figures: count_field(raw, "figures", "figure_count"),
        tables: count_field(raw, "tables", "table_count"),
        references: count_field(raw, "references", "reference_count"),
    }
}

/// Normalize a whole sequence of raw records, preserving order.
pub fn normalize_all(raw: &[Value]) -> Vec<Paper> {
    raw.iter().map(normalize).collect()
}

/// First of `names` present on the object with a non-null value.
fn field<'a>(raw: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| raw.get(name))
        .find(|v| !v.is_null())
}

/// The primary field wins when it can be read as a count; the companion
/// `*_count` field is only consulted when it can't.
fn count_field(raw: &Value, primary: &str, companion: &str) -> usize {
    Tally::from_value(field(raw, &[primary]))
        .resolve()
        .or_else(|| Tally::from_value(field(raw, &[companion])).resolve())
        .unwrap_or(0)
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Like [`as_count`], but a fractional page count is truncated instead of
/// rejected.
fn as_page_count(value: &Value) -> Option<u64> {
    as_count(value).or_else(|| as_size(value).map(|pages| pages.trunc() as u64))
}

fn as_size(value: &Value) -> Option<f64> {
    let size = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (size.is_finite() && size >= 0.0).then_some(size)
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn as_strings(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}
