use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::record::Paper;

/// Sort order for the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Ascending by paper number.
    #[default]
    Number,
    /// Ascending by title, accent- and case-insensitive.
    Title,
    /// Descending by page count.
    Pages,
    /// Descending by figure count.
    Figures,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown sort key '{0}' (expected one of: number, title, pages, figures)")]
pub struct ParseSortKeyError(pub String);

impl SortKey {
    pub fn all() -> &'static [SortKey] {
        &[
            SortKey::Number,
            SortKey::Title,
            SortKey::Pages,
            SortKey::Figures,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Title => "title",
            Self::Pages => "pages",
            Self::Figures => "figures",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Number => "paper number",
            Self::Title => "title (A-Z)",
            Self::Pages => "pages (most first)",
            Self::Figures => "figures (most first)",
        }
    }

    /// Parse a key, falling back to [`SortKey::Number`] for anything unknown.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    /// Compare two papers by this key. `a_key`/`b_key` are the papers'
    /// title collation keys (see [`collation_key`]).
    pub fn compare(self, a: &Paper, a_key: &str, b: &Paper, b_key: &str) -> Ordering {
        match self {
            Self::Number => a.number.cmp(&b.number),
            Self::Title => a_key.cmp(b_key).then_with(|| a.title.cmp(&b.title)),
            Self::Pages => b.page_count.cmp(&a.page_count),
            Self::Figures => b.figures.cmp(&a.figures),
        }
    }
}

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" | "" => Ok(Self::Number),
            "title" => Ok(Self::Title),
            "pages" => Ok(Self::Pages),
            "figures" => Ok(Self::Figures),
            _ => Err(ParseSortKeyError(s.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collation key approximating locale-aware title ordering: compatibility
/// decomposition, combining marks dropped, lower-cased.
pub fn collation_key(title: &str) -> String {
    title
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Sort view indices in place. Ties fall back to load order.
pub fn sort_indices(indices: &mut [usize], papers: &[Paper], collation: &[String], key: SortKey) {
    indices.sort_by(|&a, &b| {
        key.compare(&papers[a], &collation[a], &papers[b], &collation[b])
            .then_with(|| a.cmp(&b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(number: u64, title: &str, pages: u64, figures: usize) -> Paper {
        Paper {
            number,
            title: title.to_string(),
            page_count: pages,
            figures,
            ..Paper::default()
        }
    }

    fn sorted(papers: &[Paper], key: SortKey) -> Vec<usize> {
        let collation: Vec<String> = papers.iter().map(|p| collation_key(&p.title)).collect();
        let mut indices: Vec<usize> = (0..papers.len()).collect();
        sort_indices(&mut indices, papers, &collation, key);
        indices
    }

    #[test]
    fn parse_known_keys() {
        assert_eq!("title".parse::<SortKey>().unwrap(), SortKey::Title);
        assert_eq!(" Pages ".parse::<SortKey>().unwrap(), SortKey::Pages);
        assert_eq!("FIGURES".parse::<SortKey>().unwrap(), SortKey::Figures);
        assert_eq!("number".parse::<SortKey>().unwrap(), SortKey::Number);
    }

    #[test]
    fn unknown_key_is_an_error_but_lenient_parse_defaults() {
        assert!("relevance".parse::<SortKey>().is_err());
        assert_eq!(SortKey::parse_lenient("relevance"), SortKey::Number);
    }

    #[test]
    fn as_str_round_trips_through_from_str() {
        for key in SortKey::all() {
            assert_eq!(key.as_str().parse::<SortKey>().unwrap(), *key);
        }
    }

    #[test]
    fn collation_ignores_case_and_accents() {
        assert_eq!(collation_key("Électron"), collation_key("electron"));
        assert_eq!(collation_key("ＲＦ"), "rf");
    }

    #[test]
    fn title_sort_is_case_insensitive() {
        let papers = vec![
            paper(1, "beta", 0, 0),
            paper(2, "Alpha", 0, 0),
            paper(3, "Électron", 0, 0),
            paper(4, "delta", 0, 0),
        ];
        assert_eq!(sorted(&papers, SortKey::Title), vec![1, 0, 3, 2]);
    }

    #[test]
    fn numeric_sorts_have_expected_direction() {
        let papers = vec![
            paper(3, "a", 4, 1),
            paper(1, "b", 9, 7),
            paper(2, "c", 6, 3),
        ];
        assert_eq!(sorted(&papers, SortKey::Number), vec![1, 2, 0]);
        assert_eq!(sorted(&papers, SortKey::Pages), vec![1, 2, 0]);
        assert_eq!(sorted(&papers, SortKey::Figures), vec![1, 2, 0]);
    }

    #[test]
    fn equal_keys_keep_load_order() {
        let papers = vec![
            paper(1, "x", 5, 2),
            paper(2, "y", 5, 2),
            paper(3, "z", 5, 2),
        ];
        assert_eq!(sorted(&papers, SortKey::Pages), vec![0, 1, 2]);
        assert_eq!(sorted(&papers, SortKey::Figures), vec![0, 1, 2]);
    }
}
