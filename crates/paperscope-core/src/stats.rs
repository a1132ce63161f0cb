use std::collections::HashSet;

use serde::Serialize;

use crate::record::Paper;

/// Filter choices offered for institutions are capped at this many.
pub const MAX_INSTITUTION_OPTIONS: usize = 50;
/// Filter choices offered for topics are capped at this many.
pub const MAX_TOPIC_OPTIONS: usize = 30;

/// Aggregate statistics over the full collection (never the filtered view).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub total_papers: usize,
    /// Distinct by exact string equality.
    pub distinct_authors: usize,
    pub distinct_affiliations: usize,
    pub distinct_keywords: usize,
    pub total_pages: u64,
    pub total_figures: u64,
    /// Sum of author-list lengths over paper count; 0 for an empty set.
    pub avg_authors_per_paper: f64,
}

impl Statistics {
    pub fn compute(papers: &[Paper]) -> Self {
        let mut authors: HashSet<&str> = HashSet::new();
        let mut affiliations: HashSet<&str> = HashSet::new();
        let mut keywords: HashSet<&str> = HashSet::new();
        let mut total_pages = 0u64;
        let mut total_figures = 0u64;
        let mut author_slots = 0usize;

        for paper in papers {
            authors.extend(paper.authors.iter().map(String::as_str));
            affiliations.extend(paper.affiliations.iter().map(String::as_str));
            keywords.extend(paper.keywords.iter().map(String::as_str));
            total_pages = total_pages.saturating_add(paper.page_count);
            total_figures = total_figures.saturating_add(paper.figures as u64);
            author_slots += paper.authors.len();
        }

        let avg_authors_per_paper = if papers.is_empty() {
            0.0
        } else {
            author_slots as f64 / papers.len() as f64
        };

        Self {
            total_papers: papers.len(),
            distinct_authors: authors.len(),
            distinct_affiliations: affiliations.len(),
            distinct_keywords: keywords.len(),
            total_pages,
            total_figures,
            avg_authors_per_paper,
        }
    }
}

/// Distinct values offered as institution/topic filter choices, in the order
/// they are first seen in the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub institutions: Vec<String>,
    pub topics: Vec<String>,
}

impl FilterOptions {
    pub fn compute(papers: &[Paper]) -> Self {
        Self {
            institutions: distinct_first_seen(
                papers.iter().flat_map(|p| p.affiliations.iter()),
                MAX_INSTITUTION_OPTIONS,
            ),
            topics: distinct_first_seen(
                papers.iter().flat_map(|p| p.keywords.iter()),
                MAX_TOPIC_OPTIONS,
            ),
        }
    }
}

fn distinct_first_seen<'a>(values: impl Iterator<Item = &'a String>, limit: usize) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        if out.len() >= limit {
            break;
        }
        if seen.insert(value.as_str()) {
            out.push(value.clone());
        }
    }
    out
}
