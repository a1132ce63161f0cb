//! The query engine: owns the full paper collection, the current filtered and
//! sorted view, and the active query parameters.
//!
//! The engine is single-owner and synchronous. Every mutating call
//! re-evaluates what it needs to and returns a [`ViewChange`] so the caller
//! decides when to re-render.

use serde::Serialize;

use crate::paging::{self, PAGE_SIZE, PageWindow};
use crate::record::Paper;
use crate::sort::{SortKey, collation_key, sort_indices};
use crate::stats::{FilterOptions, Statistics};

/// How the institution filter compares against affiliations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstitutionMatch {
    /// Case-sensitive substring containment.
    #[default]
    CaseSensitive,
    /// Substring containment after lower-casing both sides.
    CaseInsensitive,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    pub institution_match: InstitutionMatch,
}

/// Active query parameters. Empty strings match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryParams {
    pub search: String,
    pub institution: String,
    pub topic: String,
    pub sort: SortKey,
}

impl QueryParams {
    /// True when no predicate narrows the view.
    pub fn is_unfiltered(&self) -> bool {
        self.search.is_empty() && self.institution.is_empty() && self.topic.is_empty()
    }
}

/// Returned by every mutating engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewChange {
    /// Records in the view.
    pub matched: usize,
    pub total_pages: usize,
    /// Current 1-based page.
    pub page: usize,
}

/// Result of looking a paper up by number.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    NotFound,
    Found(&'a Paper),
    /// Several records share the number. All of them, in load order.
    Ambiguous(Vec<&'a Paper>),
}

/// Lower-cased searchable fields of one paper, built once at ingestion.
#[derive(Debug, Clone)]
struct SearchText {
    title: String,
    authors: String,
    abstract_text: String,
    keywords: String,
}

impl SearchText {
    fn from_paper(paper: &Paper) -> Self {
        Self {
            title: paper.title.to_lowercase(),
            authors: paper.joined_authors().to_lowercase(),
            abstract_text: paper.abstract_text.to_lowercase(),
            keywords: paper.joined_keywords().to_lowercase(),
        }
    }

    /// `needle` must already be lower-cased.
    fn contains(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.title.contains(needle)
            || self.authors.contains(needle)
            || self.abstract_text.contains(needle)
            || self.keywords.contains(needle)
    }
}

/// Free-text predicate: the lower-cased `search` is a substring of the title,
/// the space-joined authors, the abstract, or the space-joined keywords.
pub fn matches_search(paper: &Paper, search: &str) -> bool {
    SearchText::from_paper(paper).contains(&search.to_lowercase())
}

/// Institution predicate: empty matches everything; otherwise some
/// affiliation contains `institution`.
pub fn matches_institution(paper: &Paper, institution: &str, mode: InstitutionMatch) -> bool {
    if institution.is_empty() {
        return true;
    }
    match mode {
        InstitutionMatch::CaseSensitive => paper
            .affiliations
            .iter()
            .any(|aff| aff.contains(institution)),
        InstitutionMatch::CaseInsensitive => {
            let needle = institution.to_lowercase();
            paper
                .affiliations
                .iter()
                .any(|aff| aff.to_lowercase().contains(&needle))
        }
    }
}

/// Topic predicate: empty matches everything; otherwise exact equality with
/// one of the keywords.
pub fn matches_topic(paper: &Paper, topic: &str) -> bool {
    topic.is_empty() || paper.keywords.iter().any(|kw| kw == topic)
}

/// In-memory paper collection with a filtered, sorted, paginated view.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    papers: Vec<Paper>,
    search_text: Vec<SearchText>,
    collation: Vec<String>,
    /// Indices into `papers`.
    view: Vec<usize>,
    page: usize,
    params: QueryParams,
    options: EngineOptions,
    stats: Statistics,
    facets: FilterOptions,
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            papers: Vec::new(),
            search_text: Vec::new(),
            collation: Vec::new(),
            view: Vec::new(),
            page: 1,
            params: QueryParams::default(),
            options,
            stats: Statistics::default(),
            facets: FilterOptions::default(),
        }
    }

    /// Replace the collection. Resets the view to every record in load
    /// order, the page to 1, and all query parameters; recomputes statistics.
    pub fn ingest(&mut self, records: impl IntoIterator<Item = Paper>) -> ViewChange {
        self.papers = records.into_iter().collect();
        self.search_text = self.papers.iter().map(SearchText::from_paper).collect();
        self.collation = self.papers.iter().map(|p| collation_key(&p.title)).collect();
        self.stats = Statistics::compute(&self.papers);
        self.facets = FilterOptions::compute(&self.papers);
        self.params = QueryParams::default();
        self.view = (0..self.papers.len()).collect();
        self.page = 1;

        tracing::info!(
            papers = self.stats.total_papers,
            authors = self.stats.distinct_authors,
            institutions = self.stats.distinct_affiliations,
            "ingested paper collection"
        );
        self.view_change()
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) -> ViewChange {
        self.params.search = text.into();
        self.recompute()
    }

    pub fn set_institution_filter(&mut self, value: impl Into<String>) -> ViewChange {
        self.params.institution = value.into();
        self.recompute()
    }

    pub fn set_topic_filter(&mut self, value: impl Into<String>) -> ViewChange {
        self.params.topic = value.into();
        self.recompute()
    }

    pub fn set_sort_key(&mut self, key: SortKey) -> ViewChange {
        self.params.sort = key;
        self.recompute()
    }

    /// Replace every parameter at once, with a single re-evaluation.
    pub fn apply(&mut self, params: QueryParams) -> ViewChange {
        self.params = params;
        self.recompute()
    }

    /// Clear search, institution and topic. The sort key is kept.
    pub fn clear_filters(&mut self) -> ViewChange {
        self.params.search.clear();
        self.params.institution.clear();
        self.params.topic.clear();
        self.recompute()
    }

    /// Move to page `n` without re-evaluating the view. `n` is not checked:
    /// a page past the end simply has no records.
    pub fn go_to_page(&mut self, n: usize) -> ViewChange {
        self.page = n;
        self.view_change()
    }

    /// Records on the current page, clipped to the end of the view.
    pub fn current_page_records(&self) -> Vec<&Paper> {
        let bounds = paging::page_bounds(self.view.len(), self.page, PAGE_SIZE);
        self.view[bounds].iter().map(|&i| &self.papers[i]).collect()
    }

    /// Every record in the view, in view order.
    pub fn view(&self) -> impl Iterator<Item = &Paper> + '_ {
        self.view.iter().map(|&i| &self.papers[i])
    }

    pub fn view_len(&self) -> usize {
        self.view.len()
    }

    pub fn total_pages(&self) -> usize {
        paging::total_pages(self.view.len(), PAGE_SIZE)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// The full collection in load order.
    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }

    /// Statistics over the full collection, as of the last ingest.
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn filter_options(&self) -> &FilterOptions {
        &self.facets
    }

    pub fn page_window(&self, max_visible: usize) -> PageWindow {
        PageWindow::compute(self.page, self.total_pages(), max_visible)
    }

    /// Look up a paper by number across the full collection.
    pub fn lookup(&self, number: u64) -> Lookup<'_> {
        let mut found: Vec<&Paper> = self.papers.iter().filter(|p| p.number == number).collect();
        match found.len() {
            0 => Lookup::NotFound,
            1 => Lookup::Found(found.remove(0)),
            _ => Lookup::Ambiguous(found),
        }
    }

    fn recompute(&mut self) -> ViewChange {
        let needle = self.params.search.to_lowercase();
        let mut indices: Vec<usize> = (0..self.papers.len())
            .filter(|&i| {
                let paper = &self.papers[i];
                self.search_text[i].contains(&needle)
                    && matches_institution(
                        paper,
                        &self.params.institution,
                        self.options.institution_match,
                    )
                    && matches_topic(paper, &self.params.topic)
            })
            .collect();
        sort_indices(&mut indices, &self.papers, &self.collation, self.params.sort);

        self.view = indices;
        self.page = 1;

        tracing::debug!(
            search = %self.params.search,
            institution = %self.params.institution,
            topic = %self.params.topic,
            sort = %self.params.sort,
            matched = self.view.len(),
            "recomputed view"
        );
        self.view_change()
    }

    fn view_change(&self) -> ViewChange {
        ViewChange {
            matched: self.view.len(),
            total_pages: self.total_pages(),
            page: self.page,
        }
    }
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new()
    }
}
