//! In-memory browsing, search and filtering for conference paper metadata.
//!
//! Raw JSON records are normalized into [`Paper`]s, handed to a
//! [`QueryEngine`], and queried through search text, institution and topic
//! filters, a sort key, and fixed-size pages.

pub mod config_file;
pub mod paging;
pub mod query;
pub mod record;
pub mod sort;
pub mod stats;

// Re-export for convenience
pub use paging::{DEFAULT_MAX_VISIBLE, PAGE_SIZE, PageWindow};
pub use query::{
    EngineOptions, InstitutionMatch, Lookup, QueryEngine, QueryParams, ViewChange,
    matches_institution, matches_search, matches_topic,
};
pub use record::{Paper, Tally, normalize, normalize_all};
pub use sort::{ParseSortKeyError, SortKey};
pub use stats::{FilterOptions, Statistics};
