use std::ops::Range;

use serde::Serialize;

/// Records per page.
pub const PAGE_SIZE: usize = 10;
/// Page numbers shown in the pagination strip.
pub const DEFAULT_MAX_VISIBLE: usize = 5;

/// `ceil(len / page_size)`; zero for an empty view.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Index range of a 1-based `page` within a view of `len` records, clipped
/// to the end. Empty for page 0 or any page past the end.
pub fn page_bounds(len: usize, page: usize, page_size: usize) -> Range<usize> {
    if page == 0 {
        return len..len;
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= len {
        return len..len;
    }
    start..start.saturating_add(page_size).min(len)
}

/// The pagination strip: a run of page numbers around the current page plus
/// previous/next links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub current: usize,
    pub total: usize,
    pub pages: Vec<usize>,
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

impl PageWindow {
    pub fn compute(current: usize, total: usize, max_visible: usize) -> Self {
        let max_visible = max_visible.max(1);
        let start = current.saturating_sub(max_visible / 2).max(1);
        let end = total.min(start.saturating_add(max_visible - 1));
        let pages = if end >= start {
            (start..=end).collect()
        } else {
            Vec::new()
        };

        Self {
            current,
            total,
            pages,
            prev: (current > 1).then(|| current - 1),
            next: (current < total).then(|| current + 1),
        }
    }
}
