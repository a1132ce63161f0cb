use std::io::Write;

use owo_colors::OwoColorize;
use paperscope_core::{FilterOptions, PageWindow, Paper, QueryParams, Statistics};

/// Number of keyword tags shown on a list card.
const CARD_KEYWORDS: usize = 3;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Shorten `text` to at most `max_chars` characters, appending "..." when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Print where the papers came from.
pub fn print_origin(
    w: &mut dyn Write,
    origin: &str,
    count: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    let line = format!("{} papers from {}", count, origin);
    if color.enabled() {
        writeln!(w, "{}", line.dimmed())?;
    } else {
        writeln!(w, "{}", line)?;
    }
    writeln!(w)?;
    Ok(())
}

/// Print the active filters and sort order above a listing.
pub fn print_active_query(
    w: &mut dyn Write,
    params: &QueryParams,
    color: ColorMode,
) -> std::io::Result<()> {
    let mut parts = Vec::new();
    if !params.is_unfiltered() {
        if !params.search.is_empty() {
            parts.push(format!("search \"{}\"", params.search));
        }
        if !params.institution.is_empty() {
            parts.push(format!("institution \"{}\"", params.institution));
        }
        if !params.topic.is_empty() {
            parts.push(format!("topic \"{}\"", params.topic));
        }
    }
    parts.push(format!("sorted by {}", params.sort.label()));

    let line = parts.join(", ");
    if color.enabled() {
        writeln!(w, "{}", line.dimmed())?;
    } else {
        writeln!(w, "{}", line)?;
    }
    writeln!(w)?;
    Ok(())
}

/// Print one paper as a list card.
pub fn print_paper_card(
    w: &mut dyn Write,
    paper: &Paper,
    preview_chars: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    let badge = format!("#{}", paper.number);
    if color.enabled() {
        writeln!(w, "{} {}", badge.cyan(), paper.title.bold())?;
    } else {
        writeln!(w, "{} {}", badge, paper.title)?;
    }

    if !paper.authors.is_empty() {
        writeln!(w, "  {}", paper.authors.join(", "))?;
    }
    if let Some(affiliation) = paper.first_affiliation() {
        if color.enabled() {
            writeln!(w, "  {}", affiliation.dimmed())?;
        } else {
            writeln!(w, "  {}", affiliation)?;
        }
    }
    if !paper.abstract_text.is_empty() {
        writeln!(w, "  {}", truncate_chars(&paper.abstract_text, preview_chars))?;
    }

    let tags = format!(
        "{} pages | {} figures | {} references",
        paper.page_count, paper.figures, paper.references
    );
    if color.enabled() {
        writeln!(w, "  {}", tags.dimmed())?;
    } else {
        writeln!(w, "  {}", tags)?;
    }

    let keywords: Vec<&str> = paper
        .keywords
        .iter()
        .take(CARD_KEYWORDS)
        .map(String::as_str)
        .collect();
    if !keywords.is_empty() {
        let line = keywords
            .iter()
            .map(|kw| format!("[{}]", kw))
            .collect::<Vec<_>>()
            .join(" ");
        if color.enabled() {
            writeln!(w, "  {}", line.green())?;
        } else {
            writeln!(w, "  {}", line)?;
        }
    }
    writeln!(w)?;
    Ok(())
}

/// Print the "showing X-Y of N" line for the current page.
pub fn print_match_summary(
    w: &mut dyn Write,
    matched: usize,
    page: usize,
    total_pages: usize,
    page_len: usize,
    page_size: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    if matched == 0 {
        if color.enabled() {
            writeln!(w, "{}", "No papers match the current filters.".yellow())?;
        } else {
            writeln!(w, "No papers match the current filters.")?;
        }
        return Ok(());
    }
    if page_len == 0 {
        writeln!(
            w,
            "Page {} is past the end ({} matching papers, {} pages)",
            page, matched, total_pages
        )?;
        return Ok(());
    }

    let start = (page - 1) * page_size + 1;
    let end = start + page_len - 1;
    let line = format!(
        "Showing {}-{} of {} papers (page {} of {})",
        start, end, matched, page, total_pages
    );
    if color.enabled() {
        writeln!(w, "{}", line.bold())?;
    } else {
        writeln!(w, "{}", line)?;
    }
    Ok(())
}

/// Print the page-number strip. Nothing is printed for a single page.
pub fn print_pagination(
    w: &mut dyn Write,
    window: &PageWindow,
    color: ColorMode,
) -> std::io::Result<()> {
    if window.total <= 1 {
        return Ok(());
    }

    let mut parts: Vec<String> = Vec::new();
    if let Some(prev) = window.prev {
        parts.push(format!("< {}", prev));
    }
    for &page in &window.pages {
        if page == window.current {
            let label = format!("[{}]", page);
            if color.enabled() {
                parts.push(label.cyan().bold().to_string());
            } else {
                parts.push(label);
            }
        } else {
            parts.push(page.to_string());
        }
    }
    if let Some(next) = window.next {
        parts.push(format!("{} >", next));
    }
    writeln!(w, "{}", parts.join("  "))?;
    Ok(())
}

/// Print every field of one paper.
pub fn print_paper_detail(
    w: &mut dyn Write,
    paper: &Paper,
    color: ColorMode,
) -> std::io::Result<()> {
    let sep = "=".repeat(60);
    writeln!(w, "{}", sep)?;
    if color.enabled() {
        writeln!(w, "{} {}", format!("#{}", paper.number).cyan(), paper.title.bold())?;
    } else {
        writeln!(w, "#{} {}", paper.number, paper.title)?;
    }
    writeln!(w, "{}", sep)?;

    print_labeled(w, "Authors", &list_or_unknown(&paper.authors, ", "), color)?;
    print_labeled(
        w,
        "Affiliations",
        &list_or_unknown(&paper.affiliations, "; "),
        color,
    )?;
    print_labeled(w, "Keywords", &list_or_unknown(&paper.keywords, ", "), color)?;
    print_labeled(w, "Pages", &paper.page_count.to_string(), color)?;
    print_labeled(w, "Figures", &paper.figures.to_string(), color)?;
    print_labeled(w, "Tables", &paper.tables.to_string(), color)?;
    print_labeled(w, "References", &paper.references.to_string(), color)?;
    let filename = if paper.filename.is_empty() {
        "unknown".to_string()
    } else {
        paper.filename.clone()
    };
    print_labeled(w, "File", &filename, color)?;
    let size = if paper.file_size_kb > 0.0 {
        format!("{:.2} KB", paper.file_size_kb)
    } else {
        "unknown".to_string()
    };
    print_labeled(w, "Size", &size, color)?;

    if !paper.abstract_text.is_empty() {
        writeln!(w)?;
        if color.enabled() {
            writeln!(w, "{}", "Abstract".bold())?;
        } else {
            writeln!(w, "Abstract")?;
        }
        writeln!(w, "  {}", paper.abstract_text)?;
    }
    writeln!(w)?;
    Ok(())
}

/// Warn that several papers share the requested number.
pub fn print_ambiguous_warning(
    w: &mut dyn Write,
    number: u64,
    count: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    let msg = format!("{} papers share number {}; showing all of them", count, number);
    if color.enabled() {
        writeln!(w, "{} {}", "WARNING:".yellow(), msg)?;
    } else {
        writeln!(w, "WARNING: {}", msg)?;
    }
    writeln!(w)?;
    Ok(())
}

pub fn print_statistics(
    w: &mut dyn Write,
    stats: &Statistics,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", "Collection statistics".bold())?;
    } else {
        writeln!(w, "Collection statistics")?;
    }
    writeln!(w, "  Papers:                {}", stats.total_papers)?;
    writeln!(w, "  Distinct authors:      {}", stats.distinct_authors)?;
    writeln!(w, "  Distinct affiliations: {}", stats.distinct_affiliations)?;
    writeln!(w, "  Distinct keywords:     {}", stats.distinct_keywords)?;
    writeln!(w, "  Total pages:           {}", stats.total_pages)?;
    writeln!(w, "  Total figures:         {}", stats.total_figures)?;
    writeln!(
        w,
        "  Avg authors per paper: {:.1}",
        stats.avg_authors_per_paper
    )?;
    Ok(())
}

pub fn print_facets(
    w: &mut dyn Write,
    options: &FilterOptions,
    color: ColorMode,
) -> std::io::Result<()> {
    print_facet_group(w, "Institutions", &options.institutions, color)?;
    writeln!(w)?;
    print_facet_group(w, "Topics", &options.topics, color)?;
    Ok(())
}

fn print_facet_group(
    w: &mut dyn Write,
    heading: &str,
    values: &[String],
    color: ColorMode,
) -> std::io::Result<()> {
    let heading = format!("{} ({})", heading, values.len());
    if color.enabled() {
        writeln!(w, "{}", heading.bold())?;
    } else {
        writeln!(w, "{}", heading)?;
    }
    for value in values {
        writeln!(w, "  {}", value)?;
    }
    Ok(())
}

fn print_labeled(
    w: &mut dyn Write,
    label: &str,
    value: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{:<13} {}", format!("{}:", label).bold(), value)?;
    } else {
        writeln!(w, "{:<13} {}", format!("{}:", label), value)?;
    }
    Ok(())
}

fn list_or_unknown(values: &[String], sep: &str) -> String {
    if values.is_empty() {
        "unknown".to_string()
    } else {
        values.join(sep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut dyn Write) -> std::io::Result<()>) -> String {
        let mut buf: Vec<u8> = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exactly", 7), "exactly");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("héllo wörld", 4), "héll...");
        assert_eq!(truncate_chars("束流动力学研究", 2), "束流...");
    }

    #[test]
    fn card_shows_first_three_keywords_and_tags() {
        let paper = Paper {
            number: 12,
            title: "Beam Loss Monitors".to_string(),
            authors: vec!["Ann Lee".to_string(), "Bo Chen".to_string()],
            affiliations: vec!["KEK".to_string(), "CERN".to_string()],
            abstract_text: "x".repeat(300),
            keywords: ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect(),
            page_count: 4,
            figures: 7,
            references: 18,
            ..Paper::default()
        };
        let out = render(|w| print_paper_card(w, &paper, 200, ColorMode(false)));
        assert!(out.starts_with("#12 Beam Loss Monitors\n"));
        assert!(out.contains("  Ann Lee, Bo Chen\n"));
        assert!(out.contains("  KEK\n"));
        assert!(!out.contains("CERN"));
        assert!(out.contains(&format!("  {}...\n", "x".repeat(200))));
        assert!(out.contains("4 pages | 7 figures | 18 references"));
        assert!(out.contains("[a] [b] [c]\n"));
        assert!(!out.contains("[d]"));
    }

    #[test]
    fn active_query_lists_only_set_filters() {
        let params = QueryParams {
            search: "beam".to_string(),
            topic: "SRF".to_string(),
            ..QueryParams::default()
        };
        let out = render(|w| print_active_query(w, &params, ColorMode(false)));
        assert!(out.starts_with("search \"beam\", topic \"SRF\", sorted by "));
        assert!(!out.contains("institution"));
    }

    #[test]
    fn pagination_marks_current_page() {
        let window = PageWindow::compute(3, 9, 5);
        let out = render(|w| print_pagination(w, &window, ColorMode(false)));
        assert_eq!(out, "< 2  1  2  [3]  4  5  4 >\n");
    }

    #[test]
    fn pagination_hidden_for_single_page() {
        let window = PageWindow::compute(1, 1, 5);
        let out = render(|w| print_pagination(w, &window, ColorMode(false)));
        assert!(out.is_empty());
    }

    #[test]
    fn match_summary_ranges() {
        let out = render(|w| print_match_summary(w, 25, 3, 3, 5, 10, ColorMode(false)));
        assert_eq!(out, "Showing 21-25 of 25 papers (page 3 of 3)\n");
        let out = render(|w| print_match_summary(w, 0, 1, 0, 0, 10, ColorMode(false)));
        assert_eq!(out, "No papers match the current filters.\n");
        let out = render(|w| print_match_summary(w, 25, 9, 3, 0, 10, ColorMode(false)));
        assert!(out.starts_with("Page 9 is past the end"));
    }
}
