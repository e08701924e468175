//! Word-processor HTML cleanup.
//!
//! DOCX exports of the reports carry recurring artifacts: section titles as
//! bold paragraphs instead of headings, stray `<br>` runs, empty paragraphs,
//! and section titles exported as list items that open a nested list. The
//! normalizer is an ordered sequence of string rewrites tuned to that corpus,
//! not a general HTML sanitizer: it reclassifies markup and deletes genuinely
//! empty markup, but never drops text.
//!
//! Stage order matters — each stage operates on the previous stage's output —
//! and every stage is idempotent on already-clean input.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Section titles that appear as a whole bold paragraph. Matched in order.
const SECTION_HEADERS: &[&str] = &[
    "Curriculum",
    "Events and Speaking Engagements",
    "Events",
    "Speaking Engagements",
    "Projects",
    "Meetings",
    "Media/Articles",
    "Media",
    "Articles",
    "Research",
    "Other",
    "Personnel",
    "Budget",
    "Goals",
    "Highlights",
    "Summary",
    "Overview",
];

/// Section titles that appear as a list item introducing a nested list — a
/// word-processor quirk where the heading itself was exported as a bullet.
/// Matched in order; longer variants are declared before their prefixes.
const LIST_SECTION_HEADERS: &[&str] = &[
    "Course Preparation and Planning",
    "Curriculum Development",
    "Educational Initiatives",
    "Collaborations and Partnerships",
    "Internal Collaborations",
    "External Collaborations",
    "Outreach and Events",
    "Meetings completed",
    "Meetings",
    "Media Coverage",
    "Grants and Funding",
    "Research Activities",
];

static BR_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

/// One compiled rule per known section header: the whole bold paragraph,
/// tolerating an optional trailing colon and surrounding whitespace.
static SECTION_HEADER_RULES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    SECTION_HEADERS
        .iter()
        .map(|h| {
            let pattern = format!(
                r"(?i)<p><strong>\s*{}:?\s*</strong></p>",
                regex::escape(h)
            );
            (*h, Regex::new(&pattern).unwrap())
        })
        .collect()
});

static BOLD_PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<p><strong>([^<]{1,60})</strong></p>").unwrap());

static EMPTY_PARAGRAPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<p>\s*</p>").unwrap());
static EMPTY_BOLD_PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<p><strong>\s*</strong></p>").unwrap());

static MULTI_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());
static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([.,;:!?])").unwrap());

/// Per-header rules for the list-item form: `<li>H<ul>` (heading opening a
/// sublist) and `<li>H</li>` (the single-line variant with no sublist).
static LIST_HEADER_RULES: Lazy<Vec<(&'static str, Regex, Regex)>> = Lazy::new(|| {
    LIST_SECTION_HEADERS
        .iter()
        .map(|h| {
            let escaped = regex::escape(h);
            let open = Regex::new(&format!(r"(?i)<li>{}:?<ul>", escaped)).unwrap();
            let single = Regex::new(&format!(r"(?i)<li>{}:?</li>", escaped)).unwrap();
            (*h, open, single)
        })
        .collect()
});

static EMPTY_LIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<ul>\s*</ul>").unwrap());
static LEADING_LIST_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)</ul>").unwrap());
static LIST_CLOSE_BEFORE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</ul><h2>").unwrap());
static HEADING_LIST_STRAY_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<h2>([^<]+)</h2><ul>([^<]*)</li></ul>").unwrap());
static LIST_CLOSE_AFTER_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</ul></li>").unwrap());
static DOUBLED_LIST_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</ul>\s*</ul>").unwrap());
static ORPHAN_ITEM_BEFORE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</li>(\s*)<h2>").unwrap());
static ORPHAN_ITEM_LIST_BEFORE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</li>(\s*)</ul>(\s*)<h2>").unwrap());

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// The cleanup pipeline, in application order. Each stage is a pure
/// string rewrite, testable in isolation.
const STAGES: &[fn(&str) -> String] = &[
    strip_line_breaks,
    promote_known_section_headers,
    promote_bold_paragraph_headers,
    remove_empty_paragraphs,
    tidy_whitespace,
    rewrite_list_section_headers,
    cleanup_list_artifacts,
];

/// Run the full cleanup pipeline over raw extractor HTML.
pub fn normalize_html(html: &str) -> String {
    STAGES
        .iter()
        .fold(html.to_string(), |acc, stage| stage(&acc))
}

/// Derive plain text from cleaned HTML: strip tags, collapse whitespace,
/// trim. Used for excerpts and search, never for display.
pub fn html_to_text(html: &str) -> String {
    let stripped = TAG.replace_all(html, " ");
    WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_string()
}

/// Line-break tags accumulate into meaningless breaks; flatten to a space.
fn strip_line_breaks(html: &str) -> String {
    BR_TAG.replace_all(html, " ").into_owned()
}

/// Promote bold paragraphs matching the known section-header catalog to
/// `<h2>`, dropping any trailing colon.
fn promote_known_section_headers(html: &str) -> String {
    let mut cleaned = html.to_string();
    for (header, rule) in SECTION_HEADER_RULES.iter() {
        cleaned = rule
            .replace_all(&cleaned, format!("<h2>{}</h2>", header))
            .into_owned();
    }
    cleaned
}

/// Promote any remaining bold-only paragraph that looks like a header the
/// catalog missed: short and not ending in terminal punctuation.
fn promote_bold_paragraph_headers(html: &str) -> String {
    BOLD_PARAGRAPH
        .replace_all(html, |caps: &Captures| {
            let trimmed = caps[1].trim().to_string();
            if !trimmed.ends_with('.') && !trimmed.ends_with(',') && trimmed.chars().count() < 50 {
                format!("<h2>{}</h2>", trimmed)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

fn remove_empty_paragraphs(html: &str) -> String {
    let cleaned = EMPTY_PARAGRAPH.replace_all(html, "").into_owned();
    EMPTY_BOLD_PARAGRAPH.replace_all(&cleaned, "").into_owned()
}

fn tidy_whitespace(html: &str) -> String {
    let cleaned = MULTI_WHITESPACE.replace_all(html, " ").into_owned();
    SPACE_BEFORE_PUNCT.replace_all(&cleaned, "$1").into_owned()
}

/// Rewrite section titles exported as list items: close the open list, emit
/// the heading, reopen a list for the items that follow.
fn rewrite_list_section_headers(html: &str) -> String {
    let mut cleaned = html.to_string();
    for (header, open_rule, single_rule) in LIST_HEADER_RULES.iter() {
        let replacement = format!("</ul><h2>{}</h2><ul>", header);
        cleaned = open_rule
            .replace_all(&cleaned, replacement.as_str())
            .into_owned();
        cleaned = single_rule
            .replace_all(&cleaned, replacement.as_str())
            .into_owned();
    }
    cleaned
}

/// Structural cleanup after the list-header rewrite: empty list pairs, a
/// leading close tag, stray closes around headings, orphaned item closes.
/// Rule order is part of the contract.
fn cleanup_list_artifacts(html: &str) -> String {
    let mut cleaned = EMPTY_LIST.replace_all(html, "").into_owned();
    cleaned = LEADING_LIST_CLOSE.replace(&cleaned, "$1").into_owned();
    cleaned = LIST_CLOSE_BEFORE_HEADING
        .replace_all(&cleaned, "</ul>\n<h2>")
        .into_owned();
    cleaned = HEADING_LIST_STRAY_ITEM
        .replace_all(&cleaned, "<h2>$1</h2><ul>$2</ul>")
        .into_owned();
    cleaned = LIST_CLOSE_AFTER_ITEM
        .replace_all(&cleaned, "</ul>")
        .into_owned();
    cleaned = DOUBLED_LIST_CLOSE.replace_all(&cleaned, "</ul>").into_owned();
    cleaned = ORPHAN_ITEM_BEFORE_HEADING
        .replace_all(&cleaned, "$1<h2>")
        .into_owned();
    cleaned = ORPHAN_ITEM_LIST_BEFORE_HEADING
        .replace_all(&cleaned, "</ul>$2<h2>")
        .into_owned();
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_breaks_become_spaces() {
        assert_eq!(
            strip_line_breaks("<p>one<br/>two<br />three<BR>four</p>"),
            "<p>one two three four</p>"
        );
    }

    #[test]
    fn known_header_with_colon_promoted() {
        let out = normalize_html("<p><strong>Budget:</strong></p><p>We spent $500.</p>");
        assert_eq!(out, "<h2>Budget</h2><p>We spent $500.</p>");
    }

    #[test]
    fn known_header_tolerates_whitespace_and_case() {
        let out = promote_known_section_headers("<p><strong> curriculum: </strong></p>");
        assert_eq!(out, "<h2>Curriculum</h2>");
    }

    #[test]
    fn longer_catalog_entries_win_over_prefixes() {
        // "Events and Speaking Engagements" is declared before "Events".
        let out =
            promote_known_section_headers("<p><strong>Events and Speaking Engagements</strong></p>");
        assert_eq!(out, "<h2>Events and Speaking Engagements</h2>");
    }

    #[test]
    fn short_bold_paragraph_promoted_generically() {
        let out = promote_bold_paragraph_headers("<p><strong>Looking Ahead</strong></p>");
        assert_eq!(out, "<h2>Looking Ahead</h2>");
    }

    #[test]
    fn bold_sentence_not_promoted_and_text_preserved() {
        let input = "<p><strong>We met the dean on Friday.</strong></p>";
        let out = normalize_html(input);
        assert!(out.contains("We met the dean on Friday."));
        assert!(!out.contains("<h2>"));
    }

    #[test]
    fn long_bold_paragraph_not_promoted() {
        let text = "A very long bold line of text that runs past fifty char";
        assert!(text.len() >= 50 && text.len() <= 60);
        let input = format!("<p><strong>{}</strong></p>", text);
        let out = normalize_html(&input);
        assert!(out.contains(text));
        assert!(!out.contains("<h2>"));
    }

    #[test]
    fn empty_paragraphs_removed() {
        let out = remove_empty_paragraphs("<p>kept</p><p>  </p><p><strong> </strong></p>");
        assert_eq!(out, "<p>kept</p>");
    }

    #[test]
    fn whitespace_tidied() {
        let out = tidy_whitespace("<p>spaced  out , really .</p>");
        assert_eq!(out, "<p>spaced out, really.</p>");
    }

    #[test]
    fn list_section_header_with_sublist_rewritten() {
        let input = "<ul><li>Meetings<ul><li>Met with CS faculty</li></ul></li></ul>";
        let out = normalize_html(input);
        assert_eq!(out, "<h2>Meetings</h2><ul><li>Met with CS faculty</li></ul>");
    }

    #[test]
    fn list_section_header_single_line_variant() {
        let input = "<ul><li>Media Coverage</li><li>Article in the local paper</li></ul>";
        let out = normalize_html(input);
        assert_eq!(
            out,
            "<h2>Media Coverage</h2><ul><li>Article in the local paper</li></ul>"
        );
    }

    #[test]
    fn list_header_catalog_order_prefers_longer_variant() {
        let input = "<ul><li>Meetings completed<ul><li>Kickoff</li></ul></li></ul>";
        let out = normalize_html(input);
        assert_eq!(out, "<h2>Meetings completed</h2><ul><li>Kickoff</li></ul>");
    }

    #[test]
    fn normalizer_is_idempotent_on_clean_input() {
        let input = "<p><strong>Budget:</strong></p><p>We spent $500.</p>\
                     <ul><li>Meetings<ul><li>Met with CS faculty</li></ul></li></ul>";
        let once = normalize_html(input);
        let twice = normalize_html(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn plain_text_derivation() {
        let text = html_to_text("<h2>Budget</h2><p>We spent   $500.</p>");
        assert_eq!(text, "Budget We spent $500.");
    }

    #[test]
    fn plain_text_of_empty_html_is_empty() {
        assert_eq!(html_to_text(""), "");
    }
}
