//! Targeted re-extraction of problem PDFs.
//!
//! A handful of source PDFs are email forwards: the automatic extraction
//! keeps the forwarding headers and loses document structure. The `repair`
//! command re-extracts a configured set of these files, strips the email
//! wrapper, rebuilds heading/list HTML from the plain text, and patches the
//! matching records of an already-written catalog in place. Records not
//! named by a repair target are untouched, as is the catalog's timestamp.

use std::fs;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Config;
use crate::extract;
use crate::ingest::{load_catalog, write_catalog, EXCERPT_CHARS};

/// Section titles recognized as line-leading headings when rebuilding HTML
/// from plain text. Prefix match, checked in order.
const REPAIR_SECTION_HEADERS: &[&str] = &[
    "Curriculum",
    "Educational Initiatives",
    "Course Preparation",
    "Events",
    "Speaking Engagements",
    "Projects",
    "Meetings",
    "Media",
    "Articles",
    "Research",
    "Other",
    "Personnel",
    "Outreach",
    "Grants",
    "Publications",
    "Partnerships",
];

const BULLET_CHARS: &[char] = &['•', '-', '●', '○', '*'];

static FORWARD_HEADER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(From|To|Subject|Date|Sent|Cc|Attachments):.*\n?").unwrap());
static FYI_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^FYI\s*$\n?").unwrap());
static INLINE_IMAGE_ARTIFACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"image\d+\.png").unwrap());

pub fn run_repair(config: &Config) -> Result<()> {
    let mut catalog = load_catalog(&config.ingest.output_file)?;
    println!("repair {}", config.ingest.output_file.display());

    if config.repair.targets.is_empty() {
        println!("  no repair targets configured");
        println!("ok");
        return Ok(());
    }

    let mut patched = 0usize;
    for target in &config.repair.targets {
        let path = config.ingest.source_dir.join(&target.file);
        if !path.exists() {
            println!("  missing source file, skipping: {}", target.file);
            continue;
        }

        let text = match fs::read(&path)
            .map_err(|e| extract::ExtractError::Pdf(e.to_string()))
            .and_then(|bytes| extract::extract_pdf(&bytes))
        {
            Ok(text) => text,
            Err(err) => {
                eprintln!("  extraction failed for {}: {}", target.file, err);
                continue;
            }
        };

        let cleaned = strip_forward_headers(&text, &config.repair.content_markers);
        let html = text_to_html(&cleaned);

        match catalog.reports.iter_mut().find(|r| r.slug == target.slug) {
            Some(record) => {
                record.html = html;
                record.excerpt =
                    cleaned.chars().take(EXCERPT_CHARS).collect::<String>() + "...";
                println!("  patched {} from {}", target.slug, target.file);
                patched += 1;
            }
            None => {
                println!("  no record with slug {}, skipping", target.slug);
            }
        }
    }

    write_catalog(&config.ingest.output_file, &catalog)?;
    println!("  records patched: {}", patched);
    println!("ok");
    Ok(())
}

/// Drop everything before the first content marker, then remove forwarding
/// header lines and inline-image artifacts.
pub fn strip_forward_headers(text: &str, content_markers: &[String]) -> String {
    let mut body = text;
    for marker in content_markers {
        let rule = Regex::new(&format!("(?i){}", regex::escape(marker)))
            .expect("escaped marker is a valid pattern");
        if let Some(m) = rule.find(body) {
            body = &body[m.start()..];
            break;
        }
    }

    let cleaned = FORWARD_HEADER_LINE.replace_all(body, "");
    let cleaned = FYI_LINE.replace_all(&cleaned, "");
    let cleaned = INLINE_IMAGE_ARTIFACT.replace_all(&cleaned, "");
    cleaned.trim().to_string()
}

/// Rebuild basic HTML from plain text: blank lines delimit paragraphs, known
/// section titles become headings, bullet lines become list items, and
/// consecutive items are wrapped in a list.
pub fn text_to_html(text: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            flush_paragraph(&mut parts, &mut paragraph);
            continue;
        }

        if is_section_header(line) {
            flush_paragraph(&mut parts, &mut paragraph);
            parts.push(format!("<h2>{}</h2>", line));
            continue;
        }

        if line.starts_with(BULLET_CHARS) {
            flush_paragraph(&mut parts, &mut paragraph);
            let item = line.trim_start_matches(|c: char| BULLET_CHARS.contains(&c) || c == ' ');
            parts.push(format!("<li>{}</li>", item));
            continue;
        }

        paragraph.push(line);
    }
    flush_paragraph(&mut parts, &mut paragraph);

    wrap_list_items(parts)
}

fn flush_paragraph(parts: &mut Vec<String>, paragraph: &mut Vec<&str>) {
    if !paragraph.is_empty() {
        parts.push(format!("<p>{}</p>", paragraph.join(" ")));
        paragraph.clear();
    }
}

fn is_section_header(line: &str) -> bool {
    if line.len() >= 100 {
        return false;
    }
    let lower = line.to_lowercase();
    REPAIR_SECTION_HEADERS
        .iter()
        .any(|h| lower.starts_with(&h.to_lowercase()))
}

/// Wrap runs of consecutive `<li>` parts in a single `<ul>`.
fn wrap_list_items(parts: Vec<String>) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_list = false;
    for part in parts {
        if part.starts_with("<li>") {
            if !in_list {
                out.push("<ul>".to_string());
                in_list = true;
            }
            out.push(part);
        } else {
            if in_list {
                out.push("</ul>".to_string());
                in_list = false;
            }
            out.push(part);
        }
    }
    if in_list {
        out.push("</ul>".to_string());
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<String> {
        vec!["Educational Initiatives".to_string(), "Curriculum".to_string()]
    }

    #[test]
    fn forward_wrapper_is_stripped() {
        let text = "From: Someone <someone@example.edu>\n\
                    To: Someone Else\n\
                    Subject: FW: monthly update\n\
                    FYI\n\
                    Educational Initiatives\n\
                    We launched the new seminar.\n";
        let cleaned = strip_forward_headers(text, &markers());
        assert!(cleaned.starts_with("Educational Initiatives"));
        assert!(!cleaned.contains("Subject:"));
        assert!(!cleaned.contains("FYI"));
        assert!(cleaned.contains("We launched the new seminar."));
    }

    #[test]
    fn marker_order_wins_over_position() {
        // "Curriculum" appears first in the text, but "Educational
        // Initiatives" is the first configured marker that matches.
        let text = "noise Curriculum noise Educational Initiatives rest";
        let cleaned = strip_forward_headers(text, &markers());
        assert!(cleaned.starts_with("Educational Initiatives"));
    }

    #[test]
    fn no_marker_keeps_whole_text() {
        let text = "Date: Tuesday\nActual content here.";
        let cleaned = strip_forward_headers(text, &markers());
        assert_eq!(cleaned, "Actual content here.");
    }

    #[test]
    fn inline_image_artifacts_removed() {
        let cleaned = strip_forward_headers("Curriculum\nsee image001.png here", &markers());
        assert_eq!(cleaned, "Curriculum\nsee  here");
    }

    #[test]
    fn text_rebuilds_headings_paragraphs_and_lists() {
        let text = "Curriculum\n\
                    We revised the syllabus.\n\
                    It ships next term.\n\
                    \n\
                    • First item\n\
                    • Second item\n\
                    \n\
                    Closing thoughts.";
        let html = text_to_html(text);
        assert_eq!(
            html,
            "<h2>Curriculum</h2>\n\
             <p>We revised the syllabus. It ships next term.</p>\n\
             <ul>\n<li>First item</li>\n<li>Second item</li>\n</ul>\n\
             <p>Closing thoughts.</p>"
        );
    }

    #[test]
    fn long_header_like_line_stays_a_paragraph() {
        let line = format!("Meetings {}", "x".repeat(120));
        let html = text_to_html(&line);
        assert!(html.starts_with("<p>"));
    }

    #[test]
    fn dash_bullets_are_list_items() {
        let html = text_to_html("- alpha\n- beta");
        assert_eq!(html, "<ul>\n<li>alpha</li>\n<li>beta</li>\n</ul>");
    }
}
