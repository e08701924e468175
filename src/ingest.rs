//! Ingestion pipeline orchestration.
//!
//! Coordinates the full run: scan the source directory, classify each
//! filename, extract and clean content, deduplicate by slug, sort by
//! recency, and write the catalog. Per-file problems are logged and
//! recovered; only an unreadable source directory or an unwritable output
//! path aborts the run.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use walkdir::WalkDir;

use crate::config::Config;
use crate::dates::{generate_slug, generate_title, has_year_token, parse_filename};
use crate::extract::{self, ExtractError, PDF_PLACEHOLDER_HTML, PDF_PLACEHOLDER_TEXT};
use crate::models::{ExtractionStatus, ReportCatalog, ReportDateInfo, ReportKind, ReportRecord};
use crate::normalize;

/// Excerpt length in characters; the ellipsis is appended unconditionally.
pub(crate) const EXCERPT_CHARS: usize = 300;

pub fn run_ingest(config: &Config, dry_run: bool, limit: Option<usize>) -> Result<()> {
    let source_dir = &config.ingest.source_dir;
    let files = scan_source_dir(source_dir)?;
    println!("ingest {}", source_dir.display());
    println!("  files found: {}", files.len());

    let mut records: Vec<ReportRecord> = Vec::new();
    let mut accepted = 0usize;

    for (filename, path) in &files {
        if filename.starts_with('.') {
            continue;
        }
        if let Some(hit) = config
            .ingest
            .exclude
            .iter()
            .find(|e| filename.contains(e.as_str()))
        {
            println!("  skipping excluded file ({}): {}", hit, filename);
            continue;
        }

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if ext != "docx" && ext != "pdf" {
            println!("  skipping non-document file: {}", filename);
            continue;
        }

        let Some(info) = parse_filename(filename, config.ingest.default_year) else {
            println!("  could not parse date from: {}", filename);
            continue;
        };
        if info.kind == ReportKind::Monthly && !has_year_token(filename) {
            println!("  inferred year {} for: {}", info.year, filename);
        }

        if let Some(lim) = limit {
            if accepted >= lim {
                println!("  limit reached ({}), stopping scan", lim);
                break;
            }
        }
        accepted += 1;

        if dry_run {
            println!("  would ingest {} -> {}", filename, generate_slug(&info));
            continue;
        }

        println!("  processing: {}", filename);
        let (html, text, status) = extract_content(path, filename, &ext);
        let record = build_record(&info, filename, html, &text, status);
        println!("    {} ({})", record.title, record.slug);
        records.push(record);
    }

    if dry_run {
        println!("  would accept: {} files (dry-run, nothing written)", accepted);
        println!("ok");
        return Ok(());
    }

    let before = records.len();
    let mut unique = dedup_by_slug(records);
    unique.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));

    let catalog = ReportCatalog {
        generated_at: Utc::now(),
        total_reports: unique.len(),
        reports: unique,
    };
    write_catalog(&config.ingest.output_file, &catalog)?;

    println!(
        "  reports written: {} (from {} accepted files)",
        catalog.total_reports, before
    );
    println!("  output: {}", config.ingest.output_file.display());
    print_year_summary(&catalog);
    println!("ok");
    Ok(())
}

/// Enumerate the source directory (flat), sorted by filename so runs are
/// deterministic and the dedup tie-break is stable.
fn scan_source_dir(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry =
            entry.with_context(|| format!("Failed to read source directory: {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let filename = entry.file_name().to_string_lossy().to_string();
        files.push((filename, entry.path().to_path_buf()));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Extract and clean one file's content, recovering extraction failures into
/// the degraded bodies the catalog documents: empty for DOCX, an explicit
/// placeholder for PDF.
fn extract_content(path: &Path, filename: &str, ext: &str) -> (String, String, ExtractionStatus) {
    if ext == "docx" {
        let result = fs::read(path)
            .map_err(|e| ExtractError::Ooxml(e.to_string()))
            .and_then(|bytes| extract::extract_docx(&bytes));
        match result {
            Ok(raw) => {
                let html = normalize::normalize_html(&raw);
                let text = normalize::html_to_text(&html);
                (html, text, ExtractionStatus::Ok)
            }
            Err(err) => {
                eprintln!("    docx extraction failed for {}: {}", filename, err);
                (String::new(), String::new(), ExtractionStatus::Empty)
            }
        }
    } else {
        let result = fs::read(path)
            .map_err(|e| ExtractError::Pdf(e.to_string()))
            .and_then(|bytes| extract::extract_pdf(&bytes));
        match result {
            Ok(text) => {
                let html = extract::paragraphs_to_html(&text);
                (html, text, ExtractionStatus::Ok)
            }
            Err(err) => {
                eprintln!("    pdf extraction failed for {}: {}", filename, err);
                (
                    PDF_PLACEHOLDER_HTML.to_string(),
                    PDF_PLACEHOLDER_TEXT.to_string(),
                    ExtractionStatus::Placeholder,
                )
            }
        }
    }
}

/// Assemble a record; slug, title, and excerpt are all deterministic.
pub fn build_record(
    info: &ReportDateInfo,
    source_file: &str,
    html: String,
    text: &str,
    extraction: ExtractionStatus,
) -> ReportRecord {
    let excerpt: String = text.chars().take(EXCERPT_CHARS).collect::<String>() + "...";
    ReportRecord {
        slug: generate_slug(info),
        title: generate_title(info),
        kind: info.kind,
        year: info.year,
        month: info.month,
        quarter: info.quarter,
        sort_key: info.sort_key,
        source_file: source_file.to_string(),
        html,
        excerpt,
        extraction,
    }
}

/// Resolve slug collisions: the first record for a slug wins, unless a later
/// DOCX-sourced record displaces an earlier PDF-sourced one (DOCX formatting
/// is higher fidelity). A later PDF never displaces anything. First-seen
/// order of slugs is preserved.
pub fn dedup_by_slug(records: Vec<ReportRecord>) -> Vec<ReportRecord> {
    let mut order: Vec<String> = Vec::new();
    let mut by_slug: HashMap<String, ReportRecord> = HashMap::new();

    for record in records {
        match by_slug.get(&record.slug) {
            None => {
                order.push(record.slug.clone());
                by_slug.insert(record.slug.clone(), record);
            }
            Some(existing) => {
                let new_is_docx = is_docx(&record.source_file);
                let existing_is_docx = is_docx(&existing.source_file);
                if new_is_docx && !existing_is_docx {
                    println!("    replacing PDF with DOCX for {}", record.slug);
                    by_slug.insert(record.slug.clone(), record);
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|slug| by_slug.remove(&slug))
        .collect()
}

fn is_docx(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".docx")
}

/// Serialize and write the catalog in one step, creating the parent
/// directory if needed.
pub fn write_catalog(path: &Path, catalog: &ReportCatalog) -> Result<()> {
    let json = serde_json::to_string_pretty(catalog)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
        }
    }
    fs::write(path, json)
        .with_context(|| format!("Failed to write catalog: {}", path.display()))?;
    Ok(())
}

/// Load a previously written catalog.
pub fn load_catalog(path: &Path) -> Result<ReportCatalog> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
    let catalog: ReportCatalog = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse catalog: {}", path.display()))?;
    Ok(catalog)
}

fn print_year_summary(catalog: &ReportCatalog) {
    let mut by_year: BTreeMap<i32, usize> = BTreeMap::new();
    for report in &catalog.reports {
        *by_year.entry(report.year).or_insert(0) += 1;
    }
    println!("  by year:");
    for (year, count) in by_year {
        println!("    {}: {} reports", year, count);
    }
}
