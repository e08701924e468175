//! Core data models used throughout Report Archive.
//!
//! These types represent the date classifications, report records, and the
//! final catalog that flow through the ingestion pipeline. The serialized
//! shape of [`ReportRecord`] and [`ReportCatalog`] is the contract with the
//! site that renders the catalog, so field names are camelCase and the
//! cadence is serialized as a lowercase `type` string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Report cadence. Quarterly reports sort by the first month of their quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Monthly,
    Quarterly,
}

/// Date classification extracted from a filename, before any content is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportDateInfo {
    pub kind: ReportKind,
    pub year: i32,
    /// 1-12; for quarterly reports, the first month of the quarter.
    pub month: u32,
    /// 1-4, only for quarterly reports.
    pub quarter: Option<u32>,
    /// `year * 100 + month` — totally orders monthly and quarterly records.
    pub sort_key: i32,
}

/// How a record's body content was obtained.
///
/// Not serialized: the catalog consumer only sees the body itself, but the
/// pipeline and its tests need to tell a genuinely empty document from a
/// failed extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionStatus {
    /// Content extracted normally.
    #[default]
    Ok,
    /// DOCX extraction failed; the record carries an empty body.
    Empty,
    /// PDF extraction failed; the record carries the placeholder body.
    Placeholder,
}

/// One catalog entry. `slug` is the primary key and URL identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub slug: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ReportKind,
    pub year: i32,
    pub month: u32,
    pub quarter: Option<u32>,
    pub sort_key: i32,
    pub source_file: String,
    pub html: String,
    pub excerpt: String,
    #[serde(skip)]
    pub extraction: ExtractionStatus,
}

/// The pipeline's sole output artifact: all records, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCatalog {
    pub generated_at: DateTime<Utc>,
    pub total_reports: usize,
    pub reports: Vec<ReportRecord>,
}
