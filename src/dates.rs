//! Filename date classification.
//!
//! Source files are named by hand ("VAILL April update.docx",
//! "Q2 2024 Quarterly Report.pdf", "FW_ Report for December 2023 .pdf"), so
//! classification is a priority-ordered set of regex rules rather than a date
//! parser. Quarterly detection always runs first; a filename matching both a
//! quarter token and a month name is quarterly.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{ReportDateInfo, ReportKind};

/// Month-name table in match-priority order. First substring hit wins, so a
/// filename containing two month tokens resolves to the earlier entry —
/// declaration order is the tie-break, not an accident.
const MONTHS: &[(&str, u32)] = &[
    ("january", 1),
    ("jan", 1),
    ("february", 2),
    ("feb", 2),
    ("march", 3),
    ("mar", 3),
    ("april", 4),
    ("apr", 4),
    ("may", 5),
    ("june", 6),
    ("jun", 6),
    ("july", 7),
    ("jul", 7),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sept", 9),
    ("sep", 9),
    ("october", 10),
    ("oct", 10),
    ("november", 11),
    ("nov", 11),
    ("december", 12),
    ("dec", 12),
];

const MONTH_NAMES: [&str; 13] = [
    "",
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Compact quarter + year: "q2 24", "q2 2024", "q324".
static QUARTER_COMPACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"q([1-4])\s*(?:20)?(\d{2})").unwrap());

/// "quarterly ... q2 ... 2024" with intervening text.
static QUARTER_VERBOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"quarterly.*?q([1-4]).*?(\d{4})").unwrap());

/// Lone quarter token, for the secondary search.
static QUARTER_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"q([1-4])").unwrap());

/// Explicit four-digit year in this century.
static YEAR_FULL: Lazy<Regex> = Lazy::new(|| Regex::new(r"20(\d{2})").unwrap());

/// Bare two-digit year, only when delimited by `.`, `-`, `_`, or end of
/// string — unrelated digit runs must not read as years.
static YEAR_SHORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{2})(?:[.\-_]|$)").unwrap());

/// Classify a filename into a [`ReportDateInfo`].
///
/// `fallback_year` is assumed when a month is found without any year token
/// (the archive has a run of files named only "May Update" and the like).
/// Returns `None` when no confident classification exists; the caller decides
/// how to report the skip.
pub fn parse_filename(filename: &str, fallback_year: i32) -> Option<ReportDateInfo> {
    let lower = filename.to_lowercase();

    let compact = QUARTER_COMPACT
        .captures(&lower)
        .or_else(|| QUARTER_VERBOSE.captures(&lower));

    if compact.is_some() || lower.contains("quarterly") {
        let (quarter, year) = match &compact {
            Some(caps) => {
                let quarter: u32 = caps[1].parse().unwrap();
                let mut year: i32 = caps[2].parse().unwrap();
                if year < 100 {
                    year += 2000;
                }
                (Some(quarter), Some(year))
            }
            // "quarterly" appeared but neither full pattern matched; scan for
            // a lone qN token and a 20YY token anywhere in the name.
            None => {
                let quarter = QUARTER_TOKEN
                    .captures(&lower)
                    .map(|c| c[1].parse::<u32>().unwrap());
                let year = YEAR_FULL
                    .captures(&lower)
                    .map(|c| 2000 + c[1].parse::<i32>().unwrap());
                (quarter, year)
            }
        };

        if let (Some(quarter), Some(year)) = (quarter, year) {
            let month = quarter_first_month(quarter);
            return Some(ReportDateInfo {
                kind: ReportKind::Quarterly,
                year,
                month,
                quarter: Some(quarter),
                sort_key: year * 100 + month as i32,
            });
        }
        // Quarterly hinted but unresolved; fall through to monthly detection.
    }

    let month = MONTHS
        .iter()
        .find(|(name, _)| lower.contains(name))
        .map(|&(_, num)| num)?;

    let year = YEAR_FULL
        .captures(&lower)
        .map(|c| 2000 + c[1].parse::<i32>().unwrap())
        .or_else(|| {
            YEAR_SHORT.captures(&lower).map(|c| {
                let y: i32 = c[1].parse().unwrap();
                if y < 100 {
                    y + 2000
                } else {
                    y
                }
            })
        })
        .unwrap_or(fallback_year);

    Some(ReportDateInfo {
        kind: ReportKind::Monthly,
        year,
        month,
        quarter: None,
        sort_key: year * 100 + month as i32,
    })
}

/// Whether the filename carries any recognizable year token. When it does
/// not, a monthly classification got its year from the fallback — callers
/// use this to flag the inference for operator review.
pub fn has_year_token(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    YEAR_FULL.is_match(&lower) || YEAR_SHORT.is_match(&lower)
}

/// First calendar month of a quarter: 1→1, 2→4, 3→7, 4→10.
fn quarter_first_month(quarter: u32) -> u32 {
    (quarter - 1) * 3 + 1
}

/// URL-safe unique identifier: `"2024-q2"` for quarterly, `"2024-04"` for
/// monthly. Pure function of the date info.
pub fn generate_slug(info: &ReportDateInfo) -> String {
    match info.quarter {
        Some(q) => format!("{}-q{}", info.year, q),
        None => format!("{}-{:02}", info.year, info.month),
    }
}

/// Human-readable title: `"Q2 2024 Quarterly Report"` / `"April 2024 Update"`.
pub fn generate_title(info: &ReportDateInfo) -> String {
    match info.quarter {
        Some(q) => format!("Q{} {} Quarterly Report", q, info.year),
        None => format!("{} {} Update", MONTH_NAMES[info.month as usize], info.year),
    }
}
