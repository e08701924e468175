//! Catalog statistics and health overview.
//!
//! Provides a quick summary of what the last ingest produced: total count,
//! cadence and per-year breakdowns, and the newest period. Used by
//! `reparc stats` to give confidence that a run did what was expected
//! without opening the JSON.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::config::Config;
use crate::ingest::load_catalog;
use crate::models::ReportKind;

pub fn run_stats(config: &Config) -> Result<()> {
    let catalog = load_catalog(&config.ingest.output_file)?;

    let monthly = catalog
        .reports
        .iter()
        .filter(|r| r.kind == ReportKind::Monthly)
        .count();
    let quarterly = catalog.reports.len() - monthly;

    println!("Report Archive — Catalog Stats");
    println!("==============================");
    println!();
    println!("  Catalog:    {}", config.ingest.output_file.display());
    println!(
        "  Generated:  {}",
        catalog.generated_at.format("%Y-%m-%d %H:%M")
    );
    println!();
    println!("  Reports:    {}", catalog.total_reports);
    println!("  Monthly:    {}", monthly);
    println!("  Quarterly:  {}", quarterly);

    if let Some(newest) = catalog.reports.first() {
        println!("  Newest:     {} ({})", newest.title, newest.slug);
    }

    // Per-year breakdown. Records are newest-first; the map re-sorts by year.
    let mut by_year: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
    for report in &catalog.reports {
        let entry = by_year.entry(report.year).or_insert((0, 0));
        match report.kind {
            ReportKind::Monthly => entry.0 += 1,
            ReportKind::Quarterly => entry.1 += 1,
        }
    }

    if !by_year.is_empty() {
        println!();
        println!("  {:<6} {:>8} {:>10}", "YEAR", "MONTHLY", "QUARTERLY");
        println!("  {}", "-".repeat(26));
        for (year, (m, q)) in by_year {
            println!("  {:<6} {:>8} {:>10}", year, m, q);
        }
    }

    println!();
    Ok(())
}
