use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub ingest: IngestConfig,
    #[serde(default)]
    pub repair: RepairConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Directory of source documents; only `.docx` and `.pdf` are processed.
    pub source_dir: PathBuf,
    /// Catalog JSON output path.
    pub output_file: PathBuf,
    /// Substrings matched against filenames; matching files are skipped.
    /// Used to drop known non-report or known-corrupted files.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Year assumed when a filename carries a month but no year token.
    #[serde(default = "default_year")]
    pub default_year: i32,
}

fn default_year() -> i32 {
    2024
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepairConfig {
    /// Phrases that mark where real report content starts inside an email
    /// forward; everything before the first match is dropped. Checked in
    /// declaration order.
    #[serde(default = "default_content_markers")]
    pub content_markers: Vec<String>,
    /// PDFs whose automatic extraction is known-poor, re-extracted by the
    /// `repair` command into an existing catalog.
    #[serde(default)]
    pub targets: Vec<RepairTarget>,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            content_markers: default_content_markers(),
            targets: Vec::new(),
        }
    }
}

fn default_content_markers() -> Vec<String> {
    vec![
        "Educational Initiatives".to_string(),
        "Curriculum".to_string(),
        "Activities".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepairTarget {
    /// Slug of the catalog record to patch.
    pub slug: String,
    /// Filename inside `source_dir` to re-extract.
    pub file: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if !(2000..=2099).contains(&config.ingest.default_year) {
        anyhow::bail!("ingest.default_year must be a four-digit year in this century");
    }

    if config.ingest.exclude.iter().any(|e| e.is_empty()) {
        anyhow::bail!("ingest.exclude entries must be non-empty substrings");
    }

    for target in &config.repair.targets {
        if target.slug.is_empty() || target.file.is_empty() {
            anyhow::bail!("repair.targets entries require both slug and file");
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn minimal_config_loads_with_defaults() {
        let file = write_config(
            r#"
[ingest]
source_dir = "./source"
output_file = "./data/reports.json"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.ingest.default_year, 2024);
        assert!(config.ingest.exclude.is_empty());
        assert!(config.repair.targets.is_empty());
        assert!(!config.repair.content_markers.is_empty());
    }

    #[test]
    fn full_config_round_trips() {
        let file = write_config(
            r#"
[ingest]
source_dir = "./source"
output_file = "./data/reports.json"
exclude = ["DRAFT -", "Email to"]
default_year = 2023

[repair]
content_markers = ["Activities"]

[[repair.targets]]
slug = "2023-12"
file = "FW_ Report for December 2023 .pdf"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.ingest.exclude.len(), 2);
        assert_eq!(config.ingest.default_year, 2023);
        assert_eq!(config.repair.targets.len(), 1);
        assert_eq!(config.repair.targets[0].slug, "2023-12");
    }

    #[test]
    fn out_of_range_default_year_rejected() {
        let file = write_config(
            r#"
[ingest]
source_dir = "./source"
output_file = "./out.json"
default_year = 1999
"#,
        );
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn empty_exclude_entry_rejected() {
        let file = write_config(
            r#"
[ingest]
source_dir = "./source"
output_file = "./out.json"
exclude = [""]
"#,
        );
        assert!(load_config(file.path()).is_err());
    }
}
