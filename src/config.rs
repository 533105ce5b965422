//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.mchstats.toml` files.

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use mch_stats::report::ReportFormat;
use mch_stats::stats::{default_facility_places, StatsOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working and input directories.
pub const CONFIG_FILE: &str = ".mchstats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Statistics settings.
    #[serde(default)]
    pub stats: StatsConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Default output format.
    #[serde(default)]
    pub format: ReportFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: ReportFormat::default(),
            verbose: false,
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("mch_stats_report.md")
}

/// Statistics settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Year for monthly registrations; the current year when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    /// Place-of-delivery values counted as a registered facility.
    #[serde(default = "default_facility_places")]
    pub facility_places: Vec<String>,

    /// Include draft monthly reports in nutrition and vaccine rollups.
    #[serde(default)]
    pub include_drafts: bool,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            year: None,
            facility_places: default_facility_places(),
            include_drafts: false,
        }
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Render grouping tables even when nothing was recorded.
    #[serde(default)]
    pub include_empty_sections: bool,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from an input directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.clone();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(year) = args.year {
            self.stats.year = Some(year);
        }
        if let Some(ref places) = args.facility_places {
            self.stats.facility_places = places.clone();
        }
        if args.include_drafts {
            self.stats.include_drafts = true;
        }
    }

    /// Options for the patient statistics.
    pub fn stats_options(&self) -> StatsOptions {
        StatsOptions {
            year: self.stats.year.unwrap_or_else(|| Utc::now().year()),
            facility_places: self.stats.facility_places.clone(),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
