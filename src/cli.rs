//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use mch_stats::report::ReportFormat;
use mch_stats::Scope;
use std::path::PathBuf;

/// mchstats - maternal & child health dashboard statistics
///
/// Computes antenatal, delivery, postnatal, family planning, immunization,
/// nutrition and vaccine stock statistics from exported facility records.
///
/// Examples:
///   mchstats --input-dir ./exports
///   mchstats --patients patients.json --format json --output stats.json
///   mchstats --input-dir ./exports --lga lga-04 --year 2024
///   mchstats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory to search for export files
    ///
    /// Picks up patients*.json, nutrition*.json, vaccine*.json and
    /// facilities.json anywhere below the directory.
    #[arg(short, long, value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Patient export files (comma-separated)
    #[arg(long, value_name = "FILES", value_delimiter = ',')]
    pub patients: Vec<PathBuf>,

    /// Nutrition report files (comma-separated)
    #[arg(long, value_name = "FILES", value_delimiter = ',')]
    pub nutrition: Vec<PathBuf>,

    /// Vaccine accountability report files (comma-separated)
    #[arg(long, value_name = "FILES", value_delimiter = ',')]
    pub vaccine: Vec<PathBuf>,

    /// Facility listing (LGAs, wards, PHCs)
    #[arg(long, value_name = "FILE")]
    pub facilities: Option<PathBuf>,

    /// Restrict to one Local Government Area
    #[arg(long, value_name = "ID", conflicts_with_all = ["ward", "phc"])]
    pub lga: Option<String>,

    /// Restrict to one ward
    #[arg(long, value_name = "ID", conflicts_with = "phc")]
    pub ward: Option<String>,

    /// Restrict to one primary health centre
    #[arg(long, value_name = "ID")]
    pub phc: Option<String>,

    /// Year for monthly registrations (defaults to the current year)
    #[arg(short, long, value_name = "YEAR")]
    pub year: Option<i32>,

    /// Include draft nutrition and vaccine reports in the rollups
    #[arg(long)]
    pub include_drafts: bool,

    /// Place-of-delivery values counted as a facility (comma-separated)
    ///
    /// Example: --facility-places "Health Facility,PHC,General Hospital"
    #[arg(long, value_name = "PLACES", value_delimiter = ',')]
    pub facility_places: Option<Vec<String>>,

    /// Output file path for the report ("-" for stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .mchstats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .mchstats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether any input was named on the command line.
    pub fn has_inputs(&self) -> bool {
        self.input_dir.is_some()
            || !self.patients.is_empty()
            || !self.nutrition.is_empty()
            || !self.vaccine.is_empty()
    }

    /// The facility scope requested on the command line.
    pub fn scope(&self) -> Scope {
        if let Some(ref id) = self.phc {
            Scope::Phc(id.clone())
        } else if let Some(ref id) = self.ward {
            Scope::Ward(id.clone())
        } else if let Some(ref id) = self.lga {
            Scope::Lga(id.clone())
        } else {
            Scope::All
        }
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if !self.has_inputs() {
            return Err(
                "No input given: use --input-dir or --patients/--nutrition/--vaccine".to_string(),
            );
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(year) = self.year {
            if !(1900..=2100).contains(&year) {
                return Err(format!("Year out of range: {}", year));
            }
        }

        if let Some(ref dir) = self.input_dir {
            if !dir.exists() {
                return Err(format!("Input directory does not exist: {}", dir.display()));
            }
            if !dir.is_dir() {
                return Err(format!("Input path is not a directory: {}", dir.display()));
            }
        }

        for path in self
            .patients
            .iter()
            .chain(&self.nutrition)
            .chain(&self.vaccine)
            .chain(&self.facilities)
        {
            if !path.is_file() {
                return Err(format!("Input file does not exist: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting; `--quiet` wins over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input_dir: None,
            patients: vec![PathBuf::from("Cargo.toml")],
            nutrition: vec![],
            vaccine: vec![],
            facilities: None,
            lga: None,
            ward: None,
            phc: None,
            year: None,
            include_drafts: false,
            facility_places: None,
            output: None,
            format: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "mchstats",
            "--patients",
            "a.json,b.json",
            "--ward",
            "w-3",
            "--format",
            "json",
            "--year",
            "2023",
        ])
        .unwrap();

        assert_eq!(args.patients.len(), 2);
        assert_eq!(args.scope(), Scope::Ward("w-3".to_string()));
        assert_eq!(args.format, Some(ReportFormat::Json));
        assert_eq!(args.year, Some(2023));
    }

    #[test]
    fn test_scope_flags_conflict() {
        let result = Args::try_parse_from(["mchstats", "-i", ".", "--lga", "a", "--phc", "b"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_requires_input() {
        let mut args = make_args();
        args.patients.clear();
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_file() {
        let mut args = make_args();
        args.vaccine = vec![PathBuf::from("no/such/vaccine.json")];
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_year_range() {
        let mut args = make_args();
        args.year = Some(24);
        assert!(args.validate().is_err());
        args.year = Some(2024);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
