//! Report assembly and rendering.

pub mod generator;

pub use generator::{generate_json_report, generate_markdown_report, write_report};

use crate::source::RecordBundle;
use crate::stats::{
    compute_patient_stats_with, rollup_nutrition, rollup_vaccine_wastage, NutritionTotals,
    StatsOptions, StatsSummary, VaccineWastage,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output format for a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown tables (default)
    #[default]
    Markdown,
    /// Pretty-printed JSON with the dashboard key names
    Json,
}

/// Metadata about a statistics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Facility scope the records were filtered to.
    pub scope: String,
    /// Year used for monthly registrations.
    pub reporting_year: i32,
    /// Number of patient records aggregated.
    pub patient_records: usize,
    /// Number of nutrition reports in the rollup.
    pub nutrition_reports: usize,
    /// Number of vaccine accountability reports in the rollup.
    pub vaccine_reports: usize,
    /// Whether draft monthly reports were included.
    pub include_drafts: bool,
}

/// A complete statistics report for one scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsReport {
    pub metadata: ReportMetadata,
    /// Patient dashboard metrics.
    pub patients: StatsSummary,
    /// Nutrition totals, absent when no nutrition reports were loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionTotals>,
    /// Vaccine wastage, absent when no vaccine reports were loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vaccine: Option<VaccineWastage>,
}

impl StatsReport {
    /// Computes every statistic over an already-scoped bundle.
    pub fn build(
        bundle: &RecordBundle,
        scope: impl Into<String>,
        options: &StatsOptions,
        include_drafts: bool,
    ) -> Self {
        let counted = |submitted: bool| include_drafts || submitted;
        let nutrition_reports = bundle
            .nutrition
            .iter()
            .filter(|r| counted(r.status.is_submitted()))
            .count();
        let vaccine_reports = bundle
            .vaccine
            .iter()
            .filter(|r| counted(r.status.is_submitted()))
            .count();

        let metadata = ReportMetadata {
            generated_at: Utc::now(),
            scope: scope.into(),
            reporting_year: options.year,
            patient_records: bundle.patients.len(),
            nutrition_reports,
            vaccine_reports,
            include_drafts,
        };

        Self {
            metadata,
            patients: compute_patient_stats_with(&bundle.patients, options),
            nutrition: (nutrition_reports > 0)
                .then(|| rollup_nutrition(&bundle.nutrition, include_drafts)),
            vaccine: (vaccine_reports > 0)
                .then(|| rollup_vaccine_wastage(&bundle.vaccine, include_drafts)),
        }
    }
}
