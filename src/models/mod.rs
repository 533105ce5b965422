//! Data models for facility health records.
//!
//! Records are read-only inputs to the statistics functions. Monthly
//! reports carry a [`ReportStatus`]; once submitted they are final.

pub mod facility;
pub mod nutrition;
pub mod patient;
pub mod vaccine;

pub use facility::{FacilityDirectory, Lga, Phc, Ward};
pub use nutrition::{AgeBandCounts, Interventions, NutritionReport, ScreeningCounts};
pub use patient::{
    AncService, AncVisit, Delivery, DeliveryOutcome, FpMethod, HivResult, PatientRecord, Vaccine,
    MAX_ANC_VISITS, PNC_VISITS,
};
pub use vaccine::{DiscardReasons, LedgerItemKind, StockLedgerRow, VaccineAccountabilityReport};

use crate::rows::RowReader;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a monthly report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// Still being filled in.
    #[default]
    Draft,
    /// Final; must not be changed.
    Submitted,
}

impl ReportStatus {
    pub fn is_submitted(&self) -> bool {
        matches!(self, ReportStatus::Submitted)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::Draft => write!(f, "Draft"),
            ReportStatus::Submitted => write!(f, "Submitted"),
        }
    }
}

impl ReportStatus {
    /// Reads `is_submitted` (flag) or `status` (text) from an export row.
    pub(crate) fn from_row(reader: &RowReader<'_>) -> Self {
        if reader.flag("is_submitted") {
            return ReportStatus::Submitted;
        }
        reader
            .text("status")
            .map(|s| ReportStatus::from(s.as_str()))
            .unwrap_or_default()
    }
}

impl From<&str> for ReportStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "submitted" | "final" | "complete" | "completed" => ReportStatus::Submitted,
            _ => ReportStatus::Draft,
        }
    }
}

/// Formats a reporting period as `YYYY-MM`, or "unknown period".
pub(crate) fn period_label(year: Option<i32>, month: Option<u32>) -> String {
    match (year, month) {
        (Some(y), Some(m)) => format!("{:04}-{:02}", y, m),
        (Some(y), None) => y.to_string(),
        _ => "unknown period".to_string(),
    }
}
