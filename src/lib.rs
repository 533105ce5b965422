//! mch-stats - dashboard statistics for maternal and child health records.
//!
//! The [`stats`] module holds the aggregation functions: pure tallies over
//! patient records and monthly nutrition and vaccine reports. The remaining
//! modules load exports from disk, scope them to a facility, and render the
//! results.

pub mod error;
pub mod models;
pub mod report;
pub mod rows;
pub mod scope;
pub mod source;
pub mod stats;

pub use error::{RenderError, ReportError, SourceError};
pub use scope::Scope;
pub use stats::{
    compute_nutrition_totals, compute_patient_stats, compute_patient_stats_with,
    compute_vaccine_wastage, NutritionTotals, StatsOptions, StatsSummary, VaccineWastage,
};
