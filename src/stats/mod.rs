//! Dashboard and report statistics.
//!
//! All functions here are pure: they read already-loaded records and return
//! freshly built summaries.

pub mod nutrition;
pub mod patient;
pub mod vaccine;

pub use nutrition::{compute_nutrition_totals, rollup_nutrition, NutritionTotals};
pub use patient::{
    age_band, compute_patient_stats, compute_patient_stats_with, default_facility_places,
    AncServiceCounts, AncVisitsBreakdown, Coverage, HivOutcomes, StatsOptions, StatsSummary,
    AGE_BANDS,
};
pub use vaccine::{compute_vaccine_wastage, rollup_vaccine_wastage, VaccineWastage};

/// Whole percentage of `count` over `denominator`, rounded half up.
///
/// Returns 0 for a zero denominator and never exceeds 100.
pub fn percentage(count: u64, denominator: u64) -> u32 {
    if denominator == 0 {
        return 0;
    }
    let count = count.min(denominator);
    ((count * 200 + denominator) / (denominator * 2)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(percentage(1, 8), 13); // 12.5
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(15, 150), 10);
    }

    #[test]
    fn test_percentage_edges() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(5, 0), 0);
        assert_eq!(percentage(7, 7), 100);
        assert_eq!(percentage(9, 7), 100);
    }
}
