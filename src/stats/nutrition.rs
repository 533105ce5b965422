//! Nutrition screening totals.

use crate::models::{AgeBandCounts, NutritionReport, ScreeningCounts};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::Add;

/// Male plus female screening sums and intervention totals. Raw counts, no rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub age_6_23_total_screened: u64,
    pub age_24_59_total_screened: u64,
    pub total_normal: u64,
    pub total_mam: u64,
    pub total_sam: u64,
    pub total_oedema: u64,
    pub total_albendazole: u64,
    pub total_vitamin_a: u64,
    pub total_rutf: u64,
    pub total_mnp: u64,
}

impl NutritionTotals {
    pub fn total_screened(&self) -> u64 {
        self.age_6_23_total_screened + self.age_24_59_total_screened
    }
}

impl Add for NutritionTotals {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            age_6_23_total_screened: self.age_6_23_total_screened + other.age_6_23_total_screened,
            age_24_59_total_screened: self.age_24_59_total_screened
                + other.age_24_59_total_screened,
            total_normal: self.total_normal + other.total_normal,
            total_mam: self.total_mam + other.total_mam,
            total_sam: self.total_sam + other.total_sam,
            total_oedema: self.total_oedema + other.total_oedema,
            total_albendazole: self.total_albendazole + other.total_albendazole,
            total_vitamin_a: self.total_vitamin_a + other.total_vitamin_a,
            total_rutf: self.total_rutf + other.total_rutf,
            total_mnp: self.total_mnp + other.total_mnp,
        }
    }
}

impl Sum for NutritionTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

fn band_sum(band: &AgeBandCounts, field: impl Fn(&ScreeningCounts) -> u32) -> u64 {
    u64::from(field(&band.male)) + u64::from(field(&band.female))
}

/// Sums the male and female sub-counts of one report.
pub fn compute_nutrition_totals(report: &NutritionReport) -> NutritionTotals {
    let bands = [&report.age_6_23, &report.age_24_59];
    let across = |field: fn(&ScreeningCounts) -> u32| -> u64 {
        bands.iter().map(|band| band_sum(band, field)).sum()
    };

    NutritionTotals {
        age_6_23_total_screened: band_sum(&report.age_6_23, |c| c.screened),
        age_24_59_total_screened: band_sum(&report.age_24_59, |c| c.screened),
        total_normal: across(|c| c.normal),
        total_mam: across(|c| c.mam),
        total_sam: across(|c| c.sam),
        total_oedema: across(|c| c.oedema),
        total_albendazole: u64::from(report.interventions.albendazole),
        total_vitamin_a: u64::from(report.interventions.vitamin_a),
        total_rutf: u64::from(report.interventions.rutf),
        total_mnp: u64::from(report.interventions.mnp),
    }
}

/// Totals across several monthly reports. Drafts are skipped unless `include_drafts`.
pub fn rollup_nutrition<'a, I>(reports: I, include_drafts: bool) -> NutritionTotals
where
    I: IntoIterator<Item = &'a NutritionReport>,
{
    reports
        .into_iter()
        .filter(|r| include_drafts || r.status.is_submitted())
        .map(compute_nutrition_totals)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportStatus;
    use serde_json::json;

    #[test]
    fn test_totals_sum_male_and_female() {
        let report: NutritionReport = serde_json::from_value(json!({
            "age_6_23_male_screened": 12,
            "age_6_23_female_screened": 9,
            "age_24_59_male_screened": 4,
            "age_24_59_female_screened": 5,
            "age_6_23_male_mam": 3,
            "age_6_23_female_mam": 2,
            "age_24_59_male_mam": 1,
            "age_24_59_female_mam": 0,
            "age_6_23_male_normal": 8,
            "age_24_59_female_normal": 5,
            "age_6_23_female_sam": 1,
            "age_24_59_male_oedema": 2,
        }))
        .unwrap();

        let totals = compute_nutrition_totals(&report);

        assert_eq!(totals.age_6_23_total_screened, 21);
        assert_eq!(totals.age_24_59_total_screened, 9);
        assert_eq!(totals.total_mam, 6);
        assert_eq!(totals.total_normal, 13);
        assert_eq!(totals.total_sam, 1);
        assert_eq!(totals.total_oedema, 2);
        assert_eq!(totals.total_screened(), 30);
    }

    #[test]
    fn test_interventions_roll_up() {
        let mut march = NutritionReport::default();
        march.status = ReportStatus::Submitted;
        march.interventions.albendazole = 14;
        march.interventions.vitamin_a = 20;
        march.interventions.rutf = 2;
        let mut april = march.clone();
        april.interventions.mnp = 11;

        let totals = rollup_nutrition(&[march, april], false);

        assert_eq!(totals.total_albendazole, 28);
        assert_eq!(totals.total_vitamin_a, 40);
        assert_eq!(totals.total_rutf, 4);
        assert_eq!(totals.total_mnp, 11);
    }

    #[test]
    fn test_empty_report_is_zero() {
        assert_eq!(
            compute_nutrition_totals(&NutritionReport::default()),
            NutritionTotals::default()
        );
    }

    #[test]
    fn test_rollup_skips_drafts() {
        let mut submitted = NutritionReport::default();
        submitted.status = ReportStatus::Submitted;
        submitted.age_6_23.male.sam = 2;
        let mut draft = NutritionReport::default();
        draft.age_6_23.female.sam = 5;

        let reports = [submitted, draft];

        assert_eq!(rollup_nutrition(&reports, false).total_sam, 2);
        assert_eq!(rollup_nutrition(&reports, true).total_sam, 7);
    }
}
