//! Monthly nutrition screening reports.

use super::{period_label, ReportStatus};
use crate::error::ReportError;
use crate::rows::{Row, RowReader};
use serde::{Deserialize, Serialize};

/// Screening outcomes for one age band and gender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningCounts {
    pub screened: u32,
    pub normal: u32,
    /// Moderate acute malnutrition.
    pub mam: u32,
    /// Severe acute malnutrition.
    pub sam: u32,
    pub oedema: u32,
}

impl ScreeningCounts {
    fn from_row(reader: &RowReader<'_>, prefix: &str) -> Self {
        let field = |name: &str| reader.count(&format!("{}_{}", prefix, name));
        Self {
            screened: field("screened"),
            normal: field("normal"),
            mam: field("mam"),
            sam: field("sam"),
            oedema: field("oedema"),
        }
    }
}

/// Male and female counts for one age band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBandCounts {
    pub male: ScreeningCounts,
    pub female: ScreeningCounts,
}

impl AgeBandCounts {
    fn from_row(reader: &RowReader<'_>, band: &str) -> Self {
        Self {
            male: ScreeningCounts::from_row(reader, &format!("{}_male", band)),
            female: ScreeningCounts::from_row(reader, &format!("{}_female", band)),
        }
    }
}

/// Interventions given during the month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interventions {
    pub albendazole: u32,
    pub vitamin_a: u32,
    /// Ready-to-use therapeutic food.
    pub rutf: u32,
    /// Multiple micronutrient powder.
    pub mnp: u32,
}

/// One facility's nutrition screening report for one month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Row")]
pub struct NutritionReport {
    pub phc_id: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub status: ReportStatus,
    /// Children aged 6 to 23 months.
    pub age_6_23: AgeBandCounts,
    /// Children aged 24 to 59 months.
    pub age_24_59: AgeBandCounts,
    pub interventions: Interventions,
}

impl NutritionReport {
    pub fn period(&self) -> String {
        period_label(self.year, self.month)
    }

    /// Marks the report final. Submitted reports cannot be submitted again.
    pub fn submit(mut self) -> Result<Self, ReportError> {
        if self.status.is_submitted() {
            return Err(ReportError::AlreadySubmitted {
                kind: "Nutrition",
                period: self.period(),
            });
        }
        self.status = ReportStatus::Submitted;
        Ok(self)
    }
}

impl From<Row> for NutritionReport {
    fn from(row: Row) -> Self {
        let reader = RowReader::new(&row);

        Self {
            phc_id: reader.text("phc_id"),
            year: reader.number("year").and_then(|y| i32::try_from(y).ok()),
            month: reader.number("month").filter(|m| (1..=12).contains(m)),
            status: ReportStatus::from_row(&reader),
            age_6_23: AgeBandCounts::from_row(&reader, "age_6_23"),
            age_24_59: AgeBandCounts::from_row(&reader, "age_24_59"),
            interventions: Interventions {
                albendazole: reader.count("albendazole"),
                vitamin_a: reader.count("vitamin_a"),
                rutf: reader.count("rutf"),
                mnp: reader.count("mnp"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_flat_report() {
        let report: NutritionReport = serde_json::from_value(json!({
            "phc_id": "phc-2",
            "year": 2024,
            "month": "5",
            "status": "submitted",
            "age_6_23_male_screened": 10,
            "age_6_23_female_mam": "2",
            "age_24_59_female_oedema": 1,
            "vitamin_a": 30,
        }))
        .unwrap();

        assert_eq!(report.phc_id.as_deref(), Some("phc-2"));
        assert_eq!(report.period(), "2024-05");
        assert!(report.status.is_submitted());
        assert_eq!(report.age_6_23.male.screened, 10);
        assert_eq!(report.age_6_23.female.mam, 2);
        assert_eq!(report.age_24_59.female.oedema, 1);
        assert_eq!(report.interventions.vitamin_a, 30);
    }

    #[test]
    fn test_invalid_month_is_dropped() {
        let report: NutritionReport =
            serde_json::from_value(json!({"year": 2024, "month": 13})).unwrap();
        assert_eq!(report.month, None);
        assert_eq!(report.status, ReportStatus::Draft);
    }

    #[test]
    fn test_submit_is_terminal() {
        let report = NutritionReport {
            year: Some(2024),
            month: Some(1),
            ..NutritionReport::default()
        };

        let submitted = report.submit().unwrap();
        assert!(submitted.status.is_submitted());

        let err = submitted.submit().unwrap_err();
        assert_eq!(
            err,
            ReportError::AlreadySubmitted {
                kind: "Nutrition",
                period: "2024-01".to_string(),
            }
        );
    }
}
