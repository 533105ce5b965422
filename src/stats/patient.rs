//! Patient-level dashboard statistics.
//!
//! Everything here is a linear tally over an already-scoped slice of
//! records. Rates are whole percentages; a zero denominator gives 0.

use super::percentage;
use crate::models::{
    AncService, AncVisit, DeliveryOutcome, FpMethod, HivResult, PatientRecord, Vaccine,
    MAX_ANC_VISITS, PNC_VISITS,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Maternal age bands, youngest first.
pub const AGE_BANDS: [&str; 4] = ["<20", "20-29", "30-39", "40+"];

/// Attended antenatal contacts at or above which a patient counts toward `anc5plus`.
pub const ANC_CONTACT_TARGET: u32 = 5;

/// Band label for a maternal age in years.
pub fn age_band(age: u32) -> &'static str {
    match age {
        0..=19 => AGE_BANDS[0],
        20..=29 => AGE_BANDS[1],
        30..=39 => AGE_BANDS[2],
        _ => AGE_BANDS[3],
    }
}

/// Place-of-delivery values that count as a registered facility.
pub fn default_facility_places() -> Vec<String> {
    vec![
        "health facility",
        "facility",
        "phc",
        "primary health centre",
        "hospital",
        "clinic",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Knobs for [`compute_patient_stats_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsOptions {
    /// Calendar year whose registrations fill `monthlyRegistrations`.
    pub year: i32,
    /// Place-of-delivery values treated as a facility, compared case-insensitively.
    pub facility_places: Vec<String>,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self::for_year(Utc::now().year())
    }
}

impl StatsOptions {
    pub fn for_year(year: i32) -> Self {
        Self {
            year,
            facility_places: default_facility_places(),
        }
    }

    pub fn is_facility_place(&self, place: &str) -> bool {
        let place = place.trim();
        self.facility_places
            .iter()
            .any(|p| p.trim().eq_ignore_ascii_case(place))
    }
}

/// Patients with a date recorded in each antenatal slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncVisitsBreakdown {
    pub anc1: usize,
    pub anc2: usize,
    pub anc3: usize,
    pub anc4: usize,
    pub anc5: usize,
    pub anc6: usize,
    pub anc7: usize,
    pub anc8: usize,
    /// Patients with at least [`ANC_CONTACT_TARGET`] attended contacts.
    pub anc5plus: usize,
}

impl AncVisitsBreakdown {
    pub fn slots(&self) -> [usize; MAX_ANC_VISITS as usize] {
        [
            self.anc1, self.anc2, self.anc3, self.anc4, self.anc5, self.anc6, self.anc7,
            self.anc8,
        ]
    }
}

/// Services delivered, counted once per visit slot they were given at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncServiceCounts {
    pub urinalysis: usize,
    pub iron_folate: usize,
    pub mms: usize,
    pub sp: usize,
    pub sba: usize,
}

impl AncServiceCounts {
    fn tally(&mut self, visit: &AncVisit) {
        for service in AncService::ALL {
            if visit.received(service) {
                *self.slot_mut(service) += 1;
            }
        }
    }

    fn slot_mut(&mut self, service: AncService) -> &mut usize {
        match service {
            AncService::Urinalysis => &mut self.urinalysis,
            AncService::IronFolate => &mut self.iron_folate,
            AncService::Mms => &mut self.mms,
            AncService::Sp => &mut self.sp,
            AncService::Sba => &mut self.sba,
        }
    }

    pub fn get(&self, service: AncService) -> usize {
        match service {
            AncService::Urinalysis => self.urinalysis,
            AncService::IronFolate => self.iron_folate,
            AncService::Mms => self.mms,
            AncService::Sp => self.sp,
            AncService::Sba => self.sba,
        }
    }
}

/// HIV testing outcomes, counted per recorded visit slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HivOutcomes {
    pub positive: usize,
    pub negative: usize,
    pub not_tested: usize,
    /// Tested, but no positive/negative result on file.
    pub awaiting_result: usize,
}

impl HivOutcomes {
    fn tally(&mut self, visit: &AncVisit) {
        if !visit.was_hiv_tested() {
            self.not_tested += 1;
            return;
        }
        match visit.hiv_result {
            Some(HivResult::Positive) => self.positive += 1,
            Some(HivResult::Negative) => self.negative += 1,
            _ => self.awaiting_result += 1,
        }
    }
}

/// Count and percentage for one vaccine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    pub count: usize,
    pub rate: u32,
}

/// Dashboard metrics derived from a set of patient records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    /// Year used for `monthlyRegistrations`.
    pub reporting_year: i32,

    pub total_patients: usize,
    pub delivered: usize,
    pub facility_deliveries: usize,
    pub facility_delivery_rate: u32,
    pub live_births: usize,
    pub stillbirths: usize,
    pub miscarriages: usize,

    pub anc1_rate: u32,
    pub anc2_rate: u32,
    pub anc3_rate: u32,
    pub anc4_rate: u32,
    pub anc5_rate: u32,
    pub anc6_rate: u32,
    pub anc7_rate: u32,
    pub anc8_rate: u32,
    pub anc_visits_breakdown: AncVisitsBreakdown,
    pub anc_service_counts: AncServiceCounts,
    pub hiv_outcomes: HivOutcomes,

    pub pnc1_received: usize,
    pub pnc2_received: usize,
    pub pnc3_received: usize,
    pub pnc1_rate: u32,
    pub pnc2_rate: u32,
    pub pnc3_rate: u32,
    pub pnc_incomplete: usize,

    pub total_fp_users: usize,
    pub fp_uptake_rate: u32,
    pub fp_methods_usage: BTreeMap<String, usize>,

    pub immunization_coverage_details: BTreeMap<String, Coverage>,

    pub age_distribution: BTreeMap<String, usize>,
    pub literacy_status_distribution: BTreeMap<String, usize>,
    pub monthly_registrations: BTreeMap<u32, usize>,

    pub delivery_type_distribution: BTreeMap<String, usize>,
    pub delivery_outcomes: BTreeMap<String, usize>,
    pub health_insurance_enrollment: BTreeMap<String, usize>,
    pub delivery_kits_received: BTreeMap<String, usize>,
}

impl StatsSummary {
    pub fn anc_rates(&self) -> [u32; MAX_ANC_VISITS as usize] {
        [
            self.anc1_rate,
            self.anc2_rate,
            self.anc3_rate,
            self.anc4_rate,
            self.anc5_rate,
            self.anc6_rate,
            self.anc7_rate,
            self.anc8_rate,
        ]
    }

    pub fn pnc_rates(&self) -> [u32; PNC_VISITS] {
        [self.pnc1_rate, self.pnc2_rate, self.pnc3_rate]
    }

    pub fn pnc_received(&self) -> [usize; PNC_VISITS] {
        [self.pnc1_received, self.pnc2_received, self.pnc3_received]
    }

}

/// Computes patient statistics for the current calendar year.
pub fn compute_patient_stats(records: &[PatientRecord]) -> StatsSummary {
    compute_patient_stats_with(records, &StatsOptions::default())
}

/// Computes patient statistics with explicit options.
///
/// Never fails: missing or malformed fields only drop out of numerators.
pub fn compute_patient_stats_with(records: &[PatientRecord], options: &StatsOptions) -> StatsSummary {
    debug!(
        "Computing patient statistics over {} records (year {})",
        records.len(),
        options.year
    );

    let total = records.len();
    let mut summary = StatsSummary {
        reporting_year: options.year,
        total_patients: total,
        ..StatsSummary::default()
    };

    let mut anc_counts = [0usize; MAX_ANC_VISITS as usize];
    let mut pnc_counts = [0usize; PNC_VISITS];
    let mut pnc_completed = 0usize;
    let mut vaccine_counts: BTreeMap<Vaccine, usize> = BTreeMap::new();

    summary.fp_methods_usage = FpMethod::ALL
        .iter()
        .map(|m| (m.key().to_string(), 0))
        .collect();
    summary.age_distribution = AGE_BANDS.iter().map(|b| (b.to_string(), 0)).collect();
    summary.monthly_registrations = (1..=12).map(|m| (m, 0)).collect();

    for record in records {
        // Antenatal care
        for (slot, count) in anc_counts.iter_mut().enumerate() {
            if record.attended_anc_visit(slot as u8 + 1) {
                *count += 1;
            }
        }
        if record.attended_anc_visits() >= ANC_CONTACT_TARGET {
            summary.anc_visits_breakdown.anc5plus += 1;
        }
        for visit in &record.anc_visits {
            summary.anc_service_counts.tally(visit);
            summary.hiv_outcomes.tally(visit);
        }

        // Delivery
        if record.has_delivered() {
            summary.delivered += 1;
            if record
                .delivery
                .place
                .as_deref()
                .is_some_and(|p| options.is_facility_place(p))
            {
                summary.facility_deliveries += 1;
            }
            if record.completed_pnc() {
                pnc_completed += 1;
            }
        }
        match record.delivery.outcome() {
            Some(DeliveryOutcome::LiveBirth) => summary.live_births += 1,
            Some(DeliveryOutcome::Stillbirth) => summary.stillbirths += 1,
            Some(DeliveryOutcome::Miscarriage) => summary.miscarriages += 1,
            Some(DeliveryOutcome::Other(_)) | None => {}
        }
        bump(
            &mut summary.delivery_type_distribution,
            record.delivery.delivery_type.as_deref(),
        );
        bump(&mut summary.delivery_outcomes, record.delivery.outcome.as_deref());
        bump(
            &mut summary.delivery_kits_received,
            record.delivery.kit_received.as_deref(),
        );

        // Postnatal care
        for (i, count) in pnc_counts.iter_mut().enumerate() {
            if record.pnc_received(i + 1) {
                *count += 1;
            }
        }

        // Family planning
        if record.fp_using {
            summary.total_fp_users += 1;
        }
        for method in FpMethod::ALL {
            if record.uses_fp_method(method) {
                *summary
                    .fp_methods_usage
                    .entry(method.key().to_string())
                    .or_default() += 1;
            }
        }

        // Immunization
        for vaccine in Vaccine::ALL {
            if record.vaccine_received(vaccine) {
                *vaccine_counts.entry(vaccine).or_default() += 1;
            }
        }

        // Demographics
        if let Some(age) = record.age {
            *summary
                .age_distribution
                .entry(age_band(age).to_string())
                .or_default() += 1;
        }
        bump(
            &mut summary.literacy_status_distribution,
            record.literacy_status.as_deref(),
        );
        bump(
            &mut summary.health_insurance_enrollment,
            record.health_insurance.as_deref(),
        );
        if let Some(registered) = record.date_of_registration {
            if registered.year() == options.year {
                *summary
                    .monthly_registrations
                    .entry(registered.month())
                    .or_default() += 1;
            }
        }
    }

    summary.facility_delivery_rate = rate(summary.facility_deliveries, summary.delivered);
    summary.fp_uptake_rate = rate(summary.total_fp_users, total);

    let [anc1, anc2, anc3, anc4, anc5, anc6, anc7, anc8] = anc_counts;
    summary.anc_visits_breakdown = AncVisitsBreakdown {
        anc1,
        anc2,
        anc3,
        anc4,
        anc5,
        anc6,
        anc7,
        anc8,
        ..summary.anc_visits_breakdown
    };
    let [anc1_rate, anc2_rate, anc3_rate, anc4_rate, anc5_rate, anc6_rate, anc7_rate, anc8_rate] =
        anc_counts.map(|count| rate(count, total));
    summary.anc1_rate = anc1_rate;
    summary.anc2_rate = anc2_rate;
    summary.anc3_rate = anc3_rate;
    summary.anc4_rate = anc4_rate;
    summary.anc5_rate = anc5_rate;
    summary.anc6_rate = anc6_rate;
    summary.anc7_rate = anc7_rate;
    summary.anc8_rate = anc8_rate;

    let [pnc1, pnc2, pnc3] = pnc_counts;
    summary.pnc1_received = pnc1;
    summary.pnc2_received = pnc2;
    summary.pnc3_received = pnc3;
    let [pnc1_rate, pnc2_rate, pnc3_rate] =
        pnc_counts.map(|count| rate(count, summary.delivered));
    summary.pnc1_rate = pnc1_rate;
    summary.pnc2_rate = pnc2_rate;
    summary.pnc3_rate = pnc3_rate;
    summary.pnc_incomplete = summary.delivered.saturating_sub(pnc_completed);

    // Coverage is measured against all registered patients, not deliveries.
    summary.immunization_coverage_details = Vaccine::ALL
        .iter()
        .map(|vaccine| {
            let count = vaccine_counts.get(vaccine).copied().unwrap_or(0);
            (
                vaccine.key().to_string(),
                Coverage {
                    count,
                    rate: rate(count, total),
                },
            )
        })
        .collect();

    summary
}

fn rate(count: usize, denominator: usize) -> u32 {
    percentage(count as u64, denominator as u64)
}

fn bump(map: &mut BTreeMap<String, usize>, key: Option<&str>) {
    if let Some(key) = key {
        *map.entry(key.to_string()).or_default() += 1;
    }
}
