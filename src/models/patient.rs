//! Patient records: registration, antenatal visits, delivery, postnatal
//! care, family planning and child immunization.

use crate::rows::{Row, RowReader};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Highest antenatal visit slot tracked per pregnancy.
pub const MAX_ANC_VISITS: u8 = 8;

/// Number of tracked postnatal visits.
pub const PNC_VISITS: usize = 3;

/// Services that can be delivered at an antenatal visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AncService {
    Urinalysis,
    IronFolate,
    /// Multiple micronutrient supplements.
    Mms,
    /// Sulfadoxine-pyrimethamine (malaria prophylaxis).
    Sp,
    /// Skilled birth attendant counselling.
    Sba,
}

impl AncService {
    pub const ALL: [AncService; 5] = [
        AncService::Urinalysis,
        AncService::IronFolate,
        AncService::Mms,
        AncService::Sp,
        AncService::Sba,
    ];

    /// Column suffix used in exports and summary keys.
    pub fn key(&self) -> &'static str {
        match self {
            AncService::Urinalysis => "urinalysis",
            AncService::IronFolate => "iron_folate",
            AncService::Mms => "mms",
            AncService::Sp => "sp",
            AncService::Sba => "sba",
        }
    }
}

/// Result of an HIV test offered at an antenatal visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HivResult {
    Positive,
    Negative,
    /// Anything else recorded, e.g. "Pending" or "Indeterminate".
    Other(String),
}

impl From<&str> for HivResult {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "positive" | "reactive" | "pos" => HivResult::Positive,
            "negative" | "non-reactive" | "non reactive" | "neg" => HivResult::Negative,
            _ => HivResult::Other(s.trim().to_string()),
        }
    }
}

/// One antenatal visit slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncVisit {
    /// Slot number, 1 through [`MAX_ANC_VISITS`].
    pub visit_number: u8,
    /// Date the visit took place.
    pub date: Option<NaiveDate>,
    /// Services delivered during the visit.
    pub services: BTreeSet<AncService>,
    /// Raw HIV test flag; "Yes" means a test was done.
    pub hiv_test: Option<String>,
    /// HIV result, if one was received.
    pub hiv_result: Option<HivResult>,
}

impl AncVisit {
    pub fn new(visit_number: u8) -> Self {
        Self {
            visit_number,
            ..Self::default()
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_service(mut self, service: AncService) -> Self {
        self.services.insert(service);
        self
    }

    pub fn with_hiv_test(mut self, tested: &str, result: Option<&str>) -> Self {
        self.hiv_test = Some(tested.to_string());
        self.hiv_result = result.map(HivResult::from);
        self
    }

    pub fn received(&self, service: AncService) -> bool {
        self.services.contains(&service)
    }

    pub fn was_hiv_tested(&self) -> bool {
        self.hiv_test
            .as_deref()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("yes"))
    }

    /// True when nothing at all was recorded for this slot.
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.services.is_empty()
            && self.hiv_test.is_none()
            && self.hiv_result.is_none()
    }

    fn from_row(reader: &RowReader<'_>, visit_number: u8) -> Self {
        let prefix = format!("anc{}", visit_number);
        let services = AncService::ALL
            .into_iter()
            .filter(|s| reader.flag(&format!("{}_{}", prefix, s.key())))
            .collect();

        Self {
            visit_number,
            date: reader.date(&format!("anc_visit_{}_date", visit_number)),
            services,
            hiv_test: reader.text(&format!("{}_hiv_test", prefix)),
            hiv_result: reader
                .text(&format!("{}_hiv_result", prefix))
                .map(|r| HivResult::from(r.as_str())),
        }
    }
}

/// Classified delivery outcome. Raw values stay on the record for grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    LiveBirth,
    Stillbirth,
    Miscarriage,
    Other(String),
}

impl From<&str> for DeliveryOutcome {
    fn from(s: &str) -> Self {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "livebirth" | "live" | "alive" | "liveborn" => DeliveryOutcome::LiveBirth,
            "stillbirth" | "stillborn" => DeliveryOutcome::Stillbirth,
            "miscarriage" | "abortion" => DeliveryOutcome::Miscarriage,
            _ => DeliveryOutcome::Other(s.trim().to_string()),
        }
    }
}

/// Delivery details, all optional until the patient delivers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    pub date: Option<NaiveDate>,
    pub place: Option<String>,
    pub delivery_type: Option<String>,
    pub outcome: Option<String>,
    pub complications: Option<String>,
    pub mother_status: Option<String>,
    pub kit_received: Option<String>,
}

impl Delivery {
    pub fn outcome(&self) -> Option<DeliveryOutcome> {
        self.outcome.as_deref().map(DeliveryOutcome::from)
    }
}

/// Family planning methods tracked as individual flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FpMethod {
    MaleCondom,
    FemaleCondom,
    Pill,
    Injectable,
    Implant,
    Iud,
    /// Lactational amenorrhea method.
    Lam,
    Other,
}

impl FpMethod {
    pub const ALL: [FpMethod; 8] = [
        FpMethod::MaleCondom,
        FpMethod::FemaleCondom,
        FpMethod::Pill,
        FpMethod::Injectable,
        FpMethod::Implant,
        FpMethod::Iud,
        FpMethod::Lam,
        FpMethod::Other,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FpMethod::MaleCondom => "male_condom",
            FpMethod::FemaleCondom => "female_condom",
            FpMethod::Pill => "pill",
            FpMethod::Injectable => "injectable",
            FpMethod::Implant => "implant",
            FpMethod::Iud => "iud",
            FpMethod::Lam => "lam",
            FpMethod::Other => "other",
        }
    }
}

/// Childhood vaccines on the routine schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vaccine {
    Bcg,
    HepB0,
    Opv0,
    Opv1,
    Opv2,
    Opv3,
    Penta1,
    Penta2,
    Penta3,
    Pcv1,
    Pcv2,
    Pcv3,
    Rota1,
    Rota2,
    Ipv1,
    Ipv2,
    Measles1,
    Measles2,
    YellowFever,
    MenA,
}

impl Vaccine {
    pub const ALL: [Vaccine; 20] = [
        Vaccine::Bcg,
        Vaccine::HepB0,
        Vaccine::Opv0,
        Vaccine::Opv1,
        Vaccine::Opv2,
        Vaccine::Opv3,
        Vaccine::Penta1,
        Vaccine::Penta2,
        Vaccine::Penta3,
        Vaccine::Pcv1,
        Vaccine::Pcv2,
        Vaccine::Pcv3,
        Vaccine::Rota1,
        Vaccine::Rota2,
        Vaccine::Ipv1,
        Vaccine::Ipv2,
        Vaccine::Measles1,
        Vaccine::Measles2,
        Vaccine::YellowFever,
        Vaccine::MenA,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Vaccine::Bcg => "bcg",
            Vaccine::HepB0 => "hep_b0",
            Vaccine::Opv0 => "opv0",
            Vaccine::Opv1 => "opv1",
            Vaccine::Opv2 => "opv2",
            Vaccine::Opv3 => "opv3",
            Vaccine::Penta1 => "penta1",
            Vaccine::Penta2 => "penta2",
            Vaccine::Penta3 => "penta3",
            Vaccine::Pcv1 => "pcv1",
            Vaccine::Pcv2 => "pcv2",
            Vaccine::Pcv3 => "pcv3",
            Vaccine::Rota1 => "rota1",
            Vaccine::Rota2 => "rota2",
            Vaccine::Ipv1 => "ipv1",
            Vaccine::Ipv2 => "ipv2",
            Vaccine::Measles1 => "measles1",
            Vaccine::Measles2 => "measles2",
            Vaccine::YellowFever => "yellow_fever",
            Vaccine::MenA => "men_a",
        }
    }
}

impl fmt::Display for Vaccine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A registered patient and everything recorded about her pregnancy and child.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Row")]
pub struct PatientRecord {
    pub id: Option<String>,
    /// Primary health centre the patient is registered at.
    pub phc_id: Option<String>,
    pub date_of_registration: Option<NaiveDate>,
    pub age: Option<u32>,
    pub literacy_status: Option<String>,
    pub health_insurance: Option<String>,
    pub gravida: Option<u32>,
    pub parity: Option<u32>,
    /// Expected delivery date.
    pub edd: Option<NaiveDate>,
    /// Recorded antenatal visit slots, ordered by visit number.
    pub anc_visits: Vec<AncVisit>,
    /// Visits beyond the tracked slots, kept as a plain counter.
    pub additional_anc_visits: u32,
    pub delivery: Delivery,
    pub pnc_visits: [Option<NaiveDate>; PNC_VISITS],
    pub fp_using: bool,
    pub fp_methods: BTreeSet<FpMethod>,
    /// Vaccines the child received.
    pub immunizations: BTreeSet<Vaccine>,
}

impl PatientRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn at_phc(mut self, phc_id: impl Into<String>) -> Self {
        self.phc_id = Some(phc_id.into());
        self
    }

    /// Adds or replaces the visit in the same slot. Out-of-range slots are ignored.
    pub fn with_anc_visit(mut self, visit: AncVisit) -> Self {
        if !(1..=MAX_ANC_VISITS).contains(&visit.visit_number) {
            return self;
        }
        self.anc_visits
            .retain(|v| v.visit_number != visit.visit_number);
        self.anc_visits.push(visit);
        self.anc_visits.sort_by_key(|v| v.visit_number);
        self
    }

    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    /// Records postnatal visit `visit` (1-based).
    pub fn with_pnc_visit(mut self, visit: usize, date: NaiveDate) -> Self {
        if let Some(slot) = visit.checked_sub(1).and_then(|i| self.pnc_visits.get_mut(i)) {
            *slot = Some(date);
        }
        self
    }

    pub fn with_fp_method(mut self, method: FpMethod) -> Self {
        self.fp_using = true;
        self.fp_methods.insert(method);
        self
    }

    pub fn with_vaccine(mut self, vaccine: Vaccine) -> Self {
        self.immunizations.insert(vaccine);
        self
    }

    pub fn anc_visit(&self, visit_number: u8) -> Option<&AncVisit> {
        self.anc_visits
            .iter()
            .find(|v| v.visit_number == visit_number)
    }

    /// Whether a date was recorded for the given antenatal slot.
    pub fn attended_anc_visit(&self, visit_number: u8) -> bool {
        self.anc_visit(visit_number)
            .is_some_and(|v| v.date.is_some())
    }

    /// Dated antenatal slots plus visits beyond the tracked slots.
    pub fn attended_anc_visits(&self) -> u32 {
        let dated = self.anc_visits.iter().filter(|v| v.date.is_some()).count() as u32;
        dated.saturating_add(self.additional_anc_visits)
    }

    pub fn has_delivered(&self) -> bool {
        self.delivery.date.is_some()
    }

    /// Whether postnatal visit `visit` (1-based) took place.
    pub fn pnc_received(&self, visit: usize) -> bool {
        visit
            .checked_sub(1)
            .and_then(|i| self.pnc_visits.get(i))
            .is_some_and(Option::is_some)
    }

    pub fn completed_pnc(&self) -> bool {
        self.pnc_visits.iter().all(Option::is_some)
    }

    pub fn uses_fp_method(&self, method: FpMethod) -> bool {
        self.fp_methods.contains(&method)
    }

    pub fn vaccine_received(&self, vaccine: Vaccine) -> bool {
        self.immunizations.contains(&vaccine)
    }
}

impl From<Row> for PatientRecord {
    fn from(row: Row) -> Self {
        let reader = RowReader::new(&row);

        let anc_visits = (1..=MAX_ANC_VISITS)
            .map(|n| AncVisit::from_row(&reader, n))
            .filter(|v| !v.is_empty())
            .collect();

        let delivery = Delivery {
            date: reader.date("date_of_delivery"),
            place: reader.text("place_of_delivery"),
            delivery_type: reader.text("delivery_type"),
            outcome: reader.text("delivery_outcome"),
            complications: reader.text("delivery_complications"),
            mother_status: reader.text("mother_status"),
            kit_received: reader.text("delivery_kit_received"),
        };

        let mut pnc_visits = [None; PNC_VISITS];
        for (i, slot) in pnc_visits.iter_mut().enumerate() {
            *slot = reader.date(&format!("pnc_visit_{}", i + 1));
        }

        let fp_methods = FpMethod::ALL
            .into_iter()
            .filter(|m| reader.flag(&format!("fp_{}", m.key())))
            .collect();

        // A recorded dose date counts even when the received flag was left blank.
        let immunizations = Vaccine::ALL
            .into_iter()
            .filter(|v| {
                reader.flag(&format!("{}_received", v.key()))
                    || reader.date(&format!("{}_date", v.key())).is_some()
            })
            .collect();

        Self {
            id: reader.text("id"),
            phc_id: reader.text("phc_id"),
            date_of_registration: reader.date("date_of_registration"),
            age: reader.number("age"),
            literacy_status: reader.text("literacy_status"),
            health_insurance: reader.text("health_insurance"),
            gravida: reader.number("gravida"),
            parity: reader.number("parity"),
            edd: reader.date("edd"),
            anc_visits,
            additional_anc_visits: reader.count("additional_anc_visits"),
            delivery,
            pnc_visits,
            fp_using: reader.flag("fp_using"),
            fp_methods,
            immunizations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_decode_flat_row() {
        let patient: PatientRecord = serde_json::from_value(json!({
            "id": 17,
            "phc_id": "phc-1",
            "date_of_registration": "2024-02-11",
            "age": "24",
            "anc_visit_1_date": "2024-02-11",
            "anc1_urinalysis": true,
            "anc1_hiv_test": "Yes",
            "anc1_hiv_result": "Negative",
            "anc_visit_3_date": "2024-04-02",
            "anc3_iron_folate": "Yes",
            "date_of_delivery": "2024-07-30",
            "place_of_delivery": "Health Facility",
            "delivery_outcome": "Live Birth",
            "pnc_visit_1": "2024-07-31",
            "fp_using": "Yes",
            "fp_implant": 1,
            "bcg_received": true,
            "bcg_date": "2024-07-31",
            "opv0_received": "no",
            "penta1_date": "2024-09-12",
        }))
        .unwrap();

        assert_eq!(patient.id.as_deref(), Some("17"));
        assert_eq!(patient.age, Some(24));
        assert_eq!(patient.anc_visits.len(), 2);
        assert!(patient.attended_anc_visit(1));
        assert!(!patient.attended_anc_visit(2));
        assert!(patient.attended_anc_visit(3));
        assert!(patient.anc_visit(1).unwrap().received(AncService::Urinalysis));
        assert!(patient.anc_visit(1).unwrap().was_hiv_tested());
        assert_eq!(
            patient.anc_visit(1).unwrap().hiv_result,
            Some(HivResult::Negative)
        );
        assert!(patient.anc_visit(3).unwrap().received(AncService::IronFolate));
        assert!(patient.has_delivered());
        assert_eq!(patient.delivery.outcome(), Some(DeliveryOutcome::LiveBirth));
        assert!(patient.pnc_received(1));
        assert!(!patient.pnc_received(2));
        assert!(patient.fp_using);
        assert!(patient.uses_fp_method(FpMethod::Implant));
        assert!(patient.vaccine_received(Vaccine::Bcg));
        assert!(!patient.vaccine_received(Vaccine::Opv0));
        assert!(patient.vaccine_received(Vaccine::Penta1));
    }

    #[test]
    fn test_malformed_fields_are_absent() {
        let patient: PatientRecord = serde_json::from_value(json!({
            "age": "unknown",
            "anc_visit_1_date": "last week",
            "date_of_delivery": 12,
            "fp_using": "maybe",
        }))
        .unwrap();

        assert_eq!(patient.age, None);
        assert!(!patient.attended_anc_visit(1));
        assert!(!patient.has_delivered());
        assert!(!patient.fp_using);
    }

    #[test]
    fn test_with_anc_visit_replaces_slot_and_ignores_out_of_range() {
        let patient = PatientRecord::new("p1")
            .with_anc_visit(AncVisit::new(2).on(date(2024, 1, 1)))
            .with_anc_visit(AncVisit::new(2).on(date(2024, 2, 1)))
            .with_anc_visit(AncVisit::new(9).on(date(2024, 3, 1)))
            .with_anc_visit(AncVisit::new(1).on(date(2023, 12, 1)));

        assert_eq!(patient.anc_visits.len(), 2);
        assert_eq!(patient.anc_visits[0].visit_number, 1);
        assert_eq!(patient.anc_visit(2).unwrap().date, Some(date(2024, 2, 1)));
    }

    #[test]
    fn test_attended_visits_include_additional_counter() {
        let mut patient = PatientRecord::new("p1")
            .with_anc_visit(AncVisit::new(1).on(date(2024, 1, 1)))
            .with_anc_visit(AncVisit::new(2).with_service(AncService::Sp));
        patient.additional_anc_visits = 3;

        assert_eq!(patient.attended_anc_visits(), 4);

        patient.additional_anc_visits = u32::MAX;
        assert_eq!(patient.attended_anc_visits(), u32::MAX);
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(DeliveryOutcome::from("Still-birth"), DeliveryOutcome::Stillbirth);
        assert_eq!(DeliveryOutcome::from("ABORTION"), DeliveryOutcome::Miscarriage);
        assert_eq!(
            DeliveryOutcome::from("Twins"),
            DeliveryOutcome::Other("Twins".to_string())
        );
    }
}
