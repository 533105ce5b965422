//! Scoping records to a node of the facility hierarchy.

use crate::models::{FacilityDirectory, NutritionReport, PatientRecord, VaccineAccountabilityReport};
use std::fmt;

/// Records that belong to a primary health centre.
pub trait FacilityScoped {
    fn phc_id(&self) -> Option<&str>;
}

impl FacilityScoped for PatientRecord {
    fn phc_id(&self) -> Option<&str> {
        self.phc_id.as_deref()
    }
}

impl FacilityScoped for NutritionReport {
    fn phc_id(&self) -> Option<&str> {
        self.phc_id.as_deref()
    }
}

impl FacilityScoped for VaccineAccountabilityReport {
    fn phc_id(&self) -> Option<&str> {
        self.phc_id.as_deref()
    }
}

/// Which records a computation covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Scope {
    /// Every record, including ones with no facility on file.
    #[default]
    All,
    Lga(String),
    Ward(String),
    Phc(String),
}

impl Scope {
    /// Whether a record registered at `phc_id` falls inside this scope.
    pub fn includes(&self, directory: &FacilityDirectory, phc_id: Option<&str>) -> bool {
        match self {
            Scope::All => true,
            Scope::Phc(id) => phc_id == Some(id.as_str()),
            Scope::Ward(id) => phc_id
                .and_then(|p| directory.ward_of(p))
                .is_some_and(|w| &w.id == id),
            Scope::Lga(id) => phc_id
                .and_then(|p| directory.lga_of(p))
                .is_some_and(|l| &l.id == id),
        }
    }

    /// Keeps only the records inside this scope.
    pub fn select<T: FacilityScoped>(&self, directory: &FacilityDirectory, records: Vec<T>) -> Vec<T> {
        if *self == Scope::All {
            return records;
        }
        records
            .into_iter()
            .filter(|r| self.includes(directory, r.phc_id()))
            .collect()
    }

    /// Human-readable name, resolved through the directory when possible.
    pub fn describe(&self, directory: &FacilityDirectory) -> String {
        match self {
            Scope::All => "All facilities".to_string(),
            Scope::Phc(id) => directory
                .location_label(id)
                .unwrap_or_else(|| self.to_string()),
            Scope::Ward(id) => match directory.ward(id) {
                Some(ward) => match directory.lga_of_ward(id) {
                    Some(lga) => format!("{} ward, {}", ward.name, lga.name),
                    None => format!("{} ward", ward.name),
                },
                None => self.to_string(),
            },
            Scope::Lga(id) => directory
                .lga(id)
                .map(|l| format!("{} LGA", l.name))
                .unwrap_or_else(|| self.to_string()),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => write!(f, "all"),
            Scope::Lga(id) => write!(f, "lga:{}", id),
            Scope::Ward(id) => write!(f, "ward:{}", id),
            Scope::Phc(id) => write!(f, "phc:{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Lga, Phc, Ward};

    fn directory() -> FacilityDirectory {
        FacilityDirectory::new(
            vec![Lga {
                id: "lga-1".to_string(),
                name: "Ikeja".to_string(),
            }],
            vec![
                Ward {
                    id: "w-1".to_string(),
                    name: "Alausa".to_string(),
                    lga_id: Some("lga-1".to_string()),
                },
                Ward {
                    id: "w-2".to_string(),
                    name: "Oregun".to_string(),
                    lga_id: Some("lga-1".to_string()),
                },
            ],
            vec![
                Phc {
                    id: "phc-1".to_string(),
                    name: "Alausa PHC".to_string(),
                    ward_id: Some("w-1".to_string()),
                },
                Phc {
                    id: "phc-2".to_string(),
                    name: "Oregun PHC".to_string(),
                    ward_id: Some("w-2".to_string()),
                },
                Phc {
                    id: "phc-3".to_string(),
                    name: "Unlinked PHC".to_string(),
                    ward_id: None,
                },
            ],
        )
    }

    fn patients() -> Vec<PatientRecord> {
        vec![
            PatientRecord::new("a").at_phc("phc-1"),
            PatientRecord::new("b").at_phc("phc-2"),
            PatientRecord::new("c").at_phc("phc-3"),
            PatientRecord::new("d"),
        ]
    }

    fn ids(records: &[PatientRecord]) -> Vec<&str> {
        records.iter().filter_map(|r| r.id.as_deref()).collect()
    }

    #[test]
    fn test_all_keeps_unaffiliated_records() {
        let selected = Scope::All.select(&directory(), patients());
        assert_eq!(selected.len(), 4);
    }

    #[test]
    fn test_lga_includes_every_ward() {
        let selected = Scope::Lga("lga-1".to_string()).select(&directory(), patients());
        assert_eq!(ids(&selected), vec!["a", "b"]);
    }

    #[test]
    fn test_ward_and_phc_scopes() {
        let dir = directory();
        let ward = Scope::Ward("w-2".to_string()).select(&dir, patients());
        assert_eq!(ids(&ward), vec!["b"]);

        let phc = Scope::Phc("phc-3".to_string()).select(&dir, patients());
        assert_eq!(ids(&phc), vec!["c"]);
    }

    #[test]
    fn test_describe() {
        let dir = directory();
        assert_eq!(Scope::All.describe(&dir), "All facilities");
        assert_eq!(Scope::Lga("lga-1".to_string()).describe(&dir), "Ikeja LGA");
        assert_eq!(
            Scope::Ward("w-1".to_string()).describe(&dir),
            "Alausa ward, Ikeja"
        );
        assert_eq!(Scope::Phc("phc-9".to_string()).describe(&dir), "phc:phc-9");
    }
}
