//! Facility hierarchy: Local Government Areas contain wards, wards contain
//! primary health centres.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Local Government Area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lga {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ward {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub lga_id: Option<String>,
}

/// Primary health centre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phc {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ward_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FacilityListing {
    #[serde(default)]
    lgas: Vec<Lga>,
    #[serde(default)]
    wards: Vec<Ward>,
    #[serde(default)]
    phcs: Vec<Phc>,
}

/// Indexed lookups over the facility hierarchy.
///
/// Every association is optional: a PHC may have no ward on file and a
/// ward may reference an LGA that is not listed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "FacilityListing")]
pub struct FacilityDirectory {
    lgas: HashMap<String, Lga>,
    wards: HashMap<String, Ward>,
    phcs: HashMap<String, Phc>,
}

impl From<FacilityListing> for FacilityDirectory {
    fn from(listing: FacilityListing) -> Self {
        Self {
            lgas: listing.lgas.into_iter().map(|l| (l.id.clone(), l)).collect(),
            wards: listing.wards.into_iter().map(|w| (w.id.clone(), w)).collect(),
            phcs: listing.phcs.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }
}

impl FacilityDirectory {
    pub fn new(lgas: Vec<Lga>, wards: Vec<Ward>, phcs: Vec<Phc>) -> Self {
        FacilityListing { lgas, wards, phcs }.into()
    }

    pub fn is_empty(&self) -> bool {
        self.lgas.is_empty() && self.wards.is_empty() && self.phcs.is_empty()
    }

    pub fn phc(&self, phc_id: &str) -> Option<&Phc> {
        self.phcs.get(phc_id)
    }

    pub fn ward(&self, ward_id: &str) -> Option<&Ward> {
        self.wards.get(ward_id)
    }

    pub fn lga(&self, lga_id: &str) -> Option<&Lga> {
        self.lgas.get(lga_id)
    }

    pub fn ward_of(&self, phc_id: &str) -> Option<&Ward> {
        let ward_id = self.phc(phc_id)?.ward_id.as_deref()?;
        self.ward(ward_id)
    }

    pub fn lga_of_ward(&self, ward_id: &str) -> Option<&Lga> {
        let lga_id = self.ward(ward_id)?.lga_id.as_deref()?;
        self.lga(lga_id)
    }

    pub fn lga_of(&self, phc_id: &str) -> Option<&Lga> {
        let ward = self.ward_of(phc_id)?;
        self.lga_of_ward(&ward.id)
    }

    /// "PHC, Ward, LGA" with whichever parts are known.
    pub fn location_label(&self, phc_id: &str) -> Option<String> {
        let phc = self.phc(phc_id)?;
        let mut parts = vec![phc.name.as_str()];
        if let Some(ward) = self.ward_of(phc_id) {
            parts.push(ward.name.as_str());
        }
        if let Some(lga) = self.lga_of(phc_id) {
            parts.push(lga.name.as_str());
        }
        Some(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn directory() -> FacilityDirectory {
        serde_json::from_value(json!({
            "lgas": [{"id": "lga-1", "name": "Ikeja"}],
            "wards": [
                {"id": "w-1", "name": "Ward A", "lga_id": "lga-1"},
                {"id": "w-2", "name": "Ward B", "lga_id": "lga-9"},
            ],
            "phcs": [
                {"id": "phc-1", "name": "Alausa PHC", "ward_id": "w-1"},
                {"id": "phc-2", "name": "Oregun PHC", "ward_id": "w-2"},
                {"id": "phc-3", "name": "Orphan PHC"},
            ],
        }))
        .unwrap()
    }

    #[test]
    fn test_resolves_full_chain() {
        let dir = directory();
        assert_eq!(dir.ward_of("phc-1").map(|w| w.id.as_str()), Some("w-1"));
        assert_eq!(dir.lga_of("phc-1").map(|l| l.name.as_str()), Some("Ikeja"));
        assert_eq!(
            dir.location_label("phc-1").as_deref(),
            Some("Alausa PHC, Ward A, Ikeja")
        );
    }

    #[test]
    fn test_missing_links_resolve_to_none() {
        let dir = directory();
        assert!(dir.lga_of("phc-2").is_none());
        assert!(dir.ward_of("phc-3").is_none());
        assert!(dir.phc("phc-404").is_none());
        assert_eq!(dir.location_label("phc-2").as_deref(), Some("Oregun PHC, Ward B"));
        assert_eq!(dir.location_label("phc-3").as_deref(), Some("Orphan PHC"));
    }
}
