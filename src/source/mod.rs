//! Discovery and loading of exported record files.
//!
//! Exports are JSON files: patient rows, monthly nutrition and vaccine
//! reports (a single object or an array), and an optional facility
//! listing. All I/O and parse errors are raised here, before any
//! statistics are computed.

use crate::error::SourceError;
use crate::models::{FacilityDirectory, NutritionReport, PatientRecord, VaccineAccountabilityReport};
use crate::scope::Scope;
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Kind of export a file holds, judged by its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Patients,
    Nutrition,
    Vaccine,
    Facilities,
}

impl SourceKind {
    /// Classifies `patients*.json`, `nutrition*.json`, `vaccine*.json` and
    /// `facilities*.json`. Anything else is ignored.
    pub fn classify(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        if !ext.eq_ignore_ascii_case("json") {
            return None;
        }
        let stem = path.file_stem()?.to_str()?.to_lowercase();
        if stem.starts_with("patient") {
            Some(SourceKind::Patients)
        } else if stem.starts_with("nutrition") {
            Some(SourceKind::Nutrition)
        } else if stem.starts_with("vaccine") {
            Some(SourceKind::Vaccine)
        } else if stem.starts_with("facilit") {
            Some(SourceKind::Facilities)
        } else {
            None
        }
    }
}

/// Files to load, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePaths {
    pub patients: Vec<PathBuf>,
    pub nutrition: Vec<PathBuf>,
    pub vaccine: Vec<PathBuf>,
    pub facilities: Option<PathBuf>,
}

impl SourcePaths {
    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
            && self.nutrition.is_empty()
            && self.vaccine.is_empty()
            && self.facilities.is_none()
    }

    pub fn file_count(&self) -> usize {
        self.patients.len()
            + self.nutrition.len()
            + self.vaccine.len()
            + usize::from(self.facilities.is_some())
    }

    pub fn add(&mut self, kind: SourceKind, path: PathBuf) {
        match kind {
            SourceKind::Patients => self.patients.push(path),
            SourceKind::Nutrition => self.nutrition.push(path),
            SourceKind::Vaccine => self.vaccine.push(path),
            SourceKind::Facilities => {
                if let Some(previous) = self.facilities.replace(path) {
                    warn!(
                        "Multiple facility listings found, ignoring {}",
                        previous.display()
                    );
                }
            }
        }
    }

    /// Adds every path from `other`. An explicit facility listing in `other` wins.
    pub fn merge(&mut self, other: SourcePaths) {
        self.patients.extend(other.patients);
        self.nutrition.extend(other.nutrition);
        self.vaccine.extend(other.vaccine);
        if other.facilities.is_some() {
            self.facilities = other.facilities;
        }
    }
}

/// Walks `dir` for export files. Hidden entries are skipped; results are sorted.
pub fn discover_sources(dir: &Path) -> Result<SourcePaths, SourceError> {
    if !dir.is_dir() {
        return Err(SourceError::NotADirectory(dir.to_path_buf()));
    }

    let mut found: Vec<(SourceKind, PathBuf)> = Vec::new();
    let walker = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name().to_str()));

    for entry in walker {
        let entry = entry.map_err(|source| SourceError::Scan {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        match SourceKind::classify(entry.path()) {
            Some(kind) => found.push((kind, entry.into_path())),
            None => debug!("Skipping {}", entry.path().display()),
        }
    }

    found.sort_by(|a, b| a.1.cmp(&b.1));

    let mut paths = SourcePaths::default();
    for (kind, path) in found {
        paths.add(kind, path);
    }

    info!(
        "Discovered {} export files in {}",
        paths.file_count(),
        dir.display()
    );
    Ok(paths)
}

fn is_hidden(name: Option<&str>) -> bool {
    name.is_some_and(|n| n.starts_with('.'))
}

/// Everything loaded from a set of export files.
#[derive(Debug, Clone, Default)]
pub struct RecordBundle {
    pub patients: Vec<PatientRecord>,
    pub nutrition: Vec<NutritionReport>,
    pub vaccine: Vec<VaccineAccountabilityReport>,
    pub facilities: FacilityDirectory,
}

impl RecordBundle {
    /// Keeps only the records inside `scope`.
    pub fn scoped(self, scope: &Scope) -> Self {
        let facilities = self.facilities;
        Self {
            patients: scope.select(&facilities, self.patients),
            nutrition: scope.select(&facilities, self.nutrition),
            vaccine: scope.select(&facilities, self.vaccine),
            facilities,
        }
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&content).map_err(|source| SourceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a file holding either one record or an array of them.
async fn read_listing<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SourceError> {
    let decoded = match read_json::<Value>(path).await? {
        Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>(),
        single => serde_json::from_value(single).map(|item| vec![item]),
    };
    let items = decoded.map_err(|source| SourceError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded {} records from {}", items.len(), path.display());
    Ok(items)
}

async fn read_all<T: DeserializeOwned>(paths: &[PathBuf]) -> Result<Vec<T>, SourceError> {
    let batches = try_join_all(paths.iter().map(|p| read_listing::<T>(p))).await?;
    Ok(batches.into_iter().flatten().collect())
}

async fn read_facilities(path: Option<&Path>) -> Result<FacilityDirectory, SourceError> {
    match path {
        Some(path) => read_json(path).await,
        None => Ok(FacilityDirectory::default()),
    }
}

/// Loads every file in `paths`, reading them concurrently.
pub async fn load_bundle(paths: &SourcePaths) -> Result<RecordBundle, SourceError> {
    let (patients, nutrition, vaccine, facilities) = tokio::try_join!(
        read_all::<PatientRecord>(&paths.patients),
        read_all::<NutritionReport>(&paths.nutrition),
        read_all::<VaccineAccountabilityReport>(&paths.vaccine),
        read_facilities(paths.facilities.as_deref()),
    )?;

    info!(
        "Loaded {} patients, {} nutrition reports, {} vaccine reports",
        patients.len(),
        nutrition.len(),
        vaccine.len()
    );

    Ok(RecordBundle {
        patients,
        nutrition,
        vaccine,
        facilities,
    })
}
