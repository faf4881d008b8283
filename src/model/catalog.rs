//! Static reference tables embedded at compile time.
//!
//! The disease keyword catalog, the precaution table and the doctor
//! directory are shipped as YAML under `data/` and parsed once at
//! startup. They are immutable for the lifetime of the process.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DISEASES_YAML: &str = include_str!("../../data/diseases.yaml");
const PRECAUTIONS_YAML: &str = include_str!("../../data/precautions.yaml");
const DOCTORS_YAML: &str = include_str!("../../data/doctors.yaml");

/// Specialization every disease falls back to when no mapping exists.
pub const GENERAL_PHYSICIAN: &str = "General Physician";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to parse {0} catalog: {1}")]
    Parse(&'static str, #[source] serde_yaml::Error),
}

/// Baseline severity of a condition, before confidence scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgently the generated advice recommends professional care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceLevel {
    Low,
    Medium,
    High,
}

impl AdviceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for AdviceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recognizable condition with its keyword vocabulary.
#[derive(Debug, Clone, Deserialize)]
pub struct DiseaseEntry {
    pub name: String,
    pub risk: RiskLevel,
    pub keywords: Vec<String>,
}

/// Catalog of all conditions the classifier can predict.
#[derive(Debug, Clone, Deserialize)]
pub struct DiseaseCatalog {
    pub diseases: Vec<DiseaseEntry>,
}

impl DiseaseCatalog {
    pub fn from_embedded() -> Result<Self, CatalogError> {
        serde_yaml::from_str(DISEASES_YAML).map_err(|e| CatalogError::Parse("disease", e))
    }

    /// Baseline risk for a predicted label. Unknown labels are treated
    /// as MEDIUM rather than rejected.
    pub fn base_risk(&self, disease: &str) -> RiskLevel {
        self.diseases
            .iter()
            .find(|d| d.name == disease)
            .map(|d| d.risk)
            .unwrap_or(RiskLevel::Medium)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.diseases.iter().map(|d| d.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.diseases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diseases.is_empty()
    }
}

/// Advice lists for one condition. Each list is trimmed to at most
/// four entries when advice is generated.
#[derive(Debug, Clone, Deserialize)]
pub struct PrecautionSet {
    pub general: Vec<String>,
    pub dos: Vec<String>,
    pub donts: Vec<String>,
    pub consult_doctor: Vec<String>,
}

/// Per-disease precaution lists plus a generic fallback set.
#[derive(Debug, Clone, Deserialize)]
pub struct PrecautionTable {
    pub default: PrecautionSet,
    pub diseases: HashMap<String, PrecautionSet>,
}

impl PrecautionTable {
    pub fn from_embedded() -> Result<Self, CatalogError> {
        serde_yaml::from_str(PRECAUTIONS_YAML).map_err(|e| CatalogError::Parse("precaution", e))
    }

    /// Precautions for a disease, falling back to the generic set for
    /// labels with no dedicated entry.
    pub fn for_disease(&self, disease: &str) -> &PrecautionSet {
        self.diseases.get(disease).unwrap_or(&self.default)
    }
}

/// A doctor listed in the static directory.
#[derive(Debug, Clone, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub specialization: String,
    pub expertise: Vec<String>,
    pub location: String,
    pub contact: String,
    pub availability: String,
    pub consultation_fee: String,
    pub experience_years: u32,
}

/// Doctor directory with the disease to specialization mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct DoctorDirectory {
    pub specializations: HashMap<String, Vec<String>>,
    pub doctors: Vec<Doctor>,
}

impl DoctorDirectory {
    pub fn from_embedded() -> Result<Self, CatalogError> {
        serde_yaml::from_str(DOCTORS_YAML).map_err(|e| CatalogError::Parse("doctor", e))
    }

    /// Specializations that treat a disease. Unknown diseases map to
    /// the general physician fallback.
    pub fn specialists_for(&self, disease: &str) -> Vec<String> {
        self.specializations
            .get(disease)
            .cloned()
            .unwrap_or_else(|| vec![GENERAL_PHYSICIAN.to_string()])
    }

    pub fn by_id(&self, id: i64) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.id == id)
    }

    pub fn all(&self) -> &[Doctor] {
        &self.doctors
    }
}

/// All static tables bundled together for shared ownership.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub diseases: DiseaseCatalog,
    pub precautions: PrecautionTable,
    pub directory: DoctorDirectory,
}

impl Catalog {
    pub fn load_embedded() -> Result<Self, CatalogError> {
        Ok(Self {
            diseases: DiseaseCatalog::from_embedded()?,
            precautions: PrecautionTable::from_embedded()?,
            directory: DoctorDirectory::from_embedded()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalogs_parse() {
        let catalog = Catalog::load_embedded().unwrap();
        assert_eq!(catalog.diseases.len(), 50);
        assert!(!catalog.directory.all().is_empty());
    }

    #[test]
    fn every_disease_has_a_precaution_entry() {
        let catalog = Catalog::load_embedded().unwrap();
        for label in catalog.diseases.labels() {
            assert!(
                catalog.precautions.diseases.contains_key(label),
                "missing precautions for {}",
                label
            );
        }
    }

    #[test]
    fn base_risk_defaults_to_medium_for_unknown_labels() {
        let catalog = DiseaseCatalog::from_embedded().unwrap();
        assert_eq!(catalog.base_risk("Common Cold"), RiskLevel::Low);
        assert_eq!(catalog.base_risk("Heart Disease"), RiskLevel::High);
        assert_eq!(catalog.base_risk("Cold"), RiskLevel::Medium);
    }

    #[test]
    fn unknown_disease_falls_back_to_general_physician() {
        let directory = DoctorDirectory::from_embedded().unwrap();
        assert_eq!(directory.specialists_for("Cold"), vec![GENERAL_PHYSICIAN]);
        assert!(directory
            .specialists_for("Diabetes")
            .contains(&"Endocrinologist".to_string()));
    }

    #[test]
    fn precaution_fallback_is_the_default_set() {
        let table = PrecautionTable::from_embedded().unwrap();
        let fallback = table.for_disease("Nonexistent Condition");
        assert_eq!(fallback.general, table.default.general);
        assert!(!fallback.dos.is_empty());
    }

    #[test]
    fn doctor_ids_are_unique() {
        let directory = DoctorDirectory::from_embedded().unwrap();
        let mut ids: Vec<i64> = directory.all().iter().map(|d| d.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), directory.all().len());
    }

    #[test]
    fn risk_levels_serialize_uppercase() {
        assert_eq!(RiskLevel::High.as_str(), "HIGH");
        assert_eq!(AdviceLevel::Medium.as_str(), "medium");
        let parsed: RiskLevel = serde_yaml::from_str("MEDIUM").unwrap();
        assert_eq!(parsed, RiskLevel::Medium);
    }
}
