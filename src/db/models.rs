//! Database models for accounts, predictions and health records

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::model::account::{DoctorAccount, User};
use crate::model::catalog::{AdviceLevel, RiskLevel};
use crate::model::ehr::EhrRecord;
use crate::model::prescription::Prescription;
use crate::model::triage::Prediction;

/// Database representation of a patient account
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    /// Convert database row to domain model
    pub fn into_domain(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            created_at: self.created_at,
        }
    }
}

/// Database representation of a doctor account
#[derive(Debug, Clone, FromRow)]
pub struct DoctorAccountRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub specialization: String,
    pub license_number: Option<String>,
    pub hospital: Option<String>,
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl DoctorAccountRow {
    /// Convert database row to domain model
    pub fn into_domain(self) -> DoctorAccount {
        DoctorAccount {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            specialization: self.specialization,
            license_number: self.license_number,
            hospital: self.hospital,
            contact: self.contact,
            created_at: self.created_at,
            is_active: self.is_active,
        }
    }
}

/// Database representation of a stored prediction
#[derive(Debug, Clone, FromRow)]
pub struct PredictionRow {
    pub id: i64,
    pub user_id: i64,
    pub symptoms_text: String,
    pub predicted_disease: String,
    pub confidence: f64,
    pub risk_level: String,
    pub precautions_text: Option<String>,
    pub advice_level: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PredictionRow {
    /// Convert database row to domain model
    pub fn into_domain(self) -> Prediction {
        let risk_level = risk_level_from_str(&self.risk_level);
        let advice_level = self.advice_level.as_deref().map(advice_level_from_str);

        Prediction {
            id: self.id,
            user_id: self.user_id,
            symptoms_text: self.symptoms_text,
            predicted_disease: self.predicted_disease,
            confidence: self.confidence,
            risk_level,
            precautions_text: self.precautions_text,
            advice_level,
            created_at: self.created_at,
        }
    }
}

/// Database representation of an EHR record
#[derive(Debug, Clone, FromRow)]
pub struct EhrRecordRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub text_content: Option<String>,
    pub prediction_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub record_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub is_archived: bool,
}

impl EhrRecordRow {
    /// Convert database row to domain model
    pub fn into_domain(self) -> EhrRecord {
        EhrRecord {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            category: self.category,
            description: self.description,
            file_name: self.file_name,
            file_type: self.file_type,
            file_path: self.file_path,
            file_size: self.file_size,
            text_content: self.text_content,
            prediction_id: self.prediction_id,
            doctor_id: self.doctor_id,
            record_date: self.record_date,
            created_at: self.created_at,
            is_archived: self.is_archived,
        }
    }
}

/// Database representation of a prescription
#[derive(Debug, Clone, FromRow)]
pub struct PrescriptionRow {
    pub id: i64,
    pub user_id: i64,
    pub doctor_id: i64,
    pub notes: String,
    pub total_days: i64,
    pub completed_days: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrescriptionRow {
    /// Convert database row to domain model. A malformed
    /// completed_days column is treated as no progress.
    pub fn into_domain(self) -> Prescription {
        let completed_days: Vec<i64> =
            serde_json::from_str(&self.completed_days).unwrap_or_default();

        Prescription {
            id: self.id,
            user_id: self.user_id,
            doctor_id: self.doctor_id,
            notes: self.notes,
            total_days: self.total_days,
            completed_days,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Helper to parse a stored risk level, defaulting unknown values to MEDIUM
pub fn risk_level_from_str(value: &str) -> RiskLevel {
    match value {
        "LOW" => RiskLevel::Low,
        "MEDIUM" => RiskLevel::Medium,
        "HIGH" => RiskLevel::High,
        _ => RiskLevel::Medium,
    }
}

/// Helper to parse a stored advice level, defaulting unknown values to medium
pub fn advice_level_from_str(value: &str) -> AdviceLevel {
    match value {
        "low" => AdviceLevel::Low,
        "medium" => AdviceLevel::Medium,
        "high" => AdviceLevel::High,
        _ => AdviceLevel::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_columns_parse_with_medium_fallback() {
        assert_eq!(risk_level_from_str("HIGH"), RiskLevel::High);
        assert_eq!(risk_level_from_str("bogus"), RiskLevel::Medium);
        assert_eq!(advice_level_from_str("low"), AdviceLevel::Low);
        assert_eq!(advice_level_from_str(""), AdviceLevel::Medium);
    }

    #[test]
    fn malformed_completed_days_becomes_empty() {
        let row = PrescriptionRow {
            id: 1,
            user_id: 1,
            doctor_id: 1,
            notes: String::new(),
            total_days: 5,
            completed_days: "not json".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(row.into_domain().completed_days.is_empty());
    }
}
