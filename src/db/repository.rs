//! Repositories for accounts, predictions, health records and prescriptions

use chrono::Utc;
use sqlx::SqlitePool;

use super::models::{DoctorAccountRow, EhrRecordRow, PredictionRow, PrescriptionRow, UserRow};
use super::DbError;
use crate::model::account::{DoctorAccount, NewDoctorAccount, NewUser, User};
use crate::model::ehr::{EhrRecord, NewEhrRecord};
use crate::model::prescription::{NewPrescription, Prescription};
use crate::model::triage::{NewPrediction, Prediction};

/// Repository for patient account operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new user account
    pub async fn insert(&self, user: &NewUser) -> Result<User, DbError> {
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(id = id, email = %user.email, "Inserted user");

        Ok(User {
            id,
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at,
        })
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT * FROM users WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_domain))
    }

    /// Get a user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<User, DbError> {
        let row: UserRow = sqlx::query_as(
            r#"
            SELECT * FROM users WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("user {}", id)))?;

        Ok(row.into_domain())
    }
}

/// Repository for doctor account operations
#[derive(Clone)]
pub struct DoctorAccountRepository {
    pool: SqlitePool,
}

impl DoctorAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new doctor account
    pub async fn insert(&self, doctor: &NewDoctorAccount) -> Result<DoctorAccount, DbError> {
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO doctors (
                name, email, password_hash, specialization,
                license_number, hospital, contact, created_at, is_active
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(&doctor.name)
        .bind(&doctor.email)
        .bind(&doctor.password_hash)
        .bind(&doctor.specialization)
        .bind(&doctor.license_number)
        .bind(&doctor.hospital)
        .bind(&doctor.contact)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(id = id, email = %doctor.email, "Inserted doctor account");

        Ok(DoctorAccount {
            id,
            name: doctor.name.clone(),
            email: doctor.email.clone(),
            password_hash: doctor.password_hash.clone(),
            specialization: doctor.specialization.clone(),
            license_number: doctor.license_number.clone(),
            hospital: doctor.hospital.clone(),
            contact: doctor.contact.clone(),
            created_at,
            is_active: true,
        })
    }

    /// Find a doctor account by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<DoctorAccount>, DbError> {
        let row: Option<DoctorAccountRow> = sqlx::query_as(
            r#"
            SELECT * FROM doctors WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DoctorAccountRow::into_domain))
    }

    /// Get a doctor account by ID
    pub async fn get_by_id(&self, id: i64) -> Result<DoctorAccount, DbError> {
        let row: DoctorAccountRow = sqlx::query_as(
            r#"
            SELECT * FROM doctors WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("doctor {}", id)))?;

        Ok(row.into_domain())
    }
}

/// Repository for stored predictions
#[derive(Clone)]
pub struct PredictionRepository {
    pool: SqlitePool,
}

impl PredictionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new prediction
    pub async fn insert(&self, prediction: &NewPrediction) -> Result<Prediction, DbError> {
        let created_at = Utc::now();
        let advice_level = prediction.advice_level.map(|a| a.as_str());

        let result = sqlx::query(
            r#"
            INSERT INTO predictions (
                user_id, symptoms_text, predicted_disease, confidence,
                risk_level, precautions_text, advice_level, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(prediction.user_id)
        .bind(&prediction.symptoms_text)
        .bind(&prediction.predicted_disease)
        .bind(prediction.confidence)
        .bind(prediction.risk_level.as_str())
        .bind(&prediction.precautions_text)
        .bind(advice_level)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(id = id, user_id = prediction.user_id, "Inserted prediction");

        Ok(Prediction {
            id,
            user_id: prediction.user_id,
            symptoms_text: prediction.symptoms_text.clone(),
            predicted_disease: prediction.predicted_disease.clone(),
            confidence: prediction.confidence,
            risk_level: prediction.risk_level,
            precautions_text: prediction.precautions_text.clone(),
            advice_level: prediction.advice_level,
            created_at,
        })
    }

    /// List a user's predictions, newest first
    pub async fn list_for_user(
        &self,
        user_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Prediction>, DbError> {
        let query = match limit {
            Some(n) => format!(
                "SELECT * FROM predictions WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT {}",
                n
            ),
            None => {
                "SELECT * FROM predictions WHERE user_id = ? ORDER BY created_at DESC, id DESC"
                    .to_string()
            }
        };

        let rows: Vec<PredictionRow> = sqlx::query_as(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PredictionRow::into_domain).collect())
    }
}

/// Repository for EHR record operations
#[derive(Clone)]
pub struct EhrRepository {
    pool: SqlitePool,
}

impl EhrRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new EHR record
    pub async fn insert(&self, record: &NewEhrRecord) -> Result<EhrRecord, DbError> {
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO ehr_records (
                user_id, title, category, description,
                file_name, file_type, file_path, file_size,
                text_content, prediction_id, doctor_id, record_date,
                created_at, is_archived
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(record.user_id)
        .bind(&record.title)
        .bind(&record.category)
        .bind(&record.description)
        .bind(&record.file_name)
        .bind(&record.file_type)
        .bind(&record.file_path)
        .bind(record.file_size)
        .bind(&record.text_content)
        .bind(record.prediction_id)
        .bind(record.doctor_id)
        .bind(record.record_date)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(id = id, user_id = record.user_id, category = %record.category, "Inserted EHR record");

        Ok(EhrRecord {
            id,
            user_id: record.user_id,
            title: record.title.clone(),
            category: record.category.clone(),
            description: record.description.clone(),
            file_name: record.file_name.clone(),
            file_type: record.file_type.clone(),
            file_path: record.file_path.clone(),
            file_size: record.file_size,
            text_content: record.text_content.clone(),
            prediction_id: record.prediction_id,
            doctor_id: record.doctor_id,
            record_date: record.record_date,
            created_at,
            is_archived: false,
        })
    }

    /// Get one of a user's records by ID
    pub async fn get(&self, user_id: i64, record_id: i64) -> Result<EhrRecord, DbError> {
        let row: EhrRecordRow = sqlx::query_as(
            r#"
            SELECT * FROM ehr_records WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(record_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("ehr record {}", record_id)))?;

        Ok(row.into_domain())
    }

    /// List a user's records with optional filters, newest first
    pub async fn list_for_user(
        &self,
        user_id: i64,
        category: Option<&str>,
        include_archived: bool,
    ) -> Result<Vec<EhrRecord>, DbError> {
        // Build dynamic query
        let mut select_query = String::from("SELECT * FROM ehr_records WHERE user_id = ?");

        if !include_archived {
            select_query.push_str(" AND is_archived = 0");
        }

        if category.is_some() {
            select_query.push_str(" AND category = ?");
        }

        select_query.push_str(" ORDER BY created_at DESC, id DESC");

        let rows: Vec<EhrRecordRow> = {
            let mut q = sqlx::query_as(&select_query).bind(user_id);
            if let Some(cat) = category {
                q = q.bind(cat.to_string());
            }
            q.fetch_all(&self.pool).await?
        };

        Ok(rows.into_iter().map(EhrRecordRow::into_domain).collect())
    }

    /// Persist the editable fields of a record
    pub async fn update(&self, record: &EhrRecord) -> Result<(), DbError> {
        sqlx::query(
            r#"
            UPDATE ehr_records
            SET title = ?, description = ?, text_content = ?, record_date = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.text_content)
        .bind(record.record_date)
        .bind(record.id)
        .bind(record.user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Archive or restore a record
    /// Returns true if the record existed
    pub async fn set_archived(
        &self,
        user_id: i64,
        record_id: i64,
        archived: bool,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE ehr_records SET is_archived = ? WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(archived)
        .bind(record_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete a record
    /// Returns true if the record was deleted, false if it didn't exist
    pub async fn delete(&self, user_id: i64, record_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            DELETE FROM ehr_records WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(record_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::debug!(id = record_id, user_id = user_id, "Deleted EHR record");
        }

        Ok(deleted)
    }
}

/// Repository for prescription operations
#[derive(Clone)]
pub struct PrescriptionRepository {
    pool: SqlitePool,
}

impl PrescriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new active prescription with no progress
    pub async fn insert(&self, prescription: &NewPrescription) -> Result<Prescription, DbError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO prescriptions (
                user_id, doctor_id, notes, total_days,
                completed_days, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, '[]', 1, ?, ?)
            "#,
        )
        .bind(prescription.user_id)
        .bind(prescription.doctor_id)
        .bind(&prescription.notes)
        .bind(prescription.total_days)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(id = id, user_id = prescription.user_id, "Inserted prescription");

        Ok(Prescription {
            id,
            user_id: prescription.user_id,
            doctor_id: prescription.doctor_id,
            notes: prescription.notes.clone(),
            total_days: prescription.total_days,
            completed_days: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Deactivate every active prescription a user has
    pub async fn deactivate_all_for_user(&self, user_id: i64) -> Result<u64, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE prescriptions SET is_active = 0, updated_at = ?
            WHERE user_id = ? AND is_active = 1
            "#,
        )
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Most recent active prescription for a user, if any
    pub async fn find_active_for_user(&self, user_id: i64) -> Result<Option<Prescription>, DbError> {
        let row: Option<PrescriptionRow> = sqlx::query_as(
            r#"
            SELECT * FROM prescriptions
            WHERE user_id = ? AND is_active = 1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PrescriptionRow::into_domain))
    }

    /// Get one of a user's prescriptions by ID
    pub async fn get(&self, user_id: i64, prescription_id: i64) -> Result<Prescription, DbError> {
        let row: PrescriptionRow = sqlx::query_as(
            r#"
            SELECT * FROM prescriptions WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(prescription_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("prescription {}", prescription_id)))?;

        Ok(row.into_domain())
    }

    /// Replace the ticked-off days of a prescription
    pub async fn update_completed_days(
        &self,
        prescription_id: i64,
        completed_days: &[i64],
    ) -> Result<(), DbError> {
        let serialized =
            serde_json::to_string(completed_days).unwrap_or_else(|_| "[]".to_string());

        sqlx::query(
            r#"
            UPDATE prescriptions SET completed_days = ?, updated_at = ? WHERE id = ?
            "#,
        )
        .bind(serialized)
        .bind(Utc::now())
        .bind(prescription_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
