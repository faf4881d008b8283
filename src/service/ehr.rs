//! Health record management and file storage
//!
//! Records live in the database, uploaded files on disk under a per
//! user directory. Database rows reference files by stored name only.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use tokio::fs;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::repository::EhrRepository;
use crate::db::DbError;
use crate::model::account::{DoctorAccount, User};
use crate::model::config::StorageConfig;
use crate::model::ehr::{
    extension_for, format_file_size, EhrCategory, EhrRecord, NewEhrRecord, FILE_TYPE_NAMES,
    MAX_FILE_SIZE,
};
use crate::model::notification::NotificationEvent;
use crate::model::triage::Prediction;
use crate::service::notification::{NotificationError, NotificationStore};

/// Categories a doctor may attach to a text record
const DOCTOR_TEXT_CATEGORIES: [EhrCategory; 6] = [
    EhrCategory::DoctorPrescription,
    EhrCategory::DoctorReport,
    EhrCategory::DoctorNote,
    EhrCategory::Prescription,
    EhrCategory::LabReport,
    EhrCategory::OpNote,
];

/// Categories a doctor may attach to a file upload
const DOCTOR_FILE_CATEGORIES: [EhrCategory; 4] = [
    EhrCategory::DoctorPrescription,
    EhrCategory::DoctorReport,
    EhrCategory::LabReport,
    EhrCategory::ScanImage,
];

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EhrError {
    /// Rejected client input. The message is returned verbatim.
    #[error("{0}")]
    Invalid(String),

    #[error("This record has no file attached")]
    NoFileAttached,

    #[error("File not found on server")]
    FileMissing,

    #[error("File storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Notification store error: {0}")]
    Notify(#[from] NotificationError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

/// An uploaded file buffered in memory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Text record content submitted through the doctor portal.
#[derive(Debug, Default)]
pub struct DoctorRecordInput {
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub text_content: Option<String>,
    pub record_date: Option<String>,
}

/// Aggregate view over a user's records.
#[derive(Debug, Serialize, ToSchema)]
pub struct EhrStatistics {
    pub total_records: usize,
    pub by_category: HashMap<String, usize>,
    pub total_file_size: i64,
    pub file_count: usize,
    pub text_record_count: usize,
    pub oldest_record: Option<String>,
    pub newest_record: Option<String>,
    pub total_file_size_formatted: String,
}

/// Record CRUD, file storage and the record-related notifications.
#[derive(Clone)]
pub struct EhrService {
    storage: StorageConfig,
    repo: EhrRepository,
    notifications: Arc<NotificationStore>,
}

impl EhrService {
    pub fn new(
        storage: StorageConfig,
        repo: EhrRepository,
        notifications: Arc<NotificationStore>,
    ) -> Self {
        Self {
            storage,
            repo,
            notifications,
        }
    }

    /// Create a text record. The category must be one of the known
    /// values and a provided date must parse.
    pub async fn create_text_record(
        &self,
        user_id: i64,
        title: String,
        category: &str,
        description: Option<String>,
        text_content: Option<String>,
        record_date: Option<&str>,
    ) -> Result<EhrRecord, EhrError> {
        let category = EhrCategory::parse(category).ok_or_else(|| {
            EhrError::Invalid(format!(
                "Invalid category. Valid categories: {}",
                join_categories(&EhrCategory::ALL)
            ))
        })?;

        let record_date = match record_date.filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(parse_record_date(raw).ok_or_else(|| {
                EhrError::Invalid("Invalid date format. Use ISO format.".to_string())
            })?),
            None => None,
        };

        let record = self
            .repo
            .insert(&NewEhrRecord {
                user_id,
                title: title.clone(),
                category: category.as_str().to_string(),
                description,
                text_content,
                record_date,
                ..NewEhrRecord::default()
            })
            .await?;

        self.notifications.notify(
            user_id,
            NotificationEvent::EhrUpload {
                title,
                category: category.as_str().to_string(),
            },
        )?;

        tracing::debug!(user_id = %user_id, record_id = %record.id, "Text record created");
        Ok(record)
    }

    /// Store an uploaded file and create its record. Any category but
    /// the system-generated prediction one is accepted. An unparseable
    /// date is ignored.
    pub async fn create_file_record(
        &self,
        user_id: i64,
        upload: UploadedFile,
        title: String,
        category: &str,
        description: Option<String>,
        record_date: Option<&str>,
    ) -> Result<EhrRecord, EhrError> {
        let uploadable: Vec<EhrCategory> = EhrCategory::ALL
            .into_iter()
            .filter(|c| *c != EhrCategory::Prediction)
            .collect();
        let category = match EhrCategory::parse(category) {
            Some(c) if c != EhrCategory::Prediction => c,
            _ => {
                return Err(EhrError::Invalid(format!(
                    "Invalid category for upload. Valid: {}",
                    join_categories(&uploadable)
                )))
            }
        };

        validate_upload(&upload)?;

        let file_size = upload.data.len() as i64;
        let stored_name = self.store_file(user_id, &upload).await?;

        let record_date = record_date
            .filter(|s| !s.trim().is_empty())
            .and_then(parse_record_date);

        let record = self
            .repo
            .insert(&NewEhrRecord {
                user_id,
                title: title.clone(),
                category: category.as_str().to_string(),
                description,
                file_name: Some(upload.file_name),
                file_type: Some(upload.content_type),
                file_path: Some(stored_name),
                file_size: Some(file_size),
                record_date,
                ..NewEhrRecord::default()
            })
            .await?;

        self.notifications.notify(
            user_id,
            NotificationEvent::EhrUpload {
                title,
                category: category.as_str().to_string(),
            },
        )?;

        tracing::debug!(user_id = %user_id, record_id = %record.id, "File record created");
        Ok(record)
    }

    /// Record the outcome of a prediction as a readable text record.
    pub async fn add_prediction_record(
        &self,
        prediction: &Prediction,
    ) -> Result<EhrRecord, EhrError> {
        let confidence_percent = (prediction.confidence * 100.0) as i64;
        let now = Utc::now();

        let text_content = format!(
            "PREDICTION RECORD\n\
             ================\n\
             Date: {} UTC\n\
             \n\
             SYMPTOMS REPORTED:\n\
             {}\n\
             \n\
             PREDICTION RESULTS:\n\
             - Predicted Condition: {}\n\
             - Risk Level: {}\n\
             - Confidence: {}%\n\
             \n\
             PRECAUTIONARY ADVICE:\n\
             {}\n\
             \n\
             ---\n\
             ⚠️ DISCLAIMER: This is an automated prediction from the Predict Care system.\n\
             This is NOT a medical diagnosis. Please consult a healthcare professional\n\
             for proper medical advice.\n",
            now.format("%Y-%m-%d %H:%M"),
            prediction.symptoms_text,
            prediction.predicted_disease,
            prediction.risk_level,
            confidence_percent,
            prediction
                .precautions_text
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or("No specific advice generated."),
        );

        let record = self
            .repo
            .insert(&NewEhrRecord {
                user_id: prediction.user_id,
                title: format!("Prediction: {}", prediction.predicted_disease),
                category: EhrCategory::Prediction.as_str().to_string(),
                description: Some(format!(
                    "System-generated prediction record. Risk: {}, Confidence: {}%",
                    prediction.risk_level, confidence_percent
                )),
                text_content: Some(text_content),
                prediction_id: Some(prediction.id),
                record_date: Some(now),
                ..NewEhrRecord::default()
            })
            .await?;

        self.notifications.notify(
            prediction.user_id,
            NotificationEvent::EhrPrediction {
                disease: prediction.predicted_disease.clone(),
            },
        )?;

        Ok(record)
    }

    /// Doctor-portal text record for a patient, signed by the doctor.
    pub async fn add_doctor_text_record(
        &self,
        patient: &User,
        doctor: &DoctorAccount,
        input: DoctorRecordInput,
    ) -> Result<EhrRecord, EhrError> {
        let category = match EhrCategory::parse(&input.category) {
            Some(c) if DOCTOR_TEXT_CATEGORIES.contains(&c) => c,
            _ => {
                return Err(EhrError::Invalid(format!(
                    "Invalid category. Valid: {}",
                    join_categories(&DOCTOR_TEXT_CATEGORIES)
                )))
            }
        };

        let mut sections = Vec::new();
        if let Some(diagnosis) = input.diagnosis.filter(|s| !s.is_empty()) {
            sections.push(format!("DIAGNOSIS:\n{}", diagnosis));
        }
        if let Some(prescription) = input.prescription.filter(|s| !s.is_empty()) {
            sections.push(format!("PRESCRIPTION:\n{}", prescription));
        }
        if let Some(notes) = input.notes.filter(|s| !s.is_empty()) {
            sections.push(format!("DOCTOR'S NOTES:\n{}", notes));
        }
        if let Some(text) = input.text_content.filter(|s| !s.is_empty()) {
            sections.push(text);
        }

        let text_content = if sections.is_empty() {
            None
        } else {
            Some(format!(
                "{}\n\n---\nRecorded by: {}\nSpecialization: {}\nDate: {} UTC",
                sections.join("\n\n"),
                doctor.name,
                doctor.specialization,
                Utc::now().format("%Y-%m-%d %H:%M")
            ))
        };

        let record_date = input
            .record_date
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .and_then(parse_record_date)
            .unwrap_or_else(Utc::now);

        let record = self
            .repo
            .insert(&NewEhrRecord {
                user_id: patient.id,
                title: input.title.clone(),
                category: category.as_str().to_string(),
                description: input.description,
                text_content,
                doctor_id: Some(doctor.id),
                record_date: Some(record_date),
                ..NewEhrRecord::default()
            })
            .await?;

        self.notifications.notify(
            patient.id,
            NotificationEvent::DoctorRecord {
                doctor_name: doctor.name.clone(),
                category: category.as_str().to_string(),
                title: input.title,
            },
        )?;

        tracing::info!(
            doctor_id = %doctor.id,
            user_id = %patient.id,
            record_id = %record.id,
            "Doctor text record added"
        );
        Ok(record)
    }

    /// Doctor-portal file upload into a patient's records.
    pub async fn add_doctor_file_record(
        &self,
        patient: &User,
        doctor: &DoctorAccount,
        upload: UploadedFile,
        title: String,
        category: &str,
        description: Option<String>,
        record_date: Option<&str>,
    ) -> Result<EhrRecord, EhrError> {
        let category = match EhrCategory::parse(category) {
            Some(c) if DOCTOR_FILE_CATEGORIES.contains(&c) => c,
            _ => {
                return Err(EhrError::Invalid(format!(
                    "Invalid category for file upload. Valid: {}",
                    join_categories(&DOCTOR_FILE_CATEGORIES)
                )))
            }
        };

        validate_upload(&upload)?;

        let file_size = upload.data.len() as i64;
        let stored_name = self.store_file(patient.id, &upload).await?;

        let record_date = record_date
            .filter(|s| !s.trim().is_empty())
            .and_then(parse_record_date)
            .unwrap_or_else(Utc::now);

        let description = format!(
            "{}\n\nUploaded by: {} ({})",
            description.unwrap_or_default(),
            doctor.name,
            doctor.specialization
        )
        .trim()
        .to_string();

        let record = self
            .repo
            .insert(&NewEhrRecord {
                user_id: patient.id,
                title: title.clone(),
                category: category.as_str().to_string(),
                description: Some(description),
                file_name: Some(upload.file_name),
                file_type: Some(upload.content_type),
                file_path: Some(stored_name),
                file_size: Some(file_size),
                doctor_id: Some(doctor.id),
                record_date: Some(record_date),
                ..NewEhrRecord::default()
            })
            .await?;

        self.notifications.notify(
            patient.id,
            NotificationEvent::DoctorRecord {
                doctor_name: doctor.name.clone(),
                category: category.as_str().to_string(),
                title,
            },
        )?;

        tracing::info!(
            doctor_id = %doctor.id,
            user_id = %patient.id,
            record_id = %record.id,
            "Doctor file record added"
        );
        Ok(record)
    }

    pub async fn get_record(&self, user_id: i64, record_id: i64) -> Result<EhrRecord, EhrError> {
        Ok(self.repo.get(user_id, record_id).await?)
    }

    pub async fn list_records(
        &self,
        user_id: i64,
        category: Option<&str>,
        include_archived: bool,
    ) -> Result<Vec<EhrRecord>, EhrError> {
        Ok(self
            .repo
            .list_for_user(user_id, category, include_archived)
            .await?)
    }

    /// Update title and description; text and date only when provided.
    /// An unparseable date leaves the stored one untouched.
    pub async fn update_record(
        &self,
        user_id: i64,
        record_id: i64,
        title: String,
        description: Option<String>,
        text_content: Option<String>,
        record_date: Option<&str>,
    ) -> Result<EhrRecord, EhrError> {
        let mut record = self.repo.get(user_id, record_id).await?;

        record.title = title;
        record.description = description;
        if let Some(text) = text_content {
            record.text_content = Some(text);
        }
        if let Some(date) = record_date
            .filter(|s| !s.trim().is_empty())
            .and_then(parse_record_date)
        {
            record.record_date = Some(date);
        }

        self.repo.update(&record).await?;
        Ok(record)
    }

    /// Archive by default. Permanent deletion also removes the stored
    /// file from disk.
    pub async fn delete_record(
        &self,
        user_id: i64,
        record_id: i64,
        permanent: bool,
    ) -> Result<(), EhrError> {
        let record = self.repo.get(user_id, record_id).await?;

        if permanent {
            if let Some(stored) = record.file_path.as_deref() {
                let path = self.storage.user_dir(user_id).join(stored);
                if let Err(e) = fs::remove_file(&path).await {
                    tracing::debug!(record_id = %record_id, error = %e, "Stored file already absent");
                }
            }
            self.repo.delete(user_id, record_id).await?;
            tracing::info!(user_id = %user_id, record_id = %record_id, "Record permanently deleted");
        } else {
            self.repo.set_archived(user_id, record_id, true).await?;
            tracing::debug!(user_id = %user_id, record_id = %record_id, "Record archived");
        }
        Ok(())
    }

    pub async fn restore_record(&self, user_id: i64, record_id: i64) -> Result<(), EhrError> {
        self.repo.get(user_id, record_id).await?;
        self.repo.set_archived(user_id, record_id, false).await?;
        Ok(())
    }

    /// Resolve a record's stored file for download.
    pub async fn download(
        &self,
        user_id: i64,
        record_id: i64,
    ) -> Result<(EhrRecord, PathBuf), EhrError> {
        let record = self.repo.get(user_id, record_id).await?;
        let Some(stored) = record.file_path.as_deref() else {
            return Err(EhrError::NoFileAttached);
        };

        let path = self.storage.user_dir(user_id).join(stored);
        if fs::metadata(&path).await.is_err() {
            return Err(EhrError::FileMissing);
        }
        Ok((record, path))
    }

    pub fn statistics(records: &[EhrRecord]) -> EhrStatistics {
        let mut by_category: HashMap<String, usize> = HashMap::new();
        let mut total_file_size = 0;
        let mut file_count = 0;
        let mut text_record_count = 0;
        let mut oldest: Option<DateTime<Utc>> = None;
        let mut newest: Option<DateTime<Utc>> = None;

        for record in records {
            *by_category.entry(record.category.clone()).or_default() += 1;

            if record.file_path.is_some() {
                file_count += 1;
                total_file_size += record.file_size.unwrap_or(0);
            }
            if record.text_content.is_some() {
                text_record_count += 1;
            }

            if oldest.map_or(true, |t| record.created_at < t) {
                oldest = Some(record.created_at);
            }
            if newest.map_or(true, |t| record.created_at > t) {
                newest = Some(record.created_at);
            }
        }

        EhrStatistics {
            total_records: records.len(),
            by_category,
            total_file_size,
            file_count,
            text_record_count,
            oldest_record: oldest.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            newest_record: newest.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            total_file_size_formatted: format_file_size(total_file_size),
        }
    }

    /// Write an uploaded file into the user's directory and return the
    /// stored file name.
    async fn store_file(&self, user_id: i64, upload: &UploadedFile) -> Result<String, EhrError> {
        let dir = self.storage.user_dir(user_id);
        fs::create_dir_all(&dir).await?;

        let stored_name = unique_filename(&upload.file_name, &upload.content_type);
        fs::write(dir.join(&stored_name), &upload.data).await?;

        tracing::debug!(
            user_id = %user_id,
            file = %stored_name,
            size = upload.data.len(),
            "File stored"
        );
        Ok(stored_name)
    }
}

fn join_categories(categories: &[EhrCategory]) -> String {
    categories
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn validate_upload(upload: &UploadedFile) -> Result<(), EhrError> {
    if extension_for(&upload.content_type).is_none() {
        let allowed = FILE_TYPE_NAMES
            .iter()
            .map(|(_, name)| *name)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(EhrError::Invalid(format!(
            "File type not allowed. Allowed types: {}",
            allowed
        )));
    }
    if upload.data.len() > MAX_FILE_SIZE {
        return Err(EhrError::Invalid(format!(
            "File too large. Maximum size: {} MB",
            MAX_FILE_SIZE / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Accepts RFC 3339, a bare datetime, or a bare date.
fn parse_record_date(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = raw.trim().replace('Z', "+00:00");
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Collision-free stored name keeping a sanitized trace of the
/// original: `{uuid8}_{timestamp}_{name}{ext}`.
fn unique_filename(original_name: &str, content_type: &str) -> String {
    let ext = extension_for(content_type).unwrap_or(".bin");
    let unique_id = Uuid::new_v4().simple().to_string();
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    format!(
        "{}_{}_{}{}",
        &unique_id[..8],
        timestamp,
        sanitize_stem(original_name),
        ext
    )
}

/// Strip path components and the extension, keep only safe characters,
/// cap at fifty.
fn sanitize_stem(original_name: &str) -> String {
    let base = Path::new(original_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base.as_str(),
    };
    stem.chars()
        .filter(|c| c.is_alphanumeric() || "._- ".contains(*c))
        .take(50)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{DoctorAccountRepository, UserRepository};
    use crate::model::account::{NewDoctorAccount, NewUser};
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    struct Fixture {
        service: EhrService,
        store: Arc<NotificationStore>,
        user: User,
        pool: SqlitePool,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init_schema(&pool).await.unwrap();

        let user = UserRepository::new(pool.clone())
            .insert(&NewUser {
                name: "Asha Rao".to_string(),
                email: "asha@example.com".to_string(),
                password_hash: "x".to_string(),
            })
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(NotificationStore::new());
        let service = EhrService::new(
            StorageConfig {
                upload_dir: dir.path().to_string_lossy().into_owned(),
            },
            EhrRepository::new(pool.clone()),
            store.clone(),
        );

        Fixture {
            service,
            store,
            user,
            pool,
            _dir: dir,
        }
    }

    async fn seed_doctor(pool: &SqlitePool) -> DoctorAccount {
        DoctorAccountRepository::new(pool.clone())
            .insert(&NewDoctorAccount {
                name: "Dr. Anitha Kolukula".to_string(),
                email: "anitha@example.com".to_string(),
                password_hash: "x".to_string(),
                specialization: "General Physician".to_string(),
                license_number: None,
                hospital: None,
                contact: None,
            })
            .await
            .unwrap()
    }

    fn pdf_upload() -> UploadedFile {
        UploadedFile {
            file_name: "lab results.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: b"%PDF-1.4 test".to_vec(),
        }
    }

    #[tokio::test]
    async fn text_record_rejects_unknown_category() {
        let fx = fixture().await;
        let err = fx
            .service
            .create_text_record(fx.user.id, "Note".to_string(), "x_ray", None, None, None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid category. Valid categories: prescription, lab_report, scan_image, \
             op_note, prediction, doctor_prescription, doctor_report, doctor_note"
        );
    }

    #[tokio::test]
    async fn text_record_rejects_malformed_dates() {
        let fx = fixture().await;
        let err = fx
            .service
            .create_text_record(
                fx.user.id,
                "Note".to_string(),
                "op_note",
                None,
                Some("saw the doctor".to_string()),
                Some("yesterday"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid date format. Use ISO format.");
    }

    #[tokio::test]
    async fn text_record_creates_and_notifies() {
        let fx = fixture().await;
        let record = fx
            .service
            .create_text_record(
                fx.user.id,
                "OP Visit".to_string(),
                "op_note",
                None,
                Some("saw the doctor".to_string()),
                Some("2024-03-01"),
            )
            .await
            .unwrap();
        assert_eq!(record.category, "op_note");
        assert!(record.record_date.is_some());

        let (notifications, unread) = fx.store.list(fx.user.id, false, 50).unwrap();
        assert_eq!(unread, 1);
        assert!(notifications[0].message.contains("OP Visit"));
    }

    #[tokio::test]
    async fn file_upload_round_trips_through_download() {
        let fx = fixture().await;
        let record = fx
            .service
            .create_file_record(
                fx.user.id,
                pdf_upload(),
                "Blood work".to_string(),
                "lab_report",
                None,
                Some("not-a-date"),
            )
            .await
            .unwrap();

        // Invalid upload dates are dropped silently
        assert!(record.record_date.is_none());
        assert_eq!(record.file_name.as_deref(), Some("lab results.pdf"));

        let (resolved, path) = fx.service.download(fx.user.id, record.id).await.unwrap();
        assert_eq!(resolved.id, record.id);
        assert_eq!(fs::read(&path).await.unwrap(), b"%PDF-1.4 test");
    }

    #[tokio::test]
    async fn uploads_validate_type_and_size() {
        let fx = fixture().await;

        let mut upload = pdf_upload();
        upload.content_type = "application/zip".to_string();
        let err = fx
            .service
            .create_file_record(
                fx.user.id,
                upload,
                "Archive".to_string(),
                "lab_report",
                None,
                None,
            )
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("File type not allowed."));

        let mut huge = pdf_upload();
        huge.data = vec![0u8; MAX_FILE_SIZE + 1];
        let err = fx
            .service
            .create_file_record(
                fx.user.id,
                huge,
                "Huge".to_string(),
                "lab_report",
                None,
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "File too large. Maximum size: 10 MB");

        let err = fx
            .service
            .create_file_record(
                fx.user.id,
                pdf_upload(),
                "Prediction".to_string(),
                "prediction",
                None,
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid category for upload. Valid: prescription, lab_report, scan_image, \
             op_note, doctor_prescription, doctor_report, doctor_note"
        );
    }

    #[tokio::test]
    async fn archive_hides_and_restore_recovers() {
        let fx = fixture().await;
        let record = fx
            .service
            .create_text_record(
                fx.user.id,
                "Note".to_string(),
                "op_note",
                None,
                Some("text".to_string()),
                None,
            )
            .await
            .unwrap();

        fx.service
            .delete_record(fx.user.id, record.id, false)
            .await
            .unwrap();
        assert!(fx
            .service
            .list_records(fx.user.id, None, false)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            fx.service
                .list_records(fx.user.id, None, true)
                .await
                .unwrap()
                .len(),
            1
        );

        fx.service
            .restore_record(fx.user.id, record.id)
            .await
            .unwrap();
        assert_eq!(
            fx.service
                .list_records(fx.user.id, None, false)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn permanent_delete_removes_the_stored_file() {
        let fx = fixture().await;
        let record = fx
            .service
            .create_file_record(
                fx.user.id,
                pdf_upload(),
                "Blood work".to_string(),
                "lab_report",
                None,
                None,
            )
            .await
            .unwrap();
        let (_, path) = fx.service.download(fx.user.id, record.id).await.unwrap();

        fx.service
            .delete_record(fx.user.id, record.id, true)
            .await
            .unwrap();
        assert!(fs::metadata(&path).await.is_err());
        assert!(fx
            .service
            .get_record(fx.user.id, record.id)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn update_keeps_text_when_not_provided() {
        let fx = fixture().await;
        let record = fx
            .service
            .create_text_record(
                fx.user.id,
                "Note".to_string(),
                "op_note",
                Some("before".to_string()),
                Some("original text".to_string()),
                None,
            )
            .await
            .unwrap();

        let updated = fx
            .service
            .update_record(
                fx.user.id,
                record.id,
                "Renamed".to_string(),
                None,
                None,
                Some("garbage-date"),
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.description, None);
        assert_eq!(updated.text_content.as_deref(), Some("original text"));
    }

    #[tokio::test]
    async fn doctor_text_record_is_signed_and_dated() {
        let fx = fixture().await;
        let doctor = seed_doctor(&fx.pool).await;

        let record = fx
            .service
            .add_doctor_text_record(
                &fx.user,
                &doctor,
                DoctorRecordInput {
                    title: "Consultation".to_string(),
                    category: "doctor_note".to_string(),
                    diagnosis: Some("Seasonal flu".to_string()),
                    notes: Some("Rest for three days".to_string()),
                    ..DoctorRecordInput::default()
                },
            )
            .await
            .unwrap();

        let text = record.text_content.unwrap();
        assert!(text.starts_with("DIAGNOSIS:\nSeasonal flu\n\nDOCTOR'S NOTES:\nRest for three days"));
        assert!(text.contains("Recorded by: Dr. Anitha Kolukula"));
        assert!(text.contains("Specialization: General Physician"));
        assert_eq!(record.doctor_id, Some(doctor.id));
        assert!(record.record_date.is_some());

        let err = fx
            .service
            .add_doctor_text_record(
                &fx.user,
                &doctor,
                DoctorRecordInput {
                    title: "Scan".to_string(),
                    category: "scan_image".to_string(),
                    ..DoctorRecordInput::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid category. Valid: doctor_prescription, doctor_report, doctor_note, \
             prescription, lab_report, op_note"
        );
    }

    #[tokio::test]
    async fn doctor_file_record_appends_uploader_to_description() {
        let fx = fixture().await;
        let doctor = seed_doctor(&fx.pool).await;

        let record = fx
            .service
            .add_doctor_file_record(
                &fx.user,
                &doctor,
                pdf_upload(),
                "Scan".to_string(),
                "lab_report",
                Some("Chest scan".to_string()),
                None,
            )
            .await
            .unwrap();
        assert_eq!(
            record.description.as_deref(),
            Some("Chest scan\n\nUploaded by: Dr. Anitha Kolukula (General Physician)")
        );

        // Without a description only the uploader line remains
        let record = fx
            .service
            .add_doctor_file_record(
                &fx.user,
                &doctor,
                pdf_upload(),
                "Scan".to_string(),
                "scan_image",
                None,
                None,
            )
            .await
            .unwrap();
        assert_eq!(
            record.description.as_deref(),
            Some("Uploaded by: Dr. Anitha Kolukula (General Physician)")
        );
    }

    #[tokio::test]
    async fn statistics_aggregate_files_and_text() {
        let fx = fixture().await;
        fx.service
            .create_file_record(
                fx.user.id,
                pdf_upload(),
                "Blood work".to_string(),
                "lab_report",
                None,
                None,
            )
            .await
            .unwrap();
        fx.service
            .create_text_record(
                fx.user.id,
                "Note".to_string(),
                "op_note",
                None,
                Some("text".to_string()),
                None,
            )
            .await
            .unwrap();

        let records = fx
            .service
            .list_records(fx.user.id, None, false)
            .await
            .unwrap();
        let stats = EhrService::statistics(&records);
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.file_count, 1);
        assert_eq!(stats.text_record_count, 1);
        assert_eq!(stats.by_category.get("lab_report"), Some(&1));
        assert_eq!(stats.by_category.get("op_note"), Some(&1));
        assert_eq!(stats.total_file_size, 13);
        assert_eq!(stats.total_file_size_formatted, "13 B");
        assert!(stats.oldest_record.is_some());
    }

    #[test]
    fn stored_names_are_sanitized() {
        assert_eq!(sanitize_stem("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_stem("lab results.pdf"), "lab results");
        assert_eq!(sanitize_stem("we!rd@name#.png"), "werdname");

        let name = unique_filename("lab results.pdf", "application/pdf");
        assert!(name.ends_with("_lab results.pdf"));
        let name = unique_filename("data.bin", "application/unknown");
        assert!(name.ends_with(".bin"));
    }

    #[test]
    fn record_dates_parse_in_common_forms() {
        assert!(parse_record_date("2024-03-01T10:30:00Z").is_some());
        assert!(parse_record_date("2024-03-01T10:30:00+05:30").is_some());
        assert!(parse_record_date("2024-03-01T10:30:00").is_some());
        assert!(parse_record_date("2024-03-01").is_some());
        assert!(parse_record_date("yesterday").is_none());
    }
}
