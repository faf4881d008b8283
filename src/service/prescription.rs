//! Prescription lifecycle and adherence tracking
//!
//! A patient has at most one active prescription. Creating a new one
//! deactivates the rest and files a copy into the patient's records.

use std::sync::Arc;

use chrono::Utc;

use crate::db::repository::{DoctorAccountRepository, EhrRepository, PrescriptionRepository};
use crate::db::DbError;
use crate::model::account::{DoctorAccount, User};
use crate::model::ehr::{EhrCategory, NewEhrRecord};
use crate::model::notification::NotificationEvent;
use crate::model::prescription::{NewPrescription, Prescription};
use crate::service::notification::{NotificationError, NotificationStore};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PrescriptionError {
    #[error("No active prescription found")]
    NoActive,

    #[error("Prescription not found")]
    NotFound,

    #[error("Cannot update inactive prescription")]
    Inactive,

    #[error("Notification store error: {0}")]
    Notify(#[from] NotificationError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

#[derive(Clone)]
pub struct PrescriptionService {
    prescriptions: PrescriptionRepository,
    doctors: DoctorAccountRepository,
    ehr: EhrRepository,
    notifications: Arc<NotificationStore>,
}

impl PrescriptionService {
    pub fn new(
        prescriptions: PrescriptionRepository,
        doctors: DoctorAccountRepository,
        ehr: EhrRepository,
        notifications: Arc<NotificationStore>,
    ) -> Self {
        Self {
            prescriptions,
            doctors,
            ehr,
            notifications,
        }
    }

    /// Create a prescription for a patient, replacing any active one.
    /// A copy lands in the patient's health records and the patient is
    /// notified.
    pub async fn create(
        &self,
        patient: &User,
        doctor: &DoctorAccount,
        notes: String,
        total_days: i64,
    ) -> Result<Prescription, PrescriptionError> {
        let deactivated = self
            .prescriptions
            .deactivate_all_for_user(patient.id)
            .await?;
        if deactivated > 0 {
            tracing::debug!(
                user_id = %patient.id,
                count = deactivated,
                "Previous prescriptions deactivated"
            );
        }

        let prescription = self
            .prescriptions
            .insert(&NewPrescription {
                user_id: patient.id,
                doctor_id: doctor.id,
                notes: notes.clone(),
                total_days,
            })
            .await?;

        let now = Utc::now();
        self.ehr
            .insert(&NewEhrRecord {
                user_id: patient.id,
                title: format!("Prescription - {}", now.format("%d %b %Y")),
                category: EhrCategory::DoctorPrescription.as_str().to_string(),
                description: Some(format!(
                    "Prescribed by Dr. {}. Duration: {} days.",
                    doctor.name, total_days
                )),
                text_content: Some(notes),
                doctor_id: Some(doctor.id),
                record_date: Some(now),
                ..NewEhrRecord::default()
            })
            .await?;

        self.notifications.notify(
            patient.id,
            NotificationEvent::PrescriptionAssigned {
                doctor_name: doctor.name.clone(),
            },
        )?;

        tracing::info!(
            doctor_id = %doctor.id,
            user_id = %patient.id,
            prescription_id = %prescription.id,
            "Prescription created"
        );
        Ok(prescription)
    }

    /// The patient's active prescription with the prescribing doctor's
    /// name.
    pub async fn active_for_user(
        &self,
        user_id: i64,
    ) -> Result<(Prescription, String), PrescriptionError> {
        let prescription = self
            .prescriptions
            .find_active_for_user(user_id)
            .await?
            .ok_or(PrescriptionError::NoActive)?;

        let doctor = self.doctors.get_by_id(prescription.doctor_id).await?;
        Ok((prescription, doctor.name))
    }

    /// Replace the set of ticked days. Days outside `0..total_days`
    /// are dropped.
    pub async fn update_progress(
        &self,
        user_id: i64,
        prescription_id: i64,
        completed_days: &[i64],
    ) -> Result<(), PrescriptionError> {
        let prescription = match self.prescriptions.get(user_id, prescription_id).await {
            Ok(p) => p,
            Err(DbError::NotFound(_)) => return Err(PrescriptionError::NotFound),
            Err(e) => return Err(e.into()),
        };

        if !prescription.is_active {
            return Err(PrescriptionError::Inactive);
        }

        let valid_days: Vec<i64> = completed_days
            .iter()
            .copied()
            .filter(|d| (0..prescription.total_days).contains(d))
            .collect();

        self.prescriptions
            .update_completed_days(prescription.id, &valid_days)
            .await?;

        tracing::debug!(
            user_id = %user_id,
            prescription_id = %prescription_id,
            days = valid_days.len(),
            "Prescription progress updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::UserRepository;
    use crate::model::account::{NewDoctorAccount, NewUser};
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    struct Fixture {
        service: PrescriptionService,
        store: Arc<NotificationStore>,
        ehr: EhrRepository,
        user: User,
        doctor: DoctorAccount,
    }

    async fn fixture() -> Fixture {
        let pool: SqlitePool = SqlitePoolOptions::new()
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
        let doctor = DoctorAccountRepository::new(pool.clone())
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
            .unwrap();

        let store = Arc::new(NotificationStore::new());
        let ehr = EhrRepository::new(pool.clone());
        let service = PrescriptionService::new(
            PrescriptionRepository::new(pool.clone()),
            DoctorAccountRepository::new(pool.clone()),
            ehr.clone(),
            store.clone(),
        );

        Fixture {
            service,
            store,
            ehr,
            user,
            doctor,
        }
    }

    #[tokio::test]
    async fn create_files_a_record_and_notifies() {
        let fx = fixture().await;
        let prescription = fx
            .service
            .create(&fx.user, &fx.doctor, "1 tablet daily".to_string(), 7)
            .await
            .unwrap();
        assert!(prescription.is_active);
        assert_eq!(prescription.total_days, 7);
        assert!(prescription.completed_days.is_empty());

        let records = fx
            .ehr
            .list_for_user(fx.user.id, None, false)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, "doctor_prescription");
        assert!(records[0].title.starts_with("Prescription - "));
        assert_eq!(records[0].text_content.as_deref(), Some("1 tablet daily"));
        assert_eq!(records[0].doctor_id, Some(fx.doctor.id));

        let (notifications, unread) = fx.store.list(fx.user.id, false, 50).unwrap();
        assert_eq!(unread, 1);
        assert!(notifications[0]
            .message
            .contains("Dr. Dr. Anitha Kolukula has assigned a new prescription"));
    }

    #[tokio::test]
    async fn a_new_prescription_replaces_the_active_one() {
        let fx = fixture().await;
        let first = fx
            .service
            .create(&fx.user, &fx.doctor, "old".to_string(), 5)
            .await
            .unwrap();
        let second = fx
            .service
            .create(&fx.user, &fx.doctor, "new".to_string(), 10)
            .await
            .unwrap();

        let (active, doctor_name) = fx.service.active_for_user(fx.user.id).await.unwrap();
        assert_eq!(active.id, second.id);
        assert_eq!(doctor_name, "Dr. Anitha Kolukula");

        let err = fx
            .service
            .update_progress(fx.user.id, first.id, &[0])
            .await
            .unwrap_err();
        assert!(matches!(err, PrescriptionError::Inactive));
    }

    #[tokio::test]
    async fn no_active_prescription_is_its_own_error() {
        let fx = fixture().await;
        let err = fx.service.active_for_user(fx.user.id).await.unwrap_err();
        assert!(matches!(err, PrescriptionError::NoActive));
    }

    #[tokio::test]
    async fn progress_drops_days_outside_the_duration() {
        let fx = fixture().await;
        let prescription = fx
            .service
            .create(&fx.user, &fx.doctor, "1 tablet daily".to_string(), 7)
            .await
            .unwrap();

        fx.service
            .update_progress(fx.user.id, prescription.id, &[-1, 0, 3, 6, 7, 99])
            .await
            .unwrap();

        let (active, _) = fx.service.active_for_user(fx.user.id).await.unwrap();
        assert_eq!(active.completed_days, vec![0, 3, 6]);
        assert_eq!(active.progress_percentage(), 42);
    }

    #[tokio::test]
    async fn progress_for_missing_prescription_is_not_found() {
        let fx = fixture().await;
        let err = fx
            .service
            .update_progress(fx.user.id, 999, &[0])
            .await
            .unwrap_err();
        assert!(matches!(err, PrescriptionError::NotFound));
    }
}
