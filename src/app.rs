//! Application state and service initialization
//!
//! This module centralizes all service initialization and dependency injection,
//! making it easier to manage the application lifecycle and test services.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::db::repository::{
    DoctorAccountRepository, EhrRepository, PredictionRepository, PrescriptionRepository,
    UserRepository,
};
use crate::model::catalog::Catalog;
use crate::model::Config;
use crate::service::classifier::{KeywordClassifier, SymptomClassifier};
use crate::service::{
    AccountService, EhrService, NotificationStore, PrescriptionService, TriageService,
};

/// Application state containing all services and shared resources
///
/// This struct centralizes service initialization and makes it easy to inject
/// dependencies into Actix-web handlers.
pub struct AppState {
    /// Database connection pool
    pub db_pool: SqlitePool,
    /// Static catalogs (diseases, precautions, doctor directory)
    pub catalog: Arc<Catalog>,
    /// In-process notification store
    pub notifications: Arc<NotificationStore>,
    /// Accounts and authentication
    pub account_service: AccountService,
    /// Symptom triage pipeline
    pub triage_service: TriageService,
    /// Health record management
    pub ehr_service: EhrService,
    /// Prescription lifecycle
    pub prescription_service: PrescriptionService,
}

impl AppState {
    /// Initialize all services and build application state
    ///
    /// This performs:
    /// 1. Database connection and schema initialization
    /// 2. Static catalog parsing
    /// 3. Classifier construction
    /// 4. Service dependency graph construction and demo seeding
    pub async fn new(config: Config) -> Result<Self, AppError> {
        // Initialize the SQLite database
        let db_pool = crate::db::create_pool()
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        crate::db::init_schema(&db_pool)
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        // Parse the embedded catalogs. A failure here is a packaging
        // bug, not a runtime condition.
        let catalog =
            Arc::new(Catalog::load_embedded().map_err(|e| AppError::StaticData(e.to_string()))?);

        // A catalog without diseases leaves the service up but unable
        // to predict; /v1/predict answers 503 until fixed.
        let classifier: Option<Arc<dyn SymptomClassifier>> =
            match KeywordClassifier::from_catalog(catalog.diseases.clone()) {
                Ok(classifier) => Some(Arc::new(classifier)),
                Err(e) => {
                    tracing::warn!(error = %e, "Classifier unavailable, predictions disabled");
                    None
                }
            };

        let notifications = Arc::new(NotificationStore::new());

        let account_service = AccountService::new(
            UserRepository::new(db_pool.clone()),
            DoctorAccountRepository::new(db_pool.clone()),
            config.jwt_secret.clone(),
        );

        let ehr_service = EhrService::new(
            config.storage.clone(),
            EhrRepository::new(db_pool.clone()),
            notifications.clone(),
        );

        let triage_service = TriageService::new(
            classifier,
            catalog.clone(),
            PredictionRepository::new(db_pool.clone()),
            ehr_service.clone(),
            notifications.clone(),
        );

        let prescription_service = PrescriptionService::new(
            PrescriptionRepository::new(db_pool.clone()),
            DoctorAccountRepository::new(db_pool.clone()),
            EhrRepository::new(db_pool.clone()),
            notifications.clone(),
        );

        if config.seed_demo_doctors {
            let created = account_service
                .seed_demo_doctors()
                .await
                .map_err(|e| AppError::Seeding(e.to_string()))?;
            if created > 0 {
                tracing::info!(created = created, "Demo doctor accounts seeded");
            }
        }

        Ok(Self {
            db_pool,
            catalog,
            notifications,
            account_service,
            triage_service,
            ehr_service,
            prescription_service,
        })
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Database initialization failed
    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),

    /// Embedded catalog data failed to parse
    #[error("Static catalog data is invalid: {0}")]
    StaticData(String),

    /// Demo account seeding failed
    #[error("Demo doctor seeding failed: {0}")]
    Seeding(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StorageConfig;

    fn test_config(dir: &tempfile::TempDir) -> Config {
        Config {
            storage: StorageConfig {
                upload_dir: dir.path().join("uploads").to_string_lossy().into_owned(),
            },
            seed_demo_doctors: true,
            jwt_secret: "test-secret".to_string(),
            port: 0,
            host: "127.0.0.1".to_string(),
        }
    }

    #[tokio::test]
    async fn state_builds_and_seeds_against_a_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var(
            "PREDICT_CARE_DATABASE_URL",
            format!("sqlite://{}", dir.path().join("app.db").display()),
        );

        let state = AppState::new(test_config(&dir)).await.unwrap();
        assert!(state.triage_service.classifier_loaded());
        assert_eq!(state.catalog.diseases.len(), 50);

        // Seeded demo doctors can log in
        let (doctor, _) = state
            .account_service
            .doctor_login("anitha.kolukula@predictcare.com", "doctor123")
            .await
            .unwrap();
        assert_eq!(doctor.specialization, "General Physician");

        std::env::remove_var("PREDICT_CARE_DATABASE_URL");
    }
}
