//! Symptom triage pipeline
//!
//! One prediction runs classification, risk resolution, advice
//! generation and doctor matching, persists the outcome, raises the
//! user's notifications and files a copy into the health records.

use std::sync::Arc;

use crate::db::repository::PredictionRepository;
use crate::db::DbError;
use crate::model::account::User;
use crate::model::catalog::{Catalog, Doctor, RiskLevel};
use crate::model::notification::NotificationEvent;
use crate::model::triage::{NewPrediction, Prediction};
use crate::service::classifier::SymptomClassifier;
use crate::service::doctor_match::{recommend_doctors, DEFAULT_LIMIT};
use crate::service::ehr::{EhrError, EhrService};
use crate::service::notification::{NotificationError, NotificationStore};
use crate::service::precaution::{self, GeneratedAdvice};
use crate::service::risk::resolve_risk;

/// How many recent predictions feed the recurrence check
const HISTORY_WINDOW: i64 = 10;

/// Same disease seen this often among recent predictions marks it
/// recurring
const RECURRING_COUNT: usize = 2;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TriageError {
    #[error("Symptoms cannot be empty. Please enter your symptoms.")]
    EmptySymptoms,

    #[error("Please enter more descriptive symptoms.")]
    TooShort,

    #[error("Model not loaded. Please contact an administrator.")]
    ClassifierUnavailable,

    #[error("Notification store error: {0}")]
    Notify(#[from] NotificationError),

    #[error("Health record error: {0}")]
    Ehr(#[from] EhrError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

/// Everything one prediction produces.
#[derive(Debug)]
pub struct TriageOutcome {
    pub prediction: Prediction,
    /// Confidence warning shown alongside the result, empty when none
    pub message: &'static str,
    pub advice: GeneratedAdvice,
    pub recommended_doctors: Vec<Doctor>,
}

#[derive(Clone)]
pub struct TriageService {
    classifier: Option<Arc<dyn SymptomClassifier>>,
    catalog: Arc<Catalog>,
    predictions: PredictionRepository,
    ehr: EhrService,
    notifications: Arc<NotificationStore>,
}

impl TriageService {
    pub fn new(
        classifier: Option<Arc<dyn SymptomClassifier>>,
        catalog: Arc<Catalog>,
        predictions: PredictionRepository,
        ehr: EhrService,
        notifications: Arc<NotificationStore>,
    ) -> Self {
        Self {
            classifier,
            catalog,
            predictions,
            ehr,
            notifications,
        }
    }

    /// Whether predictions can be served at all.
    pub fn classifier_loaded(&self) -> bool {
        self.classifier.is_some()
    }

    /// Run the full triage pipeline for a symptom description.
    pub async fn predict(&self, user: &User, symptoms: &str) -> Result<TriageOutcome, TriageError> {
        let classifier = self
            .classifier
            .as_ref()
            .ok_or(TriageError::ClassifierUnavailable)?;

        let symptoms = symptoms.trim();
        if symptoms.is_empty() {
            return Err(TriageError::EmptySymptoms);
        }
        if symptoms.chars().count() < 3 {
            return Err(TriageError::TooShort);
        }

        let normalized = symptoms.to_lowercase();
        let classification = classifier.classify(&normalized);
        let raw_confidence = classification.confidence();
        let disease = classification.label;

        // Risk is resolved from the raw probability; the rounded value
        // is for display and storage only.
        let base_risk = self.catalog.diseases.base_risk(&disease);
        let (risk_level, message) = resolve_risk(raw_confidence, base_risk);
        let confidence = round2(raw_confidence);

        let previous = self
            .predictions
            .list_for_user(user.id, Some(HISTORY_WINDOW))
            .await?;
        let is_recurring = previous
            .iter()
            .filter(|p| p.predicted_disease == disease)
            .count()
            >= RECURRING_COUNT;

        let advice = precaution::generate_advice(
            &self.catalog.precautions,
            &disease,
            confidence,
            risk_level,
            user.first_name(),
            &previous,
        );

        let recommended_doctors =
            recommend_doctors(&self.catalog.directory, &disease, risk_level, DEFAULT_LIMIT);

        let prediction = self
            .predictions
            .insert(&NewPrediction {
                user_id: user.id,
                symptoms_text: symptoms.to_string(),
                predicted_disease: disease.clone(),
                confidence,
                risk_level,
                precautions_text: Some(precaution::format_advice_for_storage(&advice)),
                advice_level: Some(advice.advice_level),
            })
            .await?;

        self.notifications.notify(
            user.id,
            NotificationEvent::PredictionComplete {
                disease: disease.clone(),
            },
        )?;
        if risk_level == RiskLevel::High {
            self.notifications.notify(user.id, NotificationEvent::HighRisk)?;
        }
        self.notifications.notify(
            user.id,
            NotificationEvent::AdviceReady {
                disease: disease.clone(),
            },
        )?;
        if is_recurring {
            self.notifications.notify(
                user.id,
                NotificationEvent::RecurringCondition { disease },
            )?;
        }

        self.ehr.add_prediction_record(&prediction).await?;

        tracing::info!(
            user_id = %user.id,
            disease = %prediction.predicted_disease,
            risk = %prediction.risk_level,
            confidence = prediction.confidence,
            "Prediction complete"
        );

        Ok(TriageOutcome {
            prediction,
            message,
            advice,
            recommended_doctors,
        })
    }

    /// The user's predictions, newest first, each with doctor
    /// recommendations recomputed from its stored outcome.
    pub async fn history(
        &self,
        user_id: i64,
    ) -> Result<Vec<(Prediction, Vec<Doctor>)>, TriageError> {
        let predictions = self.predictions.list_for_user(user_id, None).await?;
        Ok(predictions
            .into_iter()
            .map(|p| {
                let doctors = recommend_doctors(
                    &self.catalog.directory,
                    &p.predicted_disease,
                    p.risk_level,
                    DEFAULT_LIMIT,
                );
                (p, doctors)
            })
            .collect())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{EhrRepository, UserRepository};
    use crate::model::account::NewUser;
    use crate::model::config::StorageConfig;
    use crate::service::classifier::{Classification, KeywordClassifier};
    use sqlx::sqlite::SqlitePoolOptions;

    struct Fixture {
        service: TriageService,
        store: Arc<NotificationStore>,
        ehr: EhrRepository,
        user: User,
        _dir: tempfile::TempDir,
    }

    async fn fixture(with_classifier: bool) -> Fixture {
        let catalog = Arc::new(Catalog::load_embedded().unwrap());
        let classifier: Option<Arc<dyn SymptomClassifier>> = if with_classifier {
            Some(Arc::new(
                KeywordClassifier::from_catalog(catalog.diseases.clone()).unwrap(),
            ))
        } else {
            None
        };
        fixture_with(catalog, classifier).await
    }

    async fn fixture_with(
        catalog: Arc<Catalog>,
        classifier: Option<Arc<dyn SymptomClassifier>>,
    ) -> Fixture {
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
        let ehr_repo = EhrRepository::new(pool.clone());
        let ehr = EhrService::new(
            StorageConfig {
                upload_dir: dir.path().to_string_lossy().into_owned(),
            },
            ehr_repo.clone(),
            store.clone(),
        );

        let service = TriageService::new(
            classifier,
            catalog,
            PredictionRepository::new(pool.clone()),
            ehr,
            store.clone(),
        );

        Fixture {
            service,
            store,
            ehr: ehr_repo,
            user,
            _dir: dir,
        }
    }

    /// Returns a fixed distribution, for pinning boundary confidences
    /// the keyword scorer never produces.
    struct FixedClassifier {
        label: &'static str,
        confidence: f64,
    }

    impl SymptomClassifier for FixedClassifier {
        fn classify(&self, _symptoms: &str) -> Classification {
            let rest = (1.0 - self.confidence) / 2.0;
            Classification {
                label: self.label.to_string(),
                probabilities: vec![
                    (self.label.to_string(), self.confidence),
                    ("Influenza".to_string(), rest),
                    ("Migraine".to_string(), rest),
                ],
            }
        }
    }

    #[tokio::test]
    async fn risk_resolves_from_the_unrounded_confidence() {
        let catalog = Arc::new(Catalog::load_embedded().unwrap());
        let fx = fixture_with(
            catalog,
            Some(Arc::new(FixedClassifier {
                label: "Common Cold",
                confidence: 0.398,
            })),
        )
        .await;

        let outcome = fx
            .service
            .predict(&fx.user, "sniffles and a sore throat")
            .await
            .unwrap();

        // 0.398 rounds up to 0.40 but still sits below the threshold.
        assert_eq!(outcome.prediction.risk_level, RiskLevel::High);
        assert!(outcome.message.contains("Low confidence"));
        assert_eq!(outcome.prediction.confidence, 0.4);
    }

    #[tokio::test]
    async fn predict_runs_the_whole_pipeline() {
        let fx = fixture(true).await;
        let outcome = fx
            .service
            .predict(&fx.user, "Sneezing with an itchy nose and itchy throat")
            .await
            .unwrap();

        assert_eq!(outcome.prediction.predicted_disease, "Allergic Rhinitis");
        assert_eq!(outcome.prediction.confidence, 0.75);
        assert_eq!(outcome.prediction.risk_level, RiskLevel::Low);
        assert_eq!(outcome.message, "");
        assert_eq!(outcome.recommended_doctors.len(), 3);
        assert!(outcome
            .prediction
            .precautions_text
            .as_deref()
            .unwrap()
            .starts_with("Advice Level:"));

        // Prediction complete, advice ready and the record copy.
        // No high risk alert for a LOW risk outcome.
        let (notifications, unread) = fx.store.list(fx.user.id, false, 50).unwrap();
        assert_eq!(unread, 3);
        assert!(notifications[2].message.contains("Allergic Rhinitis"));

        let records = fx
            .ehr
            .list_for_user(fx.user.id, Some("prediction"), false)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].prediction_id, Some(outcome.prediction.id));
        assert!(records[0]
            .text_content
            .as_deref()
            .unwrap()
            .contains("SYMPTOMS REPORTED:"));
    }

    #[tokio::test]
    async fn predict_validates_input() {
        let fx = fixture(true).await;

        let err = fx.service.predict(&fx.user, "   ").await.unwrap_err();
        assert!(matches!(err, TriageError::EmptySymptoms));

        let err = fx.service.predict(&fx.user, "ab").await.unwrap_err();
        assert!(matches!(err, TriageError::TooShort));
    }

    #[tokio::test]
    async fn predict_requires_a_classifier() {
        let fx = fixture(false).await;
        assert!(!fx.service.classifier_loaded());

        let err = fx
            .service
            .predict(&fx.user, "fever and cough")
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::ClassifierUnavailable));
    }

    #[tokio::test]
    async fn third_occurrence_flags_a_recurring_condition() {
        let fx = fixture(true).await;
        let symptoms = "sneezing with an itchy nose and itchy throat";

        fx.service.predict(&fx.user, symptoms).await.unwrap();
        fx.service.predict(&fx.user, symptoms).await.unwrap();
        let (notifications, _) = fx.store.list(fx.user.id, false, 50).unwrap();
        assert!(!notifications
            .iter()
            .any(|n| n.message.contains("multiple times")));

        fx.service.predict(&fx.user, symptoms).await.unwrap();
        let (notifications, _) = fx.store.list(fx.user.id, false, 50).unwrap();
        assert!(notifications
            .iter()
            .any(|n| n.message.contains("multiple times")));
    }

    #[tokio::test]
    async fn history_recomputes_recommendations_newest_first() {
        let fx = fixture(true).await;
        fx.service
            .predict(&fx.user, "sneezing with an itchy nose and itchy throat")
            .await
            .unwrap();
        fx.service
            .predict(&fx.user, "wheezing and chest tightness at night")
            .await
            .unwrap();

        let history = fx.service.history(fx.user.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].0.predicted_disease, "Asthma");
        assert_eq!(history[1].0.predicted_disease, "Allergic Rhinitis");
        assert!(!history[0].1.is_empty());
        assert!(!history[1].1.is_empty());
    }
}
