//! Symptom prediction endpoints

use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::auth::AuthenticatedUser;
use crate::api::doctors::DoctorInfo;
use crate::api::error::ApiError;
use crate::model::catalog::Doctor;
use crate::model::triage::Prediction;
use crate::service::TriageService;

/// Prediction request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct PredictRequest {
    /// Free-text symptom description
    pub symptoms: String,
}

/// Full outcome of one prediction
#[derive(Debug, Serialize, ToSchema)]
pub struct PredictionResponse {
    pub disease: String,
    pub risk: String,
    pub confidence: f64,
    /// Confidence warning, empty when the prediction is trusted
    pub message: String,
    pub advice_level: String,
    pub precautions: Vec<String>,
    pub dos: Vec<String>,
    pub donts: Vec<String>,
    pub consult_when: Vec<String>,
    pub disclaimer: String,
    pub recommended_doctors: Vec<DoctorInfo>,
}

/// One stored prediction in the history listing
#[derive(Debug, Serialize, ToSchema)]
pub struct PredictionHistoryEntry {
    pub id: i64,
    pub symptoms: String,
    pub disease: String,
    pub risk: String,
    pub confidence: f64,
    pub advice_level: Option<String>,
    pub precautions_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub recommended_doctors: Vec<DoctorInfo>,
}

impl PredictionHistoryEntry {
    fn from_parts(prediction: Prediction, doctors: Vec<Doctor>) -> Self {
        Self {
            id: prediction.id,
            symptoms: prediction.symptoms_text,
            disease: prediction.predicted_disease,
            risk: prediction.risk_level.as_str().to_string(),
            confidence: prediction.confidence,
            advice_level: prediction.advice_level.map(|a| a.as_str().to_string()),
            precautions_text: prediction.precautions_text,
            created_at: prediction.created_at,
            recommended_doctors: doctors.iter().map(DoctorInfo::from).collect(),
        }
    }
}

/// Predict a condition from free-text symptoms
#[utoipa::path(
    post,
    path = "/v1/predict",
    request_body = PredictRequest,
    responses(
        (status = 200, description = "Prediction complete", body = PredictionResponse),
        (status = 400, description = "Empty or too-short symptom text"),
        (status = 401, description = "Invalid authentication credentials"),
        (status = 503, description = "Classifier not loaded")
    ),
    security(("bearer" = [])),
    tag = "triage"
)]
#[post("/v1/predict")]
pub async fn predict(
    service: web::Data<TriageService>,
    user: AuthenticatedUser,
    body: web::Json<PredictRequest>,
) -> Result<impl Responder, ApiError> {
    let outcome = service.predict(&user.0, &body.symptoms).await?;

    Ok(HttpResponse::Ok().json(PredictionResponse {
        disease: outcome.prediction.predicted_disease,
        risk: outcome.prediction.risk_level.as_str().to_string(),
        confidence: outcome.prediction.confidence,
        message: outcome.message.to_string(),
        advice_level: outcome.advice.advice_level.as_str().to_string(),
        precautions: outcome.advice.precautions,
        dos: outcome.advice.dos,
        donts: outcome.advice.donts,
        consult_when: outcome.advice.consult_when,
        disclaimer: outcome.advice.disclaimer,
        recommended_doctors: outcome
            .recommended_doctors
            .iter()
            .map(DoctorInfo::from)
            .collect(),
    }))
}

/// The caller's prediction history, newest first
#[utoipa::path(
    get,
    path = "/v1/predictions/me",
    responses(
        (status = 200, description = "Stored predictions", body = [PredictionHistoryEntry]),
        (status = 401, description = "Invalid authentication credentials")
    ),
    security(("bearer" = [])),
    tag = "triage"
)]
#[get("/v1/predictions/me")]
pub async fn prediction_history(
    service: web::Data<TriageService>,
    user: AuthenticatedUser,
) -> Result<impl Responder, ApiError> {
    let history = service.history(user.0.id).await?;
    let entries: Vec<PredictionHistoryEntry> = history
        .into_iter()
        .map(|(prediction, doctors)| PredictionHistoryEntry::from_parts(prediction, doctors))
        .collect();
    Ok(HttpResponse::Ok().json(entries))
}

/// Configure triage routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(predict).service(prediction_history);
}
