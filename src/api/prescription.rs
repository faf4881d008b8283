//! Patient-facing prescription endpoints

use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::auth::AuthenticatedUser;
use crate::api::error::ApiError;
use crate::model::prescription::Prescription;
use crate::service::PrescriptionService;

/// One prescription as returned by the API
#[derive(Debug, Serialize, ToSchema)]
pub struct PrescriptionResponse {
    pub id: i64,
    pub doctor_name: String,
    pub notes: String,
    pub total_days: i64,
    pub completed_days: Vec<i64>,
    pub progress_percentage: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrescriptionResponse {
    pub fn from_parts(prescription: Prescription, doctor_name: String) -> Self {
        Self {
            id: prescription.id,
            doctor_name,
            progress_percentage: prescription.progress_percentage(),
            notes: prescription.notes,
            total_days: prescription.total_days,
            completed_days: prescription.completed_days,
            is_active: prescription.is_active,
            created_at: prescription.created_at,
            updated_at: prescription.updated_at,
        }
    }
}

/// Progress update request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProgressRequest {
    /// Zero-based day indices the patient has completed
    pub completed_days: Vec<i64>,
}

/// The caller's active prescription
#[utoipa::path(
    get,
    path = "/v1/prescriptions/active",
    responses(
        (status = 200, description = "Active prescription", body = PrescriptionResponse),
        (status = 404, description = "No active prescription found")
    ),
    security(("bearer" = [])),
    tag = "prescriptions"
)]
#[get("/v1/prescriptions/active")]
pub async fn active_prescription(
    service: web::Data<PrescriptionService>,
    user: AuthenticatedUser,
) -> Result<impl Responder, ApiError> {
    let (prescription, doctor_name) = service.active_for_user(user.0.id).await?;
    Ok(HttpResponse::Ok().json(PrescriptionResponse::from_parts(prescription, doctor_name)))
}

/// Update adherence progress on a prescription
#[utoipa::path(
    post,
    path = "/v1/prescriptions/{id}/progress",
    params(
        ("id" = i64, Path, description = "Prescription ID")
    ),
    request_body = ProgressRequest,
    responses(
        (status = 200, description = "Progress updated"),
        (status = 400, description = "Cannot update inactive prescription"),
        (status = 404, description = "Prescription not found")
    ),
    security(("bearer" = [])),
    tag = "prescriptions"
)]
#[post("/v1/prescriptions/{id}/progress")]
pub async fn update_progress(
    service: web::Data<PrescriptionService>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    body: web::Json<ProgressRequest>,
) -> Result<impl Responder, ApiError> {
    let prescription_id = path.into_inner();
    service
        .update_progress(user.0.id, prescription_id, &body.completed_days)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

/// Configure patient prescription routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(active_prescription).service(update_progress);
}
