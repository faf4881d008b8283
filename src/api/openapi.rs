//! OpenAPI specification endpoints

use actix_web::{get, HttpResponse, Responder};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api;

/// Aggregated OpenAPI document for the whole service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Predict Care API",
        description = "Health-symptom triage: condition prediction, risk scaling, \
                       personalized precautions, doctor matching, and patient health records"
    ),
    paths(
        api::health::root,
        api::health::liveness,
        api::health::readiness,
        api::auth::register,
        api::auth::login,
        api::auth::me,
        api::triage::predict,
        api::triage::prediction_history,
        api::notification::list_notifications,
        api::notification::mark_read,
        api::notification::mark_all_read,
        api::notification::delete_notification,
        api::doctors::list_doctors,
        api::doctors::get_doctor,
        api::portal::doctor_login,
        api::portal::doctor_me,
        api::portal::lookup_patient,
        api::portal::upload_text,
        api::portal::upload_file,
        api::portal::assign_prescription,
        api::prescription::active_prescription,
        api::prescription::update_progress,
        api::ehr::list_records,
        api::ehr::get_record,
        api::ehr::create_text_record,
        api::ehr::upload_record,
        api::ehr::download_record,
        api::ehr::update_record,
        api::ehr::delete_record,
        api::ehr::restore_record,
        api::ehr::list_categories,
    ),
    components(schemas(
        api::health::ServiceStatus,
        api::health::HealthStatus,
        api::health::ReadinessStatus,
        api::health::DependencyHealth,
        api::auth::RegisterRequest,
        api::auth::LoginRequest,
        api::auth::UserProfile,
        api::auth::TokenResponse,
        api::triage::PredictRequest,
        api::triage::PredictionResponse,
        api::triage::PredictionHistoryEntry,
        api::doctors::DoctorInfo,
        api::notification::NotificationResponse,
        api::notification::NotificationListResponse,
        api::notification::MarkAllReadResponse,
        api::portal::DoctorLoginRequest,
        api::portal::DoctorProfile,
        api::portal::DoctorTokenResponse,
        api::portal::PatientLookupResponse,
        api::portal::DoctorTextRecordRequest,
        api::portal::DoctorUploadResponse,
        api::portal::AssignPrescriptionRequest,
        api::prescription::PrescriptionResponse,
        api::prescription::ProgressRequest,
        api::ehr::EhrRecordResponse,
        api::ehr::EhrListResponse,
        api::ehr::TextRecordRequest,
        api::ehr::UpdateRecordRequest,
        api::ehr::CategoryInfo,
        crate::service::ehr::EhrStatistics,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service status and probes"),
        (name = "auth", description = "Patient accounts"),
        (name = "triage", description = "Symptom prediction"),
        (name = "notifications", description = "In-app notifications"),
        (name = "doctors", description = "Static doctor directory"),
        (name = "doctor-portal", description = "Doctor accounts and patient record management"),
        (name = "prescriptions", description = "Prescription adherence"),
        (name = "ehr", description = "Electronic health records")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Serve OpenAPI JSON specification
#[get("/openapi.json")]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Serve OpenAPI YAML specification
#[get("/openapi.yaml")]
pub async fn openapi_yaml() -> impl Responder {
    match ApiDoc::openapi().to_yaml() {
        Ok(yaml) => HttpResponse::Ok().content_type("text/yaml").body(yaml),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render OpenAPI YAML");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Configure OpenAPI routes
pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(openapi_json).service(openapi_yaml);
}
