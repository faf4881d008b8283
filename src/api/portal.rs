//! Doctor portal endpoints
//!
//! Everything here (except login) requires a doctor bearer token.
//! Patients are addressed by the email they registered with.

use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::auth::AuthenticatedDoctor;
use crate::api::ehr::read_upload_form;
use crate::api::error::ApiError;
use crate::api::prescription::PrescriptionResponse;
use crate::model::account::{DoctorAccount, User};
use crate::service::ehr::DoctorRecordInput;
use crate::service::{AccountService, EhrService, PrescriptionService};

/// Doctor login request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct DoctorLoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a doctor account
#[derive(Debug, Serialize, ToSchema)]
pub struct DoctorProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub specialization: String,
    pub license_number: Option<String>,
    pub hospital: Option<String>,
    pub contact: Option<String>,
}

impl From<&DoctorAccount> for DoctorProfile {
    fn from(doctor: &DoctorAccount) -> Self {
        Self {
            id: doctor.id,
            name: doctor.name.clone(),
            email: doctor.email.clone(),
            specialization: doctor.specialization.clone(),
            license_number: doctor.license_number.clone(),
            hospital: doctor.hospital.clone(),
            contact: doctor.contact.clone(),
        }
    }
}

/// Token response returned by doctor login
#[derive(Debug, Serialize, ToSchema)]
pub struct DoctorTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub doctor: DoctorProfile,
}

/// Patient lookup result
#[derive(Debug, Serialize, ToSchema)]
pub struct PatientLookupResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_email: Option<String>,
    pub message: String,
}

/// Text record request body for the doctor portal
#[derive(Debug, Deserialize, ToSchema)]
pub struct DoctorTextRecordRequest {
    pub patient_email: String,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub text_content: Option<String>,
    pub record_date: Option<String>,
}

/// Outcome of a doctor upload
#[derive(Debug, Serialize, ToSchema)]
pub struct DoctorUploadResponse {
    pub success: bool,
    pub message: String,
    pub record_id: i64,
    pub patient_name: String,
}

/// Prescription assignment request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignPrescriptionRequest {
    pub patient_email: String,
    pub notes: String,
    pub total_days: i64,
}

async fn patient_by_email(accounts: &AccountService, email: &str) -> Result<User, ApiError> {
    accounts
        .find_patient_by_email(email.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("Patient not found".to_string()))
}

/// Doctor portal login
#[utoipa::path(
    post,
    path = "/v1/doctor/login",
    request_body = DoctorLoginRequest,
    responses(
        (status = 200, description = "Logged in", body = DoctorTokenResponse),
        (status = 401, description = "Invalid email or password")
    ),
    tag = "doctor-portal"
)]
#[post("/v1/doctor/login")]
pub async fn doctor_login(
    accounts: web::Data<AccountService>,
    body: web::Json<DoctorLoginRequest>,
) -> Result<impl Responder, ApiError> {
    let (doctor, token) = accounts
        .doctor_login(body.email.trim(), &body.password)
        .await?;
    Ok(HttpResponse::Ok().json(DoctorTokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        doctor: DoctorProfile::from(&doctor),
    }))
}

/// Current doctor profile
#[utoipa::path(
    get,
    path = "/v1/doctor/me",
    responses(
        (status = 200, description = "Current doctor", body = DoctorProfile),
        (status = 401, description = "Invalid authentication credentials"),
        (status = 403, description = "Access denied. Doctor credentials required.")
    ),
    security(("bearer" = [])),
    tag = "doctor-portal"
)]
#[get("/v1/doctor/me")]
pub async fn doctor_me(doctor: AuthenticatedDoctor) -> impl Responder {
    HttpResponse::Ok().json(DoctorProfile::from(&doctor.0))
}

/// Look up a patient by registration email
#[utoipa::path(
    get,
    path = "/v1/doctor/lookup/{patient_email}",
    params(
        ("patient_email" = String, Path, description = "Patient's registration email")
    ),
    responses(
        (status = 200, description = "Lookup result", body = PatientLookupResponse)
    ),
    security(("bearer" = [])),
    tag = "doctor-portal"
)]
#[get("/v1/doctor/lookup/{patient_email}")]
pub async fn lookup_patient(
    accounts: web::Data<AccountService>,
    _doctor: AuthenticatedDoctor,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let email = path.into_inner();
    let response = match accounts.find_patient_by_email(email.trim()).await? {
        Some(patient) => PatientLookupResponse {
            found: true,
            message: format!("Patient found: {}", patient.name),
            patient_id: Some(patient.id),
            patient_name: Some(patient.name),
            patient_email: Some(patient.email),
        },
        None => PatientLookupResponse {
            found: false,
            patient_id: None,
            patient_name: None,
            patient_email: None,
            message: format!("No patient found with email: {}", email),
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

/// Add a structured text record to a patient's EHR
#[utoipa::path(
    post,
    path = "/v1/doctor/upload/text",
    request_body = DoctorTextRecordRequest,
    responses(
        (status = 200, description = "Record added", body = DoctorUploadResponse),
        (status = 400, description = "Invalid category"),
        (status = 404, description = "Patient not found")
    ),
    security(("bearer" = [])),
    tag = "doctor-portal"
)]
#[post("/v1/doctor/upload/text")]
pub async fn upload_text(
    accounts: web::Data<AccountService>,
    ehr: web::Data<EhrService>,
    doctor: AuthenticatedDoctor,
    body: web::Json<DoctorTextRecordRequest>,
) -> Result<impl Responder, ApiError> {
    let body = body.into_inner();
    let patient = patient_by_email(&accounts, &body.patient_email).await?;

    let record = ehr
        .add_doctor_text_record(
            &patient,
            &doctor.0,
            DoctorRecordInput {
                title: body.title,
                category: body.category,
                description: body.description,
                diagnosis: body.diagnosis,
                prescription: body.prescription,
                notes: body.notes,
                text_content: body.text_content,
                record_date: body.record_date,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(DoctorUploadResponse {
        success: true,
        message: format!("Record '{}' added to {}'s health records", record.title, patient.name),
        record_id: record.id,
        patient_name: patient.name,
    }))
}

/// Upload a file into a patient's EHR
#[utoipa::path(
    post,
    path = "/v1/doctor/upload/file",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Record added", body = DoctorUploadResponse),
        (status = 400, description = "Invalid category, file type, or size"),
        (status = 404, description = "Patient not found")
    ),
    security(("bearer" = [])),
    tag = "doctor-portal"
)]
#[post("/v1/doctor/upload/file")]
pub async fn upload_file(
    accounts: web::Data<AccountService>,
    ehr: web::Data<EhrService>,
    doctor: AuthenticatedDoctor,
    payload: Multipart,
) -> Result<impl Responder, ApiError> {
    let mut form = read_upload_form(payload).await?;
    let patient_email = form.required("patient_email")?;
    let title = form.required("title")?;
    let category = form.required("category")?;
    let description = form.field("description").map(str::to_string);
    let record_date = form.field("record_date").map(str::to_string);
    let upload = form.take_file()?;

    let patient = patient_by_email(&accounts, &patient_email).await?;

    let record = ehr
        .add_doctor_file_record(
            &patient,
            &doctor.0,
            upload,
            title,
            &category,
            description,
            record_date.as_deref(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(DoctorUploadResponse {
        success: true,
        message: format!("File '{}' added to {}'s health records", record.title, patient.name),
        record_id: record.id,
        patient_name: patient.name,
    }))
}

/// Assign a prescription to a patient
#[utoipa::path(
    post,
    path = "/v1/doctor/prescriptions",
    request_body = AssignPrescriptionRequest,
    responses(
        (status = 200, description = "Prescription assigned", body = PrescriptionResponse),
        (status = 404, description = "Patient not found")
    ),
    security(("bearer" = [])),
    tag = "doctor-portal"
)]
#[post("/v1/doctor/prescriptions")]
pub async fn assign_prescription(
    accounts: web::Data<AccountService>,
    prescriptions: web::Data<PrescriptionService>,
    doctor: AuthenticatedDoctor,
    body: web::Json<AssignPrescriptionRequest>,
) -> Result<impl Responder, ApiError> {
    let body = body.into_inner();
    if body.total_days <= 0 {
        return Err(ApiError::BadRequest(
            "total_days must be a positive number".to_string(),
        ));
    }

    let patient = patient_by_email(&accounts, &body.patient_email).await?;
    let prescription = prescriptions
        .create(&patient, &doctor.0, body.notes, body.total_days)
        .await?;

    Ok(HttpResponse::Ok().json(PrescriptionResponse::from_parts(
        prescription,
        doctor.0.name,
    )))
}

/// Configure doctor portal routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(doctor_login)
        .service(doctor_me)
        .service(lookup_patient)
        .service(upload_text)
        .service(upload_file)
        .service(assign_prescription);
}
