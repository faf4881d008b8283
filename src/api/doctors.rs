//! Public endpoints over the static doctor directory

use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::model::catalog::{Catalog, Doctor};

/// One directory entry as returned by the API
#[derive(Debug, Serialize, ToSchema)]
pub struct DoctorInfo {
    pub id: i64,
    pub name: String,
    pub specialization: String,
    pub expertise: Vec<String>,
    pub location: String,
    pub contact: String,
    pub availability: String,
    pub consultation_fee: String,
    pub experience_years: u32,
}

impl From<&Doctor> for DoctorInfo {
    fn from(doctor: &Doctor) -> Self {
        Self {
            id: doctor.id,
            name: doctor.name.clone(),
            specialization: doctor.specialization.clone(),
            expertise: doctor.expertise.clone(),
            location: doctor.location.clone(),
            contact: doctor.contact.clone(),
            availability: doctor.availability.clone(),
            consultation_fee: doctor.consultation_fee.clone(),
            experience_years: doctor.experience_years,
        }
    }
}

/// List the full doctor directory
#[utoipa::path(
    get,
    path = "/v1/doctors",
    responses(
        (status = 200, description = "All directory doctors", body = [DoctorInfo])
    ),
    tag = "doctors"
)]
#[get("/v1/doctors")]
pub async fn list_doctors(catalog: web::Data<Catalog>) -> impl Responder {
    let doctors: Vec<DoctorInfo> = catalog.directory.all().iter().map(DoctorInfo::from).collect();
    HttpResponse::Ok().json(doctors)
}

/// Get one directory doctor by ID
#[utoipa::path(
    get,
    path = "/v1/doctors/{id}",
    params(
        ("id" = i64, Path, description = "Directory doctor ID")
    ),
    responses(
        (status = 200, description = "Doctor found", body = DoctorInfo),
        (status = 404, description = "Doctor not found")
    ),
    tag = "doctors"
)]
#[get("/v1/doctors/{id}")]
pub async fn get_doctor(
    catalog: web::Data<Catalog>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let id = path.into_inner();
    let doctor = catalog
        .directory
        .by_id(id)
        .ok_or_else(|| ApiError::NotFound("Doctor not found".to_string()))?;
    Ok(HttpResponse::Ok().json(DoctorInfo::from(doctor)))
}

/// Configure doctor directory routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_doctors).service(get_doctor);
}
