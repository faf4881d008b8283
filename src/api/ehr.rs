//! Electronic health record endpoints

use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::auth::AuthenticatedUser;
use crate::api::error::ApiError;
use crate::model::ehr::{file_type_name, format_file_size, EhrCategory, EhrRecord, MAX_FILE_SIZE};
use crate::service::ehr::{EhrStatistics, UploadedFile};
use crate::service::EhrService;

/// Query parameters for the record listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRecordsParams {
    /// Filter by category value
    pub category: Option<String>,
    /// Include archived records (default: false)
    pub include_archived: Option<bool>,
}

/// One health record as returned by the API
#[derive(Debug, Serialize, ToSchema)]
pub struct EhrRecordResponse {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub file_size_formatted: Option<String>,
    pub file_type_display: Option<String>,
    pub has_file: bool,
    pub uploaded_by_doctor: bool,
    pub text_content: Option<String>,
    pub prediction_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub record_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub is_archived: bool,
}

impl From<EhrRecord> for EhrRecordResponse {
    fn from(record: EhrRecord) -> Self {
        Self {
            id: record.id,
            has_file: record.has_file(),
            uploaded_by_doctor: record.uploaded_by_doctor(),
            file_size_formatted: record.file_size.map(format_file_size),
            file_type_display: record
                .file_type
                .as_deref()
                .map(|t| file_type_name(t).to_string()),
            title: record.title,
            category: record.category,
            description: record.description,
            file_name: record.file_name,
            file_type: record.file_type,
            file_size: record.file_size,
            text_content: record.text_content,
            prediction_id: record.prediction_id,
            doctor_id: record.doctor_id,
            record_date: record.record_date,
            created_at: record.created_at,
            is_archived: record.is_archived,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EhrListResponse {
    pub records: Vec<EhrRecordResponse>,
    pub total_count: usize,
    pub statistics: EhrStatistics,
}

/// Text record request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct TextRecordRequest {
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub text_content: Option<String>,
    pub record_date: Option<String>,
}

/// Record update request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRecordRequest {
    pub title: String,
    pub description: Option<String>,
    pub text_content: Option<String>,
    pub record_date: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteRecordParams {
    /// Permanently delete instead of archiving (default: false)
    pub permanent: Option<bool>,
}

/// One category in the category listing
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryInfo {
    pub value: String,
    pub name: String,
    pub icon: String,
}

/// Text fields plus the optional file of a multipart submission
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn required(&self, name: &str) -> Result<String, ApiError> {
        self.fields
            .get(name)
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .ok_or_else(|| ApiError::BadRequest(format!("Missing required field: {}", name)))
    }

    pub fn take_file(&mut self) -> Result<UploadedFile, ApiError> {
        self.file
            .take()
            .ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))
    }
}

/// Buffer a multipart submission. The file part is capped just past
/// the allowed maximum so the size check can reject it by name.
pub async fn read_upload_form(mut payload: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart payload: {}", e)))?
    {
        let name = field.name().to_string();
        let is_file = name == "file";
        let file_name = field
            .content_disposition()
            .get_filename()
            .unwrap_or("upload")
            .to_string();
        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?
        {
            if data.len() + chunk.len() > MAX_FILE_SIZE + 1 {
                return Err(ApiError::BadRequest(format!(
                    "File too large. Maximum size: {} MB",
                    MAX_FILE_SIZE / (1024 * 1024)
                )));
            }
            data.extend_from_slice(&chunk);
        }

        if is_file {
            form.file = Some(UploadedFile {
                file_name,
                content_type,
                data,
            });
        } else {
            form.fields
                .insert(name, String::from_utf8_lossy(&data).into_owned());
        }
    }

    Ok(form)
}

/// List the caller's health records with aggregate statistics
#[utoipa::path(
    get,
    path = "/v1/ehr",
    params(ListRecordsParams),
    responses(
        (status = 200, description = "Records retrieved", body = EhrListResponse),
        (status = 401, description = "Invalid authentication credentials")
    ),
    security(("bearer" = [])),
    tag = "ehr"
)]
#[get("/v1/ehr")]
pub async fn list_records(
    service: web::Data<EhrService>,
    user: AuthenticatedUser,
    query: web::Query<ListRecordsParams>,
) -> Result<impl Responder, ApiError> {
    let records = service
        .list_records(
            user.0.id,
            query.category.as_deref(),
            query.include_archived.unwrap_or(false),
        )
        .await?;

    let statistics = EhrService::statistics(&records);
    let total_count = records.len();

    Ok(HttpResponse::Ok().json(EhrListResponse {
        records: records.into_iter().map(EhrRecordResponse::from).collect(),
        total_count,
        statistics,
    }))
}

/// Get one health record
#[utoipa::path(
    get,
    path = "/v1/ehr/{id}",
    params(
        ("id" = i64, Path, description = "Record ID")
    ),
    responses(
        (status = 200, description = "Record found", body = EhrRecordResponse),
        (status = 404, description = "Record not found")
    ),
    security(("bearer" = [])),
    tag = "ehr"
)]
#[get("/v1/ehr/{id}")]
pub async fn get_record(
    service: web::Data<EhrService>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let record = service.get_record(user.0.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(EhrRecordResponse::from(record)))
}

/// Create a text-only health record
#[utoipa::path(
    post,
    path = "/v1/ehr/text",
    request_body = TextRecordRequest,
    responses(
        (status = 200, description = "Record created", body = EhrRecordResponse),
        (status = 400, description = "Invalid category or date")
    ),
    security(("bearer" = [])),
    tag = "ehr"
)]
#[post("/v1/ehr/text")]
pub async fn create_text_record(
    service: web::Data<EhrService>,
    user: AuthenticatedUser,
    body: web::Json<TextRecordRequest>,
) -> Result<impl Responder, ApiError> {
    let body = body.into_inner();
    let record = service
        .create_text_record(
            user.0.id,
            body.title,
            &body.category,
            body.description,
            body.text_content,
            body.record_date.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(EhrRecordResponse::from(record)))
}

/// Upload a file into the caller's health records
#[utoipa::path(
    post,
    path = "/v1/ehr/upload",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Record created", body = EhrRecordResponse),
        (status = 400, description = "Invalid category, file type, or size")
    ),
    security(("bearer" = [])),
    tag = "ehr"
)]
#[post("/v1/ehr/upload")]
pub async fn upload_record(
    service: web::Data<EhrService>,
    user: AuthenticatedUser,
    payload: Multipart,
) -> Result<impl Responder, ApiError> {
    let mut form = read_upload_form(payload).await?;
    let title = form.required("title")?;
    let category = form.required("category")?;
    let description = form.field("description").map(str::to_string);
    let record_date = form.field("record_date").map(str::to_string);
    let upload = form.take_file()?;

    let record = service
        .create_file_record(
            user.0.id,
            upload,
            title,
            &category,
            description,
            record_date.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(EhrRecordResponse::from(record)))
}

/// Download the file attached to a record
#[utoipa::path(
    get,
    path = "/v1/ehr/{id}/download",
    params(
        ("id" = i64, Path, description = "Record ID")
    ),
    responses(
        (status = 200, description = "File contents"),
        (status = 400, description = "This record has no file attached"),
        (status = 404, description = "File not found on server")
    ),
    security(("bearer" = [])),
    tag = "ehr"
)]
#[get("/v1/ehr/{id}/download")]
pub async fn download_record(
    service: web::Data<EhrService>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let (record, file_path) = service.download(user.0.id, path.into_inner()).await?;
    let data = tokio::fs::read(&file_path)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let download_name = record
        .file_name
        .unwrap_or_else(|| format!("record_{}", record.id));
    let content_type = record
        .file_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download_name),
        ))
        .body(data))
}

/// Update the editable fields of a record
#[utoipa::path(
    put,
    path = "/v1/ehr/{id}",
    params(
        ("id" = i64, Path, description = "Record ID")
    ),
    request_body = UpdateRecordRequest,
    responses(
        (status = 200, description = "Record updated", body = EhrRecordResponse),
        (status = 404, description = "Record not found")
    ),
    security(("bearer" = [])),
    tag = "ehr"
)]
#[put("/v1/ehr/{id}")]
pub async fn update_record(
    service: web::Data<EhrService>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    body: web::Json<UpdateRecordRequest>,
) -> Result<impl Responder, ApiError> {
    let body = body.into_inner();
    let record = service
        .update_record(
            user.0.id,
            path.into_inner(),
            body.title,
            body.description,
            body.text_content,
            body.record_date.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(EhrRecordResponse::from(record)))
}

/// Archive a record, or delete it permanently
#[utoipa::path(
    delete,
    path = "/v1/ehr/{id}",
    params(
        ("id" = i64, Path, description = "Record ID"),
        DeleteRecordParams
    ),
    responses(
        (status = 200, description = "Record archived or deleted"),
        (status = 404, description = "Record not found")
    ),
    security(("bearer" = [])),
    tag = "ehr"
)]
#[delete("/v1/ehr/{id}")]
pub async fn delete_record(
    service: web::Data<EhrService>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    query: web::Query<DeleteRecordParams>,
) -> Result<impl Responder, ApiError> {
    let permanent = query.permanent.unwrap_or(false);
    service
        .delete_record(user.0.id, path.into_inner(), permanent)
        .await?;

    let message = if permanent {
        "EHR record permanently deleted"
    } else {
        "EHR record archived"
    };
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok", "message": message })))
}

/// Restore an archived record
#[utoipa::path(
    post,
    path = "/v1/ehr/{id}/restore",
    params(
        ("id" = i64, Path, description = "Record ID")
    ),
    responses(
        (status = 200, description = "Record restored"),
        (status = 404, description = "Record not found")
    ),
    security(("bearer" = [])),
    tag = "ehr"
)]
#[post("/v1/ehr/{id}/restore")]
pub async fn restore_record(
    service: web::Data<EhrService>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    service.restore_record(user.0.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok", "message": "EHR record restored" })))
}

/// List every record category with its display name and icon
#[utoipa::path(
    get,
    path = "/v1/ehr/categories/list",
    responses(
        (status = 200, description = "All categories", body = [CategoryInfo])
    ),
    tag = "ehr"
)]
#[get("/v1/ehr/categories/list")]
pub async fn list_categories() -> impl Responder {
    let categories: Vec<CategoryInfo> = EhrCategory::ALL
        .into_iter()
        .map(|c| CategoryInfo {
            value: c.as_str().to_string(),
            name: c.display_name().to_string(),
            icon: c.icon().to_string(),
        })
        .collect();
    HttpResponse::Ok().json(categories)
}

/// Configure EHR routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_records)
        .service(create_text_record)
        .service(upload_record)
        .service(list_categories)
        .service(download_record)
        .service(restore_record)
        .service(get_record)
        .service(update_record)
        .service(delete_record);
}
