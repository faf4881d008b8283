//! Patient registration, login and the bearer-token extractors

use std::future::Future;
use std::pin::Pin;

use actix_web::http::header;
use actix_web::{get, post, web, FromRequest, HttpRequest, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::model::account::{DoctorAccount, User};
use crate::model::notification::NotificationEvent;
use crate::service::account::AccountError;
use crate::service::{AccountService, NotificationStore};

/// Registration request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a patient account
#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

/// Token response returned by register and login
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserProfile,
}

impl TokenResponse {
    fn bearer(user: &User, access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            user: user.into(),
        }
    }
}

/// The patient account behind a request's bearer token.
///
/// Extraction fails with 401 when the token is missing, malformed,
/// expired, or belongs to a doctor.
pub struct AuthenticatedUser(pub User);

/// The doctor account behind a request's bearer token.
///
/// A valid patient token on a doctor endpoint is rejected with 403;
/// everything else invalid is a 401.
pub struct AuthenticatedDoctor(pub DoctorAccount);

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
}

fn accounts_from(req: &HttpRequest) -> Result<web::Data<AccountService>, ApiError> {
    req.app_data::<web::Data<AccountService>>()
        .cloned()
        .ok_or_else(|| ApiError::Internal("Account service not configured".to_string()))
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, ApiError>>>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let accounts = accounts_from(&req)?;
            let token = bearer_token(&req).ok_or_else(ApiError::invalid_credentials)?;
            match accounts.authenticate_patient(&token).await {
                Ok(user) => Ok(AuthenticatedUser(user)),
                Err(AccountError::Db(e)) => Err(e.into()),
                Err(_) => Err(ApiError::invalid_credentials()),
            }
        })
    }
}

impl FromRequest for AuthenticatedDoctor {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, ApiError>>>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let accounts = accounts_from(&req)?;
            let token = bearer_token(&req).ok_or_else(ApiError::invalid_credentials)?;
            match accounts.authenticate_doctor(&token).await {
                Ok(doctor) => Ok(AuthenticatedDoctor(doctor)),
                Err(AccountError::Db(e)) => Err(e.into()),
                Err(_) => {
                    // A patient holding a perfectly valid token is
                    // denied, not challenged
                    if accounts.authenticate_patient(&token).await.is_ok() {
                        Err(ApiError::doctor_required())
                    } else {
                        Err(ApiError::invalid_credentials())
                    }
                }
            }
        })
    }
}

/// Register a new patient account
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = TokenResponse),
        (status = 400, description = "Email already registered")
    ),
    tag = "auth"
)]
#[post("/v1/auth/register")]
pub async fn register(
    accounts: web::Data<AccountService>,
    notifications: web::Data<NotificationStore>,
    body: web::Json<RegisterRequest>,
) -> Result<impl Responder, ApiError> {
    let body = body.into_inner();
    let (user, token) = accounts
        .register(body.name.trim(), body.email.trim(), &body.password)
        .await?;

    notifications.notify(
        user.id,
        NotificationEvent::Welcome {
            first_name: user.first_name().to_string(),
        },
    )?;

    Ok(HttpResponse::Ok().json(TokenResponse::bearer(&user, token)))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 401, description = "Invalid email or password")
    ),
    tag = "auth"
)]
#[post("/v1/auth/login")]
pub async fn login(
    accounts: web::Data<AccountService>,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, ApiError> {
    let (user, token) = accounts.login(body.email.trim(), &body.password).await?;
    Ok(HttpResponse::Ok().json(TokenResponse::bearer(&user, token)))
}

/// Current patient profile
#[utoipa::path(
    get,
    path = "/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Invalid authentication credentials")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[get("/v1/auth/me")]
pub async fn me(user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(UserProfile::from(&user.0))
}

/// Configure authentication routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register).service(login).service(me);
}
