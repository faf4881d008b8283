//! Patient and doctor accounts, password hashing and bearer tokens

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::repository::{DoctorAccountRepository, UserRepository};
use crate::db::DbError;
use crate::model::account::{DoctorAccount, NewDoctorAccount, NewUser, User};

/// Bearer token lifetime
const TOKEN_TTL_HOURS: i64 = 24;

/// Token type claim carried only by doctor tokens
const DOCTOR_TOKEN_TYPE: &str = "doctor";

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AccountError {
    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Could not validate credentials")]
    InvalidToken,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Token signing failed: {0}")]
    TokenSigning(String),

    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

/// JWT payload. `sub` is the account id, `type` is present and set to
/// `doctor` only on doctor tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// Registration, login and token verification for both account kinds.
#[derive(Clone)]
pub struct AccountService {
    users: UserRepository,
    doctors: DoctorAccountRepository,
    jwt_secret: String,
}

impl AccountService {
    pub fn new(users: UserRepository, doctors: DoctorAccountRepository, jwt_secret: String) -> Self {
        Self {
            users,
            doctors,
            jwt_secret,
        }
    }

    /// Create a patient account and issue its first token.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AccountError> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AccountError::EmailTaken);
        }

        let user = self
            .users
            .insert(&NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: hash_password(password)?,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        let token = self.issue_token(user.id, None)?;
        Ok((user, token))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AccountError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(AccountError::InvalidCredentials);
        }

        tracing::debug!(user_id = %user.id, "User logged in");

        let token = self.issue_token(user.id, None)?;
        Ok((user, token))
    }

    /// Doctor portal login. Deactivated accounts are rejected the same
    /// way as wrong credentials.
    pub async fn doctor_login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(DoctorAccount, String), AccountError> {
        let doctor = self
            .doctors
            .find_by_email(email)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        if !doctor.is_active || !verify_password(password, &doctor.password_hash) {
            return Err(AccountError::InvalidCredentials);
        }

        tracing::debug!(doctor_id = %doctor.id, "Doctor logged in");

        let token = self.issue_token(doctor.id, Some(DOCTOR_TOKEN_TYPE))?;
        Ok((doctor, token))
    }

    /// Resolve a patient bearer token to its account. Doctor tokens are
    /// rejected here, patient endpoints never accept them.
    pub async fn authenticate_patient(&self, token: &str) -> Result<User, AccountError> {
        let claims = self.decode_claims(token)?;
        if claims.token_type.as_deref() == Some(DOCTOR_TOKEN_TYPE) {
            return Err(AccountError::InvalidToken);
        }

        let id = parse_subject(&claims)?;
        match self.users.get_by_id(id).await {
            Ok(user) => Ok(user),
            Err(DbError::NotFound(_)) => Err(AccountError::InvalidToken),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a doctor bearer token to its account. The token must
    /// carry the doctor type claim and the account must still be active.
    pub async fn authenticate_doctor(&self, token: &str) -> Result<DoctorAccount, AccountError> {
        let claims = self.decode_claims(token)?;
        if claims.token_type.as_deref() != Some(DOCTOR_TOKEN_TYPE) {
            return Err(AccountError::InvalidToken);
        }

        let id = parse_subject(&claims)?;
        let doctor = match self.doctors.get_by_id(id).await {
            Ok(doctor) => doctor,
            Err(DbError::NotFound(_)) => return Err(AccountError::InvalidToken),
            Err(e) => return Err(e.into()),
        };

        if !doctor.is_active {
            return Err(AccountError::InvalidToken);
        }
        Ok(doctor)
    }

    /// Doctor account lookup by id, for attributing stored records.
    pub async fn doctor_by_id(&self, id: i64) -> Result<DoctorAccount, AccountError> {
        Ok(self.doctors.get_by_id(id).await?)
    }

    /// Patient lookup by email, for the doctor portal.
    pub async fn find_patient_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        Ok(self.users.find_by_email(email).await?)
    }

    /// Create the demo doctor accounts unless their emails exist.
    /// Returns how many accounts were created.
    pub async fn seed_demo_doctors(&self) -> Result<usize, AccountError> {
        let mut created = 0;
        for seed in DEMO_DOCTORS {
            if self.doctors.find_by_email(seed.email).await?.is_some() {
                tracing::debug!(email = %seed.email, "Demo doctor already present, skipping");
                continue;
            }

            let doctor = self
                .doctors
                .insert(&NewDoctorAccount {
                    name: seed.name.to_string(),
                    email: seed.email.to_string(),
                    password_hash: hash_password(DEMO_DOCTOR_PASSWORD)?,
                    specialization: seed.specialization.to_string(),
                    license_number: Some(seed.license_number.to_string()),
                    hospital: Some(seed.hospital.to_string()),
                    contact: Some(seed.contact.to_string()),
                })
                .await?;
            tracing::info!(doctor_id = %doctor.id, email = %seed.email, "Demo doctor created");
            created += 1;
        }
        Ok(created)
    }

    fn issue_token(&self, subject: i64, token_type: Option<&str>) -> Result<String, AccountError> {
        let exp = (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize;
        let claims = Claims {
            sub: subject.to_string(),
            exp,
            token_type: token_type.map(str::to_string),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AccountError::TokenSigning(e.to_string()))
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AccountError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AccountError::InvalidToken)
    }
}

fn parse_subject(claims: &Claims) -> Result<i64, AccountError> {
    claims.sub.parse().map_err(|_| AccountError::InvalidToken)
}

fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::Hash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

const DEMO_DOCTOR_PASSWORD: &str = "doctor123";

struct DemoDoctor {
    name: &'static str,
    email: &'static str,
    specialization: &'static str,
    hospital: &'static str,
    contact: &'static str,
    license_number: &'static str,
}

const DEMO_DOCTORS: &[DemoDoctor] = &[
    DemoDoctor {
        name: "Dr. Anitha Kolukula",
        email: "anitha.kolukula@predictcare.com",
        specialization: "General Physician",
        hospital: "Apollo Hospitals Health City, Visakhapatnam",
        contact: "040-44442424",
        license_number: "AP-MED-12345",
    },
    DemoDoctor {
        name: "Dr. K. Dileep Kumar",
        email: "dileep.kumar@predictcare.com",
        specialization: "Diabetologist & Endocrinologist",
        hospital: "Visakha Diabetes & Endocrine Centre",
        contact: "0891-2555555",
        license_number: "AP-MED-23456",
    },
    DemoDoctor {
        name: "Dr. P. Venu Madhavi",
        email: "venu.madhavi@predictcare.com",
        specialization: "Cardiologist",
        hospital: "CARE Hospitals, Visakhapatnam",
        contact: "040-68106529",
        license_number: "AP-MED-34567",
    },
    DemoDoctor {
        name: "Dr. Ramesh Varma",
        email: "ramesh.varma@predictcare.com",
        specialization: "Dermatologist",
        hospital: "Seven Hills Hospital, Visakhapatnam",
        contact: "0891-2777777",
        license_number: "AP-MED-45678",
    },
    DemoDoctor {
        name: "Dr. Srinivas Rao",
        email: "srinivas.rao@predictcare.com",
        specialization: "Pulmonologist",
        hospital: "Medicover Hospitals, Visakhapatnam",
        contact: "0891-6666666",
        license_number: "AP-MED-56789",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init_schema(&pool).await.unwrap();
        pool
    }

    fn service(pool: &SqlitePool) -> AccountService {
        AccountService::new(
            UserRepository::new(pool.clone()),
            DoctorAccountRepository::new(pool.clone()),
            "test-secret".to_string(),
        )
    }

    #[test]
    fn password_hashes_verify_and_reject() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let pool = test_pool().await;
        let service = service(&pool);

        service
            .register("Asha Rao", "asha@example.com", "pw")
            .await
            .unwrap();
        let err = service
            .register("Asha Again", "asha@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::EmailTaken));
    }

    #[tokio::test]
    async fn login_round_trip_issues_usable_token() {
        let pool = test_pool().await;
        let service = service(&pool);

        let (registered, _) = service
            .register("Asha Rao", "asha@example.com", "pw")
            .await
            .unwrap();
        let (user, token) = service.login("asha@example.com", "pw").await.unwrap();
        assert_eq!(user.id, registered.id);

        let authenticated = service.authenticate_patient(&token).await.unwrap();
        assert_eq!(authenticated.id, registered.id);
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let pool = test_pool().await;
        let service = service(&pool);

        service
            .register("Asha Rao", "asha@example.com", "pw")
            .await
            .unwrap();
        let err = service.login("asha@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));

        let err = service.login("nobody@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn doctor_tokens_do_not_open_patient_endpoints() {
        let pool = test_pool().await;
        let service = service(&pool);
        service.seed_demo_doctors().await.unwrap();

        let (_, doctor_token) = service
            .doctor_login("anitha.kolukula@predictcare.com", DEMO_DOCTOR_PASSWORD)
            .await
            .unwrap();
        let err = service
            .authenticate_patient(&doctor_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidToken));

        let doctor = service.authenticate_doctor(&doctor_token).await.unwrap();
        assert_eq!(doctor.email, "anitha.kolukula@predictcare.com");
    }

    #[tokio::test]
    async fn patient_tokens_do_not_open_the_doctor_portal() {
        let pool = test_pool().await;
        let service = service(&pool);

        let (_, token) = service
            .register("Asha Rao", "asha@example.com", "pw")
            .await
            .unwrap();
        let err = service.authenticate_doctor(&token).await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidToken));
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let pool = test_pool().await;
        let service = service(&pool);

        assert_eq!(service.seed_demo_doctors().await.unwrap(), 5);
        assert_eq!(service.seed_demo_doctors().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn garbage_tokens_are_rejected() {
        let pool = test_pool().await;
        let service = service(&pool);

        let err = service.authenticate_patient("not.a.jwt").await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidToken));
    }
}
