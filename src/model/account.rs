use chrono::{DateTime, Utc};

/// A registered patient account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// First name, used in personalized messages.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// A doctor account for the doctor portal. Separate from the static
/// directory of recommendable doctors.
#[derive(Debug, Clone)]
pub struct DoctorAccount {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub specialization: String,
    pub license_number: Option<String>,
    pub hospital: Option<String>,
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewDoctorAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub specialization: String,
    pub license_number: Option<String>,
    pub hospital: Option<String>,
    pub contact: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_name_takes_leading_word() {
        let user = User {
            id: 1,
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        };
        assert_eq!(user.first_name(), "Asha");
    }

    #[test]
    fn first_name_of_single_word_name_is_the_name() {
        let user = User {
            id: 2,
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        };
        assert_eq!(user.first_name(), "Asha");
    }
}
