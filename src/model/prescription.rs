use chrono::{DateTime, Utc};

/// A course of medication assigned by a doctor. A patient has at most
/// one active prescription; assigning a new one deactivates the rest.
#[derive(Debug, Clone)]
pub struct Prescription {
    pub id: i64,
    pub user_id: i64,
    pub doctor_id: i64,
    pub notes: String,
    pub total_days: i64,
    /// Day indices the patient has ticked off, zero-based
    pub completed_days: Vec<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prescription {
    /// Adherence as a whole percentage, truncated.
    pub fn progress_percentage(&self) -> i64 {
        if self.total_days > 0 {
            (self.completed_days.len() as f64 / self.total_days as f64 * 100.0) as i64
        } else {
            0
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPrescription {
    pub user_id: i64,
    pub doctor_id: i64,
    pub notes: String,
    pub total_days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prescription(total_days: i64, completed: Vec<i64>) -> Prescription {
        Prescription {
            id: 1,
            user_id: 1,
            doctor_id: 1,
            notes: "Take after meals".to_string(),
            total_days,
            completed_days: completed,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn progress_truncates_to_whole_percent() {
        assert_eq!(prescription(3, vec![0]).progress_percentage(), 33);
        assert_eq!(prescription(3, vec![0, 1, 2]).progress_percentage(), 100);
        assert_eq!(prescription(10, vec![]).progress_percentage(), 0);
    }

    #[test]
    fn zero_day_prescription_reports_no_progress() {
        assert_eq!(prescription(0, vec![]).progress_percentage(), 0);
    }
}
