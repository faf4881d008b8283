//! In-app notification types and message templates.
//!
//! Notifications are web-only alerts kept in memory per user. They are
//! triggered by predictions, health advice, record uploads and
//! prescription assignments.

use chrono::{DateTime, Utc};

/// Types of notifications in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// New prediction made
    Prediction,
    /// High risk alert
    HighRisk,
    /// New advice available
    Advice,
    /// Recurring condition detected
    Recurring,
    /// Welcome message for new users
    Welcome,
    /// New EHR record uploaded
    EhrUpload,
    /// Prediction saved to EHR
    EhrPrediction,
    /// Doctor uploaded a record
    DoctorRecord,
    /// Doctor assigned a new prescription
    PrescriptionAdded,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prediction => "prediction",
            Self::HighRisk => "high_risk",
            Self::Advice => "advice",
            Self::Recurring => "recurring",
            Self::Welcome => "welcome",
            Self::EhrUpload => "ehr_upload",
            Self::EhrPrediction => "ehr_prediction",
            Self::DoctorRecord => "doctor_record",
            Self::PrescriptionAdded => "prescription_added",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Prediction => "🔍",
            Self::HighRisk => "⚠️",
            Self::Advice => "💡",
            Self::Recurring => "📊",
            Self::Welcome => "👋",
            Self::EhrUpload => "📁",
            Self::EhrPrediction => "📋",
            Self::DoctorRecord => "👨‍⚕️",
            Self::PrescriptionAdded => "💊",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Prediction => "Prediction Complete",
            Self::HighRisk => "High Risk Alert",
            Self::Advice => "Health Advice Available",
            Self::Recurring => "Recurring Condition",
            Self::Welcome => "Welcome to Predict Care!",
            Self::EhrUpload => "EHR Record Added",
            Self::EhrPrediction => "Prediction Saved to EHR",
            Self::DoctorRecord => "New Medical Record from Doctor",
            Self::PrescriptionAdded => "New Prescription Assigned",
        }
    }
}

/// Something that happened that the user should be told about.
/// Rendering an event yields the notification kind and message body.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    PredictionComplete { disease: String },
    HighRisk,
    AdviceReady { disease: String },
    RecurringCondition { disease: String },
    Welcome { first_name: String },
    EhrUpload { title: String, category: String },
    EhrPrediction { disease: String },
    DoctorRecord { doctor_name: String, category: String, title: String },
    PrescriptionAssigned { doctor_name: String },
}

impl NotificationEvent {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::PredictionComplete { .. } => NotificationKind::Prediction,
            Self::HighRisk => NotificationKind::HighRisk,
            Self::AdviceReady { .. } => NotificationKind::Advice,
            Self::RecurringCondition { .. } => NotificationKind::Recurring,
            Self::Welcome { .. } => NotificationKind::Welcome,
            Self::EhrUpload { .. } => NotificationKind::EhrUpload,
            Self::EhrPrediction { .. } => NotificationKind::EhrPrediction,
            Self::DoctorRecord { .. } => NotificationKind::DoctorRecord,
            Self::PrescriptionAssigned { .. } => NotificationKind::PrescriptionAdded,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::PredictionComplete { disease } => format!(
                "Your symptom analysis is complete. Predicted condition: {}",
                disease
            ),
            Self::HighRisk => {
                "Your prediction indicates a HIGH risk level. Please consider consulting a doctor soon."
                    .to_string()
            }
            Self::AdviceReady { disease } => format!(
                "Personalized health advice is ready for your recent prediction of {}.",
                disease
            ),
            Self::RecurringCondition { disease } => format!(
                "We noticed you've had similar symptoms ({}) multiple times. Consider a medical checkup.",
                disease
            ),
            Self::Welcome { first_name } => format!(
                "Welcome {}! Start by entering your symptoms to get a health prediction.",
                first_name
            ),
            Self::EhrUpload { title, category } => format!(
                "Your {} '{}' has been added to your Electronic Health Records.",
                upload_category_display(category),
                title
            ),
            Self::EhrPrediction { disease } => format!(
                "Your prediction for {} has been saved to your Electronic Health Records.",
                disease
            ),
            Self::DoctorRecord {
                doctor_name,
                category,
                title,
            } => format!(
                "Dr. {} has added a new {} to your health records: '{}'",
                doctor_name,
                doctor_category_display(category),
                title
            ),
            Self::PrescriptionAssigned { doctor_name } => format!(
                "Dr. {} has assigned a new prescription. Check 'Health Progress' to track your adherence.",
                doctor_name
            ),
        }
    }
}

/// Display name for a category in a patient upload notification.
fn upload_category_display(category: &str) -> &str {
    match category {
        "prescription" => "prescription",
        "lab_report" => "lab report",
        "scan_image" => "scan/image",
        "op_note" => "OP note",
        other => other,
    }
}

/// Display name for a category in a doctor upload notification.
fn doctor_category_display(category: &str) -> &str {
    match category {
        "prescription" => "prescription",
        "lab_report" => "lab report",
        "scan_image" => "scan/image",
        "op_note" => "doctor's note",
        "doctor_prescription" => "prescription",
        "doctor_report" => "medical report",
        other => other,
    }
}

/// One stored notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: i64,
    pub kind: NotificationKind,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
