//! Electronic health record vocabulary and domain types.
//!
//! Records belong to exactly one user. They carry either an uploaded
//! file, free text, or both, and may reference the prediction or the
//! doctor account that produced them.

use chrono::{DateTime, Utc};

/// Maximum accepted upload size in bytes.
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// MIME types accepted for uploads, with their storage extension.
pub const ALLOWED_FILE_TYPES: &[(&str, &str)] = &[
    // Documents
    ("application/pdf", ".pdf"),
    ("application/msword", ".doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
    ),
    // Images
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
    // Text
    ("text/plain", ".txt"),
];

/// Display names for the accepted MIME types.
pub const FILE_TYPE_NAMES: &[(&str, &str)] = &[
    ("application/pdf", "PDF Document"),
    ("application/msword", "Word Document"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "Word Document",
    ),
    ("image/jpeg", "JPEG Image"),
    ("image/png", "PNG Image"),
    ("image/gif", "GIF Image"),
    ("image/webp", "WebP Image"),
    ("text/plain", "Text File"),
];

/// Extension an accepted MIME type is stored under.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    ALLOWED_FILE_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
}

/// Display name for a stored MIME type.
pub fn file_type_name(content_type: &str) -> &'static str {
    FILE_TYPE_NAMES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}

/// Human-readable file size.
pub fn format_file_size(size_bytes: i64) -> String {
    if size_bytes < 1024 {
        format!("{} B", size_bytes)
    } else if size_bytes < 1024 * 1024 {
        format!("{:.1} KB", size_bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", size_bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Categories of EHR records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EhrCategory {
    Prescription,
    LabReport,
    ScanImage,
    OpNote,
    Prediction,
    // Doctor-uploaded categories
    DoctorPrescription,
    DoctorReport,
    DoctorNote,
}

impl EhrCategory {
    pub const ALL: [EhrCategory; 8] = [
        Self::Prescription,
        Self::LabReport,
        Self::ScanImage,
        Self::OpNote,
        Self::Prediction,
        Self::DoctorPrescription,
        Self::DoctorReport,
        Self::DoctorNote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prescription => "prescription",
            Self::LabReport => "lab_report",
            Self::ScanImage => "scan_image",
            Self::OpNote => "op_note",
            Self::Prediction => "prediction",
            Self::DoctorPrescription => "doctor_prescription",
            Self::DoctorReport => "doctor_report",
            Self::DoctorNote => "doctor_note",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == value)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Prescription => "Prescription",
            Self::LabReport => "Lab Report",
            Self::ScanImage => "Scan / X-Ray",
            Self::OpNote => "OP Note / Doctor Note",
            Self::Prediction => "Prediction Record",
            Self::DoctorPrescription => "Doctor's Prescription",
            Self::DoctorReport => "Doctor's Report",
            Self::DoctorNote => "Doctor's Notes",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Prescription => "💊",
            Self::LabReport => "🔬",
            Self::ScanImage => "🩻",
            Self::OpNote => "📝",
            Self::Prediction => "🔍",
            Self::DoctorPrescription => "👨‍⚕️💊",
            Self::DoctorReport => "👨‍⚕️📋",
            Self::DoctorNote => "👨‍⚕️📝",
        }
    }
}

impl std::fmt::Display for EhrCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One health record as stored.
#[derive(Debug, Clone)]
pub struct EhrRecord {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    /// Original file name as uploaded
    pub file_name: Option<String>,
    /// MIME type of the stored file
    pub file_type: Option<String>,
    /// Stored file name inside the user's upload directory
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub text_content: Option<String>,
    pub prediction_id: Option<i64>,
    pub doctor_id: Option<i64>,
    /// Date of the medical event, not the upload date
    pub record_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub is_archived: bool,
}

impl EhrRecord {
    pub fn has_file(&self) -> bool {
        self.file_path.is_some()
    }

    pub fn uploaded_by_doctor(&self) -> bool {
        self.doctor_id.is_some()
    }
}

/// Record data ready to be persisted.
#[derive(Debug, Clone, Default)]
pub struct NewEhrRecord {
    pub user_id: i64,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub text_content: Option<String>,
    pub prediction_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub record_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_its_value() {
        for category in EhrCategory::ALL {
            assert_eq!(EhrCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(EhrCategory::parse("x_ray"), None);
    }

    #[test]
    fn file_sizes_format_by_magnitude() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn extension_lookup_covers_documents_and_images() {
        assert_eq!(extension_for("application/pdf"), Some(".pdf"));
        assert_eq!(extension_for("image/png"), Some(".png"));
        assert_eq!(extension_for("video/mp4"), None);
    }

    #[test]
    fn unknown_file_type_displays_as_unknown() {
        assert_eq!(file_type_name("application/pdf"), "PDF Document");
        assert_eq!(file_type_name("application/zip"), "Unknown");
    }
}
