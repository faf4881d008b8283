pub mod account;
pub mod classifier;
pub mod doctor_match;
pub mod ehr;
pub mod notification;
pub mod precaution;
pub mod prescription;
pub mod risk;
pub mod triage;

pub use account::AccountService;
pub use ehr::EhrService;
pub use notification::NotificationStore;
pub use prescription::PrescriptionService;
pub use triage::TriageService;
