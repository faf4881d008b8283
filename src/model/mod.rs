pub mod account;
pub mod catalog;
pub mod config;
pub mod ehr;
pub mod notification;
pub mod prescription;
pub mod triage;

pub use catalog::*;
pub use config::{Config, StorageConfig};
