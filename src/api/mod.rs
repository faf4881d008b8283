//! HTTP layer, one module per resource

pub mod auth;
pub mod doctors;
pub mod ehr;
pub mod error;
pub mod health;
pub mod notification;
pub mod openapi;
pub mod portal;
pub mod prescription;
pub mod triage;
