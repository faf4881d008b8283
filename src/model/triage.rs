use chrono::{DateTime, Utc};

use crate::model::catalog::{AdviceLevel, RiskLevel};

/// A stored symptom analysis for one user.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub id: i64,
    pub user_id: i64,
    pub symptoms_text: String,
    pub predicted_disease: String,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    /// Formatted precaution summary as saved alongside the prediction
    pub precautions_text: Option<String>,
    pub advice_level: Option<AdviceLevel>,
    pub created_at: DateTime<Utc>,
}

/// Prediction data ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub user_id: i64,
    pub symptoms_text: String,
    pub predicted_disease: String,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub precautions_text: Option<String>,
    pub advice_level: Option<AdviceLevel>,
}
