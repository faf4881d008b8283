//! Risk resolution from base risk and prediction confidence

use crate::model::catalog::RiskLevel;

/// Confidence at or above which the disease's base risk is trusted
const HIGH_CONFIDENCE: f64 = 0.7;

/// Confidence at or above which the prediction is merely cautioned
const MODERATE_CONFIDENCE: f64 = 0.4;

pub const MODERATE_CONFIDENCE_MESSAGE: &str =
    "Prediction confidence is moderate. Consider consulting a doctor.";

pub const LOW_CONFIDENCE_MESSAGE: &str =
    "⚠️ Low confidence prediction. Please consult a doctor for accurate diagnosis.";

/// Resolve the effective risk level for a prediction.
///
/// A confident prediction keeps the disease's base risk. An uncertain
/// one overrides it: moderate confidence caps the answer at MEDIUM and
/// low confidence escalates to HIGH, whatever the disease.
pub fn resolve_risk(confidence: f64, base_risk: RiskLevel) -> (RiskLevel, &'static str) {
    if confidence >= HIGH_CONFIDENCE {
        (base_risk, "")
    } else if confidence >= MODERATE_CONFIDENCE {
        (RiskLevel::Medium, MODERATE_CONFIDENCE_MESSAGE)
    } else {
        (RiskLevel::High, LOW_CONFIDENCE_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confident_prediction_keeps_base_risk() {
        assert_eq!(resolve_risk(0.9, RiskLevel::Low), (RiskLevel::Low, ""));
        assert_eq!(resolve_risk(0.7, RiskLevel::High), (RiskLevel::High, ""));
    }

    #[test]
    fn moderate_confidence_forces_medium_with_caution() {
        let (risk, message) = resolve_risk(0.55, RiskLevel::Low);
        assert_eq!(risk, RiskLevel::Medium);
        assert_eq!(message, MODERATE_CONFIDENCE_MESSAGE);

        // Even a high base risk is reported as MEDIUM in this band
        let (risk, _) = resolve_risk(0.4, RiskLevel::High);
        assert_eq!(risk, RiskLevel::Medium);
    }

    #[test]
    fn low_confidence_escalates_to_high() {
        let (risk, message) = resolve_risk(0.25, RiskLevel::Low);
        assert_eq!(risk, RiskLevel::High);
        assert_eq!(message, LOW_CONFIDENCE_MESSAGE);
    }
}
