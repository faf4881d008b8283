//! Personalized precaution generation

use crate::model::catalog::{AdviceLevel, PrecautionTable, RiskLevel};
use crate::model::triage::Prediction;

/// Number of entries kept from each precaution list
const LIST_LIMIT: usize = 4;

/// Same-disease occurrences in the history that count as recurring
const RECURRENCE_THRESHOLD: usize = 2;

pub const DISCLAIMER: &str = "⚠️ DISCLAIMER: This advice is NOT a substitute for professional medical diagnosis, advice, or treatment. Always consult a qualified healthcare provider for medical concerns.";

/// Advice generated for one prediction
#[derive(Debug, Clone)]
pub struct GeneratedAdvice {
    pub advice_level: AdviceLevel,
    pub precautions: Vec<String>,
    pub dos: Vec<String>,
    pub donts: Vec<String>,
    pub consult_when: Vec<String>,
    pub disclaimer: String,
}

/// Determine the urgency level of advice based on confidence and risk
pub fn determine_advice_level(confidence: f64, risk_level: RiskLevel) -> AdviceLevel {
    if risk_level == RiskLevel::High || confidence < 0.3 {
        AdviceLevel::High
    } else if risk_level == RiskLevel::Medium || confidence < 0.5 {
        AdviceLevel::Medium
    } else {
        AdviceLevel::Low
    }
}

/// Generate personalized precautionary advice.
///
/// The precautions list opens with a confidence-dependent message,
/// carries up to four general precautions for the disease, and closes
/// with risk and recurrence callouts when they apply.
pub fn generate_advice(
    table: &PrecautionTable,
    disease: &str,
    confidence: f64,
    risk_level: RiskLevel,
    user_name: &str,
    previous_predictions: &[Prediction],
) -> GeneratedAdvice {
    let precautions_data = table.for_disease(disease);
    let advice_level = determine_advice_level(confidence, risk_level);

    let mut precautions = Vec::new();

    // Confidence-based opening advice
    let confidence_percent = (confidence * 100.0) as i64;

    if confidence < 0.3 {
        precautions.push(format!(
            "⚠️ {}, the prediction confidence is low ({}%). These suggestions are general guidelines. Please consult a healthcare professional for an accurate assessment.",
            user_name, confidence_percent
        ));
    } else if confidence < 0.5 {
        precautions.push(format!(
            "📋 {}, based on your symptoms, here are some helpful suggestions. The prediction confidence is moderate ({}%), so professional consultation is recommended.",
            user_name, confidence_percent
        ));
    } else {
        precautions.push(format!(
            "💡 {}, based on your symptoms analysis, here are personalized suggestions to help you feel better.",
            user_name
        ));
    }

    precautions.extend(
        precautions_data
            .general
            .iter()
            .take(LIST_LIMIT)
            .cloned(),
    );

    // Risk-level specific advice
    match risk_level {
        RiskLevel::High => precautions.push(
            "🏥 Given the risk assessment, we strongly recommend consulting a healthcare provider as soon as possible."
                .to_string(),
        ),
        RiskLevel::Medium => precautions.push(
            "📞 If symptoms persist or worsen, consider scheduling a consultation with a healthcare provider."
                .to_string(),
        ),
        RiskLevel::Low => {}
    }

    // Recurring condition callout
    let same_disease_count = previous_predictions
        .iter()
        .filter(|p| p.predicted_disease == disease)
        .count();
    if same_disease_count >= RECURRENCE_THRESHOLD {
        precautions.push(
            "📊 We noticed you've had similar symptoms before. If this is a recurring issue, discussing it with a doctor may help identify underlying causes."
                .to_string(),
        );
    }

    GeneratedAdvice {
        advice_level,
        precautions,
        dos: precautions_data.dos.iter().take(LIST_LIMIT).cloned().collect(),
        donts: precautions_data.donts.iter().take(LIST_LIMIT).cloned().collect(),
        consult_when: precautions_data
            .consult_doctor
            .iter()
            .take(LIST_LIMIT)
            .cloned()
            .collect(),
        disclaimer: DISCLAIMER.to_string(),
    }
}

/// Format generated advice as a single string for database storage
pub fn format_advice_for_storage(advice: &GeneratedAdvice) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Advice Level: {}",
        advice.advice_level.as_str().to_uppercase()
    ));
    lines.push("\nKey Recommendations:".to_string());
    for p in &advice.precautions {
        lines.push(format!("• {}", p));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn table() -> PrecautionTable {
        PrecautionTable::from_embedded().unwrap()
    }

    fn prediction_for(disease: &str) -> Prediction {
        Prediction {
            id: 0,
            user_id: 1,
            symptoms_text: String::new(),
            predicted_disease: disease.to_string(),
            confidence: 0.8,
            risk_level: RiskLevel::Medium,
            precautions_text: None,
            advice_level: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn advice_level_follows_risk_then_confidence() {
        assert_eq!(determine_advice_level(0.9, RiskLevel::High), AdviceLevel::High);
        assert_eq!(determine_advice_level(0.2, RiskLevel::Low), AdviceLevel::High);
        assert_eq!(determine_advice_level(0.45, RiskLevel::Low), AdviceLevel::Medium);
        assert_eq!(determine_advice_level(0.9, RiskLevel::Medium), AdviceLevel::Medium);
        assert_eq!(determine_advice_level(0.9, RiskLevel::Low), AdviceLevel::Low);
    }

    #[test]
    fn precautions_run_five_to_seven_entries() {
        // Low risk, confident, no history: opening plus four general
        let advice = generate_advice(&table(), "Common Cold", 0.9, RiskLevel::Low, "Asha", &[]);
        assert_eq!(advice.precautions.len(), 5);

        // High risk with a recurring history adds both callouts
        let history = vec![prediction_for("Malaria"), prediction_for("Malaria")];
        let advice = generate_advice(&table(), "Malaria", 0.9, RiskLevel::High, "Asha", &history);
        assert_eq!(advice.precautions.len(), 7);
    }

    #[test]
    fn opening_message_tracks_confidence_band() {
        let low = generate_advice(&table(), "Common Cold", 0.2, RiskLevel::High, "Asha", &[]);
        assert!(low.precautions[0].contains("confidence is low (20%)"));

        let moderate = generate_advice(&table(), "Common Cold", 0.45, RiskLevel::Medium, "Asha", &[]);
        assert!(moderate.precautions[0].contains("moderate (45%)"));

        let confident = generate_advice(&table(), "Common Cold", 0.9, RiskLevel::Low, "Asha", &[]);
        assert!(confident.precautions[0].starts_with("💡 Asha"));
    }

    #[test]
    fn recurrence_needs_two_prior_matches() {
        let one = vec![prediction_for("Migraine")];
        let advice = generate_advice(&table(), "Migraine", 0.8, RiskLevel::Low, "Asha", &one);
        assert!(!advice.precautions.iter().any(|p| p.contains("recurring")));

        let two = vec![prediction_for("Migraine"), prediction_for("Migraine")];
        let advice = generate_advice(&table(), "Migraine", 0.8, RiskLevel::Low, "Asha", &two);
        assert!(advice.precautions.iter().any(|p| p.contains("recurring")));
    }

    #[test]
    fn unknown_disease_uses_default_lists_with_disclaimer() {
        let advice = generate_advice(&table(), "Cold", 0.75, RiskLevel::Medium, "Asha", &[]);
        assert_eq!(advice.dos.len(), 4);
        assert_eq!(advice.donts.len(), 4);
        assert_eq!(advice.consult_when.len(), 4);
        assert_eq!(advice.disclaimer, DISCLAIMER);
    }

    #[test]
    fn storage_format_lists_recommendations() {
        let advice = generate_advice(&table(), "Common Cold", 0.9, RiskLevel::Low, "Asha", &[]);
        let stored = format_advice_for_storage(&advice);
        assert!(stored.starts_with("Advice Level: LOW"));
        assert!(stored.contains("Key Recommendations:"));
        assert_eq!(stored.matches("• ").count(), advice.precautions.len());
    }
}
