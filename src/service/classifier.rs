//! Symptom classification over the embedded disease catalog

use crate::model::catalog::DiseaseCatalog;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Disease catalog is empty")]
    EmptyCatalog,
}

/// Outcome of classifying a symptom description
#[derive(Debug, Clone)]
pub struct Classification {
    /// Winning disease label
    pub label: String,
    /// Probability per catalog label, in catalog order, summing to 1.0
    pub probabilities: Vec<(String, f64)>,
}

impl Classification {
    /// Probability of the winning label
    pub fn confidence(&self) -> f64 {
        self.probabilities
            .iter()
            .map(|(_, p)| *p)
            .fold(0.0, f64::max)
    }
}

/// Trait for symptom classifiers
pub trait SymptomClassifier: Send + Sync {
    /// Classify a symptom description into a disease label with a
    /// probability for every label in the catalog
    fn classify(&self, symptoms: &str) -> Classification;
}

/// Classifier that scores keyword overlap between the symptom text and
/// each disease's keyword vocabulary. Scores are normalized into a
/// probability distribution; with no overlap at all the distribution
/// is uniform.
pub struct KeywordClassifier {
    catalog: DiseaseCatalog,
}

impl KeywordClassifier {
    pub fn from_catalog(catalog: DiseaseCatalog) -> Result<Self, ClassifierError> {
        if catalog.is_empty() {
            return Err(ClassifierError::EmptyCatalog);
        }
        Ok(Self { catalog })
    }

    /// Number of this disease's keyword phrases present in the text
    fn overlap(text: &str, keywords: &[String]) -> usize {
        keywords.iter().filter(|k| text.contains(k.as_str())).count()
    }
}

impl SymptomClassifier for KeywordClassifier {
    fn classify(&self, symptoms: &str) -> Classification {
        let text = symptoms.to_lowercase();

        let scores: Vec<f64> = self
            .catalog
            .diseases
            .iter()
            .map(|d| Self::overlap(&text, &d.keywords) as f64)
            .collect();

        let total: f64 = scores.iter().sum();

        let probabilities: Vec<(String, f64)> = if total > 0.0 {
            self.catalog
                .diseases
                .iter()
                .zip(&scores)
                .map(|(d, s)| (d.name.clone(), s / total))
                .collect()
        } else {
            // Nothing matched. Fall back to a uniform distribution so
            // the caller sees a minimal, honest confidence.
            let uniform = 1.0 / self.catalog.len() as f64;
            self.catalog
                .diseases
                .iter()
                .map(|d| (d.name.clone(), uniform))
                .collect()
        };

        // First strictly-greater score wins, so ties resolve to the
        // earliest catalog entry.
        let mut winner = 0;
        for (i, score) in scores.iter().enumerate() {
            if *score > scores[winner] {
                winner = i;
            }
        }

        Classification {
            label: self.catalog.diseases[winner].name.clone(),
            probabilities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> KeywordClassifier {
        KeywordClassifier::from_catalog(DiseaseCatalog::from_embedded().unwrap()).unwrap()
    }

    #[test]
    fn probabilities_sum_to_one() {
        let result = classifier().classify("high fever with chills and a bad headache");
        let sum: f64 = result.probabilities.iter().map(|(_, p)| p).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn distinctive_symptoms_pick_the_matching_disease() {
        let result = classifier().classify("sneezing with an itchy nose and itchy throat");
        assert_eq!(result.label, "Allergic Rhinitis");
        assert!(result.confidence() > 0.0);
    }

    #[test]
    fn unmatched_text_gets_uniform_distribution() {
        let result = classifier().classify("qwerty");
        assert_eq!(result.label, "Common Cold");
        assert!((result.confidence() - 1.0 / 50.0).abs() < 1e-9);
    }

    #[test]
    fn classification_is_case_insensitive() {
        let lower = classifier().classify("wheezing and chest tightness");
        let upper = classifier().classify("WHEEZING AND CHEST TIGHTNESS");
        assert_eq!(lower.label, upper.label);
        assert_eq!(lower.label, "Asthma");
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let empty = DiseaseCatalog { diseases: vec![] };
        assert!(KeywordClassifier::from_catalog(empty).is_err());
    }
}
