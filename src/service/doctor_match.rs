//! Doctor recommendation ranking

use crate::model::catalog::{Doctor, DoctorDirectory, RiskLevel, GENERAL_PHYSICIAN};

/// Default number of doctors returned for a prediction
pub const DEFAULT_LIMIT: usize = 3;

const EXPERTISE_MATCH_BONUS: i32 = 50;
const HIGH_RISK_SPECIALIST_BONUS: i32 = 30;
const EXACT_EXPERTISE_BONUS: i32 = 40;
const GENERAL_PHYSICIAN_LOW_RISK_BONUS: i32 = 20;

/// Years of experience counted toward the score, at most
const EXPERIENCE_CAP: u32 = 30;

/// Rank doctors for a predicted disease.
///
/// Candidates are the directory entries whose specialization treats
/// the disease. For HIGH risk the general physicians are dropped from
/// the candidate set, unless they are all it contains. Ranking is by
/// relevance score, descending; equal scores keep directory order.
pub fn recommend_doctors(
    directory: &DoctorDirectory,
    disease: &str,
    risk_level: RiskLevel,
    limit: usize,
) -> Vec<Doctor> {
    let mut specializations = directory.specialists_for(disease);

    if risk_level == RiskLevel::High {
        specializations.retain(|s| s != GENERAL_PHYSICIAN);
        if specializations.is_empty() {
            specializations.push(GENERAL_PHYSICIAN.to_string());
        }
    }

    let mut matching: Vec<(&Doctor, i32)> = directory
        .all()
        .iter()
        .filter(|d| specializations.iter().any(|s| *s == d.specialization))
        .map(|d| (d, relevance_score(d, disease, risk_level)))
        .collect();

    matching.sort_by_key(|(_, score)| std::cmp::Reverse(*score));

    matching
        .into_iter()
        .take(limit)
        .map(|(d, _)| d.clone())
        .collect()
}

/// Whether any expertise tag contains the disease name or vice versa
fn fuzzy_expertise_match(doctor: &Doctor, disease: &str) -> bool {
    let disease = disease.to_lowercase();
    doctor.expertise.iter().any(|exp| {
        let exp = exp.to_lowercase();
        exp.contains(&disease) || disease.contains(&exp)
    })
}

fn relevance_score(doctor: &Doctor, disease: &str, risk_level: RiskLevel) -> i32 {
    let mut score = 0;

    if fuzzy_expertise_match(doctor, disease) {
        score += EXPERTISE_MATCH_BONUS;
    }

    if risk_level == RiskLevel::High && doctor.specialization != GENERAL_PHYSICIAN {
        score += HIGH_RISK_SPECIALIST_BONUS;
    }

    // An exact expertise listing stacks on top of the fuzzy bonus
    if doctor
        .expertise
        .iter()
        .any(|exp| exp.eq_ignore_ascii_case(disease))
    {
        score += EXACT_EXPERTISE_BONUS;
    }

    if doctor.specialization == GENERAL_PHYSICIAN && risk_level == RiskLevel::Low {
        score += GENERAL_PHYSICIAN_LOW_RISK_BONUS;
    }

    score + doctor.experience_years.min(EXPERIENCE_CAP) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn directory() -> DoctorDirectory {
        DoctorDirectory::from_embedded().unwrap()
    }

    #[test]
    fn high_risk_diabetes_goes_to_specialists() {
        let doctors = recommend_doctors(&directory(), "Diabetes", RiskLevel::High, 3);
        assert!(!doctors.is_empty());
        for doctor in &doctors {
            assert!(
                doctor.specialization == "Endocrinologist"
                    || doctor.specialization == "Diabetologist",
                "unexpected specialization {}",
                doctor.specialization
            );
        }
    }

    #[test]
    fn unknown_disease_falls_back_to_general_physicians() {
        let doctors = recommend_doctors(&directory(), "Cold", RiskLevel::Low, 3);
        assert!(!doctors.is_empty());
        assert!(doctors.iter().all(|d| d.specialization == GENERAL_PHYSICIAN));
    }

    #[test]
    fn high_risk_keeps_general_physicians_when_they_are_the_only_match() {
        let doctors = recommend_doctors(&directory(), "Mystery Ailment", RiskLevel::High, 3);
        assert!(!doctors.is_empty());
        assert!(doctors.iter().all(|d| d.specialization == GENERAL_PHYSICIAN));
    }

    #[test]
    fn limit_bounds_the_result() {
        let doctors = recommend_doctors(&directory(), "Diabetes", RiskLevel::High, 2);
        assert!(doctors.len() <= 2);
    }

    #[test]
    fn exact_expertise_outranks_fuzzy_only_candidates() {
        let dir = DoctorDirectory {
            specializations: [(
                "Migraine".to_string(),
                vec!["Neurologist".to_string()],
            )]
            .into_iter()
            .collect(),
            doctors: vec![
                Doctor {
                    id: 1,
                    name: "Dr. Fuzzy".to_string(),
                    specialization: "Neurologist".to_string(),
                    expertise: vec!["Migraine Treatment".to_string()],
                    location: String::new(),
                    contact: String::new(),
                    availability: String::new(),
                    consultation_fee: String::new(),
                    experience_years: 10,
                },
                Doctor {
                    id: 2,
                    name: "Dr. Exact".to_string(),
                    specialization: "Neurologist".to_string(),
                    expertise: vec!["Migraine".to_string()],
                    location: String::new(),
                    contact: String::new(),
                    availability: String::new(),
                    consultation_fee: String::new(),
                    experience_years: 10,
                },
            ],
        };

        let doctors = recommend_doctors(&dir, "Migraine", RiskLevel::Low, 2);
        assert_eq!(doctors[0].id, 2);
        assert_eq!(doctors[1].id, 1);
    }

    #[test]
    fn equal_scores_keep_directory_order() {
        let gp = |id: i64, name: &str| Doctor {
            id,
            name: name.to_string(),
            specialization: GENERAL_PHYSICIAN.to_string(),
            expertise: vec![],
            location: String::new(),
            contact: String::new(),
            availability: String::new(),
            consultation_fee: String::new(),
            experience_years: 12,
        };
        let dir = DoctorDirectory {
            specializations: HashMap::new(),
            doctors: vec![gp(7, "Dr. First"), gp(3, "Dr. Second"), gp(9, "Dr. Third")],
        };

        let doctors = recommend_doctors(&dir, "Cold", RiskLevel::Low, 3);
        let ids: Vec<i64> = doctors.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![7, 3, 9]);
    }

    #[test]
    fn experience_contribution_is_capped() {
        let mut veteran = Doctor {
            id: 1,
            name: "Dr. Veteran".to_string(),
            specialization: GENERAL_PHYSICIAN.to_string(),
            expertise: vec![],
            location: String::new(),
            contact: String::new(),
            availability: String::new(),
            consultation_fee: String::new(),
            experience_years: 45,
        };
        let capped = relevance_score(&veteran, "Cold", RiskLevel::Medium);
        veteran.experience_years = 30;
        assert_eq!(capped, relevance_score(&veteran, "Cold", RiskLevel::Medium));
        assert_eq!(capped, 30);
    }
}
