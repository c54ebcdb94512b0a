use crate::domain::profile::InvestorProfile;
use crate::domain::property::Property;
use crate::domain::recommendation::{RiskLevel, ScoredCandidate};

const GENERIC_REASONS: [&str; 2] = [
    "Solid investment opportunity",
    "Available for fractional ownership",
];

const MAX_REASONS: usize = 3;

/// Weights and thresholds for the rule-based scorer. Point values differ
/// between deployments, so every bonus is a knob; the defaults are the
/// canonical product values.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub base_score: f64,
    pub budget_fit_bonus: f64,
    pub type_match_bonus: f64,
    pub location_match_bonus: f64,
    pub risk_alignment_bonus: f64,
    pub availability_bonus: f64,

    /// Fraction of total tokens that must still be available for the
    /// availability bonus to apply.
    pub availability_ratio: f64,

    /// Optional inclusion cutoff: candidates scoring below are dropped from
    /// the result. Disabled by default.
    pub min_score: Option<f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_score: 50.0,
            budget_fit_bonus: 20.0,
            type_match_bonus: 15.0,
            location_match_bonus: 15.0,
            risk_alignment_bonus: 10.0,
            availability_bonus: 10.0,
            availability_ratio: 0.5,
            min_score: None,
        }
    }
}

impl ScoringConfig {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("SCORING_BASE_SCORE") {
            if let Ok(n) = s.parse::<f64>() {
                out.base_score = n;
            }
        }

        if let Ok(s) = std::env::var("SCORING_BUDGET_FIT_BONUS") {
            if let Ok(n) = s.parse::<f64>() {
                out.budget_fit_bonus = n;
            }
        }

        if let Ok(s) = std::env::var("SCORING_TYPE_MATCH_BONUS") {
            if let Ok(n) = s.parse::<f64>() {
                out.type_match_bonus = n;
            }
        }

        if let Ok(s) = std::env::var("SCORING_LOCATION_MATCH_BONUS") {
            if let Ok(n) = s.parse::<f64>() {
                out.location_match_bonus = n;
            }
        }

        if let Ok(s) = std::env::var("SCORING_RISK_ALIGNMENT_BONUS") {
            if let Ok(n) = s.parse::<f64>() {
                out.risk_alignment_bonus = n;
            }
        }

        if let Ok(s) = std::env::var("SCORING_AVAILABILITY_BONUS") {
            if let Ok(n) = s.parse::<f64>() {
                out.availability_bonus = n;
            }
        }

        if let Ok(s) = std::env::var("SCORING_MIN_SCORE") {
            if let Ok(n) = s.parse::<f64>() {
                out.min_score = Some(n);
            }
        }

        out
    }
}

/// ROI-based risk classification: above 15% is high, above 10% is medium,
/// everything else (including unparseable ROI) is low.
pub fn classify_risk(expected_roi_pct: f64) -> RiskLevel {
    if expected_roi_pct > 15.0 {
        RiskLevel::High
    } else if expected_roi_pct > 10.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Rule-based scoring of candidates against a profile. Pure and
/// deterministic: no I/O, no randomness, stable ordering for equal scores.
pub fn score_candidates(
    config: &ScoringConfig,
    profile: &InvestorProfile,
    candidates: &[Property],
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .iter()
        .map(|property| score_one(config, profile, property))
        .filter(|candidate| match config.min_score {
            Some(cutoff) => candidate.score >= cutoff,
            None => true,
        })
        .collect();

    // Stable sort: equal scores keep candidate iteration order.
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored
}

fn score_one(
    config: &ScoringConfig,
    profile: &InvestorProfile,
    property: &Property,
) -> ScoredCandidate {
    let mut score = config.base_score;
    let mut reasons: Vec<String> = Vec::new();

    if profile
        .preferred_investment_range
        .contains(property.min_investment_amount())
    {
        score += config.budget_fit_bonus;
        reasons.push("Investment amount fits your preferred range".to_string());
    }

    if profile
        .preferred_property_types
        .iter()
        .any(|t| t.eq_ignore_ascii_case(&property.property_type))
    {
        score += config.type_match_bonus;
        reasons.push("Matches your preferred property type".to_string());
    }

    let location = property.location.to_lowercase();
    if profile
        .preferred_locations
        .iter()
        .any(|loc| location.contains(&loc.to_lowercase()))
    {
        score += config.location_match_bonus;
        reasons.push("Located in your preferred area".to_string());
    }

    let risk_level = classify_risk(property.expected_roi_pct());
    if profile.risk_tolerance.accepts(risk_level) {
        score += config.risk_alignment_bonus;
        reasons.push(
            match risk_level {
                RiskLevel::High => "High ROI potential aligns with your risk tolerance",
                RiskLevel::Medium => "Balanced risk-return profile",
                RiskLevel::Low => "Low-risk investment suitable for conservative approach",
            }
            .to_string(),
        );
    }

    let availability_floor = f64::from(property.total_tokens) * config.availability_ratio;
    if property.total_tokens > 0 && f64::from(property.available_tokens) > availability_floor {
        score += config.availability_bonus;
        reasons.push("Plenty of tokens remain available for entry".to_string());
    }

    if reasons.is_empty() {
        reasons.extend(GENERIC_REASONS.iter().map(|r| r.to_string()));
    }
    reasons.truncate(MAX_REASONS);

    let score = score.clamp(0.0, 100.0);

    ScoredCandidate {
        property_id: property.id,
        score,
        reasons,
        risk_level,
        match_percentage: score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{InvestmentRange, RiskTolerance};
    use chrono::Utc;

    fn moderate_profile() -> InvestorProfile {
        InvestorProfile {
            preferred_investment_range: InvestmentRange {
                min: 1000.0,
                max: 50000.0,
            },
            risk_tolerance: RiskTolerance::Moderate,
            preferred_property_types: vec!["residential".to_string(), "commercial".to_string()],
            preferred_locations: vec!["urban".to_string(), "suburban".to_string()],
            investment_goals: vec!["long-term growth".to_string()],
        }
    }

    fn property(id: i32) -> Property {
        Property {
            id,
            title: format!("Property {id}"),
            description: "A property".to_string(),
            location: "Nowhere".to_string(),
            property_type: "Land".to_string(),
            total_value: "1000000".to_string(),
            total_tokens: 1000,
            available_tokens: 100,
            expected_roi: "8.0".to_string(),
            min_investment: "100000".to_string(),
            image_url: "https://example.com/p.jpg".to_string(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn classifies_risk_at_band_boundaries() {
        assert_eq!(classify_risk(15.1), RiskLevel::High);
        assert_eq!(classify_risk(15.0), RiskLevel::Medium);
        assert_eq!(classify_risk(10.1), RiskLevel::Medium);
        assert_eq!(classify_risk(10.0), RiskLevel::Low);
        assert_eq!(classify_risk(0.0), RiskLevel::Low);
    }

    #[test]
    fn all_four_preference_rules_fire_for_a_matching_property() {
        let mut p = property(1);
        p.min_investment = "2000".to_string();
        p.property_type = "Residential".to_string();
        p.location = "Urban Heights".to_string();
        p.expected_roi = "11.0".to_string();
        p.available_tokens = 100; // below the availability floor

        let scored = score_candidates(&ScoringConfig::default(), &moderate_profile(), &[p]);
        assert_eq!(scored.len(), 1);
        let rec = &scored[0];
        // 50 base + 20 budget + 15 type + 15 location + 10 risk, clamped.
        assert_eq!(rec.score, 100.0);
        assert_eq!(rec.match_percentage, 100.0);
        assert_eq!(rec.risk_level, RiskLevel::Medium);
        assert_eq!(rec.reasons.len(), 3);
        assert_eq!(rec.reasons[0], "Investment amount fits your preferred range");
    }

    #[test]
    fn availability_bonus_requires_majority_of_tokens_left() {
        let config = ScoringConfig::default();
        let profile = moderate_profile();

        let mut liquid = property(1);
        liquid.available_tokens = 501;
        let mut tight = property(2);
        tight.available_tokens = 500;

        let scored = score_candidates(&config, &profile, &[liquid, tight]);
        assert_eq!(scored[0].property_id, 1);
        assert_eq!(scored[0].score, 60.0);
        assert_eq!(scored[1].score, 50.0);
    }

    #[test]
    fn unmatched_property_gets_base_score_and_generic_reasons() {
        let scored = score_candidates(
            &ScoringConfig::default(),
            &moderate_profile(),
            &[property(1)],
        );
        assert_eq!(scored[0].score, 50.0);
        assert_eq!(
            scored[0].reasons,
            vec![
                "Solid investment opportunity".to_string(),
                "Available for fractional ownership".to_string(),
            ]
        );
    }

    #[test]
    fn scoring_is_deterministic() {
        let config = ScoringConfig::default();
        let profile = moderate_profile();
        let candidates = vec![property(1), property(2), property(3)];

        let first = score_candidates(&config, &profile, &candidates);
        let second = score_candidates(&config, &profile, &candidates);
        assert_eq!(first, second);
    }

    #[test]
    fn equal_scores_preserve_candidate_order() {
        let scored = score_candidates(
            &ScoringConfig::default(),
            &moderate_profile(),
            &[property(3), property(1), property(2)],
        );
        let ids: Vec<i32> = scored.iter().map(|s| s.property_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn min_score_cutoff_drops_weak_candidates() {
        let mut config = ScoringConfig::default();
        config.min_score = Some(60.0);

        let mut strong = property(1);
        strong.min_investment = "2000".to_string();
        let weak = property(2);

        let scored = score_candidates(&config, &moderate_profile(), &[strong, weak]);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].property_id, 1);
    }

    #[test]
    fn scores_and_match_percentages_stay_in_range() {
        let mut config = ScoringConfig::default();
        config.base_score = 0.0;
        let scored = score_candidates(&config, &moderate_profile(), &[property(1)]);
        assert!(scored[0].score >= 0.0 && scored[0].score <= 100.0);
        assert!(scored[0].match_percentage >= 0.0 && scored[0].match_percentage <= 100.0);
    }
}
