use crate::domain::profile::{InvestmentRange, InvestorProfile, RiskTolerance};
use crate::domain::recommendation::{RiskLevel, ScoredCandidate};
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const MAX_REASONS: usize = 3;

/// Loosely-typed profile as emitted by the inference service. Converted into
/// [`InvestorProfile`] only after validation; any violation makes the caller
/// fall back to the default profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmInvestorProfile {
    pub preferred_investment_range: LlmInvestmentRange,
    pub risk_tolerance: String,
    pub preferred_property_types: Vec<String>,
    pub preferred_locations: Vec<String>,
    pub investment_goals: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmInvestmentRange {
    pub min: f64,
    pub max: f64,
}

impl LlmInvestorProfile {
    pub fn validate_and_into_profile(self) -> anyhow::Result<InvestorProfile> {
        let LlmInvestmentRange { min, max } = self.preferred_investment_range;
        ensure!(
            min.is_finite() && max.is_finite(),
            "investment range must be finite (got min={min}, max={max})"
        );
        ensure!(min >= 0.0, "investment range min must be non-negative (got {min})");
        ensure!(min <= max, "investment range is inverted (min={min}, max={max})");

        let risk_tolerance: RiskTolerance = self.risk_tolerance.parse()?;

        let preferred_property_types = non_empty_trimmed(self.preferred_property_types);
        ensure!(
            !preferred_property_types.is_empty(),
            "preferred_property_types must be non-empty"
        );

        let preferred_locations = non_empty_trimmed(self.preferred_locations);
        ensure!(
            !preferred_locations.is_empty(),
            "preferred_locations must be non-empty"
        );

        let investment_goals = non_empty_trimmed(self.investment_goals);
        ensure!(!investment_goals.is_empty(), "investment_goals must be non-empty");

        Ok(InvestorProfile {
            preferred_investment_range: InvestmentRange { min, max },
            risk_tolerance,
            preferred_property_types,
            preferred_locations,
            investment_goals,
        })
    }
}

/// Batch scoring response. The service is asked for an object with a
/// `recommendations` array; some outputs arrive as a bare array, which the
/// JSON layer normalizes into this shape before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmScoredBatch {
    #[serde(default)]
    pub recommendations: Vec<LlmScoredItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmScoredItem {
    pub property_id: i32,
    pub score: f64,
    pub reasons: Vec<String>,
    pub risk_level: String,
    pub match_percentage: f64,
}

impl LlmScoredBatch {
    pub fn validate_and_into_scores(self) -> anyhow::Result<Vec<ScoredCandidate>> {
        ensure!(
            !self.recommendations.is_empty(),
            "scoring output must contain at least one recommendation"
        );

        let mut seen_ids = BTreeSet::<i32>::new();
        let mut out = Vec::with_capacity(self.recommendations.len());
        for item in self.recommendations {
            out.push(item.validate_and_into_score(&mut seen_ids)?);
        }
        Ok(out)
    }
}

impl LlmScoredItem {
    fn validate_and_into_score(
        self,
        seen_ids: &mut BTreeSet<i32>,
    ) -> anyhow::Result<ScoredCandidate> {
        ensure!(
            seen_ids.insert(self.property_id),
            "duplicate property_id: {}",
            self.property_id
        );
        ensure!(
            self.score.is_finite() && (0.0..=100.0).contains(&self.score),
            "score out of range for property {}: {}",
            self.property_id,
            self.score
        );
        ensure!(
            self.match_percentage.is_finite() && (0.0..=100.0).contains(&self.match_percentage),
            "match_percentage out of range for property {}: {}",
            self.property_id,
            self.match_percentage
        );

        let risk_level: RiskLevel = self.risk_level.parse()?;

        let mut reasons = non_empty_trimmed(self.reasons);
        ensure!(
            !reasons.is_empty(),
            "reasons must be non-empty for property {}",
            self.property_id
        );
        reasons.truncate(MAX_REASONS);

        Ok(ScoredCandidate {
            property_id: self.property_id,
            score: self.score,
            reasons,
            risk_level,
            match_percentage: self.match_percentage,
        })
    }
}

fn non_empty_trimmed(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_profile() -> LlmInvestorProfile {
        LlmInvestorProfile {
            preferred_investment_range: LlmInvestmentRange {
                min: 500.0,
                max: 20000.0,
            },
            risk_tolerance: "Aggressive".to_string(),
            preferred_property_types: vec![" Commercial ".to_string(), String::new()],
            preferred_locations: vec!["downtown".to_string()],
            investment_goals: vec!["short-term gains".to_string()],
        }
    }

    #[test]
    fn profile_validation_trims_and_parses() {
        let profile = raw_profile().validate_and_into_profile().unwrap();
        assert_eq!(profile.risk_tolerance, RiskTolerance::Aggressive);
        assert_eq!(profile.preferred_property_types, vec!["Commercial"]);
        assert_eq!(profile.preferred_investment_range.min, 500.0);
    }

    #[test]
    fn profile_validation_rejects_inverted_range() {
        let mut raw = raw_profile();
        raw.preferred_investment_range = LlmInvestmentRange {
            min: 5000.0,
            max: 100.0,
        };
        assert!(raw.validate_and_into_profile().is_err());
    }

    #[test]
    fn profile_validation_rejects_unknown_tolerance() {
        let mut raw = raw_profile();
        raw.risk_tolerance = "yolo".to_string();
        assert!(raw.validate_and_into_profile().is_err());
    }

    #[test]
    fn profile_validation_rejects_all_blank_lists() {
        let mut raw = raw_profile();
        raw.preferred_locations = vec!["  ".to_string()];
        assert!(raw.validate_and_into_profile().is_err());
    }

    fn raw_item(property_id: i32) -> LlmScoredItem {
        LlmScoredItem {
            property_id,
            score: 72.0,
            reasons: vec!["a".to_string(), "b".to_string()],
            risk_level: "medium".to_string(),
            match_percentage: 72.0,
        }
    }

    #[test]
    fn batch_validation_accepts_well_formed_items() {
        let batch = LlmScoredBatch {
            recommendations: vec![raw_item(1), raw_item(2)],
        };
        let scores = batch.validate_and_into_scores().unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].risk_level, RiskLevel::Medium);
    }

    #[test]
    fn batch_validation_rejects_duplicate_property_ids() {
        let batch = LlmScoredBatch {
            recommendations: vec![raw_item(7), raw_item(7)],
        };
        assert!(batch.validate_and_into_scores().is_err());
    }

    #[test]
    fn batch_validation_rejects_out_of_range_score() {
        let mut item = raw_item(1);
        item.score = 140.0;
        let batch = LlmScoredBatch {
            recommendations: vec![item],
        };
        assert!(batch.validate_and_into_scores().is_err());
    }

    #[test]
    fn batch_validation_rejects_empty_batch_and_empty_reasons() {
        let empty = LlmScoredBatch {
            recommendations: Vec::new(),
        };
        assert!(empty.validate_and_into_scores().is_err());

        let mut item = raw_item(1);
        item.reasons = vec!["   ".to_string()];
        let batch = LlmScoredBatch {
            recommendations: vec![item],
        };
        assert!(batch.validate_and_into_scores().is_err());
    }

    #[test]
    fn batch_validation_caps_reasons_at_three() {
        let mut item = raw_item(1);
        item.reasons = vec!["a", "b", "c", "d"].into_iter().map(String::from).collect();
        let batch = LlmScoredBatch {
            recommendations: vec![item],
        };
        let scores = batch.validate_and_into_scores().unwrap();
        assert_eq!(scores[0].reasons.len(), 3);
    }
}
