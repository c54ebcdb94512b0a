use crate::domain::property::Property;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl FromStr for RiskLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(anyhow::anyhow!("unknown risk level: {other}")),
        }
    }
}

/// One scored candidate, keyed by property id. Produced by either the
/// inference client or the rule-based scorer; the orchestrator maps it back
/// to the full property record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub property_id: i32,
    pub score: f64,
    pub reasons: Vec<String>,
    pub risk_level: RiskLevel,
    pub match_percentage: f64,
}

/// Final per-request output. Not persisted; recomputed on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecommendation {
    pub property: Property,
    pub score: f64,
    pub reasons: Vec<String>,
    pub risk_level: RiskLevel,
    pub match_percentage: f64,
}
