use crate::domain::recommendation::RiskLevel;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Derived summary of a user's investment preferences. Computed fresh on
/// every request from current history; never cached or persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestorProfile {
    pub preferred_investment_range: InvestmentRange,
    pub risk_tolerance: RiskTolerance,
    pub preferred_property_types: Vec<String>,
    pub preferred_locations: Vec<String>,
    pub investment_goals: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRange {
    pub min: f64,
    pub max: f64,
}

impl InvestmentRange {
    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    /// conservative↔low, moderate↔medium, aggressive↔high.
    pub fn accepts(&self, level: RiskLevel) -> bool {
        matches!(
            (self, level),
            (RiskTolerance::Conservative, RiskLevel::Low)
                | (RiskTolerance::Moderate, RiskLevel::Medium)
                | (RiskTolerance::Aggressive, RiskLevel::High)
        )
    }
}

impl FromStr for RiskTolerance {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(RiskTolerance::Conservative),
            "moderate" => Ok(RiskTolerance::Moderate),
            "aggressive" => Ok(RiskTolerance::Aggressive),
            other => Err(anyhow::anyhow!("unknown risk tolerance: {other}")),
        }
    }
}
