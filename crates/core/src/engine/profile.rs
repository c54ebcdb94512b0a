use crate::domain::profile::{InvestmentRange, InvestorProfile, RiskTolerance};

/// Cold-start policy: users without history (or with an unreachable
/// inference service) get a moderate, diversified profile rather than none.
pub fn default_profile() -> InvestorProfile {
    InvestorProfile {
        preferred_investment_range: InvestmentRange {
            min: 1000.0,
            max: 50000.0,
        },
        risk_tolerance: RiskTolerance::Moderate,
        preferred_property_types: vec!["residential".to_string(), "commercial".to_string()],
        preferred_locations: vec!["urban".to_string(), "suburban".to_string()],
        investment_goals: vec!["long-term growth".to_string(), "passive income".to_string()],
    }
}
