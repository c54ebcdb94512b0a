pub mod anthropic;
pub mod error;
pub mod json;

use crate::domain::profile::InvestorProfile;
use crate::domain::property::{Investment, Property, User};
use crate::domain::recommendation::ScoredCandidate;
use serde_json::json;

#[derive(Debug, Clone, Copy)]
pub enum Provider {
    Anthropic,
}

/// Everything the profile-analysis prompt needs about one user.
#[derive(Debug, Clone)]
pub struct ProfileAnalysisInput {
    pub user: User,
    pub investments: Vec<Investment>,
}

impl ProfileAnalysisInput {
    pub fn history_json(&self) -> serde_json::Value {
        let history: Vec<serde_json::Value> = self
            .investments
            .iter()
            .map(|inv| {
                json!({
                    "property_id": inv.property_id,
                    "investment_amount": inv.investment_amount,
                    "current_value": inv.current_value,
                    "tokens_owned": inv.tokens_owned,
                })
            })
            .collect();

        json!({
            "total_investments": self.investments.len(),
            "kyc_status": self.user.kyc_status,
            "registered_at": self.user.created_at,
            "history": history,
        })
    }
}

/// Compact candidate view for the batch scoring prompt. Keeps the payload
/// small and the output contract keyed by property id.
pub fn candidates_json(candidates: &[Property]) -> serde_json::Value {
    let items: Vec<serde_json::Value> = candidates
        .iter()
        .map(|p| {
            json!({
                "property_id": p.id,
                "title": p.title,
                "location": p.location,
                "property_type": p.property_type,
                "total_value": p.total_value,
                "min_investment": p.min_investment,
                "expected_roi": p.expected_roi,
                "available_tokens": p.available_tokens,
                "total_tokens": p.total_tokens,
                "description": p.description,
            })
        })
        .collect();
    json!(items)
}

/// Opaque, possibly-unavailable inference dependency. Every method is a
/// single round-trip; callers own the fallback on failure.
#[async_trait::async_trait]
pub trait InferenceClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn analyze_profile(&self, input: ProfileAnalysisInput)
        -> anyhow::Result<InvestorProfile>;

    async fn score_properties(
        &self,
        profile: &InvestorProfile,
        candidates: &[Property],
    ) -> anyhow::Result<Vec<ScoredCandidate>>;

    async fn explain_match(
        &self,
        profile: &InvestorProfile,
        property: &Property,
    ) -> anyhow::Result<String>;
}
