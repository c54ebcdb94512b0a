pub mod fallback;
pub mod profile;

use crate::domain::profile::InvestorProfile;
use crate::domain::property::{Investment, Property, User};
use crate::domain::recommendation::PropertyRecommendation;
use crate::llm::{InferenceClient, ProfileAnalysisInput};
use crate::storage::PropertyStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub use fallback::ScoringConfig;

const DEFAULT_LIMIT: usize = 5;

pub const PROPERTY_NOT_FOUND_MESSAGE: &str = "Property not found";
pub const EXPLANATION_UNAVAILABLE_MESSAGE: &str =
    "Unable to generate detailed explanation at this time";

/// Stateless, request-scoped recommendation engine. Every public operation
/// degrades gracefully: the worst observable outcome is an empty list, the
/// default profile, or a fixed placeholder text.
pub struct RecommendationEngine {
    store: Arc<dyn PropertyStore>,
    llm: Option<Arc<dyn InferenceClient>>,
    scoring: ScoringConfig,
}

impl RecommendationEngine {
    pub fn new(
        store: Arc<dyn PropertyStore>,
        llm: Option<Arc<dyn InferenceClient>>,
        scoring: ScoringConfig,
    ) -> Self {
        Self {
            store,
            llm,
            scoring,
        }
    }

    /// Derives an investor profile from the user's history. Always returns a
    /// value: missing users, empty histories, a missing inference client, and
    /// inference failures all resolve to the default profile.
    pub async fn analyze_user_profile(&self, user_id: i32) -> InvestorProfile {
        let (user, investments) = match self.load_history(user_id).await {
            Ok(loaded) => loaded,
            Err(err) => {
                tracing::warn!(user_id, error = %err, "history lookup failed; using default profile");
                return profile::default_profile();
            }
        };

        let Some(user) = user else {
            return profile::default_profile();
        };
        if investments.is_empty() {
            return profile::default_profile();
        }

        let Some(llm) = &self.llm else {
            tracing::debug!(user_id, "no inference client configured; using default profile");
            return profile::default_profile();
        };

        match llm
            .analyze_profile(ProfileAnalysisInput { user, investments })
            .await
        {
            Ok(inferred) => inferred,
            Err(err) => {
                tracing::warn!(user_id, error = %err, "profile inference failed; using default profile");
                profile::default_profile()
            }
        }
    }

    /// Ranked, truncated recommendations for one user. Never fails; internal
    /// errors are logged and yield an empty list.
    pub async fn generate_recommendations(
        &self,
        user_id: i32,
        limit: Option<usize>,
    ) -> Vec<PropertyRecommendation> {
        match self.generate_inner(user_id, limit).await {
            Ok(recommendations) => recommendations,
            Err(err) => {
                tracing::error!(user_id, error = %err, "recommendation generation failed; returning empty list");
                Vec::new()
            }
        }
    }

    async fn generate_inner(
        &self,
        user_id: i32,
        limit: Option<usize>,
    ) -> anyhow::Result<Vec<PropertyRecommendation>> {
        let limit = normalize_limit(limit);
        let profile = self.analyze_user_profile(user_id).await;

        let properties = self.store.get_properties().await?;
        let investments = self.store.get_investments_by_user(user_id).await?;

        let invested: HashSet<i32> = investments.iter().map(|inv| inv.property_id).collect();
        let candidates: Vec<Property> = properties
            .into_iter()
            .filter(|p| !invested.contains(&p.id) && p.is_investable())
            .collect();

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let scored = match &self.llm {
            Some(client) => match client.score_properties(&profile, &candidates).await {
                Ok(scored) => scored,
                Err(err) => {
                    tracing::warn!(
                        user_id,
                        candidates = candidates.len(),
                        error = %err,
                        "inference scoring failed; using rule-based scorer"
                    );
                    fallback::score_candidates(&self.scoring, &profile, &candidates)
                }
            },
            None => fallback::score_candidates(&self.scoring, &profile, &candidates),
        };

        // Map scored entries back to candidates by id; entries the inference
        // service invented are dropped.
        let by_id: HashMap<i32, Property> =
            candidates.into_iter().map(|p| (p.id, p)).collect();
        let mut recommendations: Vec<PropertyRecommendation> = scored
            .into_iter()
            .filter_map(|s| {
                by_id.get(&s.property_id).map(|property| PropertyRecommendation {
                    property: property.clone(),
                    score: s.score.clamp(0.0, 100.0),
                    reasons: s.reasons,
                    risk_level: s.risk_level,
                    match_percentage: s.match_percentage.clamp(0.0, 100.0),
                })
            })
            .collect();

        recommendations.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        recommendations.truncate(limit);

        Ok(recommendations)
    }

    /// Free-text rationale for one recommendation. Returns fixed sentinel
    /// texts instead of errors: callers render whatever comes back.
    pub async fn explain_recommendation(&self, property_id: i32, user_id: i32) -> String {
        let property = match self.store.get_property(property_id).await {
            Ok(Some(property)) => property,
            Ok(None) => return PROPERTY_NOT_FOUND_MESSAGE.to_string(),
            Err(err) => {
                tracing::error!(property_id, error = %err, "property lookup failed");
                return EXPLANATION_UNAVAILABLE_MESSAGE.to_string();
            }
        };

        let profile = self.analyze_user_profile(user_id).await;

        let Some(llm) = &self.llm else {
            return EXPLANATION_UNAVAILABLE_MESSAGE.to_string();
        };

        match llm.explain_match(&profile, &property).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => EXPLANATION_UNAVAILABLE_MESSAGE.to_string(),
            Err(err) => {
                tracing::warn!(property_id, user_id, error = %err, "explanation generation failed");
                EXPLANATION_UNAVAILABLE_MESSAGE.to_string()
            }
        }
    }

    async fn load_history(
        &self,
        user_id: i32,
    ) -> anyhow::Result<(Option<User>, Vec<Investment>)> {
        let user = self.store.get_user(user_id).await?;
        let investments = self.store.get_investments_by_user(user_id).await?;
        Ok((user, investments))
    }
}

fn normalize_limit(limit: Option<usize>) -> usize {
    match limit {
        Some(n) if n > 0 => n,
        _ => DEFAULT_LIMIT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{InvestmentRange, RiskTolerance};
    use crate::domain::recommendation::{RiskLevel, ScoredCandidate};
    use crate::llm::Provider;
    use chrono::Utc;

    struct MemStore {
        users: Vec<User>,
        properties: Vec<Property>,
        investments: Vec<Investment>,
        fail: bool,
    }

    impl MemStore {
        fn new() -> Self {
            Self {
                users: Vec::new(),
                properties: Vec::new(),
                investments: Vec::new(),
                fail: false,
            }
        }
    }

    #[async_trait::async_trait]
    impl PropertyStore for MemStore {
        async fn get_properties(&self) -> anyhow::Result<Vec<Property>> {
            anyhow::ensure!(!self.fail, "store offline");
            Ok(self.properties.clone())
        }

        async fn get_property(&self, id: i32) -> anyhow::Result<Option<Property>> {
            anyhow::ensure!(!self.fail, "store offline");
            Ok(self.properties.iter().find(|p| p.id == id).cloned())
        }

        async fn get_user(&self, id: i32) -> anyhow::Result<Option<User>> {
            anyhow::ensure!(!self.fail, "store offline");
            Ok(self.users.iter().find(|u| u.id == id).cloned())
        }

        async fn get_investments_by_user(&self, user_id: i32) -> anyhow::Result<Vec<Investment>> {
            anyhow::ensure!(!self.fail, "store offline");
            Ok(self
                .investments
                .iter()
                .filter(|inv| inv.user_id == user_id)
                .cloned()
                .collect())
        }
    }

    enum StubBehavior {
        Fail,
        Scores(Vec<ScoredCandidate>),
        Explain(String),
    }

    struct StubInference {
        behavior: StubBehavior,
        profile: Option<InvestorProfile>,
    }

    #[async_trait::async_trait]
    impl InferenceClient for StubInference {
        fn provider(&self) -> Provider {
            Provider::Anthropic
        }

        async fn analyze_profile(
            &self,
            _input: ProfileAnalysisInput,
        ) -> anyhow::Result<InvestorProfile> {
            match &self.profile {
                Some(profile) => Ok(profile.clone()),
                None => anyhow::bail!("quota exceeded"),
            }
        }

        async fn score_properties(
            &self,
            _profile: &InvestorProfile,
            _candidates: &[Property],
        ) -> anyhow::Result<Vec<ScoredCandidate>> {
            match &self.behavior {
                StubBehavior::Scores(scores) => Ok(scores.clone()),
                _ => anyhow::bail!("quota exceeded"),
            }
        }

        async fn explain_match(
            &self,
            _profile: &InvestorProfile,
            _property: &Property,
        ) -> anyhow::Result<String> {
            match &self.behavior {
                StubBehavior::Explain(text) => Ok(text.clone()),
                _ => anyhow::bail!("quota exceeded"),
            }
        }
    }

    fn user(id: i32) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            wallet_address: None,
            kyc_status: "verified".to_string(),
            created_at: Utc::now(),
        }
    }

    fn property(id: i32) -> Property {
        Property {
            id,
            title: format!("Property {id}"),
            description: "A property".to_string(),
            location: "Urban Heights".to_string(),
            property_type: "Residential".to_string(),
            total_value: "1000000".to_string(),
            total_tokens: 1000,
            available_tokens: 800,
            expected_roi: "11.0".to_string(),
            min_investment: "2000".to_string(),
            image_url: "https://example.com/p.jpg".to_string(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn investment(id: i32, user_id: i32, property_id: i32) -> Investment {
        Investment {
            id,
            user_id,
            property_id,
            tokens_owned: 50,
            investment_amount: "5000".to_string(),
            current_value: "5250".to_string(),
            purchase_date: Utc::now(),
        }
    }

    fn engine(store: MemStore, llm: Option<StubInference>) -> RecommendationEngine {
        RecommendationEngine::new(
            Arc::new(store),
            llm.map(|stub| Arc::new(stub) as Arc<dyn InferenceClient>),
            ScoringConfig::default(),
        )
    }

    #[tokio::test]
    async fn unknown_user_gets_default_profile() {
        let engine = engine(MemStore::new(), None);
        let profile = engine.analyze_user_profile(404).await;
        assert_eq!(profile, profile::default_profile());
    }

    #[tokio::test]
    async fn user_without_history_gets_default_profile() {
        let mut store = MemStore::new();
        store.users.push(user(1));
        // Even with a working inference client, cold start uses the default.
        let llm = StubInference {
            behavior: StubBehavior::Fail,
            profile: Some(InvestorProfile {
                preferred_investment_range: InvestmentRange {
                    min: 1.0,
                    max: 2.0,
                },
                risk_tolerance: RiskTolerance::Aggressive,
                preferred_property_types: vec!["industrial".to_string()],
                preferred_locations: vec!["rural".to_string()],
                investment_goals: vec!["speculation".to_string()],
            }),
        };
        let engine = engine(store, Some(llm));
        let profile = engine.analyze_user_profile(1).await;
        assert_eq!(profile, profile::default_profile());
    }

    #[tokio::test]
    async fn profile_inference_failure_falls_back_to_default() {
        let mut store = MemStore::new();
        store.users.push(user(1));
        store.investments.push(investment(1, 1, 10));
        let llm = StubInference {
            behavior: StubBehavior::Fail,
            profile: None,
        };
        let engine = engine(store, Some(llm));
        let profile = engine.analyze_user_profile(1).await;
        assert_eq!(profile, profile::default_profile());
    }

    #[tokio::test]
    async fn recommendations_exclude_invested_and_uninvestable_properties() {
        let mut store = MemStore::new();
        store.users.push(user(1));
        store.properties.push(property(1)); // already invested
        store.properties.push(property(2)); // eligible
        let mut sold_out = property(3);
        sold_out.available_tokens = 0;
        store.properties.push(sold_out);
        let mut inactive = property(4);
        inactive.is_active = false;
        store.properties.push(inactive);
        store.investments.push(investment(1, 1, 1));

        let engine = engine(store, None);
        let recs = engine.generate_recommendations(1, None).await;

        let ids: Vec<i32> = recs.iter().map(|r| r.property.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn empty_candidate_set_returns_empty_list() {
        let mut store = MemStore::new();
        store.users.push(user(1));
        let engine = engine(store, None);
        assert!(engine.generate_recommendations(1, None).await.is_empty());
    }

    #[tokio::test]
    async fn scoring_failure_falls_back_to_rule_based_ranking() {
        let mut store = MemStore::new();
        store.users.push(user(1));
        for id in 1..=5 {
            store.properties.push(property(id));
        }
        let llm = StubInference {
            behavior: StubBehavior::Fail,
            profile: None,
        };
        let engine = engine(store, Some(llm));

        let recs = engine.generate_recommendations(1, None).await;
        assert_eq!(recs.len(), 5);
        for rec in &recs {
            assert!(!rec.reasons.is_empty() && rec.reasons.len() <= 3);
            assert!(rec.score >= 0.0 && rec.score <= 100.0);
            assert!(rec.match_percentage >= 0.0 && rec.match_percentage <= 100.0);
        }
    }

    #[tokio::test]
    async fn results_are_sorted_and_truncated_to_limit() {
        let mut store = MemStore::new();
        store.users.push(user(1));
        for id in 1..=8 {
            store.properties.push(property(id));
        }
        let engine = engine(store, None);

        let recs = engine.generate_recommendations(1, Some(3)).await;
        assert_eq!(recs.len(), 3);
        for pair in recs.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn zero_limit_is_treated_as_default() {
        let mut store = MemStore::new();
        store.users.push(user(1));
        for id in 1..=8 {
            store.properties.push(property(id));
        }
        let engine = engine(store, None);

        let recs = engine.generate_recommendations(1, Some(0)).await;
        assert_eq!(recs.len(), DEFAULT_LIMIT);
    }

    #[tokio::test]
    async fn unknown_property_ids_from_inference_are_dropped() {
        let mut store = MemStore::new();
        store.users.push(user(1));
        store.properties.push(property(1));
        store.properties.push(property(2));

        let scores = vec![
            ScoredCandidate {
                property_id: 2,
                score: 90.0,
                reasons: vec!["great fit".to_string()],
                risk_level: RiskLevel::Medium,
                match_percentage: 90.0,
            },
            ScoredCandidate {
                property_id: 999, // not a candidate
                score: 95.0,
                reasons: vec!["hallucinated".to_string()],
                risk_level: RiskLevel::Low,
                match_percentage: 95.0,
            },
            ScoredCandidate {
                property_id: 1,
                score: 40.0,
                reasons: vec!["weak fit".to_string()],
                risk_level: RiskLevel::Medium,
                match_percentage: 40.0,
            },
        ];
        let llm = StubInference {
            behavior: StubBehavior::Scores(scores),
            profile: None,
        };
        let engine = engine(store, Some(llm));

        let recs = engine.generate_recommendations(1, None).await;
        let ids: Vec<i32> = recs.iter().map(|r| r.property.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn store_failure_yields_empty_list_not_error() {
        let mut store = MemStore::new();
        store.fail = true;
        let engine = engine(store, None);
        assert!(engine.generate_recommendations(1, None).await.is_empty());
    }

    #[tokio::test]
    async fn explanation_for_missing_property_returns_sentinel() {
        let engine = engine(MemStore::new(), None);
        let text = engine.explain_recommendation(9999, 1).await;
        assert_eq!(text, PROPERTY_NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn explanation_failure_returns_placeholder() {
        let mut store = MemStore::new();
        store.users.push(user(1));
        store.properties.push(property(1));
        let llm = StubInference {
            behavior: StubBehavior::Fail,
            profile: None,
        };
        let engine = engine(store, Some(llm));

        let text = engine.explain_recommendation(1, 1).await;
        assert_eq!(text, EXPLANATION_UNAVAILABLE_MESSAGE);
    }

    #[tokio::test]
    async fn explanation_passes_through_inference_text() {
        let mut store = MemStore::new();
        store.users.push(user(1));
        store.properties.push(property(1));
        let llm = StubInference {
            behavior: StubBehavior::Explain("A strong match for your goals.".to_string()),
            profile: None,
        };
        let engine = engine(store, Some(llm));

        let text = engine.explain_recommendation(1, 1).await;
        assert_eq!(text, "A strong match for your goals.");
    }
}
