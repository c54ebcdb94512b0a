use crate::domain::contract::{LlmInvestorProfile, LlmScoredBatch, LlmScoredItem};
use crate::domain::profile::InvestorProfile;
use crate::domain::recommendation::ScoredCandidate;
use anyhow::Context;

/// Best-effort extraction of a JSON document from model output that may be
/// wrapped in markdown fences or surrounded by prose. Handles both objects
/// and top-level arrays.
pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        // Remove Markdown fences (```json ... ``` or ``` ... ```).
        let mut inner = trimmed;
        if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        return Some(inner.trim().to_string());
    }

    // Best-effort extraction: first '{' (or '[') to the matching last
    // delimiter, whichever document starts earlier.
    let obj_start = trimmed.find('{');
    let arr_start = trimmed.find('[');
    let (start, close) = match (obj_start, arr_start) {
        (Some(o), Some(a)) if a < o => (a, ']'),
        (Some(o), _) => (o, '}'),
        (None, Some(a)) => (a, ']'),
        (None, None) => return None,
    };

    let end = trimmed.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

pub fn parse_profile(text: &str) -> anyhow::Result<InvestorProfile> {
    let json_str = extract_json(text).unwrap_or_else(|| text.trim().to_string());
    let parsed = serde_json::from_str::<LlmInvestorProfile>(&json_str)
        .with_context(|| format!("LLM output is not a valid profile: {json_str}"))?;
    parsed.validate_and_into_profile()
}

/// Accepts either the requested `{"recommendations": [...]}` object or a
/// bare array of scored items.
pub fn parse_scores(text: &str) -> anyhow::Result<Vec<ScoredCandidate>> {
    let json_str = extract_json(text).unwrap_or_else(|| text.trim().to_string());

    let batch = match serde_json::from_str::<LlmScoredBatch>(&json_str) {
        Ok(batch) if !batch.recommendations.is_empty() => batch,
        _ => {
            let items = serde_json::from_str::<Vec<LlmScoredItem>>(&json_str).with_context(
                || format!("LLM output is not a valid scored batch: {json_str}"),
            )?;
            LlmScoredBatch {
                recommendations: items,
            }
        }
    };

    batch.validate_and_into_scores()
}
