use crate::config::Settings;
use crate::domain::contract::{LlmInvestorProfile, LlmScoredBatch};
use crate::domain::profile::InvestorProfile;
use crate::domain::property::Property;
use crate::domain::recommendation::ScoredCandidate;
use crate::llm::error::InferenceFailure;
use crate::llm::{candidates_json, json, InferenceClient, ProfileAnalysisInput, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const TOOL_NAME_EMIT_PROFILE: &str = "emit_profile";
const TOOL_NAME_EMIT_SCORES: &str = "emit_scores";

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_anthropic_api_key()?.to_string();
        let base_url =
            std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = std::env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let timeout_secs = std::env::var("ANTHROPIC_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            max_tokens,
        })
    }

    async fn create_message(
        &self,
        req: CreateMessageRequest,
    ) -> anyhow::Result<(serde_json::Value, CreateMessageResponse)> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .context("Anthropic request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Anthropic response body")?;
        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<serde_json::Value>(&text).ok();
            return Err(InferenceFailure {
                provider: Provider::Anthropic,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        let raw_json = serde_json::from_str::<serde_json::Value>(&text)
            .with_context(|| format!("failed to parse Anthropic response JSON: {text}"))?;
        let parsed = serde_json::from_value::<CreateMessageResponse>(raw_json.clone())
            .context("failed to decode Anthropic response into CreateMessageResponse")?;
        Ok((raw_json, parsed))
    }

    fn profile_tool() -> Tool {
        // Minimal JSON schema for the exact five-field profile contract.
        // Keep it strict and explicit to maximize compliance.
        let schema = serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "required": [
                "preferred_investment_range",
                "risk_tolerance",
                "preferred_property_types",
                "preferred_locations",
                "investment_goals"
            ],
            "properties": {
                "preferred_investment_range": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["min", "max"],
                    "properties": {
                        "min": {"type": "number", "minimum": 0},
                        "max": {"type": "number", "minimum": 0}
                    }
                },
                "risk_tolerance": {
                    "type": "string",
                    "enum": ["conservative", "moderate", "aggressive"]
                },
                "preferred_property_types": {
                    "type": "array",
                    "minItems": 1,
                    "items": {"type": "string"}
                },
                "preferred_locations": {
                    "type": "array",
                    "minItems": 1,
                    "items": {"type": "string"}
                },
                "investment_goals": {
                    "type": "array",
                    "minItems": 1,
                    "items": {"type": "string"}
                }
            }
        });

        Tool {
            name: TOOL_NAME_EMIT_PROFILE,
            description: "Emit the inferred investor profile as structured JSON",
            input_schema: schema,
        }
    }

    fn scores_tool() -> Tool {
        let schema = serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["recommendations"],
            "properties": {
                "recommendations": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["property_id", "score", "reasons", "risk_level", "match_percentage"],
                        "properties": {
                            "property_id": {"type": "integer"},
                            "score": {"type": "number", "minimum": 0, "maximum": 100},
                            "reasons": {
                                "type": "array",
                                "minItems": 1,
                                "maxItems": 3,
                                "items": {"type": "string"}
                            },
                            "risk_level": {"type": "string", "enum": ["low", "medium", "high"]},
                            "match_percentage": {"type": "number", "minimum": 0, "maximum": 100}
                        }
                    }
                }
            }
        });

        Tool {
            name: TOOL_NAME_EMIT_SCORES,
            description: "Emit the scored property recommendations as structured JSON",
            input_schema: schema,
        }
    }

    fn tool_choice(name: &'static str) -> ToolChoice {
        ToolChoice::Tool { name }
    }

    fn profile_system_prompt() -> String {
        [
            "You are a real estate investment analyst for a fractional-ownership platform.",
            "Infer the investor's preferences from their holdings and return ONLY valid JSON.",
            "Do not wrap output in markdown. Do not include any extra keys.",
            "Output schema:",
            "{",
            "  \"preferred_investment_range\": { \"min\": 1000, \"max\": 50000 },",
            "  \"risk_tolerance\": \"conservative\" | \"moderate\" | \"aggressive\",",
            "  \"preferred_property_types\": [\"residential\"],",
            "  \"preferred_locations\": [\"urban\"],",
            "  \"investment_goals\": [\"passive income\"]",
            "}",
            "Rules:",
            "- min must be <= max, both non-negative",
            "- every array must have at least one non-empty string",
        ]
        .join("\n")
    }

    fn profile_user_prompt(input: &ProfileAnalysisInput) -> String {
        format!(
            "Task: Determine this investor's preference profile from their investment history.\n\nInvestor data JSON:\n{}",
            input.history_json()
        )
    }

    fn scoring_system_prompt() -> String {
        [
            "You are a property recommendation engine for a fractional real-estate platform.",
            "Score every candidate property against the investor profile and return ONLY valid JSON.",
            "Do not wrap output in markdown. Do not include any extra keys.",
            "Output schema:",
            "{",
            "  \"recommendations\": [",
            "    {",
            "      \"property_id\": 1,",
            "      \"score\": 0,",
            "      \"reasons\": [\"line1\", \"line2\", \"line3\"],",
            "      \"risk_level\": \"low\" | \"medium\" | \"high\",",
            "      \"match_percentage\": 0",
            "    }",
            "  ]",
            "}",
            "Rules:",
            "- score and match_percentage must be in [0, 100]",
            "- reasons must have 1 to 3 short lines per property",
            "- use only the provided candidate property_ids, each at most once",
            "- weigh budget fit, property type, location, ROI vs risk tolerance, and token availability",
        ]
        .join("\n")
    }

    fn scoring_user_prompt(profile: &InvestorProfile, candidates: &[Property]) -> String {
        let profile_json = serde_json::to_value(profile).unwrap_or_default();
        format!(
            "Task: Rank these candidate properties for the investor.\n\nInvestor profile JSON:\n{}\n\nCandidates JSON:\n{}",
            profile_json,
            candidates_json(candidates)
        )
    }

    fn explain_system_prompt() -> String {
        "You are a professional real estate investment advisor providing personalized \
         property recommendations. Write 2-3 paragraphs of plain prose, no markdown, \
         covering financial benefits, risk factors, and strategic fit."
            .to_string()
    }

    fn explain_user_prompt(profile: &InvestorProfile, property: &Property) -> String {
        let profile_json = serde_json::to_value(profile).unwrap_or_default();
        let property_json = serde_json::to_value(property).unwrap_or_default();
        format!(
            "Task: Explain why this property is recommended for the investor.\n\nInvestor profile JSON:\n{}\n\nProperty JSON:\n{}",
            profile_json, property_json
        )
    }

    fn scores_repair_prompt(previous_output: &str) -> String {
        let schema = [
            "{",
            "  \"recommendations\": [",
            "    {",
            "      \"property_id\": 1,",
            "      \"score\": 75,",
            "      \"reasons\": [\"line1\", \"line2\"],",
            "      \"risk_level\": \"medium\",",
            "      \"match_percentage\": 75",
            "    }",
            "  ]",
            "}",
        ]
        .join("\n");

        format!(
            "Your previous message was NOT valid JSON for the scoring contract.\n\n\
TASK: Output ONLY a single JSON object that exactly matches the schema and rules.\n\
- Do NOT include any markdown, prose, or code fences.\n\
- score and match_percentage MUST be numbers in [0, 100].\n\
- risk_level MUST be one of low, medium, high.\n\
- reasons MUST have 1 to 3 non-empty strings.\n\
- Each property_id MUST come from the candidate list and appear at most once.\n\n\
SCHEMA:\n{schema}\n\n\
INVALID OUTPUT (for reference only; DO NOT copy verbatim):\n{previous_output}"
        )
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            match block {
                ContentBlock::Text { text } => {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(text);
                }
                ContentBlock::ToolUse { .. } => {
                    // Prefer tool output parsing when tools are enabled.
                    continue;
                }
                ContentBlock::Thinking { .. } | ContentBlock::RedactedThinking { .. } => {
                    // Ignore.
                }
                ContentBlock::Unknown => {
                    // Ignore unknown blocks.
                }
            }
        }
        out
    }

    fn response_tool_input(
        res: &CreateMessageResponse,
        tool_name: &str,
    ) -> Option<serde_json::Value> {
        for block in &res.content {
            if let ContentBlock::ToolUse { name, input, .. } = block {
                if name == tool_name {
                    return Some(input.clone());
                }
            }
        }
        None
    }

    async fn score_with_repairs(
        &self,
        initial_text: String,
        initial_raw_json: serde_json::Value,
    ) -> anyhow::Result<Vec<ScoredCandidate>> {
        match json::parse_scores(&initial_text) {
            Ok(scores) => Ok(scores),
            Err(first_err) => {
                let mut last_err = first_err;
                let mut last_text = initial_text;
                let mut last_raw_json = initial_raw_json;

                // Repair attempts: 2
                for attempt in 1..=2u32 {
                    let repair_req = CreateMessageRequest {
                        model: self.model.clone(),
                        max_tokens: self.max_tokens,
                        system: Some(Self::scoring_system_prompt()),
                        messages: vec![Message {
                            role: "user",
                            content: Self::scores_repair_prompt(&last_text),
                        }],
                        tools: Some(vec![Self::scores_tool()]),
                        tool_choice: Some(Self::tool_choice(TOOL_NAME_EMIT_SCORES)),
                    };

                    let (repair_raw_json, repair_res) = self.create_message(repair_req).await?;

                    if let Some(input) =
                        Self::response_tool_input(&repair_res, TOOL_NAME_EMIT_SCORES)
                    {
                        let batch = serde_json::from_value::<LlmScoredBatch>(input)
                            .context("failed to decode tool_use.input into LlmScoredBatch")?;
                        return batch.validate_and_into_scores();
                    }

                    let repair_text = Self::response_text(&repair_res);
                    match json::parse_scores(&repair_text) {
                        Ok(scores) => return Ok(scores),
                        Err(err) => {
                            last_err = err;
                            last_text = repair_text;
                            last_raw_json = repair_raw_json;
                            tracing::warn!(
                                attempt,
                                error = %last_err,
                                "scoring output still invalid after repair attempt"
                            );
                        }
                    }
                }

                Err(InferenceFailure {
                    provider: Provider::Anthropic,
                    stage: "parse_after_repair",
                    detail: format!("final_error={last_err}"),
                    raw_output: Some(last_text),
                    raw_response_json: Some(last_raw_json),
                }
                .into())
            }
        }
    }
}

#[async_trait::async_trait]
impl InferenceClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn analyze_profile(
        &self,
        input: ProfileAnalysisInput,
    ) -> anyhow::Result<InvestorProfile> {
        let req = CreateMessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: Some(Self::profile_system_prompt()),
            messages: vec![Message {
                role: "user",
                content: Self::profile_user_prompt(&input),
            }],
            tools: Some(vec![Self::profile_tool()]),
            tool_choice: Some(Self::tool_choice(TOOL_NAME_EMIT_PROFILE)),
        };

        let (_raw_json, res) = self.create_message(req).await?;

        if let Some(tool_input) = Self::response_tool_input(&res, TOOL_NAME_EMIT_PROFILE) {
            let parsed = serde_json::from_value::<LlmInvestorProfile>(tool_input)
                .context("failed to decode tool_use.input into LlmInvestorProfile")?;
            return parsed.validate_and_into_profile();
        }

        // Fallback to text (should be rare). Callers default the profile on
        // failure, so no repair round-trip here.
        json::parse_profile(&Self::response_text(&res))
    }

    async fn score_properties(
        &self,
        profile: &InvestorProfile,
        candidates: &[Property],
    ) -> anyhow::Result<Vec<ScoredCandidate>> {
        let make_req = |max_tokens: u32| CreateMessageRequest {
            model: self.model.clone(),
            max_tokens,
            system: Some(Self::scoring_system_prompt()),
            messages: vec![Message {
                role: "user",
                content: Self::scoring_user_prompt(profile, candidates),
            }],
            tools: Some(vec![Self::scores_tool()]),
            tool_choice: Some(Self::tool_choice(TOOL_NAME_EMIT_SCORES)),
        };

        let (mut raw_json, mut res) = self.create_message(make_req(self.max_tokens)).await?;

        // If the model hit max_tokens, retry once with a higher ceiling.
        if matches!(res.stop_reason.as_deref(), Some("max_tokens")) {
            let bumped = self.max_tokens.saturating_mul(2).max(4096);
            tracing::warn!(
                from = self.max_tokens,
                to = bumped,
                "Anthropic stop_reason=max_tokens; retrying once with higher max_tokens"
            );
            let (rj, r) = self.create_message(make_req(bumped)).await?;
            raw_json = rj;
            res = r;
        }

        // Tool output path.
        if let Some(tool_input) = Self::response_tool_input(&res, TOOL_NAME_EMIT_SCORES) {
            let batch = serde_json::from_value::<LlmScoredBatch>(tool_input)
                .context("failed to decode tool_use.input into LlmScoredBatch")?;
            return batch.validate_and_into_scores();
        }

        // Fallback to text (should be rare).
        let text = Self::response_text(&res);
        self.score_with_repairs(text, raw_json).await
    }

    async fn explain_match(
        &self,
        profile: &InvestorProfile,
        property: &Property,
    ) -> anyhow::Result<String> {
        let req = CreateMessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: Some(Self::explain_system_prompt()),
            messages: vec![Message {
                role: "user",
                content: Self::explain_user_prompt(profile, property),
            }],
            tools: None,
            tool_choice: None,
        };

        let (raw_json, res) = self.create_message(req).await?;
        let text = Self::response_text(&res);
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(InferenceFailure {
                provider: Provider::Anthropic,
                stage: "explain",
                detail: "empty explanation response".to_string(),
                raw_output: None,
                raw_response_json: Some(raw_json),
            }
            .into());
        }
        Ok(text)
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct Tool {
    name: &'static str,
    description: &'static str,
    input_schema: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
enum ToolChoice {
    #[serde(rename = "tool")]
    Tool { name: &'static str },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },

    #[serde(rename = "thinking")]
    Thinking {
        #[serde(default)]
        thinking: String,
        #[serde(default)]
        signature: String,
    },

    #[serde(rename = "redacted_thinking")]
    RedactedThinking {
        #[serde(default)]
        data: String,
    },

    #[serde(other)]
    Unknown,
}
