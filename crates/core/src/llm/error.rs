use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

/// Inference failure with enough context to diagnose the raw exchange.
#[derive(Debug, Clone)]
pub struct InferenceFailure {
    pub provider: Provider,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl fmt::Display for InferenceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inference error (provider={:?}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for InferenceFailure {}
