pub mod chain;
pub mod extract;
pub mod faq;
pub mod localize;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{ProviderKind, ProviderSettings};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// One chat-completion backend. Implementations report transport, status and
/// shape problems as errors; retrying is the chain's business, not theirs.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, messages: &[Message], json_mode: bool) -> anyhow::Result<String>;

    /// Name used in logs and in replies from the chain.
    fn label(&self) -> &str;
}

/// Finds the JSON document in a model reply, tolerating markdown fences and
/// chatter around a single object.
pub fn json_payload(response: &str) -> Option<&str> {
    let is_json = |s: &str| serde_json::from_str::<serde_json::Value>(s).is_ok();

    let trimmed = response.trim();
    if is_json(trimmed) {
        return Some(trimmed);
    }

    // Strip markdown code fences
    let cleaned = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();
    if is_json(cleaned) {
        return Some(cleaned);
    }

    // Try to find a JSON object in the response
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&cleaned[start..=end]).filter(|candidate| is_json(candidate))
}

pub fn build_provider(settings: &ProviderSettings) -> Box<dyn LlmProvider> {
    match settings.kind {
        ProviderKind::OpenAi => Box::new(openai::OpenAiProvider::new(
            settings.name.clone(),
            settings.base_url.clone(),
            settings.api_key.clone(),
            settings.model.clone(),
        )),
        ProviderKind::Ollama => Box::new(ollama::OllamaProvider::new(
            settings.name.clone(),
            settings.base_url.clone(),
            settings.model.clone(),
        )),
    }
}
