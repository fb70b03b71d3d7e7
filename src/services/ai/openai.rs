use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{LlmProvider, Message};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Any backend speaking the OpenAI `/chat/completions` dialect
/// (Chutes, OpenRouter, Groq, OpenAI itself).
pub struct OpenAiProvider {
    label: String,
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(label: String, base_url: String, api_key: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            label,
            base_url,
            api_key,
            model,
            client,
        }
    }

    /// Accepts either an API base or a full completions URL.
    fn completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{base}/chat/completions")
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn chat(&self, messages: &[Message], json_mode: bool) -> anyhow::Result<String> {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.1,
            "max_tokens": 1024,
        });
        if json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let mut request = self.client.post(self.completions_url()).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let resp = request
            .send()
            .await
            .with_context(|| format!("failed to call {}", self.label))?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse {} response", self.label))?;

        if !status.is_success() {
            let message = data["error"]["message"].as_str().unwrap_or("unknown API error");
            anyhow::bail!("{} API error ({}): {}", self.label, status, message);
        }

        data["choices"][0]["message"]["content"]
            .as_str()
            .filter(|content| !content.trim().is_empty())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing content in {} response", self.label))
    }

    fn label(&self) -> &str {
        &self.label
    }
}
