use std::env;

use crate::models::conversation::MAX_TTL_MINUTES;
use crate::services::scheduling::MAX_LEAD_TIME_MINUTES;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Ollama,
}

impl ProviderKind {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "openai" => Some(ProviderKind::OpenAi),
            "ollama" => Some(ProviderKind::Ollama),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderSettings {
    pub name: String,
    pub kind: ProviderKind,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub business_profile_path: String,
    pub booking_lead_minutes: i64,
    pub session_ttl_minutes: i64,
    pub max_slot_retries: u32,
    /// In fallback order.
    pub providers: Vec<ProviderSettings>,
    /// Session id used by the terminal chat.
    pub chat_caller_id: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let number = |key: &str, default: i64| {
            var(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let provider_names = var("LLM_PROVIDERS").unwrap_or_else(|| "chutes,openrouter".to_string());

        let mut providers = Vec::new();
        for name in provider_names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let prefix = name.to_ascii_uppercase().replace('-', "_");
            let base_url = var(&format!("{prefix}_BASE_URL"));
            let model = var(&format!("{prefix}_MODEL"));

            let (Some(base_url), Some(model)) = (base_url, model) else {
                tracing::warn!(provider = name, "missing {prefix}_BASE_URL or {prefix}_MODEL, skipping provider");
                continue;
            };

            let kind_raw = var(&format!("{prefix}_KIND")).unwrap_or_default();
            let Some(kind) = ProviderKind::parse(&kind_raw) else {
                anyhow::bail!("unknown {prefix}_KIND '{kind_raw}', expected openai or ollama");
            };

            providers.push(ProviderSettings {
                name: name.to_string(),
                kind,
                base_url,
                api_key: var(&format!("{prefix}_API_KEY")).unwrap_or_default(),
                model,
            });
        }

        anyhow::ensure!(
            !providers.is_empty(),
            "no usable LLM providers configured (LLM_PROVIDERS={provider_names})"
        );

        Ok(Self {
            port: var("PORT").and_then(|v| v.parse().ok()).unwrap_or(3000),
            database_url: var("DATABASE_URL").unwrap_or_else(|| "frontdesk.db".to_string()),
            admin_token: var("ADMIN_TOKEN").unwrap_or_else(|| "changeme".to_string()),
            business_profile_path: var("BUSINESS_PROFILE")
                .unwrap_or_else(|| "config/business_profile.yaml".to_string()),
            booking_lead_minutes: number("BOOKING_LEAD_MINUTES", 30).clamp(0, MAX_LEAD_TIME_MINUTES),
            session_ttl_minutes: number("SESSION_TTL_MINUTES", 30).clamp(1, MAX_TTL_MINUTES),
            max_slot_retries: u32::try_from(number("MAX_SLOT_RETRIES", 0)).unwrap_or(0),
            providers,
            chat_caller_id: var("CHAT_CALLER_ID").unwrap_or_else(|| "terminal".to_string()),
        })
    }
}
