use std::sync::Arc;

use crate::services::ai::chain::{ProviderCallResult, ProviderChain};
use crate::services::ai::Message;

/// Best-effort translation of catalog messages into the caller's language.
pub struct Localizer {
    chain: Arc<ProviderChain>,
}

impl Localizer {
    pub fn new(chain: Arc<ProviderChain>) -> Self {
        Self { chain }
    }

    /// Never fails: on provider exhaustion the message comes back untouched.
    pub async fn localize(&self, message: &str, language: &str) -> String {
        let messages = build_messages(message, language);

        match self.chain.call(&messages, false).await {
            ProviderCallResult::Reply(reply) => reply.content.trim().to_string(),
            ProviderCallResult::Exhausted => {
                tracing::warn!(language, "localization unavailable, replying untranslated");
                message.to_string()
            }
        }
    }
}

fn build_messages(message: &str, language: &str) -> Vec<Message> {
    let system = format!(
        "You are a professional translator and receptionist. Translate the following English message \
         into a conversational, polite {language} response. Keep service names, dates, times and \
         phone numbers exactly as written. If the requested language is 'Hinglish' or 'Hindi', use \
         the Devanagari script for Hindi words but keep English words (e.g. 'booking', 'service') in \
         Roman script. Do not add extra context, reply with the translated message only."
    );

    vec![Message::system(system), Message::user(message)]
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::services::ai::LlmProvider;

    struct Translator(Option<&'static str>);

    #[async_trait]
    impl LlmProvider for Translator {
        async fn chat(&self, messages: &[Message], json_mode: bool) -> anyhow::Result<String> {
            assert!(!json_mode);
            assert!(messages[0].content.contains("Hindi"));
            self.0
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("timeout"))
        }

        fn label(&self) -> &str {
            "translator"
        }
    }

    fn localizer(reply: Option<&'static str>) -> Localizer {
        Localizer::new(Arc::new(ProviderChain::new(vec![Box::new(Translator(reply))])))
    }

    #[tokio::test]
    async fn test_localize_returns_translation() {
        let text = localizer(Some("  कृपया अपना पूरा नाम बताइए।\n"))
            .localize("Could you please provide your full name?", "Hindi")
            .await;
        assert_eq!(text, "कृपया अपना पूरा नाम बताइए।");
    }

    #[tokio::test]
    async fn test_localize_falls_back_to_source_message() {
        let source = "Could you please provide your full name?";
        let text = localizer(None).localize(source, "Hindi").await;
        assert_eq!(text, source);
    }

    #[test]
    fn test_prompt_names_target_language() {
        let messages = build_messages("Hello", "Tamil");
        assert!(messages[0].content.contains("polite Tamil response"));
        assert_eq!(messages[1], Message::user("Hello"));
    }
}
