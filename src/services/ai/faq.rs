use std::sync::Arc;

use crate::models::BusinessProfile;
use crate::services::ai::chain::ProviderChain;
use crate::services::ai::Message;

/// Free-form answers for callers who are not booking.
pub struct FaqResponder {
    chain: Arc<ProviderChain>,
}

impl FaqResponder {
    pub fn new(chain: Arc<ProviderChain>) -> Self {
        Self { chain }
    }

    /// `None` when no provider could answer.
    pub async fn answer(&self, user_text: &str, profile: &BusinessProfile) -> Option<String> {
        let messages = build_messages(user_text, profile);
        self.chain
            .call(&messages, false)
            .await
            .into_reply()
            .map(|reply| reply.content.trim().to_string())
    }
}

fn build_messages(user_text: &str, profile: &BusinessProfile) -> Vec<Message> {
    let details = serde_json::to_string(profile).unwrap_or_default();
    let clinic = &profile.clinic_info.name;
    let contact = &profile.clinic_info.contact;

    let system = format!(
        r#"You are the professional front desk assistant for {clinic}.
Reply fluently in the language the caller uses (for example English, Hindi or Hinglish).

Answer the caller's question using ONLY the CLINIC DETAILS AND FAQS below.
If the question cannot be answered from that data, politely escalate by saying:
'I cannot find that information. Let me connect you with the front desk at {contact}.'

CLINIC DETAILS AND FAQS: {details}"#
    );

    vec![Message::system(system), Message::user(user_text)]
}
