use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde_json::{Map, Value};

use crate::errors::BookingError;
use crate::models::{BusinessProfile, ConversationState, ExtractedSlots};
use crate::services::ai::chain::{ProviderCallResult, ProviderChain};
use crate::services::ai::{json_payload, Message};

/// The fields a model is asked for, per conversation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSchema {
    Opening,
    Service,
    Time,
    Fallback,
}

impl SlotSchema {
    pub fn for_state(state: ConversationState) -> Self {
        match state {
            ConversationState::Start | ConversationState::AwaitingName => SlotSchema::Opening,
            ConversationState::AwaitingService => SlotSchema::Service,
            ConversationState::AwaitingTime => SlotSchema::Time,
            _ => SlotSchema::Fallback,
        }
    }

    pub fn fields(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            SlotSchema::Opening => &[
                ("intent", "string (BOOKING, FAQ, ESCALATION, GREETING, OTHER)"),
                ("name", "string (the caller's full name, or null)"),
                ("service_request", "string (the requested service, or null)"),
                ("detected_language", "string (e.g. 'Hindi', 'English', 'Hinglish')"),
            ],
            SlotSchema::Service => &[(
                "service_request",
                "string (the exact service name from the list, or null)",
            )],
            SlotSchema::Time => &[
                ("date", "string (the date resolved to YYYY-MM-DD, or null)"),
                ("time", "string (the time resolved to HH:MM 24-hour format, or null)"),
            ],
            SlotSchema::Fallback => &[("intent", "string (FALLBACK)")],
        }
    }

    fn to_json(self) -> Value {
        let fields: Map<String, Value> = self
            .fields()
            .iter()
            .map(|(name, description)| (name.to_string(), Value::String(description.to_string())))
            .collect();
        Value::Object(fields)
    }

    fn allows(&self, field: &str) -> bool {
        self.fields().iter().any(|(name, _)| *name == field)
    }

    /// Drops every value the schema did not ask for.
    pub fn restrict(&self, slots: ExtractedSlots) -> ExtractedSlots {
        let keep = |field: &str, value: Option<String>| value.filter(|_| self.allows(field));
        ExtractedSlots {
            intent: keep("intent", slots.intent),
            name: keep("name", slots.name),
            service_request: keep("service_request", slots.service_request),
            detected_language: keep("detected_language", slots.detected_language),
            date: keep("date", slots.date),
            time: keep("time", slots.time),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Slots {
        slots: ExtractedSlots,
        provider: String,
    },
    Failed(BookingError),
}

pub struct SlotExtractor {
    chain: Arc<ProviderChain>,
}

impl SlotExtractor {
    pub fn new(chain: Arc<ProviderChain>) -> Self {
        Self { chain }
    }

    pub async fn extract(
        &self,
        user_text: &str,
        state: ConversationState,
        profile: &BusinessProfile,
    ) -> Extraction {
        let schema = SlotSchema::for_state(state);
        let messages = build_messages(user_text, state, profile, Local::now().naive_local());

        let reply = match self.chain.call(&messages, true).await {
            ProviderCallResult::Reply(reply) => reply,
            ProviderCallResult::Exhausted => {
                return Extraction::Failed(BookingError::ProviderExhausted)
            }
        };

        match parse_slots(&reply.content) {
            Some(slots) => {
                let slots = schema.restrict(slots.normalized());
                tracing::info!(
                    provider = %reply.provider,
                    state = %state,
                    intent = slots.intent.as_deref().unwrap_or("-"),
                    "slots extracted"
                );
                Extraction::Slots {
                    slots,
                    provider: reply.provider,
                }
            }
            None => {
                tracing::warn!(provider = %reply.provider, "failed to parse extraction response as JSON");
                Extraction::Failed(BookingError::ExtractionFailure(format!(
                    "unparsable response from {}",
                    reply.provider
                )))
            }
        }
    }
}

pub fn build_messages(
    user_text: &str,
    state: ConversationState,
    profile: &BusinessProfile,
    now: NaiveDateTime,
) -> Vec<Message> {
    let schema = SlotSchema::for_state(state).to_json();
    let clinic = serde_json::to_string(&profile.clinic_info).unwrap_or_default();
    let services = serde_json::to_string(&profile.service_names()).unwrap_or_default();
    let today = now.format("%Y-%m-%d (%A)");
    let clock = now.format("%H:%M");

    let system = format!(
        r#"You are a precise data extraction tool for a front desk.
Extract information from the caller's message for the current conversation state ('{state}').

DATE/TIME RESOLUTION: if the caller uses relative terms such as 'tomorrow', 'next week', 'tonight' or '5:30 PM', resolve them to absolute values (YYYY-MM-DD and HH:MM in 24-hour format). Today is {today} and the current time is {clock}.

CLINIC DETAILS: {clinic}
CLINIC SERVICES: {services}

Output MUST be a single valid JSON object that follows the REQUIRED JSON SCHEMA exactly.
Do not include any other text, markdown or reasoning. Use null for missing fields."#
    );

    vec![
        Message::system(system),
        Message::user(format!(
            "User Input: '{user_text}'. REQUIRED JSON SCHEMA: {schema}"
        )),
    ]
}

fn parse_slots(response: &str) -> Option<ExtractedSlots> {
    json_payload(response).and_then(|json| serde_json::from_str::<ExtractedSlots>(json).ok())
}
