use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::BookingError;

pub const DEFAULT_LANGUAGE: &str = "English";

/// Longest session lifetime `touch` will stamp, ten years.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365 * 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    Start,
    AwaitingName,
    AwaitingService,
    AwaitingTime,
    Confirmation,
    Booked,
    FaqMode,
    Escalated,
}

impl ConversationState {
    pub const ALL: [ConversationState; 8] = [
        ConversationState::Start,
        ConversationState::AwaitingName,
        ConversationState::AwaitingService,
        ConversationState::AwaitingTime,
        ConversationState::Confirmation,
        ConversationState::Booked,
        ConversationState::FaqMode,
        ConversationState::Escalated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Start => "START",
            ConversationState::AwaitingName => "AWAITING_NAME",
            ConversationState::AwaitingService => "AWAITING_SERVICE",
            ConversationState::AwaitingTime => "AWAITING_TIME",
            ConversationState::Confirmation => "CONFIRMATION",
            ConversationState::Booked => "BOOKED",
            ConversationState::FaqMode => "FAQ_MODE",
            ConversationState::Escalated => "ESCALATED",
        }
    }

    /// Returns `None` for anything outside the closed state set.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.as_str() == s)
    }

    pub fn is_booking_in_progress(&self) -> bool {
        matches!(
            self,
            ConversationState::AwaitingName
                | ConversationState::AwaitingService
                | ConversationState::AwaitingTime
                | ConversationState::Confirmation
        )
    }

    /// Edges of the booking flow. Whole-session resets bypass this table.
    pub fn can_transition_to(&self, next: ConversationState) -> bool {
        use ConversationState::*;

        match (*self, next) {
            (from, AwaitingName) if !from.is_booking_in_progress() => true,
            (AwaitingName, AwaitingName | AwaitingService) => true,
            (AwaitingService, AwaitingService | AwaitingTime) => true,
            (AwaitingTime, AwaitingTime | Booked) => true,
            (Confirmation, Confirmation | Booked) => true,
            (from, Escalated) => from.is_booking_in_progress(),
            (from, Start | FaqMode) => !from.is_booking_in_progress(),
            _ => false,
        }
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slots collected so far. Fields are only ever set; a reset replaces the whole context.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl SlotContext {
    pub fn is_empty(&self) -> bool {
        *self == SlotContext::default()
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    pub state: ConversationState,
    pub context: SlotContext,
    /// Consecutive re-prompts in the current collection state.
    pub retries: u32,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl Session {
    pub fn new(id: &str) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: id.to_string(),
            state: ConversationState::Start,
            context: SlotContext::default(),
            retries: 0,
            last_activity: now,
            expires_at: now,
        }
    }

    pub fn is_booking_in_progress(&self) -> bool {
        self.state.is_booking_in_progress()
    }

    /// Moves along one edge of the flow. Rejected edges leave the session untouched.
    pub fn transition_to(&mut self, next: ConversationState) -> Result<(), BookingError> {
        if !self.state.can_transition_to(next) {
            return Err(BookingError::InvalidStateTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::debug!(session = %self.id, from = %self.state, to = %next, "state transition");
        if next != self.state {
            self.retries = 0;
        }
        self.state = next;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.state = ConversationState::Start;
        self.context = SlotContext::default();
        self.retries = 0;
    }

    pub fn touch(&mut self, ttl_minutes: i64) {
        let now = Utc::now().naive_utc();
        self.last_activity = now;
        self.expires_at = now + Duration::minutes(ttl_minutes.clamp(-MAX_TTL_MINUTES, MAX_TTL_MINUTES));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_state() {
        for state in ConversationState::ALL {
            assert_eq!(ConversationState::parse(state.as_str()), Some(state));
        }
        assert_eq!(ConversationState::parse("AWAITING_PAYMENT"), None);
        assert_eq!(ConversationState::parse("start"), None);
    }

    #[test]
    fn test_booking_in_progress_states() {
        let in_progress: Vec<_> = ConversationState::ALL
            .into_iter()
            .filter(|s| s.is_booking_in_progress())
            .collect();
        assert_eq!(
            in_progress,
            vec![
                ConversationState::AwaitingName,
                ConversationState::AwaitingService,
                ConversationState::AwaitingTime,
                ConversationState::Confirmation,
            ]
        );
    }

    #[test]
    fn test_rejected_transition_leaves_session_unchanged() {
        let mut session = Session::new("+15550001111");
        session.context.language = Some("Hindi".to_string());
        let before = session.clone();

        let err = session
            .transition_to(ConversationState::AwaitingTime)
            .unwrap_err();

        assert!(matches!(err, BookingError::InvalidStateTransition { .. }));
        assert_eq!(session, before);
    }

    #[test]
    fn test_transition_resets_retry_counter() {
        let mut session = Session::new("caller");
        session.transition_to(ConversationState::AwaitingName).unwrap();
        session.retries = 2;

        session.transition_to(ConversationState::AwaitingName).unwrap();
        assert_eq!(session.retries, 2);

        session.transition_to(ConversationState::AwaitingService).unwrap();
        assert_eq!(session.retries, 0);
    }

    #[test]
    fn test_cannot_abandon_booking_for_start() {
        assert!(!ConversationState::AwaitingService.can_transition_to(ConversationState::Start));
        assert!(ConversationState::Booked.can_transition_to(ConversationState::Start));
        assert!(ConversationState::FaqMode.can_transition_to(ConversationState::AwaitingName));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut session = Session::new("caller");
        session.transition_to(ConversationState::AwaitingName).unwrap();
        session.context.name = Some("Asha Rao".to_string());

        session.reset();
        let once = session.clone();
        session.reset();

        assert_eq!(session, once);
        assert_eq!(session.state, ConversationState::Start);
        assert!(session.context.is_empty());
    }

    #[test]
    fn test_touch_caps_huge_ttl() {
        let mut session = Session::new("caller");
        session.touch(i64::MAX);
        let lifetime = session.expires_at - session.last_activity;
        assert_eq!(lifetime, Duration::minutes(MAX_TTL_MINUTES));

        session.touch(i64::MIN);
        assert!(session.expires_at < session.last_activity);
    }

    #[test]
    fn test_language_defaults_to_english() {
        let mut ctx = SlotContext::default();
        assert_eq!(ctx.language(), "English");
        ctx.language = Some("Hinglish".to_string());
        assert_eq!(ctx.language(), "Hinglish");
    }
}
