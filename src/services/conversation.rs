use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use crate::errors::BookingError;
use crate::models::{Booking, BusinessProfile, ConversationState, ExtractedSlots, Intent, Session};
use crate::services::ai::chain::ProviderChain;
use crate::services::ai::extract::{Extraction, SlotExtractor};
use crate::services::ai::faq::FaqResponder;
use crate::services::ai::localize::Localizer;
use crate::services::catalog::Notice;
use crate::services::scheduling::{validate_at, OperatingRules, ReasonCode};
use crate::services::sessions::{SessionLocks, SessionStore};

#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub rules: OperatingRules,
    /// Consecutive re-prompts before handing the caller to a human; 0 disables the bound.
    pub max_slot_retries: u32,
}

/// What a turn decided, before it is put into words.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Notice(Notice),
    Rejected(ReasonCode),
    Booked(Booking),
    Escalated,
    Faq,
    ProviderFailure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    pub outcome: Outcome,
    /// Language to answer in, captured before any reset.
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub reply: String,
    pub state: ConversationState,
}

/// Applies one turn's extracted slots to the session.
///
/// On `Err` the session may be partially modified; callers work on a copy and
/// throw it away.
pub fn advance(
    session: &mut Session,
    slots: &ExtractedSlots,
    profile: &BusinessProfile,
    settings: &EngineSettings,
    now: NaiveDateTime,
) -> Result<Advance, BookingError> {
    if let Some(language) = &slots.detected_language {
        session.context.language = Some(language.clone());
    }
    let language = session.context.language().to_string();

    let outcome = match session.state {
        state if !state.is_booking_in_progress() && slots.intent() == Intent::Booking => {
            session.transition_to(ConversationState::AwaitingName)?;
            Outcome::Notice(Notice::AskName)
        }

        ConversationState::AwaitingName => match &slots.name {
            Some(name) => {
                session.transition_to(ConversationState::AwaitingService)?;
                session.context.name = Some(name.clone());
                Outcome::Notice(Notice::AskService {
                    name: name.clone(),
                    services: profile.services_list(),
                })
            }
            None => retry(session, settings, Notice::RetryName)?,
        },

        ConversationState::AwaitingService => {
            let requested = slots.service_request.as_deref();
            match requested.and_then(|r| profile.find_service(r)) {
                Some(service) => {
                    session.transition_to(ConversationState::AwaitingTime)?;
                    session.context.service = Some(service.name.clone());
                    Outcome::Notice(Notice::AskTime {
                        service: service.name.clone(),
                        hours: profile.clinic_info.hours.clone(),
                    })
                }
                None => {
                    if let Some(requested) = requested {
                        let err = BookingError::UnknownServiceRequested(requested.to_string());
                        tracing::info!(session = %session.id, error = %err, "service not offered");
                    }
                    retry(
                        session,
                        settings,
                        Notice::ServiceNotFound {
                            services: profile.services_list(),
                        },
                    )?
                }
            }
        }

        ConversationState::AwaitingTime => match (&slots.date, &slots.time) {
            (Some(date), Some(time)) => {
                let validation = validate_at(date, time, &settings.rules, now);
                if validation.valid {
                    session.transition_to(ConversationState::Booked)?;
                    session.context.date = Some(date.clone());
                    session.context.time = Some(time.clone());

                    let booking = Booking::new(
                        &session.id,
                        session.context.name.as_deref().unwrap_or("Patient"),
                        session.context.service.as_deref().unwrap_or("consultation"),
                        date,
                        time,
                    );
                    tracing::info!(
                        session = %session.id,
                        booking = %booking.id,
                        service = %booking.service,
                        date = %booking.date,
                        time = %booking.time,
                        "booking confirmed"
                    );
                    session.reset();
                    Outcome::Booked(booking)
                } else {
                    let err = BookingError::ValidationRejection(validation.reason);
                    tracing::info!(session = %session.id, error = %err, date = %date, time = %time, "slot rejected");
                    Outcome::Rejected(validation.reason)
                }
            }
            _ => retry(session, settings, Notice::RetryTime)?,
        },

        state => {
            if !state.is_booking_in_progress() {
                session.transition_to(ConversationState::Start)?;
            }
            Outcome::Faq
        }
    };

    Ok(Advance { outcome, language })
}

fn retry(
    session: &mut Session,
    settings: &EngineSettings,
    notice: Notice,
) -> Result<Outcome, BookingError> {
    session.retries += 1;

    if settings.max_slot_retries > 0 && session.retries >= settings.max_slot_retries {
        session.transition_to(ConversationState::Escalated)?;
        tracing::warn!(session = %session.id, retries = session.retries, "retry limit reached, escalating");
        session.reset();
        return Ok(Outcome::Escalated);
    }

    Ok(Outcome::Notice(notice))
}

pub struct ConversationEngine {
    extractor: SlotExtractor,
    localizer: Localizer,
    faq: FaqResponder,
    profile: Arc<BusinessProfile>,
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    settings: EngineSettings,
}

impl ConversationEngine {
    pub fn new(
        chain: Arc<ProviderChain>,
        profile: Arc<BusinessProfile>,
        store: Arc<dyn SessionStore>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            extractor: SlotExtractor::new(Arc::clone(&chain)),
            localizer: Localizer::new(Arc::clone(&chain)),
            faq: FaqResponder::new(chain),
            profile,
            store,
            locks: SessionLocks::default(),
            settings,
        }
    }

    pub fn profile(&self) -> &BusinessProfile {
        &self.profile
    }

    /// Runs one caller turn. The stored session is only written once every
    /// model call of the turn has finished.
    pub async fn process_message(&self, caller_id: &str, text: &str) -> anyhow::Result<TurnReply> {
        let _turn = self.locks.acquire(caller_id).await;

        let stored = self.store.load(caller_id);
        let mut session = stored.clone();

        let extraction = self
            .extractor
            .extract(text, session.state, &self.profile)
            .await;

        let mut provider = None;
        let (outcome, language) = match extraction {
            Extraction::Failed(err) => {
                tracing::warn!(phone = caller_id, error = %err, "extraction failed");
                (Outcome::ProviderFailure, session.context.language().to_string())
            }
            Extraction::Slots { slots, provider: label } => {
                provider = Some(label);
                let now = Local::now().naive_local();
                match advance(&mut session, &slots, &self.profile, &self.settings, now) {
                    Ok(advance) => (advance.outcome, advance.language),
                    Err(err) => {
                        tracing::error!(phone = caller_id, error = %err, "keeping session unchanged");
                        session = stored.clone();
                        let handoff = Notice::Handoff {
                            contact: self.profile.clinic_info.contact.clone(),
                        };
                        (Outcome::Notice(handoff), session.context.language().to_string())
                    }
                }
            }
        };

        tracing::info!(
            phone = caller_id,
            from = %stored.state,
            to = %session.state,
            provider = provider.as_deref().unwrap_or("-"),
            "processed turn"
        );

        let reply = self.render(&outcome, text, &language).await;

        match &outcome {
            Outcome::Booked(booking) => self.store.commit_booking(booking, &session)?,
            _ => self.store.save(&session)?,
        }

        Ok(TurnReply {
            reply,
            state: session.state,
        })
    }

    /// Clears the caller's session back to `START`.
    pub async fn reset(&self, caller_id: &str) -> anyhow::Result<Session> {
        let _turn = self.locks.acquire(caller_id).await;

        let mut session = self.store.load(caller_id);
        session.reset();
        self.store.save(&session)?;

        tracing::info!(phone = caller_id, "session reset");
        Ok(session)
    }

    pub async fn session(&self, caller_id: &str) -> Session {
        let _turn = self.locks.acquire(caller_id).await;
        self.store.load(caller_id)
    }

    async fn render(&self, outcome: &Outcome, text: &str, language: &str) -> String {
        let contact = &self.profile.clinic_info.contact;

        let notice = match outcome {
            Outcome::Notice(notice) => notice.clone(),
            Outcome::Rejected(reason) => {
                Notice::for_rejection(*reason, &self.settings.rules, &self.profile)
                    .unwrap_or(Notice::RetryTime)
            }
            Outcome::Booked(booking) => Notice::Booked {
                service: booking.service.clone(),
                date: booking.date.clone(),
                time: booking.time.clone(),
                name: booking.customer_name.clone(),
            },
            Outcome::Escalated => Notice::Handoff {
                contact: contact.clone(),
            },
            Outcome::ProviderFailure => Notice::ProviderFailure {
                contact: contact.clone(),
            },
            Outcome::Faq => match self.faq.answer(text, &self.profile).await {
                Some(answer) => return answer,
                None => Notice::ProviderFailure {
                    contact: contact.clone(),
                },
            },
        };

        self.localizer.localize(&notice.to_string(), language).await
    }
}
