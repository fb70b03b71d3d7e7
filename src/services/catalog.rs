use crate::models::BusinessProfile;
use crate::services::scheduling::{OperatingRules, ReasonCode};

/// Fixed English source text for everything the engine says on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    AskName,
    AskService { name: String, services: String },
    AskTime { service: String, hours: String },
    RetryName,
    RetryTime,
    PastDate,
    TooSoon { minutes: i64 },
    ClosedHours { hours: String },
    ServiceNotFound { services: String },
    ProviderFailure { contact: String },
    Booked {
        service: String,
        date: String,
        time: String,
        name: String,
    },
    Handoff { contact: String },
}

impl Notice {
    /// Remedial message for a rejected slot; `None` for an accepted one.
    pub fn for_rejection(
        reason: ReasonCode,
        rules: &OperatingRules,
        profile: &BusinessProfile,
    ) -> Option<Self> {
        match reason {
            ReasonCode::Ok => None,
            ReasonCode::PastDate => Some(Notice::PastDate),
            ReasonCode::TooSoon => Some(Notice::TooSoon {
                minutes: rules.lead_time_minutes,
            }),
            ReasonCode::ClosedHours => Some(Notice::ClosedHours {
                hours: profile.clinic_info.hours.clone(),
            }),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::AskName => write!(
                f,
                "I see you want to book! Could you please provide your full name so I can check availability?"
            ),
            Notice::AskService { name, services } => write!(
                f,
                "Thank you, {name}. What service are you booking? We offer: {services}."
            ),
            Notice::AskTime { service, hours } => write!(
                f,
                "Perfect, {service}. What day and time works best for you? Our hours are {hours}."
            ),
            Notice::RetryName => write!(f, "I still need your full name to proceed with the booking."),
            Notice::RetryTime => write!(
                f,
                "I still need a specific date (e.g. YYYY-MM-DD) and time (e.g. HH:MM) to confirm the slot."
            ),
            Notice::PastDate => write!(
                f,
                "I am sorry, I cannot book an appointment for a date that has already passed. Please select a future date."
            ),
            Notice::TooSoon { minutes } => write!(
                f,
                "I am sorry, you must book at least {minutes} minutes in advance. Please select a slightly later time."
            ),
            Notice::ClosedHours { hours } => write!(
                f,
                "I am sorry, we are closed on weekends (Saturday and Sunday) and outside of our working hours ({hours}). Please select a different day or time."
            ),
            Notice::ServiceNotFound { services } => write!(
                f,
                "I apologize, I didn't recognize that service. Please choose from: {services}."
            ),
            Notice::ProviderFailure { contact } => write!(
                f,
                "I apologize, our assistant is currently unavailable. Please call us directly at {contact} for immediate assistance."
            ),
            Notice::Booked {
                service,
                date,
                time,
                name,
            } => write!(
                f,
                "Great news! Your {service} appointment has been tentatively scheduled for {date} at {time} under the name {name}. We'll send you a confirmation message shortly!"
            ),
            Notice::Handoff { contact } => write!(
                f,
                "I'm having trouble completing your booking here. Let me connect you with our front desk at {contact}."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> BusinessProfile {
        BusinessProfile::from_yaml_str(
            r#"
clinic_info:
  name: Test Clinic
  contact: "555-0100"
  hours: "Mon-Fri 09:00-17:00"
services:
  - name: Cleaning
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_rejection_messages_carry_details() {
        let rules = OperatingRules {
            lead_time_minutes: 45,
        };
        let profile = profile();

        let too_soon = Notice::for_rejection(ReasonCode::TooSoon, &rules, &profile).unwrap();
        assert!(too_soon.to_string().contains("at least 45 minutes"));

        let closed = Notice::for_rejection(ReasonCode::ClosedHours, &rules, &profile).unwrap();
        assert!(closed.to_string().contains("Mon-Fri 09:00-17:00"));

        assert_eq!(
            Notice::for_rejection(ReasonCode::PastDate, &rules, &profile),
            Some(Notice::PastDate)
        );
        assert_eq!(Notice::for_rejection(ReasonCode::Ok, &rules, &profile), None);
    }

    #[test]
    fn test_booked_echoes_every_slot() {
        let text = Notice::Booked {
            service: "Cleaning".to_string(),
            date: "2099-01-05".to_string(),
            time: "11:00".to_string(),
            name: "Asha Rao".to_string(),
        }
        .to_string();

        for part in ["Cleaning", "2099-01-05", "11:00", "Asha Rao"] {
            assert!(text.contains(part), "missing {part}");
        }
    }
}
