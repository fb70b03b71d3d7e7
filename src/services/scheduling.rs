use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    Ok,
    PastDate,
    TooSoon,
    ClosedHours,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::Ok => "OK",
            ReasonCode::PastDate => "PAST_DATE",
            ReasonCode::TooSoon => "TOO_SOON",
            ReasonCode::ClosedHours => "CLOSED_HOURS",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub reason: ReasonCode,
}

impl ValidationOutcome {
    fn accept() -> Self {
        Self {
            valid: true,
            reason: ReasonCode::Ok,
        }
    }

    fn reject(reason: ReasonCode) -> Self {
        Self {
            valid: false,
            reason,
        }
    }
}

/// Upper bound accepted from configuration, one year.
pub const MAX_LEAD_TIME_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingRules {
    pub lead_time_minutes: i64,
}

/// Checks a proposed slot against the clock of this machine.
pub fn validate(date: &str, time: &str, rules: &OperatingRules) -> ValidationOutcome {
    validate_at(date, time, rules, Local::now().naive_local())
}

/// Checks run in order and stop at the first failure. Time of day against
/// opening hours is not checked.
pub fn validate_at(
    date: &str,
    time: &str,
    rules: &OperatingRules,
    now: NaiveDateTime,
) -> ValidationOutcome {
    // Unparsable extractor output is reported as a past date.
    let Some(slot) = parse_slot(date, time) else {
        return ValidationOutcome::reject(ReasonCode::PastDate);
    };

    let today = now.date();
    if slot.date() < today {
        return ValidationOutcome::reject(ReasonCode::PastDate);
    }

    if slot.date() == today {
        let earliest = TimeDelta::try_minutes(rules.lead_time_minutes)
            .and_then(|lead| now.checked_add_signed(lead));
        // A lead time running past the end of the calendar rules out all of today.
        if earliest.map_or(true, |earliest| slot < earliest) {
            return ValidationOutcome::reject(ReasonCode::TooSoon);
        }
    }

    if matches!(slot.weekday(), Weekday::Sat | Weekday::Sun) {
        return ValidationOutcome::reject(ReasonCode::ClosedHours);
    }

    ValidationOutcome::accept()
}

fn parse_slot(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M").ok()?;
    Some(date.and_time(time))
}
