use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Booking,
    Faq,
    Escalation,
    Greeting,
    Other,
    Fallback,
}

impl Intent {
    /// Lenient parse: models are not consistent about case.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "BOOKING" | "BOOK" => Intent::Booking,
            "FAQ" => Intent::Faq,
            "ESCALATION" => Intent::Escalation,
            "GREETING" => Intent::Greeting,
            "FALLBACK" => Intent::Fallback,
            _ => Intent::Other,
        }
    }
}

/// Fields a model may hand back for one turn. Anything outside the
/// current state's schema is dropped before the engine sees it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractedSlots {
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub service_request: Option<String>,
    #[serde(default)]
    pub detected_language: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

impl ExtractedSlots {
    pub fn intent(&self) -> Intent {
        self.intent
            .as_deref()
            .map(Intent::parse)
            .unwrap_or(Intent::Other)
    }

    /// Trims values and turns blanks and spelled-out nulls into absence.
    pub fn normalized(self) -> Self {
        Self {
            intent: clean(self.intent),
            name: clean(self.name),
            service_request: clean(self.service_request),
            detected_language: clean(self.detected_language),
            date: clean(self.date),
            time: clean(self.time),
        }
    }
}

fn clean(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}
