use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicInfo {
    pub name: String,
    pub contact: String,
    pub hours: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

/// The one business this instance books for. Loaded once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub clinic_info: ClinicInfo,
    pub services: Vec<Service>,
    #[serde(default)]
    pub faqs: Vec<Faq>,
}

impl BusinessProfile {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read business profile: {}", path.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("invalid business profile: {}", path.display()))
    }

    pub fn from_yaml_str(s: &str) -> anyhow::Result<Self> {
        let profile: BusinessProfile = serde_yaml::from_str(s)?;

        anyhow::ensure!(
            !profile.clinic_info.name.trim().is_empty(),
            "clinic_info.name must not be empty"
        );
        anyhow::ensure!(!profile.services.is_empty(), "at least one service is required");
        for service in &profile.services {
            anyhow::ensure!(!service.name.trim().is_empty(), "service names must not be empty");
        }

        Ok(profile)
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn services_list(&self) -> String {
        self.service_names().join(", ")
    }

    /// Exact, case-sensitive match against canonical names.
    pub fn find_service(&self, requested: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == requested)
    }
}
