use serde::{Deserialize, Serialize};

/// Pricing and workflow tier of an order line.
///
/// Anything that does not name a known tier deserializes to `Unknown`, which
/// prices and schedules like the safe defaults instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "service_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    DirectBuy,
    VideoConsultation,
    HomeVisit,
    #[serde(other)]
    Unknown,
}

impl ServiceType {
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "DIRECT_BUY" => ServiceType::DirectBuy,
            "VIDEO_CONSULTATION" => ServiceType::VideoConsultation,
            "HOME_VISIT" => ServiceType::HomeVisit,
            _ => ServiceType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::DirectBuy => "DIRECT_BUY",
            ServiceType::VideoConsultation => "VIDEO_CONSULTATION",
            ServiceType::HomeVisit => "HOME_VISIT",
            ServiceType::Unknown => "UNKNOWN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceType::DirectBuy => "Direct Buy",
            ServiceType::VideoConsultation => "Video Consultation",
            ServiceType::HomeVisit => "Home Visit",
            ServiceType::Unknown => "Standard",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ServiceType::Unknown)
    }
}

impl Default for ServiceType {
    fn default() -> Self {
        ServiceType::DirectBuy
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
