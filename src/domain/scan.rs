use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tier assigned at write time; display-side code may override it when the
/// domain is on the denylist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "SAFE")]
    Safe,
    #[serde(rename = "WARNED")]
    Warned,
    #[serde(rename = "HIGH_RISK")]
    HighRisk,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            RiskLevel::HighRisk
        } else if score > 0.5 {
            RiskLevel::Warned
        } else {
            RiskLevel::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Warned => "WARNED",
            RiskLevel::HighRisk => "HIGH_RISK",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "HIGH_RISK" => RiskLevel::HighRisk,
            "WARNED" => RiskLevel::Warned,
            _ => RiskLevel::Safe,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewScan {
    pub url: String,
    pub domain: String,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanRecord {
    pub id: i64,
    pub url: String,
    pub domain: String,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub explanation: Option<String>,
    pub timestamp: DateTime<Utc>,
}
