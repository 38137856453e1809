use std::collections::HashSet;

use serde::Serialize;

use crate::domain::{RiskLevel, ScanRecord};

use super::blocklist::is_blocked;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActivityStatus {
    #[serde(rename = "BLOCKED")]
    Blocked,
    #[serde(rename = "WARNED")]
    Warned,
    #[serde(rename = "SAFE")]
    Safe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    #[serde(rename = "Phishing")]
    Phishing,
    #[serde(rename = "Social Eng.")]
    SocialEng,
    #[serde(rename = "Critical")]
    Critical,
    #[serde(rename = "Safe")]
    Safe,
    #[serde(rename = "General")]
    General,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub domain: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub status: ActivityStatus,
    pub category: Category,
    pub explanation: Option<String>,
    pub is_blocked: bool,
}

const PHISHING_KEYWORDS: &[&str] = &["impersonation", "typosquatting", "homoglyph", "phish"];
const SOCIAL_ENG_KEYWORDS: &[&str] = &["urgency", "social engineering", "scam"];

// Denylist beats everything: a blocked entry is pinned to maximum display
// risk regardless of its stored score.
pub fn classify(scan: &ScanRecord, denylist: &HashSet<String>) -> ActivityEntry {
    let blocked = is_blocked(&scan.domain, denylist);

    let status = if blocked || scan.risk_score > 0.8 {
        ActivityStatus::Blocked
    } else if scan.risk_score > 0.5 {
        ActivityStatus::Warned
    } else {
        ActivityStatus::Safe
    };

    let explanation = scan.explanation.as_deref().unwrap_or("").to_lowercase();
    let category = if PHISHING_KEYWORDS.iter().any(|kw| explanation.contains(kw)) {
        Category::Phishing
    } else if SOCIAL_ENG_KEYWORDS.iter().any(|kw| explanation.contains(kw)) {
        Category::SocialEng
    } else if scan.risk_score > 0.7 {
        Category::Critical
    } else if scan.risk_score < 0.1 {
        Category::Safe
    } else {
        Category::General
    };

    let (display_score, display_level) = if blocked {
        (1.0, RiskLevel::HighRisk)
    } else {
        (scan.risk_score, scan.risk_level)
    };

    ActivityEntry {
        id: scan.id,
        domain: scan.domain.clone(),
        timestamp: scan.timestamp,
        risk_score: display_score,
        risk_level: display_level,
        status,
        category,
        explanation: scan.explanation.clone(),
        is_blocked: blocked,
    }
}

/// Interaction-density metric over the scans seen in the last 60 seconds.
#[derive(Debug, Clone, Serialize)]
pub struct CognitiveStatus {
    pub level: f64,
    pub status: &'static str,
    pub triggers: Vec<&'static str>,
    pub density_metric: i64,
}

pub fn cognitive_status(recent_count: i64) -> CognitiveStatus {
    if recent_count == 0 {
        return CognitiveStatus {
            level: 0.05,
            status: "Optimal",
            triggers: vec!["System Idle"],
            density_metric: 0,
        };
    }

    let level = (0.1 + recent_count as f64 * 0.1).min(1.0);
    let mut status = "Normal";
    let mut triggers = vec!["Active Evaluation"];

    if recent_count > 5 {
        status = "Elevated";
        triggers.push("High Volume");
    }
    if recent_count > 10 {
        status = "Maximal";
        triggers.push("Rapid Decisions");
    }
    triggers.truncate(3);

    CognitiveStatus {
        level: (level * 100.0).round() / 100.0,
        status,
        triggers,
        density_metric: recent_count,
    }
}
