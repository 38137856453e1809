use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureContribution {
    pub word: String,
    pub weight: f64,
}

/// `top_features` holds at most three entries, all with strictly positive
/// weight, sorted weight-descending.
#[derive(Debug, Clone, Serialize)]
pub struct LabelResult {
    pub label: String,
    pub probability: f64,
    pub top_features: Vec<FeatureContribution>,
}

/// `detections` iterates in artifact label order; `max_risk_score` is the
/// maximum label probability.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreResult {
    pub max_risk_score: f64,
    pub detections: Vec<LabelResult>,
}

impl ScoreResult {
    pub fn zero(labels: &[String]) -> Self {
        Self {
            max_risk_score: 0.0,
            detections: labels
                .iter()
                .map(|label| LabelResult {
                    label: label.clone(),
                    probability: 0.0,
                    top_features: Vec::new(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionTaken {
    #[serde(rename = "BLOCKED")]
    Blocked,
    #[serde(rename = "WARNED")]
    Warned,
    #[serde(rename = "IGNORED")]
    Ignored,
}

impl ActionTaken {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionTaken::Blocked => "BLOCKED",
            ActionTaken::Warned => "WARNED",
            ActionTaken::Ignored => "IGNORED",
        }
    }
}

/// Telemetry record reported by clients.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskEvent {
    pub domain_hash: String,
    pub timestamp: i64,
    pub risk_bucket: u8,
    #[serde(default)]
    pub labels: Vec<String>,
    pub action_taken: ActionTaken,
}

/// Nearest-integer bucketing of a float score into [0, 10].
pub fn risk_bucket(score: f64) -> u8 {
    (score * 10.0).round().clamp(0.0, 10.0) as u8
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardKpi {
    pub total_scans: i64,
    pub threats_blocked: i64,
    pub critical_blocked: i64,
    pub safety_score: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub kpi: DashboardKpi,
    pub recent_interventions: Vec<crate::domain::scan::ScanRecord>,
    pub activity_trend: Vec<DailyCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub total_scans: i64,
    pub threats_blocked: i64,
    pub common_patterns: BTreeMap<String, i64>,
    pub recent_trend: Vec<DailyCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_bucket_rounds_to_nearest() {
        assert_eq!(risk_bucket(0.55), 6);
        assert_eq!(risk_bucket(0.04), 0);
        assert_eq!(risk_bucket(1.0), 10);
    }

    #[test]
    fn risk_bucket_clamps_out_of_range_scores() {
        assert_eq!(risk_bucket(1.7), 10);
        assert_eq!(risk_bucket(-0.3), 0);
    }
}
