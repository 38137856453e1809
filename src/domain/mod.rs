pub mod scan;
pub mod types;

pub use scan::{NewScan, RiskLevel, ScanRecord};
pub use types::{
    risk_bucket, ActionTaken, DailyCount, DashboardKpi, DashboardStats, EventSummary,
    FeatureContribution, LabelResult, RiskEvent, ScoreResult,
};
