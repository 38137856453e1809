use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::{
    analysis::{self, ActivityEntry, CognitiveStatus},
    db::{BlocklistRepository, EventRepository, ScanRepository},
    domain::{DashboardKpi, DashboardStats, EventSummary},
};

const TREND_DAYS: i64 = 7;
const DENSITY_WINDOW_SECONDS: i64 = 60;
const RECENT_LIMIT: i64 = 10;

/// Read-time aggregation; every view is recomputed from storage on each call.
#[derive(Clone)]
pub struct Aggregator {
    scans: ScanRepository,
    blocklist: BlocklistRepository,
    events: EventRepository,
}

impl Aggregator {
    pub fn new(
        scans: ScanRepository,
        blocklist: BlocklistRepository,
        events: EventRepository,
    ) -> Self {
        Self {
            scans,
            blocklist,
            events,
        }
    }

    pub async fn dashboard(&self, now: DateTime<Utc>) -> Result<DashboardStats> {
        let total_scans = self.scans.total_count().await?;
        let threats_blocked = self.scans.actionable_count().await?;
        let critical_blocked = self.scans.critical_count().await?;
        let recent_interventions = self.scans.recent(RECENT_LIMIT, 0).await?;
        let activity_trend = self.scans.daily_counts(now, TREND_DAYS).await?;

        Ok(DashboardStats {
            kpi: DashboardKpi {
                total_scans,
                threats_blocked,
                critical_blocked,
                safety_score: (100 - critical_blocked * 5).max(0),
            },
            recent_interventions,
            activity_trend,
        })
    }

    pub async fn activity_log(&self, limit: i64, offset: i64) -> Result<Vec<ActivityEntry>> {
        let denylist = self.blocklist.all().await?;
        let scans = self.scans.recent(limit, offset).await?;
        Ok(scans
            .iter()
            .map(|scan| analysis::classify(scan, &denylist))
            .collect())
    }

    pub async fn cognitive(&self, now: DateTime<Utc>) -> Result<CognitiveStatus> {
        let recent = self.scans.window_count(now, DENSITY_WINDOW_SECONDS).await?;
        Ok(analysis::cognitive_status(recent))
    }

    pub async fn event_summary(&self, now: DateTime<Utc>) -> Result<EventSummary> {
        Ok(EventSummary {
            total_scans: self.events.total_count().await?,
            threats_blocked: self.events.blocked_count().await?,
            common_patterns: self.events.label_counts().await?,
            recent_trend: self.events.daily_counts(now, TREND_DAYS).await?,
        })
    }

    pub async fn reset(&self) -> Result<u64> {
        self.scans.clear_all().await
    }
}
