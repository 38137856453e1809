use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::domain::{DailyCount, RiskEvent};

use super::scans::fill_daily_gaps;

#[derive(Clone)]
pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // The integer bucket is widened back to an approximate float score; the
    // first label is kept as the primary pattern for grouping.
    pub async fn insert(&self, event: &RiskEvent) -> Result<()> {
        let primary_label = event
            .labels
            .first()
            .map(String::as_str)
            .unwrap_or("unknown");
        sqlx::query(
            r#"INSERT INTO risk_events (domain_hash, timestamp, risk_score, primary_label, action)
                VALUES (?1, ?2, ?3, ?4, ?5)"#,
        )
        .bind(&event.domain_hash)
        .bind(event.timestamp)
        .bind(f64::from(event.risk_bucket.min(10)) / 10.0)
        .bind(primary_label)
        .bind(event.action_taken.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn total_count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM risk_events"#)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn blocked_count(&self) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as(r#"SELECT COUNT(*) FROM risk_events WHERE action = 'BLOCKED'"#)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn label_counts(&self) -> Result<BTreeMap<String, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"SELECT primary_label, COUNT(*) FROM risk_events GROUP BY primary_label"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn daily_counts(&self, now: DateTime<Utc>, days: i64) -> Result<Vec<DailyCount>> {
        let start = (now - Duration::days(days - 1)).date_naive();
        let start_ts = start
            .and_hms_opt(0, 0, 0)
            .expect("midnight is valid")
            .and_utc()
            .timestamp();

        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"SELECT strftime('%Y-%m-%d', timestamp, 'unixepoch') AS day, COUNT(*)
                FROM risk_events WHERE timestamp >= ?1 GROUP BY day"#,
        )
        .bind(start_ts)
        .fetch_all(&self.pool)
        .await?;

        Ok(fill_daily_gaps(rows, start, days))
    }
}
