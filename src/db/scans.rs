use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqlitePool};

use crate::domain::{DailyCount, NewScan, RiskLevel, ScanRecord};

// Scans at or above this score count as "actionable" in the dashboard KPI.
const ACTIONABLE_SCORE: f64 = 0.4;

#[derive(Clone)]
pub struct ScanRepository {
    pool: SqlitePool,
}

impl ScanRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, scan: NewScan, timestamp: DateTime<Utc>) -> Result<i64> {
        let id = sqlx::query(
            r#"INSERT INTO scans (url, domain, risk_score, risk_level, explanation, timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        )
        .bind(&scan.url)
        .bind(&scan.domain)
        .bind(scan.risk_score)
        .bind(scan.risk_level.as_str())
        .bind(&scan.explanation)
        .bind(timestamp.timestamp())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    pub async fn recent(&self, limit: i64, offset: i64) -> Result<Vec<ScanRecord>> {
        let rows = sqlx::query_as::<_, ScanRecord>(
            r#"SELECT id, url, domain, risk_score, risk_level, explanation, timestamp
                FROM scans ORDER BY timestamp DESC, id DESC LIMIT ?1 OFFSET ?2"#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn total_count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM scans"#)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn actionable_count(&self) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as(r#"SELECT COUNT(*) FROM scans WHERE risk_score >= ?1"#)
                .bind(ACTIONABLE_SCORE)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn critical_count(&self) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as(r#"SELECT COUNT(*) FROM scans WHERE risk_level = 'HIGH_RISK'"#)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn window_count(&self, now: DateTime<Utc>, seconds: i64) -> Result<i64> {
        let cutoff = now.timestamp() - seconds;
        let (count,): (i64,) =
            sqlx::query_as(r#"SELECT COUNT(*) FROM scans WHERE timestamp >= ?1"#)
                .bind(cutoff)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    // Oldest first, gaps filled with zero.
    pub async fn daily_counts(&self, now: DateTime<Utc>, days: i64) -> Result<Vec<DailyCount>> {
        let start = (now - Duration::days(days - 1)).date_naive();
        let start_ts = start
            .and_hms_opt(0, 0, 0)
            .expect("midnight is valid")
            .and_utc()
            .timestamp();

        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"SELECT strftime('%Y-%m-%d', timestamp, 'unixepoch') AS day, COUNT(*)
                FROM scans WHERE timestamp >= ?1 GROUP BY day"#,
        )
        .bind(start_ts)
        .fetch_all(&self.pool)
        .await?;

        Ok(fill_daily_gaps(rows, start, days))
    }

    pub async fn clear_all(&self) -> Result<u64> {
        let affected = sqlx::query(r#"DELETE FROM scans"#)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected)
    }
}

pub(crate) fn fill_daily_gaps(
    rows: Vec<(String, i64)>,
    start: chrono::NaiveDate,
    days: i64,
) -> Vec<DailyCount> {
    let by_day: HashMap<String, i64> = rows.into_iter().collect();
    (0..days)
        .map(|offset| {
            let date = (start + Duration::days(offset)).format("%Y-%m-%d").to_string();
            let count = by_day.get(&date).copied().unwrap_or(0);
            DailyCount { date, count }
        })
        .collect()
}

impl FromRow<'_, SqliteRow> for ScanRecord {
    fn from_row(row: &SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let level: String = row.try_get("risk_level")?;
        let timestamp: i64 = row.try_get("timestamp")?;
        Ok(Self {
            id: row.try_get("id")?,
            url: row.try_get("url")?,
            domain: row.try_get("domain")?,
            risk_score: row.try_get("risk_score")?,
            risk_level: RiskLevel::parse(&level),
            explanation: row.try_get("explanation")?,
            timestamp: DateTime::from_timestamp(timestamp, 0).unwrap_or(DateTime::UNIX_EPOCH),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn scan(domain: &str, score: f64) -> NewScan {
        NewScan {
            url: format!("http://{domain}"),
            domain: domain.to_string(),
            risk_score: score,
            risk_level: RiskLevel::from_score(score),
            explanation: None,
        }
    }

    #[tokio::test]
    async fn insert_and_read_back() {
        let repo = ScanRepository::new(test_pool().await);
        let now = Utc::now();
        repo.insert(scan("example.com", 0.9), now).await.unwrap();

        let rows = repo.recent(10, 0).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].domain, "example.com");
        assert_eq!(rows[0].risk_level, RiskLevel::HighRisk);
        assert_eq!(rows[0].timestamp.timestamp(), now.timestamp());
    }

    #[tokio::test]
    async fn counts_split_by_threshold_and_level() {
        let repo = ScanRepository::new(test_pool().await);
        let now = Utc::now();
        repo.insert(scan("safe.com", 0.1), now).await.unwrap();
        repo.insert(scan("warned.com", 0.6), now).await.unwrap();
        repo.insert(scan("bad.com", 0.95), now).await.unwrap();

        assert_eq!(repo.total_count().await.unwrap(), 3);
        assert_eq!(repo.actionable_count().await.unwrap(), 2);
        assert_eq!(repo.critical_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn window_count_excludes_old_scans() {
        let repo = ScanRepository::new(test_pool().await);
        let now = Utc::now();
        repo.insert(scan("old.com", 0.2), now - Duration::seconds(120))
            .await
            .unwrap();
        repo.insert(scan("fresh.com", 0.2), now).await.unwrap();

        assert_eq!(repo.window_count(now, 60).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn daily_counts_fill_gaps_oldest_first() {
        let repo = ScanRepository::new(test_pool().await);
        let now = Utc::now();
        repo.insert(scan("a.com", 0.2), now).await.unwrap();
        repo.insert(scan("b.com", 0.2), now - Duration::days(2))
            .await
            .unwrap();

        let trend = repo.daily_counts(now, 7).await.unwrap();
        assert_eq!(trend.len(), 7);
        assert_eq!(trend[6].count, 1);
        assert_eq!(trend[4].count, 1);
        assert_eq!(trend.iter().map(|d| d.count).sum::<i64>(), 2);
        assert!(trend[0].date < trend[6].date);
    }

    #[tokio::test]
    async fn clear_all_removes_every_row() {
        let repo = ScanRepository::new(test_pool().await);
        let now = Utc::now();
        repo.insert(scan("a.com", 0.2), now).await.unwrap();
        repo.insert(scan("b.com", 0.2), now).await.unwrap();

        assert_eq!(repo.clear_all().await.unwrap(), 2);
        assert_eq!(repo.total_count().await.unwrap(), 0);
    }
}
