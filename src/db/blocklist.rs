use std::collections::HashSet;

use anyhow::Result;
use sqlx::SqlitePool;

/// Stores exact strings only; the subdomain relationship is computed at
/// query time by `analysis::blocklist`.
#[derive(Clone)]
pub struct BlocklistRepository {
    pool: SqlitePool,
}

impl BlocklistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn add(&self, domain: &str) -> Result<bool> {
        let affected = sqlx::query(r#"INSERT OR IGNORE INTO blocked_domains (domain) VALUES (?1)"#)
            .bind(domain)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    pub async fn remove(&self, domain: &str) -> Result<bool> {
        let affected = sqlx::query(r#"DELETE FROM blocked_domains WHERE domain = ?1"#)
            .bind(domain)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    pub async fn all(&self) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(r#"SELECT domain FROM blocked_domains"#)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(domain,)| domain).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn add_is_idempotent() {
        let repo = BlocklistRepository::new(test_pool().await);
        assert!(repo.add("tamilrockers.com").await.unwrap());
        assert!(!repo.add("tamilrockers.com").await.unwrap());
        assert_eq!(repo.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn remove_reports_whether_present() {
        let repo = BlocklistRepository::new(test_pool().await);
        repo.add("tamilrockers.com").await.unwrap();
        assert!(repo.remove("tamilrockers.com").await.unwrap());
        assert!(!repo.remove("tamilrockers.com").await.unwrap());
        assert!(repo.all().await.unwrap().is_empty());
    }
}
