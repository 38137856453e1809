use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Datelike, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::io::{AsyncBufReadExt, BufReader};
use url::Url;

use crate::{
    analysis,
    config::AppConfig,
    db::{self, BlocklistRepository, EventRepository, ScanRepository},
    domain::{risk_bucket, LabelResult, NewScan, RiskEvent, RiskLevel, ScoreResult},
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    model::{ModelArtifact, RiskEngine},
    stats::Aggregator,
};

pub struct SentinelApp {
    pool: SqlitePool,
    engine: RiskEngine,
    scans: ScanRepository,
    blocklist: BlocklistRepository,
    events: EventRepository,
    aggregator: Aggregator,
    shutdown: Shutdown,
    timezone: Tz,
}

/// One JSON line per analyzed input, written to stdout.
#[derive(Debug, Serialize)]
struct Verdict {
    input: String,
    domain: Option<String>,
    risk_score: f64,
    risk_bucket: u8,
    risk_level: RiskLevel,
    max_risk_score: f64,
    explanation: Option<String>,
    detections: Vec<LabelResult>,
}

impl SentinelApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        // Artifact load failure is fatal; never start with a broken model.
        let artifact = ModelArtifact::load(&config.model)
            .context("failed to load model artifact; cannot start")?;
        let engine = RiskEngine::new(Arc::new(artifact));

        let pool = db::init_pool(&paths.db_path).await?;
        let scans = ScanRepository::new(pool.clone());
        let blocklist = BlocklistRepository::new(pool.clone());
        let events = EventRepository::new(pool.clone());
        let aggregator = Aggregator::new(scans.clone(), blocklist.clone(), events.clone());

        let timezone: Tz = config.timezone.parse().unwrap_or(chrono_tz::UTC);

        Ok(Self {
            pool,
            engine,
            scans,
            blocklist,
            events,
            aggregator,
            shutdown,
            timezone,
        })
    }

    pub async fn run(self) -> Result<()> {
        tracing::info!(labels = ?self.engine.labels(), "risk engine ready; reading stdin");

        let mut listener = self.shutdown.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                _ = listener.notified() => {
                    tracing::info!("shutdown signal received");
                    break;
                }
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            let line = line.trim();
                            if line.is_empty() {
                                continue;
                            }
                            if let Err(err) = self.handle_line(line).await {
                                tracing::error!(target: "app", error = %err, "failed to process input");
                            }
                        }
                        Ok(None) => {
                            tracing::info!("input stream closed");
                            break;
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
            }
        }

        self.pool.close().await;
        tracing::info!("risk engine stopped");
        Ok(())
    }

    async fn handle_line(&self, line: &str) -> Result<()> {
        if let Some(command) = line.strip_prefix(':') {
            return self.handle_command(command).await;
        }
        let verdict = self.handle_scan(line).await?;
        println!("{}", serde_json::to_string(&verdict)?);
        Ok(())
    }

    // The denylist is not consulted here; it is applied at read time by the
    // activity view.
    async fn handle_scan(&self, input: &str) -> Result<Verdict> {
        let domain = extract_domain(input);

        let domain_str = domain.clone().unwrap_or_default();
        if !domain_str.is_empty() && analysis::is_trusted_domain(&domain_str) {
            let result = ScoreResult::zero(self.engine.labels());
            let explanation = Some("Safe platform detected".to_string());
            self.record_scan(input, &domain_str, 0.0, RiskLevel::Safe, &explanation)
                .await?;
            return Ok(Verdict {
                input: input.to_string(),
                domain,
                risk_score: 0.0,
                risk_bucket: 0,
                risk_level: RiskLevel::Safe,
                max_risk_score: 0.0,
                explanation,
                detections: result.detections,
            });
        }

        let result = self.engine.analyze(input);

        let local_now = Utc::now().with_timezone(&self.timezone);
        let (multiplier, temporal_note) = analysis::adjust_temporal_risk(
            Some(local_now.hour()),
            Some(local_now.weekday().num_days_from_monday()),
            result.max_risk_score,
        );
        let adjusted = (result.max_risk_score * multiplier).min(1.0);

        let explanation = compose_explanation(&result, temporal_note);
        let risk_level = RiskLevel::from_score(adjusted);
        self.record_scan(input, &domain_str, adjusted, risk_level, &explanation)
            .await?;

        Ok(Verdict {
            input: input.to_string(),
            domain,
            risk_score: adjusted,
            risk_bucket: risk_bucket(adjusted),
            risk_level,
            max_risk_score: result.max_risk_score,
            explanation,
            detections: result.detections,
        })
    }

    async fn record_scan(
        &self,
        input: &str,
        domain: &str,
        risk_score: f64,
        risk_level: RiskLevel,
        explanation: &Option<String>,
    ) -> Result<()> {
        self.scans
            .insert(
                NewScan {
                    url: input.to_string(),
                    domain: domain.to_string(),
                    risk_score,
                    risk_level,
                    explanation: explanation.clone(),
                },
                Utc::now(),
            )
            .await
            .context("failed to persist scan record")?;
        Ok(())
    }

    async fn handle_command(&self, command: &str) -> Result<()> {
        let (name, arg) = match command.split_once(' ') {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "stats" => {
                let stats = self.aggregator.dashboard(Utc::now()).await?;
                println!("{}", serde_json::to_string(&stats)?);
            }
            "activity" => {
                let log = self.aggregator.activity_log(20, 0).await?;
                println!("{}", serde_json::to_string(&log)?);
            }
            "status" => {
                let status = self.aggregator.cognitive(Utc::now()).await?;
                println!("{}", serde_json::to_string(&status)?);
            }
            "summary" => {
                let summary = self.aggregator.event_summary(Utc::now()).await?;
                println!("{}", serde_json::to_string(&summary)?);
            }
            "block" if !arg.is_empty() => {
                let added = self.blocklist.add(&arg.to_lowercase()).await?;
                tracing::info!(target: "blocklist", domain = %arg, added, "blocklist add");
            }
            "unblock" if !arg.is_empty() => {
                let removed = self.blocklist.remove(&arg.to_lowercase()).await?;
                tracing::info!(target: "blocklist", domain = %arg, removed, "blocklist remove");
            }
            "blocklist" => {
                let mut domains: Vec<String> = self.blocklist.all().await?.into_iter().collect();
                domains.sort();
                println!("{}", serde_json::to_string(&domains)?);
            }
            "event" if !arg.is_empty() => {
                let event: RiskEvent =
                    serde_json::from_str(arg).context("invalid risk event payload")?;
                self.events.insert(&event).await?;
                tracing::info!(target: "events", domain_hash = %event.domain_hash, "risk event recorded");
            }
            "reset" => {
                let purged = self.aggregator.reset().await?;
                tracing::info!(purged, "telemetry data purged");
            }
            _ => {
                tracing::warn!(target: "app", command = %name, "unknown command");
            }
        }
        Ok(())
    }
}

// Free text without a recognizable domain yields `None`; such scans are
// stored with an empty domain and never match the allow/deny lists.
fn extract_domain(input: &str) -> Option<String> {
    if let Ok(url) = Url::parse(input) {
        if let Some(host) = url.host_str() {
            return Some(host.to_lowercase());
        }
    }
    let candidate = input.split(['/', '?', '#']).next().unwrap_or("").trim();
    if !candidate.is_empty()
        && candidate.contains('.')
        && !candidate.contains(char::is_whitespace)
        && !candidate.ends_with('.')
    {
        return Some(candidate.to_lowercase());
    }
    None
}

// The label names double as the keywords the activity classifier matches on.
fn compose_explanation(result: &ScoreResult, temporal_note: Option<String>) -> Option<String> {
    let triggered: Vec<&str> = result
        .detections
        .iter()
        .filter(|d| d.probability > 0.5)
        .map(|d| d.label.as_str())
        .collect();

    let mut parts = Vec::new();
    if !triggered.is_empty() {
        parts.push(format!("Social engineering cues: {}", triggered.join(", ")));
    }
    if let Some(note) = temporal_note {
        parts.push(note);
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeatureContribution;

    #[test]
    fn extract_domain_from_urls_and_bare_domains() {
        assert_eq!(
            extract_domain("http://movies.tamilrockers.com/stream"),
            Some("movies.tamilrockers.com".to_string())
        );
        assert_eq!(
            extract_domain("https://WWW.YouTube.com/watch?v=x"),
            Some("www.youtube.com".to_string())
        );
        assert_eq!(
            extract_domain("rvce.edu.in"),
            Some("rvce.edu.in".to_string())
        );
        assert_eq!(
            extract_domain("paypal.com.verify-login.net/session"),
            Some("paypal.com.verify-login.net".to_string())
        );
    }

    #[test]
    fn free_text_has_no_domain() {
        assert_eq!(extract_domain("URGENT: wire the payment now"), None);
        assert_eq!(extract_domain("hello"), None);
    }

    #[test]
    fn explanation_combines_labels_and_temporal_note() {
        let result = ScoreResult {
            max_risk_score: 0.9,
            detections: vec![
                LabelResult {
                    label: "urgency".to_string(),
                    probability: 0.9,
                    top_features: vec![FeatureContribution {
                        word: "urgent".to_string(),
                        weight: 2.0,
                    }],
                },
                LabelResult {
                    label: "fear".to_string(),
                    probability: 0.2,
                    top_features: Vec::new(),
                },
            ],
        };

        let explanation = compose_explanation(&result, None).unwrap();
        assert_eq!(explanation, "Social engineering cues: urgency");

        let explanation = compose_explanation(
            &result,
            Some("Temporal Warning: Unusual late-night activity.".to_string()),
        )
        .unwrap();
        assert_eq!(
            explanation,
            "Social engineering cues: urgency; Temporal Warning: Unusual late-night activity."
        );
    }

    #[test]
    fn quiet_result_has_no_explanation() {
        let result = ScoreResult {
            max_risk_score: 0.1,
            detections: Vec::new(),
        };
        assert_eq!(compose_explanation(&result, None), None);
    }
}
