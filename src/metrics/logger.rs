// Decision logger
//
// Appends one JSON line per routed query to <metrics_dir>/<UTC date>.jsonl.
// Queries are stored as SHA-256 hashes only.

use anyhow::{Context, Result};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use super::types::RoutingMetric;
use crate::router::{Route, RoutingMethod};

pub struct DecisionLogger {
    metrics_dir: PathBuf,
    // Serializes appends so concurrent queries never interleave lines
    write_lock: Mutex<()>,
}

impl DecisionLogger {
    pub fn new(metrics_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&metrics_dir).with_context(|| {
            format!(
                "Failed to create metrics directory: {}",
                metrics_dir.display()
            )
        })?;

        Ok(Self {
            metrics_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn file_for(&self, date: &str) -> PathBuf {
        self.metrics_dir.join(format!("{}.jsonl", date))
    }

    /// Append a metric to today's file
    pub fn log(&self, metric: &RoutingMetric) -> Result<()> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let log_file = self.file_for(&today);

        let json = serde_json::to_string(metric).context("Failed to serialize metric")?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("decision log lock poisoned"))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("Failed to open decision log: {}", log_file.display()))?;

        writeln!(file, "{}", json).context("Failed to write decision log")?;
        Ok(())
    }

    /// Hash a query for privacy (SHA256)
    pub fn hash_query(query: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(query.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Read metrics for a specific date (YYYY-MM-DD)
    pub fn read_metrics(&self, date: &str) -> Result<Vec<RoutingMetric>> {
        let log_file = self.file_for(date);

        if !log_file.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&log_file)
            .with_context(|| format!("Failed to read decision log: {}", log_file.display()))?;

        contents
            .lines()
            .filter(|line| !line.is_empty())
            .map(serde_json::from_str)
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to parse decision log")
    }

    pub fn summary_for(&self, date: &str) -> Result<DecisionSummary> {
        let metrics = self.read_metrics(date)?;

        let mut by_route: HashMap<Route, usize> = HashMap::new();
        let mut by_method: HashMap<RoutingMethod, usize> = HashMap::new();
        for m in &metrics {
            *by_route.entry(m.route).or_insert(0) += 1;
            *by_method.entry(m.method).or_insert(0) += 1;
        }

        let error_fallbacks = metrics
            .iter()
            .filter(|m| m.fallback.map(|f| f.is_error()).unwrap_or(false))
            .count();

        let avg_latency_us = if metrics.is_empty() {
            0
        } else {
            metrics.iter().map(|m| m.latency_us).sum::<u64>() / metrics.len() as u64
        };

        Ok(DecisionSummary {
            total: metrics.len(),
            by_route,
            by_method,
            error_fallbacks,
            avg_latency_us,
        })
    }

    pub fn today_summary(&self) -> Result<DecisionSummary> {
        self.summary_for(&Utc::now().format("%Y-%m-%d").to_string())
    }
}

#[derive(Debug, Default)]
pub struct DecisionSummary {
    pub total: usize,
    pub by_route: HashMap<Route, usize>,
    pub by_method: HashMap<RoutingMethod, usize>,
    pub error_fallbacks: usize,
    pub avg_latency_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{FallbackReason, RoutingDecision};

    #[test]
    fn test_hash_query() {
        let hash1 = DecisionLogger::hash_query("Hello");
        let hash2 = DecisionLogger::hash_query("Hello");
        let hash3 = DecisionLogger::hash_query("World");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert_eq!(hash1.len(), 64); // SHA256 produces 64 hex chars
    }

    #[test]
    fn test_log_and_summarize() {
        let dir = tempfile::tempdir().unwrap();
        let logger = DecisionLogger::new(dir.path().join("metrics")).unwrap();

        let semantic = RoutingDecision::semantic(Route::Faq, 0.8);
        let fallback = RoutingDecision {
            route: Route::ProductSearch,
            method: RoutingMethod::Keyword,
            score: None,
            fallback: Some(FallbackReason::EncodingError),
        };

        logger
            .log(&RoutingMetric::new(DecisionLogger::hash_query("a"), &semantic, 100))
            .unwrap();
        logger
            .log(&RoutingMetric::new(DecisionLogger::hash_query("b"), &fallback, 300))
            .unwrap();

        let summary = logger.today_summary().unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.by_route[&Route::Faq], 1);
        assert_eq!(summary.by_method[&RoutingMethod::Keyword], 1);
        assert_eq!(summary.error_fallbacks, 1);
        assert_eq!(summary.avg_latency_us, 200);
    }

    #[test]
    fn test_missing_day_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let logger = DecisionLogger::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(logger.summary_for("1999-01-01").unwrap().total, 0);
    }
}
