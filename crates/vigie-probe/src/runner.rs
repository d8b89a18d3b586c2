//! Scan runner: several probes on one URL.

use crate::engine::ProbeEngine;
use crate::error::Result;
use crate::probes::ProbeKind;
use crate::report::{ComplianceReport, ScanSummary};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::info;
use vigie_core::{AppConfig, ProbeTarget};

/// Runs probes concurrently, up to `max_concurrent_probes` at a time.
#[derive(Clone)]
pub struct ScanRunner {
    engine: ProbeEngine,
    max_concurrent_probes: usize,
}

impl ScanRunner {
    /// Create a runner around an engine.
    #[must_use]
    pub fn new(engine: ProbeEngine, max_concurrent_probes: usize) -> Self {
        Self {
            engine,
            max_concurrent_probes: max_concurrent_probes.max(1),
        }
    }

    /// Create a runner from the application configuration.
    ///
    /// # Errors
    /// Returns error if the engine cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            ProbeEngine::from_config(config)?,
            config.scanning.concurrent_probes,
        ))
    }

    /// The underlying engine.
    #[must_use]
    pub fn engine(&self) -> &ProbeEngine {
        &self.engine
    }

    /// Run every probe on `url`.
    ///
    /// # Errors
    /// Returns error if `url` is not an absolute http(s) URL.
    pub async fn run_all(&self, url: &str) -> Result<ScanSummary> {
        self.run(url, &ProbeKind::ALL).await
    }

    /// Run `kinds` on `url`. Reports come back in the order of `kinds`, with
    /// duplicates removed.
    ///
    /// # Errors
    /// Returns error if `url` is not an absolute http(s) URL.
    pub async fn run(&self, url: &str, kinds: &[ProbeKind]) -> Result<ScanSummary> {
        let target = ProbeTarget::parse(url)?;
        let timestamp = Utc::now();

        let mut unique: Vec<ProbeKind> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            if !unique.contains(kind) {
                unique.push(*kind);
            }
        }

        let mut futures = FuturesUnordered::new();
        let mut reports: Vec<Option<ComplianceReport>> = vec![None; unique.len()];

        for (index, kind) in unique.iter().copied().enumerate() {
            let engine = &self.engine;
            let target = &target;
            futures.push(async move { (index, engine.run(kind, target).await) });

            // Respect concurrency limit
            while futures.len() >= self.max_concurrent_probes {
                if let Some((index, report)) = futures.next().await {
                    reports[index] = Some(report);
                }
            }
        }

        // Collect remaining results
        while let Some((index, report)) = futures.next().await {
            reports[index] = Some(report);
        }

        let summary =
            ScanSummary::from_reports(&target.to_string(), timestamp, reports.into_iter().flatten().collect());

        info!(
            scan_id = %summary.scan_id,
            url = %summary.url,
            probes = summary.reports.len(),
            score = summary.score,
            critical = summary.critical_count,
            "scan finished"
        );

        Ok(summary)
    }
}
