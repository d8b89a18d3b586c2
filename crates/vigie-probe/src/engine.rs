//! Probe engine.
//!
//! [`ProbeEngine::run`] starts the budget, performs the mandatory origin
//! fetch and dispatches to the requested probe. The origin fetch is the only
//! fatal stage: when it fails the probe returns an `Erreur d'analyse` report
//! without running anything else.

use crate::budget::{Stage, TimeBudget};
use crate::error::Result;
use crate::extract::PageSnapshot;
use crate::probes::{self, ProbeKind};
use crate::report::ComplianceReport;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use vigie_core::{AppConfig, ProbeTarget};
use vigie_fetch::{FetchOptions, FetchResult, Fetcher, HttpFetcher, ACCEPT_HTML};
use vigie_patterns::Catalog;

/// Timeouts, budget and fan-out caps of a probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Mandatory origin fetch timeout (outside the budget)
    pub origin_timeout: Duration,
    /// Wall-clock budget of the optional stages
    pub budget: Duration,
    /// Per-sitemap fetch timeout
    pub sitemap_timeout: Duration,
    /// Located target fetch timeout
    pub target_timeout: Duration,
    /// robots.txt fetch timeout
    pub robots_timeout: Duration,
    /// Secondary fetch timeout
    pub secondary_timeout: Duration,
    /// Sitemap fetches per probe
    pub max_sitemaps: usize,
    /// Secondary fetches per probe
    pub max_secondary_fetches: usize,
    /// Inventory size cap
    pub max_inventory_items: usize,
    /// Inventory cap per category
    pub max_items_per_category: usize,
    /// Body size cap of every fetch
    pub max_document_bytes: usize,
}

impl ProbeSettings {
    /// Settings from the application configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let probe = &config.probe;
        Self {
            origin_timeout: Duration::from_millis(config.http.origin_timeout_ms),
            budget: Duration::from_millis(probe.budget_ms),
            sitemap_timeout: Duration::from_millis(probe.sitemap_timeout_ms),
            target_timeout: Duration::from_millis(probe.target_timeout_ms),
            robots_timeout: Duration::from_millis(probe.robots_timeout_ms),
            secondary_timeout: Duration::from_millis(probe.secondary_timeout_ms),
            max_sitemaps: probe.max_sitemaps,
            max_secondary_fetches: probe.max_secondary_fetches,
            max_inventory_items: probe.max_inventory_items,
            max_items_per_category: probe.max_items_per_category,
            max_document_bytes: probe.max_document_bytes,
        }
    }

    /// Override the budget.
    #[must_use]
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Timeout of an optional stage.
    #[must_use]
    pub fn stage_timeout(&self, stage: Stage) -> Duration {
        match stage {
            Stage::Robots => self.robots_timeout,
            Stage::Sitemap => self.sitemap_timeout,
            Stage::Target => self.target_timeout,
            Stage::Secondary => self.secondary_timeout,
        }
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Shared, read-only collaborators of every probe.
pub struct ProbeContext {
    /// Content source
    pub fetcher: Arc<dyn Fetcher>,
    /// Pattern libraries
    pub catalog: Arc<Catalog>,
    /// Timeouts and caps
    pub settings: ProbeSettings,
}

impl ProbeContext {
    /// Fetch `url` as an optional `stage`, or `None` when the budget refuses.
    pub async fn fetch_optional(
        &self,
        budget: &TimeBudget,
        stage: Stage,
        url: &Url,
        accept: &str,
    ) -> Option<FetchResult> {
        if !budget.allows(stage) {
            return None;
        }
        let options = FetchOptions::new(self.settings.stage_timeout(stage))
            .with_max_bytes(self.settings.max_document_bytes)
            .with_accept(accept);
        let result = self.fetcher.fetch(url.as_str(), &options).await;
        debug!(
            stage = %stage,
            url = %url,
            status = result.status_code,
            elapsed_ms = result.elapsed_ms,
            "optional fetch done"
        );
        Some(result)
    }
}

/// The fetched and parsed origin page.
pub struct OriginPage {
    /// Probe input
    pub target: ProbeTarget,
    /// Raw fetch result
    pub fetch: FetchResult,
    /// Parsed markup
    pub page: PageSnapshot,
}

impl OriginPage {
    /// Parse a successful origin fetch. References resolve against the final
    /// URL after redirects.
    #[must_use]
    pub fn new(target: ProbeTarget, fetch: FetchResult) -> Self {
        let base = Url::parse(&fetch.final_url).unwrap_or_else(|_| target.url().clone());
        let page = PageSnapshot::parse(&fetch.content, &base);
        Self {
            target,
            fetch,
            page,
        }
    }

    /// Host the scope filter compares against.
    #[must_use]
    pub fn origin_domain(&self) -> &str {
        self.target.origin_domain()
    }

    /// URL references are resolved against.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.page.base
    }
}

/// Runs probes against URLs.
#[derive(Clone)]
pub struct ProbeEngine {
    ctx: Arc<ProbeContext>,
}

impl ProbeEngine {
    /// Create an engine from its collaborators.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, catalog: Arc<Catalog>, settings: ProbeSettings) -> Self {
        Self {
            ctx: Arc::new(ProbeContext {
                fetcher,
                catalog,
                settings,
            }),
        }
    }

    /// Create an engine with an HTTP fetcher and the configured pattern libraries.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid, the HTTP client cannot
    /// be built or the pattern override directory cannot be read.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = HttpFetcher::new(&config.http)?;
        let catalog = Catalog::load(&config.patterns)?;
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(catalog),
            ProbeSettings::from_config(config),
        ))
    }

    /// Shared probe context.
    #[must_use]
    pub fn context(&self) -> &ProbeContext {
        &self.ctx
    }

    /// Validate `url` and run `kind` against it.
    ///
    /// # Errors
    /// Returns error if `url` is not an absolute http(s) URL.
    pub async fn run_url(&self, kind: ProbeKind, url: &str) -> Result<ComplianceReport> {
        let target = ProbeTarget::parse(url)?;
        Ok(self.run(kind, &target).await)
    }

    /// Run one probe. Never fails: every failure is reported in-band.
    pub async fn run(&self, kind: ProbeKind, target: &ProbeTarget) -> ComplianceReport {
        let timestamp = Utc::now();
        let budget = TimeBudget::start(self.ctx.settings.budget);
        let url = target.to_string();

        let options = FetchOptions::new(self.ctx.settings.origin_timeout)
            .with_max_bytes(self.ctx.settings.max_document_bytes)
            .with_accept(ACCEPT_HTML);
        let fetch = self.ctx.fetcher.fetch(&url, &options).await;

        let mut report = if fetch.is_success() {
            let origin = OriginPage::new(target.clone(), fetch);
            probes::dispatch(kind, &self.ctx, &origin, &budget, timestamp).await
        } else {
            let error = fetch
                .error
                .unwrap_or_else(|| format!("HTTP {}", fetch.status_code));
            warn!(probe = %kind, url = %url, error = %error, "origin fetch failed");
            ComplianceReport::origin_failure(kind, &url, timestamp, &error)
        };

        report.elapsed_ms = budget.elapsed_ms();
        report.exceeded_budget = budget.is_exceeded();

        info!(
            probe = %kind,
            url = %url,
            score = report.score,
            level = %report.level,
            found = report.found,
            elapsed_ms = report.elapsed_ms,
            exceeded_budget = report.exceeded_budget,
            "probe finished"
        );

        report
    }
}
