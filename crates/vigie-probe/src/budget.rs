//! Per-probe wall-clock budget.
//!
//! The budget starts when a probe is entered. Every optional network stage
//! asks [`TimeBudget::allows`] first; once the budget is spent the answer is
//! `false` for the rest of the probe.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Optional network stages gated by the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// `robots.txt` fetch
    Robots,
    /// One sitemap fetch
    Sitemap,
    /// Fetch of the located target document
    Target,
    /// Secondary fetch (script, manifest, well-known path)
    Secondary,
}

impl Stage {
    /// Stable name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Robots => "robots",
            Self::Sitemap => "sitemap",
            Self::Target => "target",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wall-clock budget shared by the stages of one probe.
#[derive(Debug)]
pub struct TimeBudget {
    started: Instant,
    budget: Duration,
    exceeded: AtomicBool,
}

impl TimeBudget {
    /// Start the clock.
    #[must_use]
    pub fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
            exceeded: AtomicBool::new(false),
        }
    }

    /// Whether `stage` may run. Latches the exceeded flag on the first refusal.
    pub fn allows(&self, stage: Stage) -> bool {
        if self.exceeded.load(Ordering::Relaxed) {
            debug!(stage = %stage, "stage skipped, budget already exceeded");
            return false;
        }

        let elapsed = self.started.elapsed();
        if elapsed >= self.budget {
            self.exceeded.store(true, Ordering::Relaxed);
            debug!(
                stage = %stage,
                elapsed_ms = millis(elapsed),
                budget_ms = millis(self.budget),
                "stage skipped, budget exceeded"
            );
            return false;
        }

        true
    }

    /// Time since the probe started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// [`Self::elapsed`] in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        millis(self.elapsed())
    }

    /// Time left before the budget is spent.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }

    /// A stage was refused, or the probe ran past its budget.
    #[must_use]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded.load(Ordering::Relaxed) || self.elapsed() > self.budget
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_budget_allows() {
        let budget = TimeBudget::start(Duration::from_secs(60));
        assert!(budget.allows(Stage::Sitemap));
        assert!(budget.allows(Stage::Target));
        assert!(!budget.is_exceeded());
        assert!(budget.remaining() > Duration::from_secs(59));
    }

    #[test]
    fn test_zero_budget_refuses_and_latches() {
        let budget = TimeBudget::start(Duration::ZERO);
        assert!(!budget.allows(Stage::Robots));
        assert!(budget.is_exceeded());
        assert!(!budget.allows(Stage::Secondary));
        assert_eq!(budget.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_budget_expires_with_time() {
        let budget = TimeBudget::start(Duration::from_millis(20));
        assert!(budget.allows(Stage::Sitemap));
        std::thread::sleep(Duration::from_millis(40));
        assert!(budget.is_exceeded());
        assert!(!budget.allows(Stage::Target));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Target.to_string(), "target");
        assert_eq!(Stage::Secondary.as_str(), "secondary");
    }
}
