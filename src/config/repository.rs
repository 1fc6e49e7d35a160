//! Read-through cache of rule sets keyed by fiscal year.
//!
//! The first request for a fiscal year loads it from a [`RuleSource`];
//! concurrent requests for the same uncached year wait on a single load and
//! all receive the same `Arc<RuleSet>`. Once cached, a rule set is never
//! replaced for the lifetime of the repository.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::FiscalYear;

use super::loader::RuleSource;
use super::types::RuleSet;

/// The default timeout for one fetch from the rule source.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(2);

/// Timeout and retry behaviour for loading a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPolicy {
    /// Upper bound on a single fetch.
    pub timeout: Duration,
    /// Total attempts for transient failures (at least one).
    pub max_attempts: u32,
    /// Delay before the first retry; doubles after each retry.
    pub initial_backoff: Duration,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOAD_TIMEOUT,
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

type Slot = Arc<OnceCell<Arc<RuleSet>>>;

/// Loads and caches rule sets per fiscal year.
///
/// # Example
///
/// ```no_run
/// use salary_tax_engine::config::{RuleSetRepository, YamlRuleSource};
/// use salary_tax_engine::models::FiscalYear;
///
/// # async fn run() -> Result<(), salary_tax_engine::error::EngineError> {
/// let repository = RuleSetRepository::new(YamlRuleSource::new("./config/rules"));
/// let fy = FiscalYear::parse("2025-26")?;
///
/// let first = repository.resolve(&fy).await?;
/// let second = repository.resolve(&fy).await?;
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RuleSetRepository<S> {
    source: S,
    policy: LoadPolicy,
    slots: RwLock<HashMap<FiscalYear, Slot>>,
}

impl<S: RuleSource> RuleSetRepository<S> {
    /// Creates a repository with the default load policy.
    pub fn new(source: S) -> Self {
        Self::with_policy(source, LoadPolicy::default())
    }

    /// Creates a repository with an explicit load policy.
    pub fn with_policy(source: S, policy: LoadPolicy) -> Self {
        Self {
            source,
            policy,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the rule source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the rule set for a fiscal year, loading it on first use.
    ///
    /// Concurrent callers for the same uncached year share one load; if that
    /// load fails (or its caller is cancelled) the next waiter takes over.
    /// Failed loads are not cached, and the last failing caller drops the
    /// empty slot so unknown years leave nothing behind.
    pub async fn resolve(&self, fiscal_year: &FiscalYear) -> EngineResult<Arc<RuleSet>> {
        let slot = self.slot(fiscal_year);
        if let Some(rule_set) = slot.get() {
            return Ok(Arc::clone(rule_set));
        }

        match slot.get_or_try_init(|| self.load(fiscal_year)).await {
            Ok(rule_set) => Ok(Arc::clone(rule_set)),
            Err(err) => {
                self.release_empty_slot(fiscal_year, &slot);
                Err(err)
            }
        }
    }

    /// Returns the fiscal years currently cached, sorted.
    pub fn cached_years(&self) -> Vec<FiscalYear> {
        let mut years: Vec<FiscalYear> = self
            .slots
            .read()
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(year, _)| year.clone())
            .collect();
        years.sort();
        years
    }

    fn slot(&self, fiscal_year: &FiscalYear) -> Slot {
        if let Some(slot) = self.slots.read().get(fiscal_year) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write();
        Arc::clone(slots.entry(fiscal_year.clone()).or_default())
    }

    /// Removes an uninitialized slot once no other caller holds it. Clones
    /// are only taken under a lock, so the count is stable under the write
    /// lock: one reference in the map, one held by the caller.
    fn release_empty_slot(&self, fiscal_year: &FiscalYear, slot: &Slot) {
        let mut slots = self.slots.write();
        let removable = slots.get(fiscal_year).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && !current.initialized() && Arc::strong_count(current) == 2
        });
        if removable {
            slots.remove(fiscal_year);
        }
    }

    async fn load(&self, fiscal_year: &FiscalYear) -> EngineResult<Arc<RuleSet>> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut backoff = self.policy.initial_backoff;
        let mut attempt = 1;

        loop {
            let started = Instant::now();
            let outcome = match tokio::time::timeout(
                self.policy.timeout,
                self.source.fetch(fiscal_year),
            )
            .await
            {
                Ok(result) => result.and_then(|rule_set| {
                    rule_set.validate()?;
                    Ok(rule_set)
                }),
                Err(_) => Err(EngineError::RuleSourceUnavailable {
                    fiscal_year: fiscal_year.to_string(),
                    message: format!("timed out after {}ms", self.policy.timeout.as_millis()),
                }),
            };

            match outcome {
                Ok(rule_set) => {
                    info!(
                        fiscal_year = %fiscal_year,
                        attempt,
                        duration_us = started.elapsed().as_micros(),
                        "Rule set loaded"
                    );
                    return Ok(Arc::new(rule_set));
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    warn!(
                        fiscal_year = %fiscal_year,
                        attempt,
                        backoff_ms = backoff.as_millis(),
                        error = %err,
                        "Rule source unavailable, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(err) => {
                    warn!(fiscal_year = %fiscal_year, attempt, error = %err, "Rule set load failed");
                    return Err(err);
                }
            }
        }
    }
}
