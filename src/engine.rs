//! The engine entry point.
//!
//! [`TaxEngine`] resolves the rule set for a fiscal year through its
//! repository and runs the regime comparison against it.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::info;

use crate::calculation::compare_regimes;
use crate::config::{RuleSetRepository, RuleSource};
use crate::error::EngineResult;
use crate::models::{CompensationProfile, FiscalYear, RegimeId, RegimeResult};

/// Computes regime comparisons against cached fiscal-year rules.
///
/// # Example
///
/// ```no_run
/// use salary_tax_engine::config::YamlRuleSource;
/// use salary_tax_engine::engine::TaxEngine;
/// use salary_tax_engine::models::{CompensationProfile, FiscalYear};
/// use rust_decimal::Decimal;
///
/// # async fn run() -> Result<(), salary_tax_engine::error::EngineError> {
/// let engine = TaxEngine::new(YamlRuleSource::new("./config/rules"));
/// let profile = CompensationProfile::new(Decimal::from(1_200_000), 30);
///
/// let results = engine.compare(&profile, &FiscalYear::parse("2024-25")?, &[]).await?;
/// for (regime, result) in &results {
///     println!("{}: {}", regime, result.monthly_take_home);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TaxEngine<S> {
    repository: RuleSetRepository<S>,
}

impl<S: RuleSource> TaxEngine<S> {
    /// Creates an engine over a rule source with the default load policy.
    pub fn new(source: S) -> Self {
        Self::with_repository(RuleSetRepository::new(source))
    }

    /// Creates an engine over an existing repository.
    pub fn with_repository(repository: RuleSetRepository<S>) -> Self {
        Self { repository }
    }

    /// Returns the rule-set repository.
    pub fn repository(&self) -> &RuleSetRepository<S> {
        &self.repository
    }

    /// Computes every requested regime for a profile in a fiscal year.
    ///
    /// The profile is validated before the rule set is resolved, so an
    /// invalid profile never triggers a rule load. An empty `regimes` slice
    /// means every regime the fiscal year defines.
    pub async fn compare(
        &self,
        profile: &CompensationProfile,
        fiscal_year: &FiscalYear,
        regimes: &[RegimeId],
    ) -> EngineResult<BTreeMap<RegimeId, RegimeResult>> {
        profile.validate()?;

        let start = Instant::now();
        let rule_set = self.repository.resolve(fiscal_year).await?;
        let results = compare_regimes(profile, &rule_set, regimes)?;

        info!(
            fiscal_year = %fiscal_year,
            regimes = results.len(),
            duration_us = start.elapsed().as_micros(),
            "Comparison completed"
        );

        Ok(results)
    }
}
