//! Rule-set types for tax computation.
//!
//! This module contains the strongly-typed rule structures that are
//! deserialized from the per-fiscal-year YAML rule files, together with the
//! structural validation applied before a rule set is cached.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{DeductionCode, FiscalYear, RegimeId};

/// A contiguous income band taxed at a single marginal rate.
///
/// The band covers `[lower, upper)`; an absent upper bound is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slab {
    /// Inclusive lower bound of the band.
    pub lower: Decimal,
    /// Exclusive upper bound, or `None` for the top band.
    #[serde(default)]
    pub upper: Option<Decimal>,
    /// Marginal rate as a fraction (0.05 = 5%).
    pub rate: Decimal,
}

/// Slab overrides for taxpayers at or above an age.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeSlabs {
    /// Minimum age (inclusive) for these slabs to apply.
    pub min_age: u8,
    /// The slab table for this age band.
    pub slabs: Vec<Slab>,
}

/// Small-income rebate (section 87A).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebateRule {
    /// Income at or below which the rebate applies.
    pub threshold: Decimal,
    /// The largest rebate allowed.
    pub max_rebate: Decimal,
}

/// An income tier above which a surcharge rate applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeBand {
    /// Income above this threshold attracts the band's rate.
    pub threshold: Decimal,
    /// Surcharge rate as a fraction of tax.
    pub rate: Decimal,
}

/// Capital gains rates and exemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalGainsRule {
    /// Rate on short-term gains.
    pub short_term_rate: Decimal,
    /// Rate on long-term gains above the exemption.
    pub long_term_rate: Decimal,
    /// Long-term gains up to this amount are untaxed.
    pub long_term_exemption: Decimal,
    /// Whether cess is levied on capital-gains tax.
    #[serde(default = "default_true")]
    pub levy_cess: bool,
}

/// A Chapter VI-A deduction ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionRule {
    /// Maximum deductible amount.
    pub cap: Decimal,
    /// Allowed even under regimes that are not deduction-eligible.
    #[serde(default)]
    pub regime_neutral: bool,
}

/// House-rent allowance exemption parameters (section 10(13A)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HraRule {
    /// Share of basic exempt for metro residents.
    pub metro_factor: Decimal,
    /// Share of basic exempt for everyone else.
    pub non_metro_factor: Decimal,
    /// Share of basic subtracted from rent paid.
    pub rent_offset_factor: Decimal,
}

/// Statutory rounding of income, cess and tax (sections 288A and 288B).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingPolicy {
    /// Taxable income is rounded to the nearest multiple of this amount.
    #[serde(default = "default_multiple")]
    pub taxable_income_multiple: Decimal,
    /// Cess is rounded to the nearest multiple of this amount.
    #[serde(default = "default_multiple")]
    pub cess_multiple: Decimal,
    /// Total tax is rounded to the nearest multiple of this amount.
    #[serde(default = "default_multiple")]
    pub tax_multiple: Decimal,
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        Self {
            taxable_income_multiple: Decimal::ONE,
            cess_multiple: Decimal::ONE,
            tax_multiple: Decimal::ONE,
        }
    }
}

impl RoundingPolicy {
    /// Rounds taxable income to the configured multiple.
    pub fn round_income(&self, value: Decimal) -> Decimal {
        round_to_multiple(value, self.taxable_income_multiple)
    }

    /// Rounds cess to the configured multiple.
    pub fn round_cess(&self, value: Decimal) -> Decimal {
        round_to_multiple(value, self.cess_multiple)
    }

    /// Rounds a tax total to the configured multiple.
    pub fn round_tax(&self, value: Decimal) -> Decimal {
        round_to_multiple(value, self.tax_multiple)
    }
}

/// Rounds to the nearest whole currency unit, halves away from zero.
///
/// # Examples
///
/// ```
/// use salary_tax_engine::config::round_currency;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_currency(Decimal::from_str("3680.50").unwrap()), Decimal::from(3681));
/// ```
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to the nearest multiple, halves away from zero. A non-positive
/// multiple leaves the value untouched.
pub fn round_to_multiple(value: Decimal, multiple: Decimal) -> Decimal {
    if multiple <= Decimal::ZERO {
        return value;
    }
    round_currency(value / multiple) * multiple
}

/// Rules for one regime within a fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeRules {
    /// Default slab table.
    pub slabs: Vec<Slab>,
    /// Age-specific slab tables (senior citizens).
    #[serde(default)]
    pub age_slabs: Vec<AgeSlabs>,
    /// Whether HRA and LTA exemptions apply.
    #[serde(default)]
    pub allows_exemptions: bool,
    /// Whether Chapter VI-A deductions apply.
    #[serde(default)]
    pub deduction_eligible: bool,
    /// Whether professional tax reduces salary income.
    #[serde(default)]
    pub professional_tax_deductible: bool,
    /// Regime-specific standard deduction, overriding the rule-set amount.
    #[serde(default)]
    pub standard_deduction: Option<Decimal>,
    /// Small-income rebate.
    #[serde(default)]
    pub rebate: Option<RebateRule>,
    /// Surcharge bands ordered by threshold.
    #[serde(default)]
    pub surcharge: Vec<SurchargeBand>,
    /// Regime-specific cess rate.
    #[serde(default)]
    pub cess_rate: Option<Decimal>,
    /// Regime-specific deduction ceilings.
    #[serde(default)]
    pub deduction_caps: BTreeMap<DeductionCode, Decimal>,
    /// Regime-specific capital gains rule.
    #[serde(default)]
    pub capital_gains: Option<CapitalGainsRule>,
}

impl RegimeRules {
    /// Returns the slab table for a taxpayer's age: the age band with the
    /// highest `min_age` not above `age`, or the default table.
    pub fn slabs_for_age(&self, age: u8) -> &[Slab] {
        self.age_slabs
            .iter()
            .filter(|band| band.min_age <= age)
            .max_by_key(|band| band.min_age)
            .map(|band| band.slabs.as_slice())
            .unwrap_or(&self.slabs)
    }
}

/// Per-regime rules. Absent regimes are unsupported for the fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeTable {
    /// The exemption-permitting regime.
    #[serde(default)]
    pub old: Option<RegimeRules>,
    /// The simplified-rate regime.
    #[serde(default)]
    pub new: Option<RegimeRules>,
}

/// The complete rule table for one fiscal year.
///
/// Rule sets are loaded once per fiscal year and shared immutably.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// The fiscal year these rules apply to.
    pub fiscal_year: FiscalYear,
    /// Free-form description of the rule set.
    #[serde(default)]
    pub description: String,
    /// Standard deduction from salary.
    pub standard_deduction: Decimal,
    /// Health and education cess rate.
    #[serde(default)]
    pub cess_rate: Option<Decimal>,
    /// HRA exemption parameters.
    pub hra: HraRule,
    /// Deduction ceilings by section.
    #[serde(default)]
    pub deductions: BTreeMap<DeductionCode, DeductionRule>,
    /// Capital gains rates.
    #[serde(default)]
    pub capital_gains: Option<CapitalGainsRule>,
    /// Rounding policy.
    #[serde(default)]
    pub rounding: RoundingPolicy,
    /// Annual professional tax by state code.
    #[serde(default)]
    pub professional_tax: BTreeMap<String, Decimal>,
    /// Whether capital gains count towards rebate eligibility.
    #[serde(default)]
    pub rebate_includes_capital_gains: bool,
    /// Per-regime rules.
    pub regimes: RegimeTable,
}

impl RuleSet {
    /// Returns the rules for a regime, or `None` if the regime is not
    /// defined for this fiscal year.
    pub fn regime(&self, regime: RegimeId) -> Option<&RegimeRules> {
        match regime {
            RegimeId::Old => self.regimes.old.as_ref(),
            RegimeId::New => self.regimes.new.as_ref(),
        }
    }

    /// Returns every regime defined in this rule set.
    pub fn supported_regimes(&self) -> Vec<RegimeId> {
        RegimeId::ALL
            .into_iter()
            .filter(|regime| self.regime(*regime).is_some())
            .collect()
    }

    /// Returns the standard deduction for a regime.
    pub fn standard_deduction_for(&self, rules: &RegimeRules) -> Decimal {
        rules.standard_deduction.unwrap_or(self.standard_deduction)
    }

    /// Returns the cess rate for a regime, zero when undefined.
    pub fn cess_rate_for(&self, rules: &RegimeRules) -> Decimal {
        rules
            .cess_rate
            .or(self.cess_rate)
            .unwrap_or(Decimal::ZERO)
    }

    /// Returns the capital gains rule for a regime, if any.
    pub fn capital_gains_for<'a>(&'a self, rules: &'a RegimeRules) -> Option<&'a CapitalGainsRule> {
        rules.capital_gains.as_ref().or(self.capital_gains.as_ref())
    }

    /// Returns the ceiling for a deduction section under a regime, or `None`
    /// when the section is not defined.
    pub fn deduction_cap(&self, code: DeductionCode, rules: &RegimeRules) -> Option<Decimal> {
        let rule = self.deductions.get(&code)?;
        Some(rules.deduction_caps.get(&code).copied().unwrap_or(rule.cap))
    }

    /// Returns the annual professional tax for a state, zero when the state
    /// levies none.
    pub fn professional_tax_for(&self, state: &str) -> Decimal {
        self.professional_tax
            .get(&state.trim().to_ascii_uppercase())
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Validates the structure of the rule set.
    ///
    /// Slab tables must be contiguous, non-overlapping, increasing, and end
    /// with an unbounded band; surcharge thresholds must strictly increase;
    /// rates must not be negative. Rule values themselves are not judged.
    pub fn validate(&self) -> EngineResult<()> {
        if self.supported_regimes().is_empty() {
            return Err(self.malformed("no regimes defined".to_string()));
        }

        for regime in self.supported_regimes() {
            let Some(rules) = self.regime(regime) else {
                continue;
            };

            validate_slabs(&rules.slabs).map_err(|message| {
                self.malformed(format!("{} regime slabs: {}", regime, message))
            })?;

            for band in &rules.age_slabs {
                validate_slabs(&band.slabs).map_err(|message| {
                    self.malformed(format!(
                        "{} regime slabs for age {}+: {}",
                        regime, band.min_age, message
                    ))
                })?;
            }

            validate_surcharge(&rules.surcharge).map_err(|message| {
                self.malformed(format!("{} regime surcharge: {}", regime, message))
            })?;
        }

        Ok(())
    }

    fn malformed(&self, message: String) -> EngineError {
        EngineError::MalformedRuleSet {
            fiscal_year: self.fiscal_year.to_string(),
            message,
        }
    }
}

fn validate_slabs(slabs: &[Slab]) -> Result<(), String> {
    let Some(last) = slabs.last() else {
        return Err("slab table is empty".to_string());
    };

    if slabs[0].lower < Decimal::ZERO {
        return Err("first slab starts below zero".to_string());
    }

    for (index, slab) in slabs.iter().enumerate() {
        let number = index + 1;
        if slab.rate < Decimal::ZERO {
            return Err(format!("slab {} has a negative rate", number));
        }
        if let Some(upper) = slab.upper {
            if upper <= slab.lower {
                return Err(format!("slab {} upper bound is not above its lower bound", number));
            }
        }
    }

    for (index, pair) in slabs.windows(2).enumerate() {
        match pair[0].upper {
            Some(upper) if upper == pair[1].lower => {}
            Some(_) => {
                return Err(format!(
                    "slab {} does not start where slab {} ends",
                    index + 2,
                    index + 1
                ));
            }
            None => return Err(format!("slab {} is unbounded but not last", index + 1)),
        }
    }

    if last.upper.is_some() {
        return Err("last slab must be unbounded".to_string());
    }

    Ok(())
}

fn validate_surcharge(bands: &[SurchargeBand]) -> Result<(), String> {
    if bands.iter().any(|band| band.rate < Decimal::ZERO) {
        return Err("negative surcharge rate".to_string());
    }
    if bands.windows(2).any(|pair| pair[1].threshold <= pair[0].threshold) {
        return Err("thresholds are not strictly increasing".to_string());
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

fn default_multiple() -> Decimal {
    Decimal::ONE
}
