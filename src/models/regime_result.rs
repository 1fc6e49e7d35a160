//! Regime result models for the salary tax engine.
//!
//! This module contains the [`RegimeResult`] type and its associated structures
//! that capture every output of one regime's computation, including the
//! itemized tax, take-home figures, and the audit trace.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{DeductionCode, RegimeId};

/// Pre-tax exemptions and salary deductions resolved for a regime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exemptions {
    /// House-rent allowance exemption.
    pub hra: Decimal,
    /// Leave-travel allowance exemption.
    pub lta: Decimal,
    /// Standard deduction from salary.
    pub standard_deduction: Decimal,
    /// Professional tax deducted from salary income.
    pub professional_tax: Decimal,
}

impl Exemptions {
    /// Returns the sum of all exemptions.
    pub fn total(&self) -> Decimal {
        self.hra + self.lta + self.standard_deduction + self.professional_tax
    }
}

/// A single deduction section applied against taxable income.
///
/// # Example
///
/// ```
/// use salary_tax_engine::models::{AppliedDeduction, DeductionCode};
/// use rust_decimal::Decimal;
///
/// let deduction = AppliedDeduction {
///     code: DeductionCode::Section80C,
///     declared: Decimal::from(200_000),
///     cap: Decimal::from(150_000),
///     applied: Decimal::from(150_000),
/// };
/// assert_eq!(deduction.applied, deduction.cap);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDeduction {
    /// The deduction section.
    pub code: DeductionCode,
    /// The amount declared on the profile.
    pub declared: Decimal,
    /// The ceiling for this section under the regime.
    pub cap: Decimal,
    /// The amount actually deducted.
    pub applied: Decimal,
}

/// Itemized tax on salary and other-source income.
///
/// `total` always equals `base_tax - rebate + surcharge + cess + rounding_adjustment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    /// Tax from the progressive slab table.
    pub base_tax: Decimal,
    /// Rebate, including marginal relief above the rebate threshold.
    pub rebate: Decimal,
    /// Surcharge after marginal relief.
    pub surcharge: Decimal,
    /// Health and education cess.
    pub cess: Decimal,
    /// Difference introduced by rounding the total to the statutory multiple.
    pub rounding_adjustment: Decimal,
    /// Total tax payable on salary and other-source income.
    pub total: Decimal,
}

/// The result of computing one regime for a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeResult {
    /// The regime this result was computed under.
    pub regime: RegimeId,
    /// Gross salary (employee-visible components only).
    pub gross_salary: Decimal,
    /// Exemptions resolved before tax.
    pub exemptions: Exemptions,
    /// Chapter deductions applied, one entry per declared section.
    pub deductions: Vec<AppliedDeduction>,
    /// Total of applied chapter deductions.
    pub total_deductions: Decimal,
    /// Taxable income plus capital gains, used for surcharge bands.
    pub total_income: Decimal,
    /// Taxable income after exemptions and deductions, rounded.
    pub taxable_income: Decimal,
    /// Itemized tax on taxable income.
    pub tax: TaxBreakdown,
    /// Tax on capital gains, computed separately from the slabs.
    pub capital_gains_tax: Decimal,
    /// Employee-side statutory deductions withheld from pay.
    pub employee_statutory_deductions: Decimal,
    /// Annual take-home pay.
    pub annual_take_home: Decimal,
    /// Monthly take-home pay.
    pub monthly_take_home: Decimal,
    /// Record of every rule applied.
    pub audit_trace: Vec<AuditStep>,
}

impl RegimeResult {
    /// Returns total annual tax including capital-gains tax.
    pub fn total_annual_tax(&self) -> Decimal {
        self.tax.total + self.capital_gains_tax
    }
}

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// Reference to the statutory section for this rule.
    pub section_ref: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// Which regime pays more and by how much.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    /// The regime with the highest annual take-home.
    pub recommended_regime: RegimeId,
    /// Annual take-home advantage over the next-best regime (zero when only
    /// one regime was compared).
    pub annual_savings: Decimal,
}

impl ComparisonSummary {
    /// Picks the regime with the highest annual take-home; ties go to the
    /// regime with lower total tax, then to the earlier regime.
    ///
    /// Returns `None` for an empty result map.
    pub fn from_results(results: &BTreeMap<RegimeId, RegimeResult>) -> Option<Self> {
        let mut ranked: Vec<&RegimeResult> = results.values().collect();
        ranked.sort_by(|a, b| {
            b.annual_take_home
                .cmp(&a.annual_take_home)
                .then_with(|| a.total_annual_tax().cmp(&b.total_annual_tax()))
                .then_with(|| a.regime.cmp(&b.regime))
        });

        let best = ranked.first()?;
        let annual_savings = ranked
            .get(1)
            .map(|runner_up| best.annual_take_home - runner_up.annual_take_home)
            .unwrap_or(Decimal::ZERO);

        Some(Self {
            recommended_regime: best.regime,
            annual_savings,
        })
    }
}
