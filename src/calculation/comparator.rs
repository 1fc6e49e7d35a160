//! Regime comparison.
//!
//! Runs the full pipeline (exemptions, deductions, slab tax, rebate,
//! surcharge and cess, capital gains, take-home) once per requested regime
//! against a resolved rule set. Regimes share nothing but the borrowed
//! profile and rule set, so each result is independent of which other
//! regimes were requested.

use std::collections::BTreeMap;
use std::time::Instant;

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::RuleSet;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, CompensationProfile, RegimeId, RegimeResult};

use super::capital_gains::calculate_capital_gains_tax;
use super::deductions::apply_chapter_deductions;
use super::gross_income::resolve_gross_income;
use super::slab_tax::calculate_slab_tax;
use super::take_home::calculate_take_home;
use super::tax_finalizer::finalize_tax;

/// Computes one regime for a profile.
///
/// The profile is assumed valid; [`compare_regimes`] validates before calling
/// this.
///
/// # Errors
///
/// Returns [`EngineError::UnsupportedRegime`] if the rule set does not define
/// the regime.
pub fn calculate_regime(
    profile: &CompensationProfile,
    rule_set: &RuleSet,
    regime: RegimeId,
) -> EngineResult<RegimeResult> {
    let start = Instant::now();
    let rules = rule_set
        .regime(regime)
        .ok_or_else(|| EngineError::UnsupportedRegime {
            regime,
            fiscal_year: rule_set.fiscal_year.to_string(),
        })?;

    let mut audit_trace: Vec<AuditStep> = Vec::new();
    let mut step_number = 1u32;

    let gross = resolve_gross_income(profile, rule_set, rules, step_number);
    step_number += gross.audit_steps.len() as u32;
    audit_trace.extend(gross.audit_steps);

    let deductions = apply_chapter_deductions(profile, rule_set, rules, step_number);
    step_number += 1;
    audit_trace.push(deductions.audit_step);

    let net_salary = (gross.gross_salary - gross.exemptions.total()).max(Decimal::ZERO);
    let unrounded = (net_salary + profile.other_income - deductions.total).max(Decimal::ZERO);
    let taxable_income = rule_set.rounding.round_income(unrounded);
    let total_income = taxable_income + profile.capital_gains();

    audit_trace.push(AuditStep {
        step_number,
        rule_id: "taxable_income".to_string(),
        rule_name: "Taxable Income".to_string(),
        section_ref: "288A".to_string(),
        input: serde_json::json!({
            "gross_salary": gross.gross_salary.normalize().to_string(),
            "exemptions": gross.exemptions.total().normalize().to_string(),
            "other_income": profile.other_income.normalize().to_string(),
            "deductions": deductions.total.normalize().to_string(),
            "capital_gains": profile.capital_gains().normalize().to_string()
        }),
        output: serde_json::json!({
            "taxable_income": taxable_income.normalize().to_string(),
            "total_income": total_income.normalize().to_string()
        }),
        reasoning: format!(
            "₹{} salary after exemptions + ₹{} other income - ₹{} deductions = ₹{}, rounded to ₹{}",
            net_salary.normalize(),
            profile.other_income.normalize(),
            deductions.total.normalize(),
            unrounded.normalize(),
            taxable_income.normalize()
        ),
    });
    step_number += 1;

    let slabs = rules.slabs_for_age(profile.age);
    let slab_tax = calculate_slab_tax(taxable_income, slabs, step_number);
    step_number += 1;
    audit_trace.push(slab_tax.audit_step);

    let finalized = finalize_tax(
        slab_tax.base_tax,
        taxable_income,
        total_income,
        rule_set,
        rules,
        slabs,
        step_number,
    );
    step_number += finalized.audit_steps.len() as u32;
    audit_trace.extend(finalized.audit_steps);

    let capital_gains = calculate_capital_gains_tax(
        profile.short_term_gains,
        profile.long_term_gains,
        rule_set,
        rules,
        step_number,
    );
    step_number += 1;
    audit_trace.push(capital_gains.audit_step);

    let total_annual_tax = finalized.breakdown.total + capital_gains.tax;
    let take_home = calculate_take_home(
        profile,
        rule_set,
        gross.gross_salary,
        total_annual_tax,
        step_number,
    );
    audit_trace.push(take_home.audit_step);

    debug!(
        regime = %regime,
        fiscal_year = %rule_set.fiscal_year,
        taxable_income = %taxable_income,
        total_tax = %total_annual_tax,
        duration_us = start.elapsed().as_micros(),
        "Regime computed"
    );

    Ok(RegimeResult {
        regime,
        gross_salary: gross.gross_salary,
        exemptions: gross.exemptions,
        total_deductions: deductions.total,
        deductions: deductions.deductions,
        total_income,
        taxable_income,
        tax: finalized.breakdown,
        capital_gains_tax: capital_gains.tax,
        employee_statutory_deductions: take_home.statutory_deductions,
        annual_take_home: take_home.take_home.annual,
        monthly_take_home: take_home.take_home.monthly,
        audit_trace,
    })
}

/// Computes every requested regime for a profile against a resolved rule set.
///
/// An empty `regimes` slice means every regime the rule set defines.
/// Duplicates are ignored.
///
/// # Errors
///
/// * [`EngineError::InvalidProfile`] if the profile fails validation
/// * [`EngineError::UnsupportedRegime`] if any requested regime is missing
///   from the rule set; no regime is computed in that case
///
/// # Examples
///
/// ```
/// use salary_tax_engine::calculation::compare_regimes;
/// use salary_tax_engine::config::load_rule_set_file;
/// use salary_tax_engine::models::{CompensationProfile, RegimeId};
/// use rust_decimal::Decimal;
///
/// let rule_set = load_rule_set_file("config/rules/2025-26.yaml").unwrap();
/// let profile = CompensationProfile::new(Decimal::from(1_000_000), 30);
///
/// let results = compare_regimes(&profile, &rule_set, &[]).unwrap();
/// assert_eq!(results.len(), 2);
/// assert_eq!(results[&RegimeId::New].tax.total, Decimal::ZERO);
/// ```
pub fn compare_regimes(
    profile: &CompensationProfile,
    rule_set: &RuleSet,
    regimes: &[RegimeId],
) -> EngineResult<BTreeMap<RegimeId, RegimeResult>> {
    profile.validate()?;

    let requested: Vec<RegimeId> = if regimes.is_empty() {
        rule_set.supported_regimes()
    } else {
        let mut requested = regimes.to_vec();
        requested.sort();
        requested.dedup();
        requested
    };

    if let Some(missing) = requested.iter().find(|r| rule_set.regime(**r).is_none()) {
        return Err(EngineError::UnsupportedRegime {
            regime: *missing,
            fiscal_year: rule_set.fiscal_year.to_string(),
        });
    }

    requested
        .into_iter()
        .map(|regime| calculate_regime(profile, rule_set, regime).map(|result| (regime, result)))
        .collect()
}
