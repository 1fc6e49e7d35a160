//! Capital gains tax at special rates.
//!
//! Short-term gains (section 111A) and long-term gains above the exemption
//! (section 112A) are taxed at flat rates outside the slab table. Cess is
//! levied when the rule says so; surcharge is not.

use rust_decimal::Decimal;

use crate::config::{CapitalGainsRule, RegimeRules, RoundingPolicy, RuleSet, round_currency};
use crate::models::AuditStep;

/// The result of a capital-gains calculation, including the audit step.
#[derive(Debug, Clone)]
pub struct CapitalGainsResult {
    /// Tax on capital gains, cess included.
    pub tax: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Computes capital-gains tax under a rule, cess included.
///
/// Tax is rounded to the rupee and cess per the rounding policy.
///
/// # Examples
///
/// ```
/// use salary_tax_engine::calculation::compute_capital_gains_tax;
/// use salary_tax_engine::config::{CapitalGainsRule, RoundingPolicy};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let rule = CapitalGainsRule {
///     short_term_rate: Decimal::from_str("0.20").unwrap(),
///     long_term_rate: Decimal::from_str("0.125").unwrap(),
///     long_term_exemption: Decimal::from(125_000),
///     levy_cess: false,
/// };
///
/// // 20% of 1L + 12.5% of (2L - 1.25L)
/// let tax = compute_capital_gains_tax(
///     Decimal::from(100_000),
///     Decimal::from(200_000),
///     &rule,
///     Decimal::ZERO,
///     &RoundingPolicy::default(),
/// );
/// assert_eq!(tax, Decimal::from(29_375));
/// ```
pub fn compute_capital_gains_tax(
    short_term_gains: Decimal,
    long_term_gains: Decimal,
    rule: &CapitalGainsRule,
    cess_rate: Decimal,
    rounding: &RoundingPolicy,
) -> Decimal {
    let short_term = short_term_gains.max(Decimal::ZERO) * rule.short_term_rate;
    let taxable_long_term = (long_term_gains - rule.long_term_exemption).max(Decimal::ZERO);
    let long_term = taxable_long_term * rule.long_term_rate;

    let tax = round_currency(short_term + long_term);
    let cess = if rule.levy_cess {
        rounding.round_cess(tax * cess_rate)
    } else {
        Decimal::ZERO
    };

    tax + cess
}

/// Computes capital-gains tax for a profile under a regime.
///
/// A rule set without a capital-gains rule taxes gains at zero, which the
/// audit step records.
///
/// # Arguments
///
/// * `short_term_gains` - Short-term gains for the year
/// * `long_term_gains` - Long-term gains for the year
/// * `rule_set` - The fiscal year's rule set
/// * `rules` - The rules of the regime being computed
/// * `step_number` - The step number for audit trail sequencing
pub fn calculate_capital_gains_tax(
    short_term_gains: Decimal,
    long_term_gains: Decimal,
    rule_set: &RuleSet,
    rules: &RegimeRules,
    step_number: u32,
) -> CapitalGainsResult {
    let rule = rule_set.capital_gains_for(rules);
    let cess_rate = rule_set.cess_rate_for(rules);

    let tax = match rule {
        Some(rule) => compute_capital_gains_tax(
            short_term_gains,
            long_term_gains,
            rule,
            cess_rate,
            &rule_set.rounding,
        ),
        None => Decimal::ZERO,
    };

    let reasoning = match rule {
        _ if short_term_gains.is_zero() && long_term_gains.is_zero() => {
            "No capital gains declared".to_string()
        }
        None => "No capital gains rates defined for this fiscal year".to_string(),
        Some(rule) => format!(
            "STCG ₹{} at {}; LTCG ₹{} less exemption ₹{} at {}; {} = ₹{}",
            short_term_gains.normalize(),
            rule.short_term_rate.normalize(),
            long_term_gains.normalize(),
            rule.long_term_exemption.normalize(),
            rule.long_term_rate.normalize(),
            if rule.levy_cess { "with cess" } else { "no cess" },
            tax.normalize()
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "capital_gains_tax".to_string(),
        rule_name: "Capital Gains Tax".to_string(),
        section_ref: "111A/112A".to_string(),
        input: serde_json::json!({
            "short_term_gains": short_term_gains.normalize().to_string(),
            "long_term_gains": long_term_gains.normalize().to_string(),
            "short_term_rate": rule.map(|r| r.short_term_rate.normalize().to_string()),
            "long_term_rate": rule.map(|r| r.long_term_rate.normalize().to_string()),
            "long_term_exemption": rule.map(|r| r.long_term_exemption.normalize().to_string())
        }),
        output: serde_json::json!({
            "capital_gains_tax": tax.normalize().to_string()
        }),
        reasoning,
    };

    CapitalGainsResult { tax, audit_step }
}
