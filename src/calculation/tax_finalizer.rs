//! Rebate, surcharge, cess and statutory rounding.
//!
//! Turns base slab tax into the final tax payable on salary and other-source
//! income:
//!
//! 1. Rebate (section 87A) up to a ceiling for income at or below the
//!    threshold, with marginal relief just above it.
//! 2. Surcharge by income band, with marginal relief at every band boundary.
//! 3. Cess on tax plus surcharge.
//! 4. Rounding of the total to the configured multiple (section 288B).
//!
//! Marginal relief guarantees that crossing a threshold by one rupee never
//! raises tax by more than one rupee (before cess and rounding).

use rust_decimal::Decimal;

use crate::config::{RebateRule, RegimeRules, RuleSet, Slab, SurchargeBand, round_currency};
use crate::models::{AuditStep, TaxBreakdown};

use super::slab_tax::compute_slab_tax;

/// Final tax breakdown plus the audit steps that produced it.
#[derive(Debug, Clone)]
pub struct FinalizedTax {
    /// The itemized tax.
    pub breakdown: TaxBreakdown,
    /// Rebate, surcharge and cess steps, in order.
    pub audit_steps: Vec<AuditStep>,
}

/// Computes the rebate for a base tax.
///
/// At or below the threshold the rebate is the lesser of the base tax and
/// the ceiling. Above the threshold, tax is limited to the income in excess
/// of the threshold, and the difference is granted as relief (still capped
/// at the ceiling).
///
/// # Examples
///
/// ```
/// use salary_tax_engine::calculation::compute_rebate;
/// use salary_tax_engine::config::RebateRule;
/// use rust_decimal::Decimal;
///
/// let rule = RebateRule { threshold: Decimal::from(700_000), max_rebate: Decimal::from(25_000) };
///
/// // Fully rebated at the threshold
/// assert_eq!(compute_rebate(Decimal::from(25_000), Decimal::from(700_000), Some(&rule)), Decimal::from(25_000));
///
/// // ₹10 over the threshold leaves ₹10 payable
/// assert_eq!(compute_rebate(Decimal::from(25_001), Decimal::from(700_010), Some(&rule)), Decimal::from(24_991));
/// ```
pub fn compute_rebate(base_tax: Decimal, rebate_income: Decimal, rule: Option<&RebateRule>) -> Decimal {
    let Some(rule) = rule else {
        return Decimal::ZERO;
    };
    if base_tax <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    if rebate_income <= rule.threshold {
        return base_tax.min(rule.max_rebate);
    }

    let excess = rebate_income - rule.threshold;
    if base_tax > excess {
        (base_tax - excess).min(rule.max_rebate)
    } else {
        Decimal::ZERO
    }
}

/// Returns the surcharge band in force for a total income, if any.
///
/// A band applies when income strictly exceeds its threshold; the band with
/// the highest such threshold wins.
pub fn surcharge_band(total_income: Decimal, bands: &[SurchargeBand]) -> Option<&SurchargeBand> {
    bands
        .iter()
        .filter(|band| total_income > band.threshold)
        .max_by(|a, b| a.threshold.cmp(&b.threshold))
}

/// Computes surcharge on net tax with marginal relief.
///
/// Relief caps the surcharge so that tax plus surcharge exceeds the tax plus
/// surcharge payable exactly at the band threshold by no more than the
/// income above that threshold.
///
/// # Arguments
///
/// * `net_tax` - Base tax less rebate
/// * `taxable_income` - Slab-taxed income
/// * `total_income` - Income used for band selection
/// * `rules` - The regime rules (slabs are taken from `slabs`)
/// * `slabs` - The slab table in force for the taxpayer
/// * `rebate_income_extra` - Income added to taxable income for rebate eligibility
pub fn compute_surcharge(
    net_tax: Decimal,
    taxable_income: Decimal,
    total_income: Decimal,
    rules: &RegimeRules,
    slabs: &[Slab],
    rebate_income_extra: Decimal,
) -> Decimal {
    let Some(band) = surcharge_band(total_income, &rules.surcharge) else {
        return Decimal::ZERO;
    };
    if net_tax <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let excess = total_income - band.threshold;
    let previous_rate = surcharge_band(band.threshold, &rules.surcharge)
        .map(|previous| previous.rate)
        .unwrap_or(Decimal::ZERO);

    let reference_taxable = (taxable_income - excess).max(Decimal::ZERO);
    let reference_base = compute_slab_tax(reference_taxable, slabs);
    let reference_net = reference_base
        - compute_rebate(
            reference_base,
            reference_taxable + rebate_income_extra,
            rules.rebate.as_ref(),
        );

    let full = net_tax * band.rate;
    let ceiling = reference_net * (Decimal::ONE + previous_rate) + excess;
    let relieved = ceiling - net_tax;

    round_currency(full.min(relieved).max(Decimal::ZERO))
}

/// Applies rebate, surcharge, cess and rounding to base slab tax.
///
/// # Arguments
///
/// * `base_tax` - Tax from the slab table
/// * `taxable_income` - Rounded taxable income
/// * `total_income` - Taxable income plus capital gains
/// * `rule_set` - The fiscal year's rule set
/// * `rules` - The rules of the regime being computed
/// * `slabs` - The slab table in force for the taxpayer
/// * `step_number_start` - The first step number for the audit trail
pub fn finalize_tax(
    base_tax: Decimal,
    taxable_income: Decimal,
    total_income: Decimal,
    rule_set: &RuleSet,
    rules: &RegimeRules,
    slabs: &[Slab],
    step_number_start: u32,
) -> FinalizedTax {
    let mut step_number = step_number_start;
    let mut audit_steps = Vec::with_capacity(3);

    let rebate_income_extra = if rule_set.rebate_includes_capital_gains {
        (total_income - taxable_income).max(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };
    let rebate_income = taxable_income + rebate_income_extra;

    let rebate = round_currency(compute_rebate(base_tax, rebate_income, rules.rebate.as_ref()))
        .min(base_tax);
    let net_tax = base_tax - rebate;

    audit_steps.push(AuditStep {
        step_number,
        rule_id: "rebate".to_string(),
        rule_name: "Rebate".to_string(),
        section_ref: "87A".to_string(),
        input: serde_json::json!({
            "base_tax": base_tax.normalize().to_string(),
            "rebate_income": rebate_income.normalize().to_string(),
            "threshold": rules.rebate.as_ref().map(|r| r.threshold.normalize().to_string()),
            "max_rebate": rules.rebate.as_ref().map(|r| r.max_rebate.normalize().to_string())
        }),
        output: serde_json::json!({
            "rebate": rebate.normalize().to_string(),
            "net_tax": net_tax.normalize().to_string()
        }),
        reasoning: match rules.rebate.as_ref() {
            None => "No rebate under this regime".to_string(),
            Some(rule) if rebate_income <= rule.threshold => format!(
                "Income ₹{} within rebate threshold ₹{}; rebate ₹{}",
                rebate_income.normalize(),
                rule.threshold.normalize(),
                rebate.normalize()
            ),
            Some(rule) if rebate > Decimal::ZERO => format!(
                "Marginal relief: tax limited to income above ₹{}; relief ₹{}",
                rule.threshold.normalize(),
                rebate.normalize()
            ),
            Some(rule) => format!(
                "Income ₹{} exceeds rebate threshold ₹{}",
                rebate_income.normalize(),
                rule.threshold.normalize()
            ),
        },
    });
    step_number += 1;

    let band = surcharge_band(total_income, &rules.surcharge);
    let surcharge = compute_surcharge(
        net_tax,
        taxable_income,
        total_income,
        rules,
        slabs,
        rebate_income_extra,
    );

    audit_steps.push(AuditStep {
        step_number,
        rule_id: "surcharge".to_string(),
        rule_name: "Surcharge".to_string(),
        section_ref: "Part I, First Schedule (surcharge)".to_string(),
        input: serde_json::json!({
            "net_tax": net_tax.normalize().to_string(),
            "total_income": total_income.normalize().to_string(),
            "band_threshold": band.map(|b| b.threshold.normalize().to_string()),
            "band_rate": band.map(|b| b.rate.normalize().to_string())
        }),
        output: serde_json::json!({
            "surcharge": surcharge.normalize().to_string()
        }),
        reasoning: match band {
            None => "Income below every surcharge threshold".to_string(),
            Some(b) if surcharge < round_currency(net_tax * b.rate) => format!(
                "Surcharge at {} above ₹{} reduced by marginal relief to ₹{}",
                b.rate.normalize(),
                b.threshold.normalize(),
                surcharge.normalize()
            ),
            Some(b) => format!(
                "Surcharge at {} on income above ₹{} = ₹{}",
                b.rate.normalize(),
                b.threshold.normalize(),
                surcharge.normalize()
            ),
        },
    });
    step_number += 1;

    let cess_rate = rule_set.cess_rate_for(rules);
    let cess = rule_set.rounding.round_cess((net_tax + surcharge) * cess_rate);
    let raw_total = net_tax + surcharge + cess;
    let total = rule_set.rounding.round_tax(raw_total);
    let rounding_adjustment = total - raw_total;

    audit_steps.push(AuditStep {
        step_number,
        rule_id: "cess".to_string(),
        rule_name: "Health and Education Cess".to_string(),
        section_ref: "288B".to_string(),
        input: serde_json::json!({
            "tax_and_surcharge": (net_tax + surcharge).normalize().to_string(),
            "cess_rate": cess_rate.normalize().to_string(),
            "cess_multiple": rule_set.rounding.cess_multiple.normalize().to_string(),
            "tax_multiple": rule_set.rounding.tax_multiple.normalize().to_string()
        }),
        output: serde_json::json!({
            "cess": cess.normalize().to_string(),
            "rounding_adjustment": rounding_adjustment.normalize().to_string(),
            "total": total.normalize().to_string()
        }),
        reasoning: format!(
            "Cess {} on ₹{} = ₹{}; total ₹{} rounded to ₹{}",
            cess_rate.normalize(),
            (net_tax + surcharge).normalize(),
            cess.normalize(),
            raw_total.normalize(),
            total.normalize()
        ),
    });

    FinalizedTax {
        breakdown: TaxBreakdown {
            base_tax,
            rebate,
            surcharge,
            cess,
            rounding_adjustment,
            total,
        },
        audit_steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_rule_set_file;
    use crate::models::RegimeId;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rule_set(fy: &str) -> RuleSet {
        load_rule_set_file(format!("./config/rules/{}.yaml", fy)).unwrap()
    }

    fn finalize(rule_set: &RuleSet, regime: RegimeId, taxable: &str) -> TaxBreakdown {
        let rules = rule_set.regime(regime).unwrap();
        let slabs = rules.slabs_for_age(30);
        let taxable = dec(taxable);
        let base = compute_slab_tax(taxable, slabs);
        finalize_tax(base, taxable, taxable, rule_set, rules, slabs, 1).breakdown
    }

    fn tax_before_cess(rule_set: &RuleSet, regime: RegimeId, taxable: Decimal) -> Decimal {
        let rules = rule_set.regime(regime).unwrap();
        let slabs = rules.slabs_for_age(30);
        let base = compute_slab_tax(taxable, slabs);
        let rebate = compute_rebate(base, taxable, rules.rebate.as_ref());
        let net = base - rebate;
        net + compute_surcharge(net, taxable, taxable, rules, slabs, Decimal::ZERO)
    }

    /// TF-001: full rebate at the threshold
    #[test]
    fn test_rebate_zeroes_tax_at_threshold() {
        let rule_set = rule_set("2023-24");
        let tax = finalize(&rule_set, RegimeId::New, "700000");

        assert_eq!(tax.base_tax, dec("25000"));
        assert_eq!(tax.rebate, dec("25000"));
        assert_eq!(tax.total, Decimal::ZERO);
    }

    /// TF-002: no cliff just above the rebate threshold
    #[test]
    fn test_rebate_marginal_relief_above_threshold() {
        let rule_set = rule_set("2023-24");
        let at = tax_before_cess(&rule_set, RegimeId::New, dec("700000"));
        let above = tax_before_cess(&rule_set, RegimeId::New, dec("700100"));

        assert_eq!(at, Decimal::ZERO);
        assert_eq!(above, dec("100"));
    }

    /// TF-003: relief fades out once slab tax on the excess is smaller
    #[test]
    fn test_rebate_relief_ends() {
        let rule = RebateRule {
            threshold: dec("700000"),
            max_rebate: dec("25000"),
        };
        // a base of 37,000 is below the 80,000 excess
        assert_eq!(compute_rebate(dec("37000"), dec("780000"), Some(&rule)), Decimal::ZERO);
    }

    /// TF-004: FY 2025-26 new regime rebates tax up to ₹12 lakh
    #[test]
    fn test_fy2025_rebate_at_twelve_lakh() {
        let rule_set = rule_set("2025-26");
        let tax = finalize(&rule_set, RegimeId::New, "1200000");

        assert_eq!(tax.base_tax, dec("60000"));
        assert_eq!(tax.total, Decimal::ZERO);
    }

    /// TF-005: surcharge applies strictly above the band threshold
    #[test]
    fn test_no_surcharge_at_threshold() {
        let rule_set = rule_set("2023-24");
        let tax = finalize(&rule_set, RegimeId::Old, "5000000");
        assert_eq!(tax.surcharge, Decimal::ZERO);
    }

    /// TF-006: surcharge marginal relief at ₹50 lakh
    #[test]
    fn test_surcharge_marginal_relief_at_first_band() {
        let rule_set = rule_set("2023-24");
        let at = tax_before_cess(&rule_set, RegimeId::Old, dec("5000000"));
        let above = tax_before_cess(&rule_set, RegimeId::Old, dec("5000010"));

        // base at 50L = 112,500 + 30% of 40L = 1,312,500
        assert_eq!(at, dec("1312500"));
        assert!(above - at <= dec("10"));
    }

    /// TF-007: well above the threshold the full surcharge applies
    #[test]
    fn test_full_surcharge_far_above_threshold() {
        let rule_set = rule_set("2023-24");
        let tax = finalize(&rule_set, RegimeId::Old, "6000000");

        // base = 112,500 + 30% of 50L = 1,612,500; 10% surcharge
        assert_eq!(tax.base_tax, dec("1612500"));
        assert_eq!(tax.surcharge, dec("161250"));
    }

    /// TF-008: marginal relief between higher bands uses the lower band's rate
    #[test]
    fn test_surcharge_relief_between_bands() {
        let rule_set = rule_set("2023-24");
        let at = tax_before_cess(&rule_set, RegimeId::Old, dec("10000000"));
        let above = tax_before_cess(&rule_set, RegimeId::Old, dec("10000010"));

        assert!(above >= at);
        assert!(above - at <= dec("10"));
    }

    #[test]
    fn test_cess_and_rounding() {
        let rule_set = rule_set("2023-24");
        let tax = finalize(&rule_set, RegimeId::Old, "897600");

        assert_eq!(tax.base_tax, dec("92020"));
        assert_eq!(tax.cess, dec("3681"));
        assert_eq!(tax.rounding_adjustment, dec("-1"));
        assert_eq!(tax.total, dec("95700"));
        assert_eq!(
            tax.total,
            tax.base_tax - tax.rebate + tax.surcharge + tax.cess + tax.rounding_adjustment
        );
    }

    #[test]
    fn test_cess_follows_rounding_policy() {
        let mut rule_set = rule_set("2023-24");
        rule_set.rounding.cess_multiple = dec("10");
        let tax = finalize(&rule_set, RegimeId::Old, "897600");

        // 4% of 92,020 = 3,680.80, rounded to the nearest ₹10
        assert_eq!(tax.cess, dec("3680"));
        assert_eq!(tax.total, dec("95700"));
        assert_eq!(tax.rounding_adjustment, Decimal::ZERO);
    }

    #[test]
    fn test_no_rebate_rule_means_no_rebate() {
        assert_eq!(compute_rebate(dec("5000"), dec("100"), None), Decimal::ZERO);
    }

    #[test]
    fn test_surcharge_band_selection() {
        let rule_set = rule_set("2023-24");
        let bands = &rule_set.regime(RegimeId::Old).unwrap().surcharge;

        assert!(surcharge_band(dec("5000000"), bands).is_none());
        assert_eq!(surcharge_band(dec("5000001"), bands).unwrap().rate, dec("0.10"));
        assert_eq!(surcharge_band(dec("60000000"), bands).unwrap().rate, dec("0.37"));
    }

    #[test]
    fn test_audit_steps_cover_rebate_surcharge_cess() {
        let rule_set = rule_set("2023-24");
        let rules = rule_set.regime(RegimeId::New).unwrap();
        let slabs = rules.slabs_for_age(30);
        let result = finalize_tax(dec("25000"), dec("700000"), dec("700000"), &rule_set, rules, slabs, 10);

        let ids: Vec<&str> = result.audit_steps.iter().map(|s| s.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["rebate", "surcharge", "cess"]);
        assert_eq!(result.audit_steps[0].step_number, 10);
        assert_eq!(result.audit_steps[2].step_number, 12);
    }
}
