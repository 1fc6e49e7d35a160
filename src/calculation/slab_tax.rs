//! Progressive slab tax.
//!
//! Tax is the sum, over every slab, of the portion of taxable income falling
//! inside the slab multiplied by its rate. The result does not depend on the
//! order slabs are listed in.

use rust_decimal::Decimal;

use crate::config::Slab;
use crate::models::AuditStep;

/// The result of a slab tax calculation, including the audit step.
#[derive(Debug, Clone)]
pub struct SlabTaxResult {
    /// Tax before rebate, surcharge and cess.
    pub base_tax: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Returns the portion of `taxable` falling inside a slab.
fn slab_overlap(taxable: Decimal, slab: &Slab) -> Decimal {
    let top = match slab.upper {
        Some(upper) => taxable.min(upper),
        None => taxable,
    };
    (top - slab.lower).max(Decimal::ZERO)
}

/// Computes progressive tax on taxable income.
///
/// Income at or below zero yields zero tax.
///
/// # Examples
///
/// ```
/// use salary_tax_engine::calculation::compute_slab_tax;
/// use salary_tax_engine::config::Slab;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let slabs = vec![
///     Slab { lower: Decimal::ZERO, upper: Some(Decimal::from(250_000)), rate: Decimal::ZERO },
///     Slab { lower: Decimal::from(250_000), upper: Some(Decimal::from(500_000)), rate: Decimal::from_str("0.05").unwrap() },
///     Slab { lower: Decimal::from(500_000), upper: None, rate: Decimal::from_str("0.20").unwrap() },
/// ];
///
/// assert_eq!(compute_slab_tax(Decimal::from(600_000), &slabs), Decimal::from(32_500));
/// ```
pub fn compute_slab_tax(taxable: Decimal, slabs: &[Slab]) -> Decimal {
    if taxable <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    slabs
        .iter()
        .map(|slab| slab_overlap(taxable, slab) * slab.rate)
        .sum()
}

/// Computes slab tax and records the per-slab breakdown.
///
/// # Arguments
///
/// * `taxable_income` - Rounded taxable income
/// * `slabs` - The slab table in force for the taxpayer
/// * `step_number` - The step number for audit trail sequencing
pub fn calculate_slab_tax(taxable_income: Decimal, slabs: &[Slab], step_number: u32) -> SlabTaxResult {
    let base_tax = compute_slab_tax(taxable_income, slabs);

    let bands: Vec<serde_json::Value> = slabs
        .iter()
        .filter(|slab| slab_overlap(taxable_income, slab) > Decimal::ZERO)
        .map(|slab| {
            let portion = slab_overlap(taxable_income, slab);
            serde_json::json!({
                "lower": slab.lower.normalize().to_string(),
                "upper": slab.upper.map(|u| u.normalize().to_string()),
                "rate": slab.rate.normalize().to_string(),
                "portion": portion.normalize().to_string(),
                "tax": (portion * slab.rate).normalize().to_string()
            })
        })
        .collect();

    let audit_step = AuditStep {
        step_number,
        rule_id: "slab_tax".to_string(),
        rule_name: "Slab Tax".to_string(),
        section_ref: "Part I, First Schedule".to_string(),
        input: serde_json::json!({
            "taxable_income": taxable_income.normalize().to_string(),
            "slab_count": slabs.len()
        }),
        output: serde_json::json!({
            "bands": bands,
            "base_tax": base_tax.normalize().to_string()
        }),
        reasoning: format!(
            "Progressive tax on ₹{} across {} slab(s) = ₹{}",
            taxable_income.normalize(),
            bands.len(),
            base_tax.normalize()
        ),
    };

    SlabTaxResult {
        base_tax,
        audit_step,
    }
}
