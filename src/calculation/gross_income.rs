//! Gross salary and pre-tax exemption resolution.
//!
//! This module aggregates salary components into gross salary and resolves
//! the exemptions deducted from it before tax: house-rent allowance (section
//! 10(13A)), leave-travel allowance (section 10(5)), the standard deduction
//! (section 16(ia)) and professional tax (section 16(iii)).

use rust_decimal::Decimal;

use crate::config::{HraRule, RegimeRules, RuleSet};
use crate::models::{AuditStep, CompensationProfile, Exemptions};

/// The result of resolving gross income, including audit steps.
#[derive(Debug, Clone)]
pub struct GrossIncomeResult {
    /// Gross salary from employee-visible components.
    pub gross_salary: Decimal,
    /// Exemptions resolved under the regime.
    pub exemptions: Exemptions,
    /// One audit step per component resolved.
    pub audit_steps: Vec<AuditStep>,
}

/// Computes the HRA exemption: the least of the allowance received, rent
/// paid in excess of a share of basic, and a metro-dependent share of basic.
///
/// Each candidate is clamped at zero, and no rent paid means no exemption.
///
/// # Examples
///
/// ```
/// use salary_tax_engine::calculation::hra_exemption;
/// use salary_tax_engine::config::HraRule;
/// use salary_tax_engine::models::CompensationProfile;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let rule = HraRule {
///     metro_factor: Decimal::from_str("0.50").unwrap(),
///     non_metro_factor: Decimal::from_str("0.40").unwrap(),
///     rent_offset_factor: Decimal::from_str("0.10").unwrap(),
/// };
/// let mut profile = CompensationProfile::new(Decimal::from(600_000), 30);
/// profile.house_rent_allowance = Decimal::from(300_000);
/// profile.rent_paid = Decimal::from(240_000);
///
/// // rent - 10% of basic = 180,000 is the smallest of the three limbs
/// assert_eq!(hra_exemption(&profile, &rule), Decimal::from(180_000));
/// ```
pub fn hra_exemption(profile: &CompensationProfile, rule: &HraRule) -> Decimal {
    if profile.rent_paid <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let factor = if profile.metro {
        rule.metro_factor
    } else {
        rule.non_metro_factor
    };

    let received = profile.house_rent_allowance.max(Decimal::ZERO);
    let rent_excess = (profile.rent_paid - profile.basic * rule.rent_offset_factor).max(Decimal::ZERO);
    let basic_share = (profile.basic * factor).max(Decimal::ZERO);

    received.min(rent_excess).min(basic_share)
}

/// Computes the LTA exemption: the allowance received, limited to the
/// travel cost claimed when one is declared.
pub fn lta_exemption(profile: &CompensationProfile) -> Decimal {
    let received = profile.leave_travel_allowance.max(Decimal::ZERO);
    match profile.lta_claimed {
        Some(claimed) => received.min(claimed.max(Decimal::ZERO)),
        None => received,
    }
}

/// Resolves gross salary and exemptions for one regime.
///
/// HRA and LTA exemptions apply only when the regime allows exemptions;
/// professional tax only when the regime allows it as a deduction. The
/// standard deduction never exceeds gross salary.
///
/// # Arguments
///
/// * `profile` - The compensation profile
/// * `rule_set` - The fiscal year's rule set
/// * `rules` - The rules of the regime being computed
/// * `step_number_start` - The first step number for the audit trail
pub fn resolve_gross_income(
    profile: &CompensationProfile,
    rule_set: &RuleSet,
    rules: &RegimeRules,
    step_number_start: u32,
) -> GrossIncomeResult {
    let mut step_number = step_number_start;
    let mut audit_steps = Vec::with_capacity(5);

    let gross_salary = profile.gross_salary();
    audit_steps.push(AuditStep {
        step_number,
        rule_id: "gross_salary".to_string(),
        rule_name: "Gross Salary".to_string(),
        section_ref: "17(1)".to_string(),
        input: serde_json::json!({
            "basic": profile.basic.normalize().to_string(),
            "house_rent_allowance": profile.house_rent_allowance.normalize().to_string(),
            "conveyance": profile.conveyance.normalize().to_string(),
            "special_allowance": profile.special_allowance.normalize().to_string(),
            "leave_travel_allowance": profile.leave_travel_allowance.normalize().to_string(),
            "bonus": profile.bonus.normalize().to_string(),
            "other_taxable": profile.other_taxable.normalize().to_string()
        }),
        output: serde_json::json!({
            "gross_salary": gross_salary.normalize().to_string()
        }),
        reasoning: format!(
            "Sum of salary components = ₹{}; employer contributions excluded",
            gross_salary.normalize()
        ),
    });
    step_number += 1;

    let hra = if rules.allows_exemptions {
        hra_exemption(profile, &rule_set.hra)
    } else {
        Decimal::ZERO
    };
    let hra_reasoning = if !rules.allows_exemptions {
        "HRA exemption not permitted under this regime".to_string()
    } else if profile.rent_paid <= Decimal::ZERO {
        "No rent paid, so no HRA exemption".to_string()
    } else {
        format!(
            "Least of HRA received, rent less {} of basic, and {} of basic ({}) = ₹{}",
            rule_set.hra.rent_offset_factor.normalize(),
            if profile.metro {
                rule_set.hra.metro_factor.normalize()
            } else {
                rule_set.hra.non_metro_factor.normalize()
            },
            if profile.metro { "metro" } else { "non-metro" },
            hra.normalize()
        )
    };
    audit_steps.push(AuditStep {
        step_number,
        rule_id: "hra_exemption".to_string(),
        rule_name: "House Rent Allowance Exemption".to_string(),
        section_ref: "10(13A)".to_string(),
        input: serde_json::json!({
            "house_rent_allowance": profile.house_rent_allowance.normalize().to_string(),
            "rent_paid": profile.rent_paid.normalize().to_string(),
            "basic": profile.basic.normalize().to_string(),
            "metro": profile.metro,
            "permitted": rules.allows_exemptions
        }),
        output: serde_json::json!({
            "exempt_hra": hra.normalize().to_string()
        }),
        reasoning: hra_reasoning,
    });
    step_number += 1;

    let lta = if rules.allows_exemptions {
        lta_exemption(profile)
    } else {
        Decimal::ZERO
    };
    audit_steps.push(AuditStep {
        step_number,
        rule_id: "lta_exemption".to_string(),
        rule_name: "Leave Travel Allowance Exemption".to_string(),
        section_ref: "10(5)".to_string(),
        input: serde_json::json!({
            "leave_travel_allowance": profile.leave_travel_allowance.normalize().to_string(),
            "lta_claimed": profile.lta_claimed.map(|c| c.normalize().to_string()),
            "permitted": rules.allows_exemptions
        }),
        output: serde_json::json!({
            "exempt_lta": lta.normalize().to_string()
        }),
        reasoning: if rules.allows_exemptions {
            format!("LTA exempt up to the amount claimed = ₹{}", lta.normalize())
        } else {
            "LTA exemption not permitted under this regime".to_string()
        },
    });
    step_number += 1;

    let standard_deduction = rule_set.standard_deduction_for(rules).min(gross_salary);
    audit_steps.push(AuditStep {
        step_number,
        rule_id: "standard_deduction".to_string(),
        rule_name: "Standard Deduction".to_string(),
        section_ref: "16(ia)".to_string(),
        input: serde_json::json!({
            "configured": rule_set.standard_deduction_for(rules).normalize().to_string(),
            "gross_salary": gross_salary.normalize().to_string()
        }),
        output: serde_json::json!({
            "standard_deduction": standard_deduction.normalize().to_string()
        }),
        reasoning: format!(
            "Standard deduction of ₹{} (limited to gross salary)",
            standard_deduction.normalize()
        ),
    });
    step_number += 1;

    let levied = rule_set.professional_tax_for(&profile.state);
    let professional_tax = if rules.professional_tax_deductible {
        levied
    } else {
        Decimal::ZERO
    };
    audit_steps.push(AuditStep {
        step_number,
        rule_id: "professional_tax".to_string(),
        rule_name: "Professional Tax".to_string(),
        section_ref: "16(iii)".to_string(),
        input: serde_json::json!({
            "state": profile.state,
            "levied": levied.normalize().to_string(),
            "deductible": rules.professional_tax_deductible
        }),
        output: serde_json::json!({
            "professional_tax": professional_tax.normalize().to_string()
        }),
        reasoning: if rules.professional_tax_deductible {
            format!("Professional tax of ₹{} deducted from salary", professional_tax.normalize())
        } else {
            "Professional tax is not deductible under this regime".to_string()
        },
    });

    GrossIncomeResult {
        gross_salary,
        exemptions: Exemptions {
            hra,
            lta,
            standard_deduction,
            professional_tax,
        },
        audit_steps,
    }
}
