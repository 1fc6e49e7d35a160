//! Chapter VI-A deduction calculation.
//!
//! Declared investments are deducted up to a per-section ceiling. Only
//! deduction-eligible regimes apply them, except for sections the rule set
//! marks regime-neutral. Income level is never consulted.

use rust_decimal::Decimal;

use crate::config::{RegimeRules, RuleSet};
use crate::models::{AppliedDeduction, AuditStep, CompensationProfile, DeductionCode};

/// The result of applying chapter deductions, including the audit step.
#[derive(Debug, Clone)]
pub struct DeductionResult {
    /// One entry per declared section, in section order.
    pub deductions: Vec<AppliedDeduction>,
    /// Sum of applied amounts.
    pub total: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Returns the amount deductible for one declared section under a regime.
///
/// Ineligible sections and sections missing from the rule set yield a zero
/// cap.
pub fn applied_deduction(
    code: DeductionCode,
    declared: Decimal,
    rule_set: &RuleSet,
    rules: &RegimeRules,
) -> AppliedDeduction {
    let eligible = rule_set
        .deductions
        .get(&code)
        .is_some_and(|rule| rules.deduction_eligible || rule.regime_neutral);

    let cap = if eligible {
        rule_set
            .deduction_cap(code, rules)
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    AppliedDeduction {
        code,
        declared,
        cap,
        applied: declared.max(Decimal::ZERO).min(cap),
    }
}

/// Applies every declared investment on the profile against its cap.
///
/// # Arguments
///
/// * `profile` - The compensation profile carrying declarations
/// * `rule_set` - The fiscal year's rule set
/// * `rules` - The rules of the regime being computed
/// * `step_number` - The step number for audit trail sequencing
///
/// # Examples
///
/// ```
/// use salary_tax_engine::calculation::apply_chapter_deductions;
/// use salary_tax_engine::config::load_rule_set_file;
/// use salary_tax_engine::models::{CompensationProfile, DeductionCode, RegimeId};
/// use rust_decimal::Decimal;
///
/// let rule_set = load_rule_set_file("config/rules/2023-24.yaml").unwrap();
/// let mut profile = CompensationProfile::new(Decimal::from(600_000), 30);
/// profile.declared_investments.insert(DeductionCode::Section80C, Decimal::from(200_000));
///
/// let old = apply_chapter_deductions(&profile, &rule_set, rule_set.regime(RegimeId::Old).unwrap(), 1);
/// assert_eq!(old.total, Decimal::from(150_000));
///
/// let new = apply_chapter_deductions(&profile, &rule_set, rule_set.regime(RegimeId::New).unwrap(), 1);
/// assert_eq!(new.total, Decimal::ZERO);
/// ```
pub fn apply_chapter_deductions(
    profile: &CompensationProfile,
    rule_set: &RuleSet,
    rules: &RegimeRules,
    step_number: u32,
) -> DeductionResult {
    let deductions: Vec<AppliedDeduction> = profile
        .declared_investments
        .iter()
        .map(|(code, declared)| applied_deduction(*code, *declared, rule_set, rules))
        .collect();

    let total: Decimal = deductions.iter().map(|d| d.applied).sum();

    let lines: Vec<String> = deductions
        .iter()
        .map(|d| {
            format!(
                "{}: min(₹{}, cap ₹{}) = ₹{}",
                d.code,
                d.declared.normalize(),
                d.cap.normalize(),
                d.applied.normalize()
            )
        })
        .collect();

    let reasoning = if deductions.is_empty() {
        "No investments declared".to_string()
    } else if !rules.deduction_eligible && total.is_zero() {
        "Chapter VI-A deductions not available under this regime".to_string()
    } else {
        format!("{}; total ₹{}", lines.join("; "), total.normalize())
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "chapter_deductions".to_string(),
        rule_name: "Chapter VI-A Deductions".to_string(),
        section_ref: "VI-A".to_string(),
        input: serde_json::json!({
            "declared": deductions
                .iter()
                .map(|d| {
                    (
                        d.code.section().to_string(),
                        serde_json::Value::String(d.declared.normalize().to_string()),
                    )
                })
                .collect::<serde_json::Map<String, serde_json::Value>>(),
            "deduction_eligible": rules.deduction_eligible
        }),
        output: serde_json::json!({
            "applied": deductions
                .iter()
                .map(|d| {
                    (
                        d.code.section().to_string(),
                        serde_json::Value::String(d.applied.normalize().to_string()),
                    )
                })
                .collect::<serde_json::Map<String, serde_json::Value>>(),
            "total": total.normalize().to_string()
        }),
        reasoning,
    };

    DeductionResult {
        deductions,
        total,
        audit_step,
    }
}
