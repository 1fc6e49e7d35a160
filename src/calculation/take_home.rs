//! Take-home pay synthesis.
//!
//! Annual take-home is gross salary less employee-side statutory deductions
//! and total annual tax. Employer contributions never reduce take-home.

use rust_decimal::Decimal;

use crate::config::{RuleSet, round_currency};
use crate::models::{AuditStep, CompensationProfile};

const MONTHS_PER_YEAR: u32 = 12;

/// Annual and monthly take-home pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TakeHome {
    /// Annual take-home.
    pub annual: Decimal,
    /// Annual take-home divided by twelve, rounded to the rupee.
    pub monthly: Decimal,
}

/// The result of a take-home calculation, including the audit step.
#[derive(Debug, Clone)]
pub struct TakeHomeResult {
    /// Employee-side statutory deductions.
    pub statutory_deductions: Decimal,
    /// The take-home figures.
    pub take_home: TakeHome,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Returns the employee-side statutory deductions withheld from pay:
/// retirement-fund and pension contributions, professional tax levied by the
/// employee's state, and any other payroll deductions.
///
/// Professional tax is withheld whether or not the regime allows it as a
/// deduction from income.
pub fn employee_statutory_deductions(profile: &CompensationProfile, rule_set: &RuleSet) -> Decimal {
    profile.employee_retirement_contribution()
        + profile.employee_pension_contribution
        + rule_set.professional_tax_for(&profile.state)
        + profile.other_payroll_deductions
}

/// Computes take-home pay.
///
/// # Examples
///
/// ```
/// use salary_tax_engine::calculation::synthesize_take_home;
/// use rust_decimal::Decimal;
///
/// let take_home = synthesize_take_home(
///     Decimal::from(1_425_000),
///     Decimal::from(130_000),
///     Decimal::from(74_400),
/// );
/// assert_eq!(take_home.annual, Decimal::from(1_220_600));
/// assert_eq!(take_home.monthly, Decimal::from(101_717));
/// ```
pub fn synthesize_take_home(
    gross_salary: Decimal,
    total_annual_tax: Decimal,
    statutory_deductions: Decimal,
) -> TakeHome {
    let annual = gross_salary - statutory_deductions - total_annual_tax;
    TakeHome {
        annual,
        monthly: round_currency(annual / Decimal::from(MONTHS_PER_YEAR)),
    }
}

/// Computes statutory deductions and take-home pay with an audit step.
///
/// # Arguments
///
/// * `profile` - The compensation profile
/// * `rule_set` - The fiscal year's rule set
/// * `gross_salary` - Gross salary for the regime
/// * `total_annual_tax` - Slab tax total plus capital-gains tax
/// * `step_number` - The step number for audit trail sequencing
pub fn calculate_take_home(
    profile: &CompensationProfile,
    rule_set: &RuleSet,
    gross_salary: Decimal,
    total_annual_tax: Decimal,
    step_number: u32,
) -> TakeHomeResult {
    let statutory_deductions = employee_statutory_deductions(profile, rule_set);
    let take_home = synthesize_take_home(gross_salary, total_annual_tax, statutory_deductions);

    let audit_step = AuditStep {
        step_number,
        rule_id: "take_home".to_string(),
        rule_name: "Take-Home Pay".to_string(),
        section_ref: "Payroll".to_string(),
        input: serde_json::json!({
            "gross_salary": gross_salary.normalize().to_string(),
            "employee_retirement": profile.employee_retirement_contribution().normalize().to_string(),
            "employee_pension": profile.employee_pension_contribution.normalize().to_string(),
            "professional_tax": rule_set.professional_tax_for(&profile.state).normalize().to_string(),
            "other_payroll_deductions": profile.other_payroll_deductions.normalize().to_string(),
            "total_annual_tax": total_annual_tax.normalize().to_string(),
            "employer_retirement": profile.employer_retirement_contribution().normalize().to_string(),
            "employer_pension": profile.employer_pension_contribution.normalize().to_string()
        }),
        output: serde_json::json!({
            "statutory_deductions": statutory_deductions.normalize().to_string(),
            "annual_take_home": take_home.annual.normalize().to_string(),
            "monthly_take_home": take_home.monthly.normalize().to_string()
        }),
        reasoning: format!(
            "₹{} gross - ₹{} statutory - ₹{} tax = ₹{} a year (₹{} a month)",
            gross_salary.normalize(),
            statutory_deductions.normalize(),
            total_annual_tax.normalize(),
            take_home.annual.normalize(),
            take_home.monthly.normalize()
        ),
    };

    TakeHomeResult {
        statutory_deductions,
        take_home,
        audit_step,
    }
}
