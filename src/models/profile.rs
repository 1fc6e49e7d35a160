//! Compensation profile model and related types.
//!
//! This module defines the [`CompensationProfile`] input and the closed set of
//! [`DeductionCode`]s a profile may declare investments against.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The minimum age accepted on a profile.
pub const MINIMUM_AGE: u8 = 18;

/// The largest monetary amount (in rupees) accepted on any profile field.
///
/// Keeps every sum and product in the pipeline well inside `Decimal` range.
pub const MAXIMUM_AMOUNT: i64 = 1_000_000_000_000_000;

/// A Chapter VI-A deduction section an investment can be declared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeductionCode {
    /// Section 80C: retirement-linked savings (PF, PPF, ELSS, life cover).
    #[serde(rename = "80c")]
    Section80C,
    /// Section 80D: health insurance premiums.
    #[serde(rename = "80d")]
    Section80D,
    /// Section 80CCD(1B): additional contribution to the national pension scheme.
    #[serde(rename = "80ccd_1b")]
    Section80Ccd1b,
}

impl DeductionCode {
    /// Returns the statutory section reference for audit output.
    pub fn section(&self) -> &'static str {
        match self {
            DeductionCode::Section80C => "80C",
            DeductionCode::Section80D => "80D",
            DeductionCode::Section80Ccd1b => "80CCD(1B)",
        }
    }
}

impl fmt::Display for DeductionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section())
    }
}

/// An employee's annual compensation and declarations for one fiscal year.
///
/// All monetary values are annual amounts in rupees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationProfile {
    /// Basic salary.
    pub basic: Decimal,
    /// House-rent allowance received.
    #[serde(default)]
    pub house_rent_allowance: Decimal,
    /// Conveyance allowance.
    #[serde(default)]
    pub conveyance: Decimal,
    /// Special allowances.
    #[serde(default)]
    pub special_allowance: Decimal,
    /// Leave-travel allowance received.
    #[serde(default)]
    pub leave_travel_allowance: Decimal,
    /// Annual bonus.
    #[serde(default)]
    pub bonus: Decimal,
    /// Any other taxable salary component.
    #[serde(default)]
    pub other_taxable: Decimal,
    /// Employee retirement-fund contribution as a percentage of basic.
    #[serde(default)]
    pub employee_retirement_percent: Decimal,
    /// Employer retirement-fund contribution as a percentage of basic.
    #[serde(default)]
    pub employer_retirement_percent: Decimal,
    /// Employee-side voluntary pension contribution deducted through payroll.
    #[serde(default)]
    pub employee_pension_contribution: Decimal,
    /// Employer-side voluntary pension contribution.
    #[serde(default)]
    pub employer_pension_contribution: Decimal,
    /// Declared investment amounts by deduction section.
    #[serde(default)]
    pub declared_investments: BTreeMap<DeductionCode, Decimal>,
    /// Annual rent paid.
    #[serde(default)]
    pub rent_paid: Decimal,
    /// Whether the employee lives in a metro city.
    #[serde(default)]
    pub metro: bool,
    /// Age in completed years at the end of the fiscal year.
    pub age: u8,
    /// State of residence code (e.g., "KA", "MH").
    #[serde(default)]
    pub state: String,
    /// Income from other sources.
    #[serde(default)]
    pub other_income: Decimal,
    /// Short-term capital gains.
    #[serde(default)]
    pub short_term_gains: Decimal,
    /// Long-term capital gains.
    #[serde(default)]
    pub long_term_gains: Decimal,
    /// LTA travel cost actually claimed; the full allowance when absent.
    #[serde(default)]
    pub lta_claimed: Option<Decimal>,
    /// Other employee-side payroll deductions (not tax deductible).
    #[serde(default)]
    pub other_payroll_deductions: Decimal,
}

impl CompensationProfile {
    /// Creates a profile with the given basic salary and age and every other
    /// field zeroed.
    ///
    /// # Examples
    ///
    /// ```
    /// use salary_tax_engine::models::CompensationProfile;
    /// use rust_decimal::Decimal;
    ///
    /// let profile = CompensationProfile::new(Decimal::from(600_000), 30);
    /// assert_eq!(profile.gross_salary(), Decimal::from(600_000));
    /// ```
    pub fn new(basic: Decimal, age: u8) -> Self {
        Self {
            basic,
            house_rent_allowance: Decimal::ZERO,
            conveyance: Decimal::ZERO,
            special_allowance: Decimal::ZERO,
            leave_travel_allowance: Decimal::ZERO,
            bonus: Decimal::ZERO,
            other_taxable: Decimal::ZERO,
            employee_retirement_percent: Decimal::ZERO,
            employer_retirement_percent: Decimal::ZERO,
            employee_pension_contribution: Decimal::ZERO,
            employer_pension_contribution: Decimal::ZERO,
            declared_investments: BTreeMap::new(),
            rent_paid: Decimal::ZERO,
            metro: false,
            age,
            state: String::new(),
            other_income: Decimal::ZERO,
            short_term_gains: Decimal::ZERO,
            long_term_gains: Decimal::ZERO,
            lta_claimed: None,
            other_payroll_deductions: Decimal::ZERO,
        }
    }

    /// Returns the sum of all employee-visible salary components.
    ///
    /// Employer-side retirement and pension contributions are cost to the
    /// company, not salary income, and are excluded.
    pub fn gross_salary(&self) -> Decimal {
        self.basic
            + self.house_rent_allowance
            + self.conveyance
            + self.special_allowance
            + self.leave_travel_allowance
            + self.bonus
            + self.other_taxable
    }

    /// Returns the employee retirement-fund contribution for the year.
    pub fn employee_retirement_contribution(&self) -> Decimal {
        self.basic * self.employee_retirement_percent / Decimal::ONE_HUNDRED
    }

    /// Returns the employer retirement-fund contribution for the year.
    pub fn employer_retirement_contribution(&self) -> Decimal {
        self.basic * self.employer_retirement_percent / Decimal::ONE_HUNDRED
    }

    /// Returns the total of both capital-gains components.
    pub fn capital_gains(&self) -> Decimal {
        self.short_term_gains + self.long_term_gains
    }

    /// Checks the profile invariants: money between zero and
    /// [`MAXIMUM_AMOUNT`], percentages within 0..=100 and an adult age.
    pub fn validate(&self) -> EngineResult<()> {
        let monetary = [
            ("basic", self.basic),
            ("house_rent_allowance", self.house_rent_allowance),
            ("conveyance", self.conveyance),
            ("special_allowance", self.special_allowance),
            ("leave_travel_allowance", self.leave_travel_allowance),
            ("bonus", self.bonus),
            ("other_taxable", self.other_taxable),
            ("employee_pension_contribution", self.employee_pension_contribution),
            ("employer_pension_contribution", self.employer_pension_contribution),
            ("rent_paid", self.rent_paid),
            ("other_income", self.other_income),
            ("short_term_gains", self.short_term_gains),
            ("long_term_gains", self.long_term_gains),
            ("other_payroll_deductions", self.other_payroll_deductions),
        ];
        for (field, value) in monetary {
            check_amount(field, value)?;
        }

        if let Some(claimed) = self.lta_claimed {
            check_amount("lta_claimed", claimed)?;
        }

        for (code, amount) in &self.declared_investments {
            check_amount(&format!("declared_investments.{}", code.section()), *amount)?;
        }

        for (field, percent) in [
            ("employee_retirement_percent", self.employee_retirement_percent),
            ("employer_retirement_percent", self.employer_retirement_percent),
        ] {
            if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
                return Err(EngineError::InvalidProfile {
                    field: field.to_string(),
                    message: format!("must be between 0 and 100, got {}", percent),
                });
            }
        }

        if self.age < MINIMUM_AGE {
            return Err(EngineError::InvalidProfile {
                field: "age".to_string(),
                message: format!("must be at least {}, got {}", MINIMUM_AGE, self.age),
            });
        }

        Ok(())
    }
}

fn check_amount(field: &str, value: Decimal) -> EngineResult<()> {
    let message = if value < Decimal::ZERO {
        "must not be negative".to_string()
    } else if value > Decimal::from(MAXIMUM_AMOUNT) {
        format!("must not exceed {}", MAXIMUM_AMOUNT)
    } else {
        return Ok(());
    };
    Err(EngineError::InvalidProfile {
        field: field.to_string(),
        message,
    })
}
