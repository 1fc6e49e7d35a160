//! Core data models for the salary tax engine.
//!
//! This module contains all the domain models used throughout the engine.

mod profile;
mod regime;
mod regime_result;

pub use profile::{CompensationProfile, DeductionCode, MAXIMUM_AMOUNT, MINIMUM_AGE};
pub use regime::{FiscalYear, RegimeId};
pub use regime_result::{
    AppliedDeduction, AuditStep, ComparisonSummary, Exemptions, RegimeResult, TaxBreakdown,
};
