//! Calculation logic for the salary tax engine.
//!
//! This module contains the per-regime pipeline: gross salary and exemption
//! resolution, Chapter VI-A deductions, progressive slab tax, rebate and
//! surcharge with marginal relief, cess and rounding, capital gains tax,
//! take-home synthesis, and the comparator that runs them per regime.

mod capital_gains;
mod comparator;
mod deductions;
mod gross_income;
mod slab_tax;
mod take_home;
mod tax_finalizer;

pub use capital_gains::{CapitalGainsResult, calculate_capital_gains_tax, compute_capital_gains_tax};
pub use comparator::{calculate_regime, compare_regimes};
pub use deductions::{DeductionResult, applied_deduction, apply_chapter_deductions};
pub use gross_income::{GrossIncomeResult, hra_exemption, lta_exemption, resolve_gross_income};
pub use slab_tax::{SlabTaxResult, calculate_slab_tax, compute_slab_tax};
pub use take_home::{
    TakeHome, TakeHomeResult, calculate_take_home, employee_statutory_deductions,
    synthesize_take_home,
};
pub use tax_finalizer::{
    FinalizedTax, compute_rebate, compute_surcharge, finalize_tax, surcharge_band,
};
