//! Salary and income-tax computation engine.
//!
//! This crate computes gross salary, taxable income, tax liability and
//! take-home pay for a compensation profile under each income-tax regime of
//! a fiscal year, using versioned rule tables loaded from YAML.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod telemetry;
