//! Rule-set loading, caching, and service settings.
//!
//! This module provides the per-fiscal-year tax rule tables (slabs, caps,
//! exemption parameters, surcharge bands), the sources they are loaded from,
//! the single-flight repository that caches them, and the environment-backed
//! service settings.
//!
//! # Example
//!
//! ```no_run
//! use salary_tax_engine::config::load_rule_set_file;
//! use salary_tax_engine::models::RegimeId;
//!
//! let rules = load_rule_set_file("./config/rules/2024-25.yaml").unwrap();
//! println!("Regimes: {:?}", rules.supported_regimes());
//! assert!(rules.regime(RegimeId::New).is_some());
//! ```

mod loader;
mod repository;
mod settings;
mod types;

pub use loader::{
    InMemoryRuleSource, RuleSource, YamlRuleSource, load_rule_set_file, parse_rule_set,
};
pub use repository::{DEFAULT_LOAD_TIMEOUT, LoadPolicy, RuleSetRepository};
pub use settings::{EngineSettings, SettingsError};
pub use types::{
    AgeSlabs, CapitalGainsRule, DeductionRule, HraRule, RebateRule, RegimeRules, RegimeTable,
    RoundingPolicy, RuleSet, Slab, SurchargeBand, round_currency, round_to_multiple,
};
