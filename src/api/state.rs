//! Application state for the salary tax engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::YamlRuleSource;
use crate::engine::TaxEngine;

/// Shared application state.
///
/// Holds the engine, whose rule-set cache is shared by every request.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<TaxEngine<YamlRuleSource>>,
}

impl AppState {
    /// Creates a new application state around an engine.
    pub fn new(engine: TaxEngine<YamlRuleSource>) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Returns the engine.
    pub fn engine(&self) -> &TaxEngine<YamlRuleSource> {
        &self.engine
    }
}
