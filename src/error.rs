//! Error types for the salary tax engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while resolving rules and
//! computing a regime comparison.

use thiserror::Error;

use crate::models::RegimeId;

/// The main error type for the salary tax engine.
///
/// Every stage of the pipeline either returns a result or propagates one of
/// these variants upward unchanged.
///
/// # Example
///
/// ```
/// use salary_tax_engine::error::EngineError;
///
/// let error = EngineError::UnknownFiscalYear {
///     fiscal_year: "1999-00".to_string(),
/// };
/// assert_eq!(error.to_string(), "No rule set defined for fiscal year 1999-00");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No rule definition exists for the requested fiscal year.
    #[error("No rule set defined for fiscal year {fiscal_year}")]
    UnknownFiscalYear {
        /// The fiscal year that was requested.
        fiscal_year: String,
    },

    /// A requested regime has no entry in the resolved rule set.
    #[error("Regime '{regime}' is not supported in fiscal year {fiscal_year}")]
    UnsupportedRegime {
        /// The regime that was requested.
        regime: RegimeId,
        /// The fiscal year whose rule set lacks the regime.
        fiscal_year: String,
    },

    /// The rule definition failed structural validation or could not be parsed.
    #[error("Malformed rule set for fiscal year {fiscal_year}: {message}")]
    MalformedRuleSet {
        /// The fiscal year of the offending rule set.
        fiscal_year: String,
        /// A description of the defect.
        message: String,
    },

    /// The rule source failed transiently (I/O failure or timeout).
    #[error("Rule source unavailable for fiscal year {fiscal_year}: {message}")]
    RuleSourceUnavailable {
        /// The fiscal year being loaded.
        fiscal_year: String,
        /// A description of the failure.
        message: String,
    },

    /// The compensation profile violates an input invariant.
    #[error("Invalid profile field '{field}': {message}")]
    InvalidProfile {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },
}

impl EngineError {
    /// Returns true when the error is transient and the load may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::RuleSourceUnavailable { .. })
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_regime_displays_regime_and_year() {
        let error = EngineError::UnsupportedRegime {
            regime: RegimeId::Old,
            fiscal_year: "2025-26".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Regime 'old' is not supported in fiscal year 2025-26"
        );
    }

    #[test]
    fn test_malformed_rule_set_displays_message() {
        let error = EngineError::MalformedRuleSet {
            fiscal_year: "2024-25".to_string(),
            message: "slab 2 does not start where slab 1 ends".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Malformed rule set for fiscal year 2024-25: slab 2 does not start where slab 1 ends"
        );
    }

    #[test]
    fn test_invalid_profile_displays_field_and_message() {
        let error = EngineError::InvalidProfile {
            field: "basic".to_string(),
            message: "must not be negative".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid profile field 'basic': must not be negative"
        );
    }

    #[test]
    fn test_only_rule_source_unavailable_is_retryable() {
        let transient = EngineError::RuleSourceUnavailable {
            fiscal_year: "2024-25".to_string(),
            message: "timed out".to_string(),
        };
        let fatal = EngineError::UnknownFiscalYear {
            fiscal_year: "2024-25".to_string(),
        };
        assert!(transient.is_retryable());
        assert!(!fatal.is_retryable());
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_unknown_year() -> EngineResult<()> {
            Err(EngineError::UnknownFiscalYear {
                fiscal_year: "2001-02".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_unknown_year()?;
            Ok(())
        }

        assert_eq!(
            propagates_error(),
            Err(EngineError::UnknownFiscalYear {
                fiscal_year: "2001-02".to_string()
            })
        );
    }
}
