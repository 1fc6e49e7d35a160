//! Request types for the salary tax engine API.
//!
//! This module defines the JSON request structure for the `/compare` endpoint.

use serde::{Deserialize, Serialize};

use crate::models::{CompensationProfile, RegimeId};

/// Request body for the `/compare` endpoint.
///
/// # Example
///
/// ```
/// use salary_tax_engine::api::CompareRequest;
///
/// let request: CompareRequest = serde_json::from_str(r#"{
///     "fiscal_year": "2024-25",
///     "profile": { "basic": "900000", "age": 30 }
/// }"#).unwrap();
/// assert!(request.regimes.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareRequest {
    /// The fiscal year, e.g. "2024-25".
    pub fiscal_year: String,
    /// Regimes to compute; empty means every regime the year defines.
    #[serde(default)]
    pub regimes: Vec<RegimeId>,
    /// The compensation profile.
    pub profile: CompensationProfile,
}
