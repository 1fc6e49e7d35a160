//! Regime and fiscal-year identifiers.
//!
//! This module defines the closed set of tax regimes and the fiscal-year key
//! used to look up rule sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A mutually exclusive rule variant under which tax is computed.
///
/// # Examples
///
/// ```
/// use salary_tax_engine::models::RegimeId;
///
/// let regime: RegimeId = "new".parse().unwrap();
/// assert_eq!(regime, RegimeId::New);
/// assert_eq!(regime.to_string(), "new");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeId {
    /// The exemption-permitting regime with Chapter VI-A deductions.
    Old,
    /// The simplified-rate regime.
    New,
}

impl RegimeId {
    /// All regimes known to the engine, in display order.
    pub const ALL: [RegimeId; 2] = [RegimeId::Old, RegimeId::New];

    /// Returns the snake_case identifier used in rule files and requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegimeId::Old => "old",
            RegimeId::New => "new",
        }
    }
}

impl fmt::Display for RegimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegimeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "old" => Ok(RegimeId::Old),
            "new" => Ok(RegimeId::New),
            other => Err(format!("unknown regime '{}' (expected 'old' or 'new')", other)),
        }
    }
}

/// An Indian fiscal year key such as `2024-25` (April 2024 to March 2025).
///
/// Accepts `2024-25`, `FY2024-25` and `2024-2025`; the canonical form is
/// always `YYYY-YY`.
///
/// # Examples
///
/// ```
/// use salary_tax_engine::models::FiscalYear;
///
/// let fy = FiscalYear::parse("FY2024-2025").unwrap();
/// assert_eq!(fy.as_str(), "2024-25");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FiscalYear {
    key: String,
}

impl FiscalYear {
    /// Parses a fiscal-year string into its canonical key.
    ///
    /// Returns `UnknownFiscalYear` when the string is not a recognisable
    /// fiscal year.
    pub fn parse(value: &str) -> EngineResult<Self> {
        let unknown = || EngineError::UnknownFiscalYear {
            fiscal_year: value.to_string(),
        };

        let trimmed = value.trim();
        let trimmed = trimmed
            .strip_prefix("FY")
            .or_else(|| trimmed.strip_prefix("fy"))
            .unwrap_or(trimmed);

        let (start, end) = trimmed.split_once('-').ok_or_else(unknown)?;
        if start.len() != 4 || !(end.len() == 2 || end.len() == 4) {
            return Err(unknown());
        }
        if !start.bytes().chain(end.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(unknown());
        }

        let start_year: u16 = start.parse().map_err(|_| unknown())?;
        let end_value: u16 = end.parse().map_err(|_| unknown())?;
        let expected_end = start_year + 1;
        let matches_end = if end.len() == 2 {
            end_value == expected_end % 100
        } else {
            end_value == expected_end
        };
        if !matches_end {
            return Err(unknown());
        }

        Ok(Self {
            key: format!("{}-{:02}", start_year, expected_end % 100),
        })
    }

    /// Returns the canonical `YYYY-YY` key.
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl FromStr for FiscalYear {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FiscalYear {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FiscalYear> for String {
    fn from(value: FiscalYear) -> Self {
        value.key
    }
}
