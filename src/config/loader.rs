//! Rule-set loading functionality.
//!
//! This module provides the [`RuleSource`] trait the repository loads rule
//! sets through, a YAML directory implementation, and an in-memory
//! implementation for embedding and tests.

use std::collections::HashMap;
use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::FiscalYear;

use super::types::RuleSet;

/// An external supplier of rule sets keyed by fiscal year.
///
/// Implementations return `UnknownFiscalYear` when no definition exists,
/// `RuleSourceUnavailable` for transient failures that may be retried, and
/// `MalformedRuleSet` for definitions that cannot be parsed.
pub trait RuleSource: Send + Sync + 'static {
    /// Fetches the rule set for a fiscal year.
    fn fetch(&self, fiscal_year: &FiscalYear)
    -> impl Future<Output = EngineResult<RuleSet>> + Send;
}

/// Reads rule sets from a directory of YAML files.
///
/// # Directory Structure
///
/// ```text
/// config/rules/
/// ├── 2023-24.yaml
/// ├── 2024-25.yaml
/// └── 2025-26.yaml
/// ```
///
/// # Example
///
/// ```no_run
/// use salary_tax_engine::config::{RuleSetRepository, YamlRuleSource};
/// use salary_tax_engine::models::FiscalYear;
///
/// # async fn run() -> Result<(), salary_tax_engine::error::EngineError> {
/// let repository = RuleSetRepository::new(YamlRuleSource::new("./config/rules"));
/// let rules = repository.resolve(&FiscalYear::parse("2024-25")?).await?;
/// println!("Standard deduction: {}", rules.standard_deduction);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct YamlRuleSource {
    dir: PathBuf,
}

impl YamlRuleSource {
    /// Creates a source reading from the given directory.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the directory rule files are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the rule file path for a fiscal year.
    pub fn path_for(&self, fiscal_year: &FiscalYear) -> PathBuf {
        self.dir.join(format!("{}.yaml", fiscal_year))
    }
}

impl RuleSource for YamlRuleSource {
    async fn fetch(&self, fiscal_year: &FiscalYear) -> EngineResult<RuleSet> {
        let path = self.path_for(fiscal_year);
        debug!(path = %path.display(), "Reading rule file");

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| read_error(fiscal_year, &path, err))?;

        parse_rule_set(fiscal_year, &content)
    }
}

/// Serves rule sets held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRuleSource {
    rules: HashMap<FiscalYear, RuleSet>,
}

impl InMemoryRuleSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule set keyed by its own fiscal year.
    pub fn with_rule_set(mut self, rule_set: RuleSet) -> Self {
        self.rules.insert(rule_set.fiscal_year.clone(), rule_set);
        self
    }
}

impl RuleSource for InMemoryRuleSource {
    async fn fetch(&self, fiscal_year: &FiscalYear) -> EngineResult<RuleSet> {
        self.rules
            .get(fiscal_year)
            .cloned()
            .ok_or_else(|| EngineError::UnknownFiscalYear {
                fiscal_year: fiscal_year.to_string(),
            })
    }
}

/// Parses and validates a YAML rule definition for a fiscal year.
///
/// The definition must declare the same fiscal year it was requested for.
pub fn parse_rule_set(fiscal_year: &FiscalYear, content: &str) -> EngineResult<RuleSet> {
    let rule_set: RuleSet =
        serde_yaml::from_str(content).map_err(|e| EngineError::MalformedRuleSet {
            fiscal_year: fiscal_year.to_string(),
            message: e.to_string(),
        })?;

    if rule_set.fiscal_year != *fiscal_year {
        return Err(EngineError::MalformedRuleSet {
            fiscal_year: fiscal_year.to_string(),
            message: format!("definition declares fiscal year {}", rule_set.fiscal_year),
        });
    }

    rule_set.validate()?;
    Ok(rule_set)
}

/// Loads a rule file synchronously, taking the fiscal year from the file
/// stem (e.g., `config/rules/2024-25.yaml`).
///
/// # Example
///
/// ```no_run
/// use salary_tax_engine::config::load_rule_set_file;
///
/// let rules = load_rule_set_file("./config/rules/2024-25.yaml")?;
/// assert_eq!(rules.fiscal_year.as_str(), "2024-25");
/// # Ok::<(), salary_tax_engine::error::EngineError>(())
/// ```
pub fn load_rule_set_file<P: AsRef<Path>>(path: P) -> EngineResult<RuleSet> {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    let fiscal_year = FiscalYear::parse(stem)?;

    let content = fs::read_to_string(path).map_err(|err| read_error(&fiscal_year, path, err))?;
    parse_rule_set(&fiscal_year, &content)
}

fn read_error(fiscal_year: &FiscalYear, path: &Path, err: io::Error) -> EngineError {
    if err.kind() == io::ErrorKind::NotFound {
        EngineError::UnknownFiscalYear {
            fiscal_year: fiscal_year.to_string(),
        }
    } else {
        EngineError::RuleSourceUnavailable {
            fiscal_year: fiscal_year.to_string(),
            message: format!("failed to read {}: {}", path.display(), err),
        }
    }
}
