//! Integrity checks over the metadata store.
//!
//! Checks come in two tiers:
//!
//! | Tier | Checks | Needs |
//! |------|--------|-------|
//! | offline | field_shape, dependencies, publications, preferred_prefix, schema_required, redundant_descriptions, standardized | the store (and schema file) |
//! | network | purl_config, obograph, repository_license, contribution_guidelines | HTTP, GitHub token |
//!
//! Every check walks all records and reports every failure it finds; one
//! record failing never hides another, and one check failing never skips a
//! sibling check.

pub mod metadata;
pub mod network;

use std::collections::BTreeMap;
use std::fmt;

use crate::config::ChecksConfig;
use crate::error::Result;
use crate::models::RegistryRecord;

/// One violated expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub record: String,
    pub field: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub message: String,
}

impl Failure {
    pub fn new(
        record: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            record: record.into(),
            field: field.into(),
            expected: None,
            actual: None,
            message: message.into(),
        }
    }

    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.record, self.field, self.message)?;
        match (&self.expected, &self.actual) {
            (Some(e), Some(a)) => write!(f, " (expected {}, found {})", e, a),
            (Some(e), None) => write!(f, " (expected {})", e),
            (None, Some(a)) => write!(f, " (found {})", a),
            (None, None) => Ok(()),
        }
    }
}

/// Failures produced by one named check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub name: &'static str,
    pub failures: Vec<Failure>,
}

impl CheckReport {
    pub fn new(name: &'static str, failures: Vec<Failure>) -> Self {
        Self { name, failures }
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Total failures across reports.
pub fn failure_count(reports: &[CheckReport]) -> usize {
    reports.iter().map(|r| r.failures.len()).sum()
}

/// Run every offline check.
///
/// `schema_required` only runs when `checks.schema_path` is configured.
///
/// # Errors
///
/// Only when the configured schema file cannot be read or parsed. Record
/// problems are failures, not errors.
pub fn run_offline(
    records: &BTreeMap<String, RegistryRecord>,
    config: &ChecksConfig,
) -> Result<Vec<CheckReport>> {
    let mut reports = vec![
        CheckReport::new("field_shape", metadata::field_shape(records)),
        CheckReport::new("dependencies", metadata::dependencies(records)),
        CheckReport::new(
            "publications",
            metadata::publications(records, &config.grandfathered_publications),
        ),
        CheckReport::new(
            "preferred_prefix",
            metadata::preferred_prefix(records, &config.preferred_prefix_exempt),
        ),
        CheckReport::new(
            "redundant_descriptions",
            metadata::redundant_descriptions(records),
        ),
        CheckReport::new("standardized", metadata::standardized(records)?),
    ];

    if let Some(path) = &config.schema_path {
        let schema = metadata::load_schema(path)?;
        reports.push(CheckReport::new(
            "schema_required",
            metadata::schema_required(&schema),
        ));
    }

    Ok(reports)
}
