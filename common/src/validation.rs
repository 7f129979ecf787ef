//! # Validation Results
//!
//! Per-rule outcomes and the run-wide report built from them.
//!
//! A [`RuleValidationResult`] only ever gains defects, so once a rule is
//! invalid it stays invalid. The [`ValidationReport`] keeps every result in
//! processing order and passes only when no result carries a defect.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::network::range::CidrError;
use crate::rules::RuleDirection;

/// Missing or malformed data inside a single rule definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralDefect {
    #[error("rule definition must be a mapping")]
    NotAMapping,
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("{field} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("{0} is empty")]
    EmptyRanges(&'static str),
    #[error("{field} entry '{cidr}' is not a valid CIDR range: {source}")]
    MalformedCidr {
        field: &'static str,
        cidr: String,
        source: CidrError,
    },
}

/// A reason a rule failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleDefect {
    #[error(transparent)]
    Structural(#[from] StructuralDefect),

    #[error(
        "{direction} rule '{rule}': subnet_name '{subnet}', subnet_region '{region}' and host network project '{project}' do not resolve to a subnet ({reason})"
    )]
    SubnetResolution {
        direction: RuleDirection,
        rule: String,
        subnet: String,
        region: String,
        project: String,
        reason: String,
    },

    #[error("subnet has no CIDR ranges")]
    SubnetWithoutRanges,

    #[error("{field} entry '{cidr}' not part of subnet CIDR ranges")]
    ContainmentViolation { field: &'static str, cidr: String },

    #[error(
        "user {user} does not hold an approved network role on subnet {subnet} (region: {region})"
    )]
    AccessDenied {
        user: String,
        subnet: String,
        region: String,
    },

    #[error(
        "access check for user {user} on subnet {subnet} (region: {region}) failed: {reason}"
    )]
    AccessCheckFailed {
        user: String,
        subnet: String,
        region: String,
        reason: String,
    },
}

/// Outcome of validating one rule of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleValidationResult {
    file: PathBuf,
    rule_name: String,
    direction: RuleDirection,
    defects: Vec<RuleDefect>,
}

impl RuleValidationResult {
    pub fn new(file: impl Into<PathBuf>, rule_name: impl Into<String>, direction: RuleDirection) -> Self {
        Self {
            file: file.into(),
            rule_name: rule_name.into(),
            direction,
            defects: Vec::new(),
        }
    }

    pub fn push(&mut self, defect: impl Into<RuleDefect>) {
        self.defects.push(defect.into());
    }

    pub fn is_valid(&self) -> bool {
        self.defects.is_empty()
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn direction(&self) -> RuleDirection {
        self.direction
    }

    pub fn defects(&self) -> &[RuleDefect] {
        &self.defects
    }

    /// Human readable error messages, in the order they were found.
    pub fn errors(&self) -> Vec<String> {
        self.defects.iter().map(ToString::to_string).collect()
    }
}

/// Every rule outcome of a run, in processing order.
#[derive(Debug, Default, Clone)]
pub struct ValidationReport {
    results: Vec<RuleValidationResult>,
    files: usize,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: RuleValidationResult) {
        self.results.push(result);
    }

    pub fn file_processed(&mut self) {
        self.files += 1;
    }

    pub fn files_processed(&self) -> usize {
        self.files
    }

    pub fn rules_evaluated(&self) -> usize {
        self.results.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleValidationResult> {
        self.results.iter().filter(|r| !r.is_valid())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// True when no evaluated rule carries a defect.
    pub fn passed(&self) -> bool {
        self.results.iter().all(RuleValidationResult::is_valid)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
