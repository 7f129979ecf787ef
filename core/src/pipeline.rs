//! # Rule Processing Pipeline
//!
//! Drives a full run: select files, parse each one, validate each rule and
//! collect the outcomes into a [`ValidationReport`].
//!
//! A file that cannot be read or parsed aborts the run. A rule that fails
//! validation never does, every rule of every file is evaluated.

use std::path::PathBuf;

use tracing::info;

use vpcgate_common::config::Config;
use vpcgate_common::rules::RuleDirection;
use vpcgate_common::validation::{RuleValidationResult, ValidationReport};

use crate::loader::{self, LoadError};
use crate::resolver::SubnetResolver;
use crate::validator::{self, ValidationContext};

/// Selects the rule files for `cfg` and validates them.
pub fn run<F>(
    cfg: &Config,
    resolver: &dyn SubnetResolver,
    on_rule_done: F,
) -> Result<ValidationReport, LoadError>
where
    F: FnMut(&RuleValidationResult),
{
    let files = loader::select_rule_files(cfg)?;
    info!("{} firewall rule file(s) selected for validation", files.len());

    let ctx = ValidationContext {
        host_network_project: &cfg.host_network_project,
        user_email: &cfg.user_email,
        resolver,
    };
    process_rule_files(&files, &ctx, on_rule_done)
}

/// Validates every rule in `files`, ingress rules before egress rules.
///
/// `on_rule_done` is called once per rule as soon as its result is known.
pub fn process_rule_files<F>(
    files: &[PathBuf],
    ctx: &ValidationContext<'_>,
    mut on_rule_done: F,
) -> Result<ValidationReport, LoadError>
where
    F: FnMut(&RuleValidationResult),
{
    let mut report = ValidationReport::new();

    for path in files {
        let rule_file = loader::load_rule_file(path)?;
        info!(
            "Validating {} rule(s) from {}",
            rule_file.rule_count(),
            path.display()
        );

        for direction in RuleDirection::ALL {
            for (name, rule) in rule_file.rules(direction) {
                let result = validator::validate_rule(ctx, direction, path, &name, rule);
                on_rule_done(&result);
                report.record(result);
            }
        }
        report.file_processed();
    }

    Ok(report)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
