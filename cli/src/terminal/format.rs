use std::path::Path;

use colored::*;
use vpcgate_common::validation::RuleValidationResult;

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

/// Shows `file` relative to the repository root when possible.
pub fn display_path(file: &Path, root: &Path) -> String {
    file.strip_prefix(root).unwrap_or(file).display().to_string()
}

pub fn result_to_details(result: &RuleValidationResult, root: &Path) -> Vec<Detail> {
    let valid: ColoredString = if result.is_valid() {
        "yes".color(colors::PASS)
    } else {
        "no".color(colors::FAIL).bold()
    };

    vec![
        ("Source File".to_string(), display_path(result.file(), root).normal()),
        ("Rule Type".to_string(), result.direction().to_string().normal()),
        ("Rule Valid".to_string(), valid),
        (
            "Error Count".to_string(),
            result.defects().len().to_string().color(colors::ACCENT),
        ),
    ]
}
