use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use colored::*;
use tracing::info;

use crate::gprint;
use crate::terminal::{colors, format, print, spinner};
use vpcgate_common::config::{Config, ValidationMode};
use vpcgate_common::validation::ValidationReport;
use vpcgate_core::pipeline;
use vpcgate_core::resolver::GcpComputeResolver;

/// Runs the gate. Returns `Ok(false)` when at least one rule is invalid.
pub fn validate(timeout: Option<u64>, quiet: u8) -> anyhow::Result<bool> {
    let mut cfg: Config = Config::from_env().context("loading action inputs")?;
    if let Some(secs) = timeout {
        cfg.timeout = Duration::from_secs(secs);
    }
    announce_mode(&cfg);
    let roles: Vec<&str> = cfg.approved_roles.iter().collect();
    info!("Approved subnet roles: {}", roles.join(", "));

    let resolver = GcpComputeResolver::from_config(&cfg).context("creating compute client")?;

    let start_time: Instant = Instant::now();
    let mut evaluated: usize = 0;
    let outcome = pipeline::run(&cfg, &resolver, |result| {
        evaluated += 1;
        spinner::report_validation_progress(evaluated, result.rule_name());
    });
    spinner::finish();

    let report: ValidationReport = outcome.context("processing firewall rule validation")?;
    validation_ends(&report, &cfg.absolute_path, start_time.elapsed(), quiet);
    Ok(report.passed())
}

fn announce_mode(cfg: &Config) {
    match cfg.mode() {
        ValidationMode::All => {
            info!("Running in validate ALL mode");
            info!(
                "All firewall rules will be validated against the credentials of {}",
                cfg.user_email
            );
        }
        ValidationMode::ChangedOnly => {
            info!("Running in validate changes only mode");
            info!("Only firewall rules that have been modified will be validated");
        }
    }
}

fn validation_ends(report: &ValidationReport, root: &Path, total_time: Duration, quiet: u8) {
    if quiet > 0 {
        gprint!();
    }

    if report.passed() {
        print::header("no errors found", quiet);
        print_summary(report, total_time, quiet);
        return;
    }

    print::header("firewall rules containing errors", quiet);
    print_failures(report, root, quiet);
    print_summary(report, total_time, quiet);
}

fn print_failures(report: &ValidationReport, root: &Path, quiet: u8) {
    let failures: Vec<_> = report.failures().collect();
    for (idx, result) in failures.iter().enumerate() {
        print::tree_head(idx + 1, result.rule_name());
        if quiet < 2 {
            print::as_tree_one_level(format::result_to_details(result, root));
        }
        let errors: Vec<String> = result.errors();
        print::numbered_list(errors.as_slice());
        if idx + 1 != failures.len() {
            gprint!();
        }
    }
}

fn print_summary(report: &ValidationReport, total_time: Duration, quiet: u8) {
    let rules: ColoredString = format!("{} rules", report.rules_evaluated()).bold();
    let files: ColoredString = format!("{} files", report.files_processed()).bold();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();

    let verdict: ColoredString = if report.passed() {
        "PASS".color(colors::PASS).bold()
    } else {
        format!("FAIL ({} invalid)", report.failure_count())
            .color(colors::FAIL)
            .bold()
    };
    let output: &ColoredString = &format!("{verdict}: {rules} in {files} checked in {total_time}")
        .color(colors::TEXT_DEFAULT);

    match quiet {
        0 => {
            print::fat_separator();
            print::centerln(output);
            print::end_of_program();
        }
        _ => {
            gprint!();
            print::print(output);
        }
    }
}
