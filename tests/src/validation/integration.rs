use vpcgate_common::iam::{ApprovedRoles, NETWORK_ADMIN, NETWORK_USER};
use vpcgate_common::rules::RuleDirection;
use vpcgate_common::validation::{RuleDefect, StructuralDefect};
use vpcgate_core::loader::LoadError;
use vpcgate_core::pipeline;
use vpcgate_core::resolver::{ResolveError, StaticResolver};

use super::util::*;

#[test]
fn test_validate_all_clean_tree_passes() {
    let repo = Repo::new();
    repo.write("firewall/app.yaml", CLEAN_RULES);
    repo.write("firewall/README.md", "not a rule file");
    let resolver = granted_resolver();

    let report = pipeline::run(&repo.config(true), &resolver, |_| {}).expect("run should succeed");

    assert!(report.passed(), "clean rules should pass");
    assert_eq!(report.files_processed(), 1, "only YAML files are selected");
    assert_eq!(report.rules_evaluated(), 2);
    assert_eq!(resolver.lookups(), 2);
    assert_eq!(resolver.access_checks(), 2);
}

#[test]
fn test_validate_all_reports_every_failure() {
    let repo = Repo::new();
    repo.write("firewall/app.yaml", CLEAN_RULES);
    repo.write("firewall/team/broken.yml", BROKEN_RULES);
    let resolver = granted_resolver();

    let mut seen: Vec<String> = Vec::new();
    let report = pipeline::run(&repo.config(true), &resolver, |r| {
        seen.push(r.rule_name().to_string())
    })
    .expect("rule defects must not abort the run");

    assert!(!report.passed());
    assert_eq!(report.files_processed(), 2);
    assert_eq!(report.rules_evaluated(), 4, "every rule is evaluated");
    assert_eq!(seen.len(), 4, "progress is reported once per rule");

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 2);

    let leaks = failures
        .iter()
        .find(|r| r.rule_name() == "leaks-out")
        .expect("leaks-out should fail");
    assert_eq!(leaks.direction(), RuleDirection::Ingress);
    assert!(leaks.file().ends_with("team/broken.yml"));
    assert!(matches!(
        leaks.defects(),
        [RuleDefect::ContainmentViolation { cidr, .. }] if cidr == "10.10.0.0/23"
    ));

    let no_region = failures
        .iter()
        .find(|r| r.rule_name() == "no-region")
        .expect("no-region should fail");
    assert!(matches!(
        no_region.defects(),
        [RuleDefect::Structural(StructuralDefect::Missing("subnet_region"))]
    ));
}

#[test]
fn test_changed_only_validates_listed_files() {
    let repo = Repo::new();
    repo.write("firewall/app.yaml", CLEAN_RULES);
    repo.write("firewall/broken.yaml", BROKEN_RULES);
    repo.write(MANIFEST, "firewall/app.yaml\n");
    let resolver = granted_resolver();

    let report = pipeline::run(&repo.config(false), &resolver, |_| {}).expect("run should succeed");

    assert!(report.passed(), "unlisted broken file must be ignored");
    assert_eq!(report.files_processed(), 1);
    assert_eq!(report.rules_evaluated(), 2);
}

#[test]
fn test_changed_only_accepts_comma_separated_manifest() {
    let repo = Repo::new();
    repo.write("firewall/app.yaml", CLEAN_RULES);
    repo.write("firewall/broken.yaml", BROKEN_RULES);
    repo.write(MANIFEST, "firewall/app.yaml, firewall/broken.yaml\n");
    let resolver = granted_resolver();

    let report = pipeline::run(&repo.config(false), &resolver, |_| {}).expect("run should succeed");

    assert_eq!(report.files_processed(), 2);
    assert_eq!(report.failure_count(), 2);
}

#[test]
fn test_empty_manifest_is_fatal() {
    let repo = Repo::new();
    repo.write("firewall/app.yaml", CLEAN_RULES);
    repo.write(MANIFEST, "");
    let resolver = granted_resolver();

    let err = pipeline::run(&repo.config(false), &resolver, |_| {}).unwrap_err();

    assert!(matches!(err, LoadError::ManifestEmpty(_)), "got {err:?}");
    assert_eq!(resolver.lookups(), 0, "no rule may be evaluated");
}

#[test]
fn test_missing_manifest_is_fatal() {
    let repo = Repo::new();
    repo.write("firewall/app.yaml", CLEAN_RULES);
    let resolver = granted_resolver();

    let err = pipeline::run(&repo.config(false), &resolver, |_| {}).unwrap_err();

    assert!(matches!(err, LoadError::ManifestMissing(_)), "got {err:?}");
}

#[test]
fn test_no_rule_files_is_fatal() {
    let repo = Repo::new();
    repo.write("firewall/notes.txt", "nothing here");
    let resolver = granted_resolver();

    let err = pipeline::run(&repo.config(true), &resolver, |_| {}).unwrap_err();

    assert!(matches!(err, LoadError::NoRuleFiles), "got {err:?}");
}

#[test]
fn test_unparseable_file_aborts_run() {
    let repo = Repo::new();
    repo.write("firewall/a.yaml", CLEAN_RULES);
    repo.write("firewall/b.yaml", "ingress: [unclosed\n");
    let resolver = granted_resolver();

    let err = pipeline::run(&repo.config(true), &resolver, |_| {}).unwrap_err();

    assert!(
        matches!(&err, LoadError::FileParse { path, .. } if path.ends_with("b.yaml")),
        "got {err:?}"
    );
}

#[test]
fn test_listed_file_that_does_not_exist_aborts_run() {
    let repo = Repo::new();
    repo.write(MANIFEST, "firewall/gone.yaml");
    let resolver = granted_resolver();

    let err = pipeline::run(&repo.config(false), &resolver, |_| {}).unwrap_err();

    assert!(matches!(err, LoadError::FileRead { .. }), "got {err:?}");
}

#[test]
fn test_user_without_role_fails_every_rule() {
    let repo = Repo::new();
    repo.write("firewall/app.yaml", CLEAN_RULES);
    let resolver = StaticResolver::default()
        .with_subnet(APP, ["10.10.0.0/24", "10.20.0.0/16"])
        .with_subnet(DATA, ["10.30.0.0/24"]);

    let report = pipeline::run(&repo.config(true), &resolver, |_| {}).expect("run should succeed");

    assert_eq!(report.failure_count(), 2);
    for result in report.failures() {
        assert!(matches!(
            result.defects(),
            [RuleDefect::AccessDenied { user, .. }] if user == USER
        ));
    }
}

#[test]
fn test_provider_error_is_recorded_per_rule() {
    let repo = Repo::new();
    repo.write("firewall/app.yaml", CLEAN_RULES);
    let resolver = granted_resolver().with_error(APP, ResolveError::NotFound);

    let report = pipeline::run(&repo.config(true), &resolver, |_| {}).expect("run should succeed");

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1, "only the rule on the broken subnet fails");
    assert_eq!(failures[0].rule_name(), "allow-https");
    assert!(matches!(
        failures[0].defects(),
        [RuleDefect::SubnetResolution { .. }]
    ));
}

#[test]
fn test_only_configured_roles_grant_access() {
    let repo = Repo::new();
    repo.write("firewall/app.yaml", CLEAN_RULES);
    let member = format!("user:{USER}");
    let resolver = StaticResolver::new(ApprovedRoles::new([NETWORK_ADMIN]))
        .with_subnet(APP, ["10.10.0.0/24", "10.20.0.0/16"])
        .with_subnet(DATA, ["10.30.0.0/24"])
        .with_binding(APP, NETWORK_ADMIN, &member)
        .with_binding(DATA, NETWORK_USER, &member);

    let report = pipeline::run(&repo.config(true), &resolver, |_| {}).expect("run should succeed");

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1, "networkUser is not in the configured set");
    assert_eq!(failures[0].rule_name(), "to-data");
}
