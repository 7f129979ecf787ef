//! # Rule Validation
//!
//! Validates a single firewall rule in three stages:
//!
//! 1. **Structure**: `subnet_name`, `subnet_region` and the direction's range
//!    list must be present and well formed. All structural defects are
//!    reported together, and later stages only run when there are none.
//! 2. **Containment**: every declared range must lie inside one of the
//!    subnet's primary or secondary ranges.
//! 3. **Access**: the acting user must hold an approved role on the subnet.

use std::path::Path;

use serde_yaml::Value;
use tracing::debug;

use vpcgate_common::network::containment;
use vpcgate_common::network::range::Ipv4Cidr;
use vpcgate_common::rules::{FieldValue, RawRule, RuleDirection};
use vpcgate_common::validation::{RuleDefect, RuleValidationResult, StructuralDefect};

use crate::resolver::{SubnetRef, SubnetResolver};

/// What every rule of a run is validated against.
pub struct ValidationContext<'a> {
    pub host_network_project: &'a str,
    pub user_email: &'a str,
    pub resolver: &'a dyn SubnetResolver,
}

/// Fields of a structurally sound rule.
struct RuleTarget {
    subnet_name: String,
    subnet_region: String,
    ranges: Vec<String>,
}

/// Validates one rule definition as found in a rule file.
pub fn validate_rule(
    ctx: &ValidationContext<'_>,
    direction: RuleDirection,
    file: &Path,
    rule_name: &str,
    rule: &Value,
) -> RuleValidationResult {
    let mut result = RuleValidationResult::new(file, rule_name, direction);

    let Some(raw) = RawRule::from_value(rule) else {
        result.push(StructuralDefect::NotAMapping);
        return result;
    };

    let Some(target) = check_structure(direction, &raw, &mut result) else {
        return result;
    };

    let subnet = SubnetRef::new(
        ctx.host_network_project,
        &target.subnet_region,
        &target.subnet_name,
    );
    debug!("Validating {direction} rule '{rule_name}' against {subnet}");

    let authorities = match ctx.resolver.resolve_subnet_cidrs(&subnet) {
        Ok(authorities) => authorities,
        Err(e) => {
            result.push(RuleDefect::SubnetResolution {
                direction,
                rule: rule_name.to_string(),
                subnet: target.subnet_name.clone(),
                region: target.subnet_region.clone(),
                project: ctx.host_network_project.to_string(),
                reason: e.to_string(),
            });
            return result;
        }
    };

    if authorities.is_empty() {
        result.push(RuleDefect::SubnetWithoutRanges);
        return result;
    }

    let field = direction.ranges_field();
    for cidr in containment::find_uncontained(&target.ranges, &authorities) {
        result.push(RuleDefect::ContainmentViolation { field, cidr });
    }

    match ctx.resolver.has_approved_access(ctx.user_email, &subnet) {
        Ok(true) => {}
        Ok(false) => result.push(RuleDefect::AccessDenied {
            user: ctx.user_email.to_string(),
            subnet: target.subnet_name.clone(),
            region: target.subnet_region.clone(),
        }),
        Err(e) => result.push(RuleDefect::AccessCheckFailed {
            user: ctx.user_email.to_string(),
            subnet: target.subnet_name.clone(),
            region: target.subnet_region.clone(),
            reason: e.to_string(),
        }),
    }

    result
}

/// Runs every structural check, recording each defect.
///
/// Returns the extracted fields only when the rule has no structural defect.
fn check_structure(
    direction: RuleDirection,
    raw: &RawRule,
    result: &mut RuleValidationResult,
) -> Option<RuleTarget> {
    let subnet_name = require_string("subnet_name", &raw.subnet_name, result);
    let subnet_region = require_string("subnet_region", &raw.subnet_region, result);
    let ranges = require_ranges(direction.ranges_field(), raw.ranges(direction), result);

    if !result.is_valid() {
        return None;
    }

    Some(RuleTarget {
        subnet_name: subnet_name?,
        subnet_region: subnet_region?,
        ranges: ranges?,
    })
}

fn require_string(
    field: &'static str,
    value: &FieldValue<String>,
    result: &mut RuleValidationResult,
) -> Option<String> {
    match value {
        FieldValue::Present(s) => Some(s.clone()),
        FieldValue::Missing => {
            result.push(StructuralDefect::Missing(field));
            None
        }
        FieldValue::WrongType => {
            result.push(StructuralDefect::WrongType {
                field,
                expected: "a string",
            });
            None
        }
    }
}

fn require_ranges(
    field: &'static str,
    value: &FieldValue<Vec<String>>,
    result: &mut RuleValidationResult,
) -> Option<Vec<String>> {
    let ranges = match value {
        FieldValue::Present(ranges) => ranges,
        FieldValue::Missing => {
            result.push(StructuralDefect::Missing(field));
            return None;
        }
        FieldValue::WrongType => {
            result.push(StructuralDefect::WrongType {
                field,
                expected: "a list of CIDR strings",
            });
            return None;
        }
    };

    if ranges.is_empty() {
        result.push(StructuralDefect::EmptyRanges(field));
        return None;
    }

    let mut well_formed = true;
    for cidr in ranges {
        if let Err(source) = cidr.parse::<Ipv4Cidr>() {
            well_formed = false;
            result.push(StructuralDefect::MalformedCidr {
                field,
                cidr: cidr.clone(),
                source,
            });
        }
    }

    well_formed.then(|| ranges.clone())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{ResolveError, StaticResolver};
    use vpcgate_common::iam::NETWORK_USER;
    use vpcgate_common::network::range::CidrError;

    const PROJECT: &str = "host-net";
    const USER: &str = "dev@example.com";
    const APP: SubnetRef<'static> = SubnetRef {
        project: PROJECT,
        region: "europe-west1",
        name: "app",
    };

    fn approved_resolver() -> StaticResolver {
        StaticResolver::default()
            .with_subnet(APP, ["10.0.0.0/24", "10.4.0.0/16"])
            .with_binding(APP, NETWORK_USER, "user:dev@example.com")
    }

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    fn validate(resolver: &StaticResolver, direction: RuleDirection, rule: &str) -> RuleValidationResult {
        let ctx = ValidationContext {
            host_network_project: PROJECT,
            user_email: USER,
            resolver,
        };
        validate_rule(&ctx, direction, Path::new("fw/app.yaml"), "rule-a", &yaml(rule))
    }

    #[test]
    fn test_valid_ingress_rule() {
        let resolver = approved_resolver();
        let result = validate(
            &resolver,
            RuleDirection::Ingress,
            r#"
subnet_name: app
subnet_region: europe-west1
destination_ranges: ["10.0.0.0/25", "10.4.12.0/24"]
priority: 1000
"#,
        );
        assert!(result.is_valid(), "{:?}", result.errors());
        assert_eq!(result.rule_name(), "rule-a");
        assert_eq!(result.file(), Path::new("fw/app.yaml"));
    }

    #[test]
    fn test_missing_name_and_ranges_reports_both_without_lookup() {
        let resolver = approved_resolver();
        let result = validate(&resolver, RuleDirection::Ingress, "subnet_region: europe-west1");

        assert_eq!(
            result.defects(),
            &[
                RuleDefect::Structural(StructuralDefect::Missing("subnet_name")),
                RuleDefect::Structural(StructuralDefect::Missing("destination_ranges")),
            ]
        );
        assert_eq!(resolver.lookups(), 0);
        assert_eq!(resolver.access_checks(), 0);
    }

    #[test]
    fn test_egress_requires_source_ranges() {
        let resolver = approved_resolver();
        let result = validate(
            &resolver,
            RuleDirection::Egress,
            r#"
subnet_name: app
subnet_region: europe-west1
destination_ranges: ["10.0.0.0/25"]
source_ranges: []
"#,
        );
        assert_eq!(result.errors(), vec!["source_ranges is empty"]);
        assert_eq!(resolver.lookups(), 0);
    }

    #[test]
    fn test_wrong_types_are_distinct_from_missing() {
        let resolver = approved_resolver();
        let result = validate(
            &resolver,
            RuleDirection::Ingress,
            r#"
subnet_name: [app]
subnet_region: 7
destination_ranges: "10.0.0.0/24"
"#,
        );
        assert_eq!(
            result.errors(),
            vec![
                "subnet_name must be a string",
                "subnet_region must be a string",
                "destination_ranges must be a list of CIDR strings",
            ]
        );
    }

    #[test]
    fn test_malformed_cidr_is_structural() {
        let resolver = approved_resolver();
        let result = validate(
            &resolver,
            RuleDirection::Ingress,
            r#"
subnet_name: app
subnet_region: europe-west1
destination_ranges: ["10.0.0.0/24", "10.0.0.300/32", "fd00::/8"]
"#,
        );
        assert!(matches!(
            result.defects(),
            [
                RuleDefect::Structural(StructuralDefect::MalformedCidr {
                    source: CidrError::InvalidAddress(_),
                    ..
                }),
                RuleDefect::Structural(StructuralDefect::MalformedCidr {
                    source: CidrError::Ipv6Unsupported(_),
                    ..
                }),
            ]
        ));
        assert_eq!(resolver.lookups(), 0);
    }

    #[test]
    fn test_non_mapping_rule() {
        let resolver = approved_resolver();
        let result = validate(&resolver, RuleDirection::Egress, "- 10.0.0.0/8");
        assert_eq!(result.errors(), vec!["rule definition must be a mapping"]);
    }

    #[test]
    fn test_unknown_subnet_stops_validation() {
        let resolver = approved_resolver();
        let result = validate(
            &resolver,
            RuleDirection::Egress,
            r#"
subnet_name: missing
subnet_region: europe-west1
source_ranges: ["10.0.0.0/24"]
"#,
        );
        assert!(matches!(
            result.defects(),
            [RuleDefect::SubnetResolution { direction: RuleDirection::Egress, .. }]
        ));
        let msg = &result.errors()[0];
        assert!(msg.contains("'missing'") && msg.contains("'europe-west1'") && msg.contains("'host-net'"));
        assert!(msg.contains("rule-a"));
        assert_eq!(resolver.access_checks(), 0);
    }

    #[test]
    fn test_resolution_timeout_is_recorded() {
        let resolver = StaticResolver::default()
            .with_error(APP, ResolveError::Timeout(std::time::Duration::from_secs(30)));
        let result = validate(
            &resolver,
            RuleDirection::Ingress,
            "{subnet_name: app, subnet_region: europe-west1, destination_ranges: [10.0.0.0/24]}",
        );
        assert_eq!(result.defects().len(), 1);
        assert!(result.errors()[0].contains("timed out"));
    }

    #[test]
    fn test_subnet_without_ranges() {
        let resolver = StaticResolver::default()
            .with_subnet(APP, Vec::<String>::new())
            .with_binding(APP, NETWORK_USER, "user:dev@example.com");
        let result = validate(
            &resolver,
            RuleDirection::Ingress,
            "{subnet_name: app, subnet_region: europe-west1, destination_ranges: [10.0.0.0/24]}",
        );
        assert_eq!(result.defects(), &[RuleDefect::SubnetWithoutRanges]);
        assert_eq!(resolver.access_checks(), 0);
    }

    #[test]
    fn test_every_uncontained_range_reported_then_access_checked() {
        let resolver = approved_resolver();
        let result = validate(
            &resolver,
            RuleDirection::Egress,
            r#"
subnet_name: app
subnet_region: europe-west1
source_ranges: ["10.0.0.0/23", "10.0.0.128/25", "192.168.1.0/24"]
"#,
        );
        assert_eq!(
            result.errors(),
            vec![
                "source_ranges entry '10.0.0.0/23' not part of subnet CIDR ranges",
                "source_ranges entry '192.168.1.0/24' not part of subnet CIDR ranges",
            ]
        );
        assert_eq!(resolver.access_checks(), 1);
    }

    #[test]
    fn test_unapproved_user_yields_single_access_error() {
        let resolver = StaticResolver::default()
            .with_subnet(APP, ["10.0.0.0/24"])
            .with_binding(APP, "roles/compute.networkViewer", "user:dev@example.com");
        let result = validate(
            &resolver,
            RuleDirection::Ingress,
            "{subnet_name: app, subnet_region: europe-west1, destination_ranges: [10.0.0.0/28]}",
        );
        assert_eq!(
            result.defects(),
            &[RuleDefect::AccessDenied {
                user: USER.to_string(),
                subnet: "app".to_string(),
                region: "europe-west1".to_string(),
            }]
        );
    }

    #[test]
    fn test_access_provider_error_is_recorded() {
        struct FlakyIam;
        impl SubnetResolver for FlakyIam {
            fn resolve_subnet_cidrs(&self, _: &SubnetRef<'_>) -> Result<Vec<String>, ResolveError> {
                Ok(vec!["10.0.0.0/24".to_string()])
            }
            fn has_approved_access(&self, _: &str, _: &SubnetRef<'_>) -> Result<bool, ResolveError> {
                Err(ResolveError::Provider {
                    status: 503,
                    message: "backend unavailable".to_string(),
                })
            }
        }

        let ctx = ValidationContext {
            host_network_project: PROJECT,
            user_email: USER,
            resolver: &FlakyIam,
        };
        let rule = yaml("{subnet_name: app, subnet_region: europe-west1, destination_ranges: [10.0.0.0/24]}");
        let result = validate_rule(&ctx, RuleDirection::Ingress, Path::new("a.yaml"), "r", &rule);

        assert!(matches!(result.defects(), [RuleDefect::AccessCheckFailed { .. }]));
        assert!(result.errors()[0].contains("backend unavailable"));
    }
}
