use std::cell::Cell;
use std::collections::HashMap;

use vpcgate_common::iam::{ApprovedRoles, IamBinding, IamPolicy};

use super::{ResolveError, SubnetRef, SubnetResolver};

type SubnetKey = (String, String, String);

fn key(subnet: &SubnetRef<'_>) -> SubnetKey {
    (
        subnet.project.to_string(),
        subnet.region.to_string(),
        subnet.name.to_string(),
    )
}

/// Resolver backed by subnet and policy data held in memory.
///
/// Role matching goes through [`IamPolicy::grants`], the same path the GCP
/// resolver uses.
#[derive(Debug, Default)]
pub struct StaticResolver {
    subnets: HashMap<SubnetKey, Vec<String>>,
    policies: HashMap<SubnetKey, IamPolicy>,
    errors: HashMap<SubnetKey, ResolveError>,
    approved_roles: ApprovedRoles,
    lookups: Cell<usize>,
    access_checks: Cell<usize>,
}

impl StaticResolver {
    pub fn new(approved_roles: ApprovedRoles) -> Self {
        Self {
            approved_roles,
            ..Self::default()
        }
    }

    /// Registers a subnet with its primary and secondary ranges.
    pub fn with_subnet<I, S>(mut self, subnet: SubnetRef<'_>, ranges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subnets
            .insert(key(&subnet), ranges.into_iter().map(Into::into).collect());
        self
    }

    /// Adds `member` (e.g. `user:dev@example.com`) to a binding on the subnet.
    pub fn with_binding(mut self, subnet: SubnetRef<'_>, role: &str, member: &str) -> Self {
        let policy = self.policies.entry(key(&subnet)).or_default();
        match policy.bindings.iter_mut().find(|b| b.role == role) {
            Some(binding) => binding.members.push(member.to_string()),
            None => policy.bindings.push(IamBinding {
                role: role.to_string(),
                members: vec![member.to_string()],
            }),
        }
        self
    }

    /// Makes every call for the subnet fail with `error`.
    pub fn with_error(mut self, subnet: SubnetRef<'_>, error: ResolveError) -> Self {
        self.errors.insert(key(&subnet), error);
        self
    }

    /// Number of subnet range lookups served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }

    /// Number of access checks served so far.
    pub fn access_checks(&self) -> usize {
        self.access_checks.get()
    }
}

impl SubnetResolver for StaticResolver {
    fn resolve_subnet_cidrs(&self, subnet: &SubnetRef<'_>) -> Result<Vec<String>, ResolveError> {
        self.lookups.set(self.lookups.get() + 1);
        let key = key(subnet);
        if let Some(err) = self.errors.get(&key) {
            return Err(err.clone());
        }
        self.subnets.get(&key).cloned().ok_or(ResolveError::NotFound)
    }

    fn has_approved_access(&self, email: &str, subnet: &SubnetRef<'_>) -> Result<bool, ResolveError> {
        self.access_checks.set(self.access_checks.get() + 1);
        let key = key(subnet);
        if let Some(err) = self.errors.get(&key) {
            return Err(err.clone());
        }
        Ok(self
            .policies
            .get(&key)
            .is_some_and(|policy| policy.grants(email, &self.approved_roles)))
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
