//! IAM policy model for shared VPC subnets.

use std::collections::BTreeSet;

use serde::Deserialize;

pub const NETWORK_USER: &str = "roles/compute.networkUser";
pub const NETWORK_ADMIN: &str = "roles/compute.networkAdmin";

/// Roles that allow a user to attach firewall rules to a subnet.
///
/// Matching is an exact string comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovedRoles(BTreeSet<String>);

impl ApprovedRoles {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(roles.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for ApprovedRoles {
    fn default() -> Self {
        Self::new([NETWORK_USER, NETWORK_ADMIN])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IamBinding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// The subset of a subnet's IAM policy the access check reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IamPolicy {
    #[serde(default)]
    pub bindings: Vec<IamBinding>,
}

impl IamPolicy {
    /// True when `user:<email>` is a direct member of a binding with an approved role.
    ///
    /// Groups and service accounts are not expanded.
    pub fn grants(&self, email: &str, approved: &ApprovedRoles) -> bool {
        let member = format!("user:{email}");
        self.bindings
            .iter()
            .filter(|binding| approved.contains(&binding.role))
            .any(|binding| binding.members.iter().any(|m| *m == member))
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
