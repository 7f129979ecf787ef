//! The boundary between rule validation and the cloud provider.
//!
//! Validation only needs two answers about a subnet: which CIDR blocks it owns
//! and whether the acting user may attach rules to it. [`SubnetResolver`] is
//! that contract. [`gcp`] answers it from the Compute Engine API, [`memory`]
//! from data held in memory.
//!
//! **Architectural Note:**
//! The validator depends on the trait only. Every call is blocking and must
//! return within the resolver's own timeout, a timeout is reported as a
//! [`ResolveError`] like any other lookup failure.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub mod gcp;
pub mod memory;

pub use gcp::GcpComputeResolver;
pub use memory::StaticResolver;

/// Identifies a subnet inside the shared VPC host project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubnetRef<'a> {
    pub project: &'a str,
    pub region: &'a str,
    pub name: &'a str,
}

impl<'a> SubnetRef<'a> {
    pub fn new(project: &'a str, region: &'a str, name: &'a str) -> Self {
        Self {
            project,
            region,
            name,
        }
    }
}

impl fmt::Display for SubnetRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/regions/{}/subnetworks/{}",
            self.project, self.region, self.name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("subnet not found")]
    NotFound,
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("could not obtain an access token: {0}")]
    Auth(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Answers subnet questions for the validator.
pub trait SubnetResolver {
    /// Returns the subnet's primary range followed by its secondary ranges,
    /// in the order the provider declares them.
    fn resolve_subnet_cidrs(&self, subnet: &SubnetRef<'_>) -> Result<Vec<String>, ResolveError>;

    /// True when `email` holds an approved role on the subnet.
    fn has_approved_access(&self, email: &str, subnet: &SubnetRef<'_>) -> Result<bool, ResolveError>;
}
