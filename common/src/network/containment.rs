//! # CIDR Containment
//!
//! Decides which candidate ranges are not fully enclosed by any single
//! authority range.
//!
//! A candidate is contained when both its network address and its last
//! address (under the candidate's own mask) fall inside one authority block.

use tracing::warn;

use crate::network::range::{CidrError, Ipv4Cidr};

/// Outcome of checking a set of candidate ranges against authority ranges.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ContainmentOutcome {
    /// Candidates that parsed but are not enclosed by any authority, in input order.
    pub uncontained: Vec<String>,
    /// Candidates that could not be parsed, in input order.
    pub unparseable: Vec<(String, CidrError)>,
}

impl ContainmentOutcome {
    pub fn is_clean(&self) -> bool {
        self.uncontained.is_empty() && self.unparseable.is_empty()
    }
}

/// Checks every candidate against the authority set.
///
/// Authorities that do not parse are skipped with a warning.
pub fn check_containment<C, A>(candidates: &[C], authorities: &[A]) -> ContainmentOutcome
where
    C: AsRef<str>,
    A: AsRef<str>,
{
    let authorities = parse_authorities(authorities);

    let mut outcome = ContainmentOutcome::default();
    for raw in candidates {
        let raw = raw.as_ref();
        match is_enclosed(raw, &authorities) {
            Ok(true) => {}
            Ok(false) => outcome.uncontained.push(raw.to_string()),
            Err(e) => outcome.unparseable.push((raw.to_string(), e)),
        }
    }
    outcome
}

/// Returns every candidate not enclosed by any single authority, in input order.
///
/// Unparseable candidates are treated as uncontained.
pub fn find_uncontained<C, A>(candidates: &[C], authorities: &[A]) -> Vec<String>
where
    C: AsRef<str>,
    A: AsRef<str>,
{
    let authorities = parse_authorities(authorities);

    candidates
        .iter()
        .map(|c| c.as_ref())
        .filter(|raw| !matches!(is_enclosed(raw, &authorities), Ok(true)))
        .map(str::to_string)
        .collect()
}

fn parse_authorities<A: AsRef<str>>(authorities: &[A]) -> Vec<Ipv4Cidr> {
    authorities
        .iter()
        .filter_map(|raw| match raw.as_ref().parse::<Ipv4Cidr>() {
            Ok(cidr) => Some(cidr),
            Err(e) => {
                warn!("Skipping subnet range: {e}");
                None
            }
        })
        .collect()
}

fn is_enclosed(candidate: &str, authorities: &[Ipv4Cidr]) -> Result<bool, CidrError> {
    let candidate: Ipv4Cidr = candidate.parse()?;
    Ok(authorities.iter().any(|auth| auth.encloses(&candidate)))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
