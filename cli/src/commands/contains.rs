use colored::*;
use tracing::warn;

use crate::terminal::{colors, print};
use vpcgate_common::network::containment;
use vpcgate_common::network::range::Ipv4Cidr;

/// Offline containment check. Returns `Ok(false)` when a range is not enclosed.
pub fn contains(candidates: &[String], subnets: &[String], quiet: u8) -> anyhow::Result<bool> {
    if !subnets.iter().any(|s| s.parse::<Ipv4Cidr>().is_ok()) {
        anyhow::bail!("none of the given subnet ranges is a valid IPv4 CIDR range");
    }

    let outcome = containment::check_containment(candidates, subnets);
    for (cidr, e) in &outcome.unparseable {
        warn!("Rejecting '{cidr}': {e}");
    }

    print::header("containment", quiet);
    for candidate in candidates {
        let enclosed: bool = !outcome.uncontained.contains(candidate)
            && !outcome.unparseable.iter().any(|(c, _)| c == candidate);
        let verdict: ColoredString = if enclosed {
            "contained".color(colors::PASS)
        } else {
            "NOT contained".color(colors::FAIL).bold()
        };
        print::aligned_line(candidate, verdict);
    }

    Ok(outcome.is_clean())
}
