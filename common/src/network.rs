//! IPv4 range arithmetic used to check firewall rules against subnet allocations.

pub mod containment;
pub mod range;
