//! # IPv4 CIDR Model
//!
//! Parses CIDR notation (`10.0.0.0/24`) into a network value and exposes the
//! first and last address it covers.
//!
//! Firewall rules declare *candidate* ranges, resolved subnets provide
//! *authority* ranges. Both are represented by [`Ipv4Cidr`].

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use pnet::ipnetwork::Ipv4Network;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    #[error("'{0}' is not in CIDR notation (expected address/prefix)")]
    MissingPrefix(String),
    #[error("invalid IPv4 address in '{0}'")]
    InvalidAddress(String),
    #[error("invalid prefix length in '{0}'")]
    InvalidPrefix(String),
    #[error("'{0}' is an IPv6 range; only IPv4 ranges are supported")]
    Ipv6Unsupported(String),
}

/// A parsed IPv4 network: address plus prefix length.
///
/// The address keeps whatever host bits were written (`10.10.1.0/16`),
/// [`Ipv4Cidr::first`] and [`Ipv4Cidr::last`] always work on the masked network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    network: Ipv4Network,
}

impl Ipv4Cidr {
    pub fn new(addr: Ipv4Addr, prefix: u8) -> Result<Self, CidrError> {
        let network = Ipv4Network::new(addr, prefix)
            .map_err(|_| CidrError::InvalidPrefix(format!("{addr}/{prefix}")))?;
        Ok(Self { network })
    }

    /// The network address (all host bits cleared).
    pub fn first(&self) -> Ipv4Addr {
        self.network.network()
    }

    /// The highest address under this range's own mask (all host bits set).
    pub fn last(&self) -> Ipv4Addr {
        self.network.broadcast()
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.network.contains(addr)
    }

    /// True when every address of `other` also lies inside `self`.
    ///
    /// Both blocks are contiguous and power-of-two aligned, so checking the
    /// first and last address of `other` is enough.
    pub fn encloses(&self, other: &Ipv4Cidr) -> bool {
        self.contains(other.first()) && self.contains(other.last())
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network.ip(), self.network.prefix())
    }
}

impl FromStr for Ipv4Cidr {
    type Err = CidrError;

    /// Parses `a.b.c.d/p` with `p <= 32`.
    ///
    /// Host bits may be set, they are masked off when computing the span.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some((ip_str, prefix_str)) = s.split_once('/') else {
            return Err(CidrError::MissingPrefix(s.to_string()));
        };

        if ip_str.parse::<Ipv6Addr>().is_ok() {
            return Err(CidrError::Ipv6Unsupported(s.to_string()));
        }

        let addr = ip_str
            .parse::<Ipv4Addr>()
            .map_err(|_| CidrError::InvalidAddress(s.to_string()))?;

        if prefix_str.is_empty() || !prefix_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CidrError::InvalidPrefix(s.to_string()));
        }
        let prefix = prefix_str
            .parse::<u8>()
            .map_err(|_| CidrError::InvalidPrefix(s.to_string()))?;

        Self::new(addr, prefix).map_err(|_| CidrError::InvalidPrefix(s.to_string()))
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
