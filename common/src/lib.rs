//! # vpcgate common
//!
//! Domain models shared by the validation engine and the command line:
//!
//! * [`network`]: IPv4 CIDR parsing and the containment check.
//! * [`rules`]: typed view over firewall rule files.
//! * [`validation`]: per-rule results and the run report.
//! * [`iam`]: subnet IAM policies and the approved role set.
//! * [`config`]: run configuration read from the action inputs.

pub mod config;
pub mod iam;
pub mod network;
pub mod rules;
pub mod validation;
