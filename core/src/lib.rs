//! # vpcgate core
//!
//! Validation engine for shared VPC firewall rule files.
//!
//! * [`loader`]: selects and parses the rule files of a run.
//! * [`resolver`]: the [`resolver::SubnetResolver`] contract and its implementations.
//! * [`validator`]: validates a single rule.
//! * [`pipeline`]: runs the validator over every selected rule.

pub mod loader;
pub mod pipeline;
pub mod resolver;
pub mod validator;
