//! # Run Configuration
//!
//! All inputs are provided by the GitHub Action as environment variables and
//! read once at startup. Every required key has its own error so the workflow
//! log points at the exact missing input.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::iam::ApprovedRoles;

pub const ABS_PATH: &str = "ABS_PATH";
pub const RULES_PATH: &str = "RULES_PATH";
pub const VALIDATE_ALL: &str = "VALIDATE_ALL";
pub const USER_EMAIL: &str = "USER_EMAIL";
pub const CHANGED_FILE_LIST: &str = "CHANGED_FILE_LIST";
pub const GCP_HOST_NETWORK_PROJECT: &str = "GCP_HOST_NETWORK_PROJECT";
pub const TIMEOUT_SECS: &str = "VPCGATE_TIMEOUT_SECS";
pub const COMPUTE_API_URL: &str = "GCP_COMPUTE_API_URL";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("required input '{input}' not provided ({key} is unset)")]
    Missing {
        key: &'static str,
        input: &'static str,
    },
    #[error("input '{input}' must be 'true' or 'false', '{value}' is not valid")]
    InvalidBool { input: &'static str, value: String },
    #[error("{key} must be a positive number of seconds, '{value}' is not valid")]
    InvalidTimeout { key: &'static str, value: String },
}

/// Which rule files a run selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Every rule file under the rules directory.
    All,
    /// Only files listed in the changed-file manifest.
    ChangedOnly,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Shared VPC host project that owns the subnets.
    pub host_network_project: String,
    /// Repository root, relative paths are resolved against it.
    pub absolute_path: PathBuf,
    /// Rules directory relative to `absolute_path`.
    pub rules_path: PathBuf,
    pub validate_all: bool,
    /// Acting user, checked against the subnet IAM policy.
    pub user_email: String,
    /// Changed-file manifest (CSV).
    pub changed_file_list: PathBuf,
    /// Upper bound for each call to the cloud provider.
    pub timeout: Duration,
    pub compute_api_url: Option<String>,
    pub approved_roles: ApprovedRoles,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str, input: &'static str| {
            lookup(key).ok_or(ConfigError::Missing { key, input })
        };

        let absolute_path = required(ABS_PATH, "abs-path")?;
        let rules_path = required(RULES_PATH, "rules-path")?;
        let validate_all = required(VALIDATE_ALL, "validate-all")?;
        let validate_all = parse_bool(&validate_all).ok_or(ConfigError::InvalidBool {
            input: "validate-all",
            value: validate_all,
        })?;
        let user_email = required(USER_EMAIL, "user-email")?;
        let changed_file_list = required(CHANGED_FILE_LIST, "changed-file-list")?;
        let host_network_project = required(GCP_HOST_NETWORK_PROJECT, "gcp-host-network-project")?;

        let timeout = match lookup(TIMEOUT_SECS) {
            Some(value) => parse_timeout(&value).ok_or(ConfigError::InvalidTimeout {
                key: TIMEOUT_SECS,
                value,
            })?,
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            host_network_project,
            absolute_path: PathBuf::from(absolute_path),
            rules_path: PathBuf::from(rules_path),
            validate_all,
            user_email,
            changed_file_list: PathBuf::from(changed_file_list),
            timeout,
            compute_api_url: lookup(COMPUTE_API_URL).filter(|url| !url.is_empty()),
            approved_roles: ApprovedRoles::default(),
        })
    }

    pub fn mode(&self) -> ValidationMode {
        if self.validate_all {
            ValidationMode::All
        } else {
            ValidationMode::ChangedOnly
        }
    }

    /// Directory scanned in [`ValidationMode::All`].
    pub fn rules_dir(&self) -> PathBuf {
        self.absolute_path.join(&self.rules_path)
    }
}

/// Accepts the same spellings as the workflow inputs historically did:
/// `1`, `t`, `true` and `0`, `f`, `false`, case-insensitive.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

fn parse_timeout(value: &str) -> Option<Duration> {
    match value.trim().parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
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
