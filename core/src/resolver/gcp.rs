//! Compute Engine v1 REST implementation of [`SubnetResolver`].
//!
//! Two endpoints are used:
//! * `GET .../regions/{region}/subnetworks/{name}` for the CIDR ranges.
//! * `GET .../regions/{region}/subnetworks/{name}/getIamPolicy` for the bindings.
//!
//! Access tokens come from `GOOGLE_OAUTH_ACCESS_TOKEN` or
//! `CLOUDSDK_AUTH_ACCESS_TOKEN` (exported by the usual GitHub auth step) and
//! fall back to the metadata server when running on GCP.

use std::cell::RefCell;
use std::time::Duration;

use reqwest::{StatusCode, Url};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use vpcgate_common::config::Config;
use vpcgate_common::iam::{ApprovedRoles, IamPolicy};

use super::{ResolveError, SubnetRef, SubnetResolver};

pub const DEFAULT_COMPUTE_API: &str = "https://compute.googleapis.com/compute/v1";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const TOKEN_ENV_VARS: [&str; 2] = ["GOOGLE_OAUTH_ACCESS_TOKEN", "CLOUDSDK_AUTH_ACCESS_TOKEN"];

#[derive(Debug, Clone)]
enum TokenSource {
    Static(String),
    /// Token endpoint of the metadata server.
    MetadataServer(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Subnetwork {
    #[serde(default)]
    ip_cidr_range: Option<String>,
    #[serde(default)]
    secondary_ip_ranges: Vec<SecondaryRange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecondaryRange {
    ip_cidr_range: String,
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct GcpComputeResolver {
    client: Client,
    base_url: Url,
    timeout: Duration,
    approved_roles: ApprovedRoles,
    token_source: TokenSource,
    token: RefCell<Option<String>>,
}

impl GcpComputeResolver {
    /// Builds a resolver from the run configuration, picking up a token from
    /// the environment when one is exported.
    pub fn from_config(cfg: &Config) -> Result<Self, ResolveError> {
        let token_source = TOKEN_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|t| !t.is_empty()))
            .map_or_else(
                || TokenSource::MetadataServer(METADATA_TOKEN_URL.to_string()),
                TokenSource::Static,
            );

        Self::build(
            cfg.compute_api_url.as_deref().unwrap_or(DEFAULT_COMPUTE_API),
            cfg.timeout,
            cfg.approved_roles.clone(),
            token_source,
        )
    }

    /// Resolver with a fixed bearer token.
    pub fn with_token(
        base_url: &str,
        timeout: Duration,
        approved_roles: ApprovedRoles,
        token: impl Into<String>,
    ) -> Result<Self, ResolveError> {
        Self::build(base_url, timeout, approved_roles, TokenSource::Static(token.into()))
    }

    fn build(
        base_url: &str,
        timeout: Duration,
        approved_roles: ApprovedRoles,
        token_source: TokenSource,
    ) -> Result<Self, ResolveError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ResolveError::Transport(format!("invalid compute API URL '{base_url}'")))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vpcgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ResolveError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout,
            approved_roles,
            token_source,
            token: RefCell::new(None),
        })
    }

    /// Appends the subnet path to the API base, one escaped segment per value.
    ///
    /// Region and name come from rule files, a `/` in them must never reach
    /// another project.
    fn subnet_url(&self, subnet: &SubnetRef<'_>, method: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "projects",
                subnet.project,
                "regions",
                subnet.region,
                "subnetworks",
                subnet.name,
            ]);
            segments.extend(method);
        }
        url
    }

    fn access_token(&self) -> Result<String, ResolveError> {
        if let Some(token) = self.token.borrow().as_ref() {
            return Ok(token.clone());
        }

        let token = match &self.token_source {
            TokenSource::Static(token) => token.clone(),
            TokenSource::MetadataServer(token_url) => {
                debug!("Requesting access token from the metadata server");
                let request = self
                    .client
                    .get(token_url.as_str())
                    .header("Metadata-Flavor", "Google");
                let response = self
                    .send(request)
                    .map_err(|e| ResolveError::Auth(e.to_string()))?;
                decode::<MetadataToken>(response)
                    .map_err(|e| ResolveError::Auth(e.to_string()))?
                    .access_token
            }
        };

        *self.token.borrow_mut() = Some(token.clone());
        Ok(token)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ResolveError> {
        debug!("GET {url}");
        let token = self.access_token()?;
        let response = self.send(self.client.get(url).bearer_auth(token))?;
        decode(response)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, ResolveError> {
        request.send().map_err(|e| {
            if e.is_timeout() {
                ResolveError::Timeout(self.timeout)
            } else {
                ResolveError::Transport(e.to_string())
            }
        })
    }
}

impl SubnetResolver for GcpComputeResolver {
    fn resolve_subnet_cidrs(&self, subnet: &SubnetRef<'_>) -> Result<Vec<String>, ResolveError> {
        let subnetwork: Subnetwork = self.get_json(self.subnet_url(subnet, None))?;
        Ok(collect_ranges(subnetwork))
    }

    fn has_approved_access(&self, email: &str, subnet: &SubnetRef<'_>) -> Result<bool, ResolveError> {
        let url = self.subnet_url(subnet, Some("getIamPolicy"));
        let policy: IamPolicy = self.get_json(url)?;
        Ok(policy.grants(email, &self.approved_roles))
    }
}

fn collect_ranges(subnetwork: Subnetwork) -> Vec<String> {
    subnetwork
        .ip_cidr_range
        .filter(|primary| !primary.is_empty())
        .into_iter()
        .chain(subnetwork.secondary_ip_ranges.into_iter().map(|r| r.ip_cidr_range))
        .collect()
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ResolveError> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|e| ResolveError::Transport(e.to_string()))?;

    if status == StatusCode::NOT_FOUND {
        return Err(ResolveError::NotFound);
    }
    if !status.is_success() {
        return Err(ResolveError::Provider {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    serde_json::from_str(&body).map_err(|e| ResolveError::Decode(e.to_string()))
}

/// Pulls `error.message` out of a Google API error body, or returns the body as is.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
