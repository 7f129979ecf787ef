use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vpcgate_common::config::{
    ABS_PATH, CHANGED_FILE_LIST, Config, GCP_HOST_NETWORK_PROJECT, RULES_PATH, USER_EMAIL,
    VALIDATE_ALL,
};
use vpcgate_common::iam::{ApprovedRoles, NETWORK_USER};
use vpcgate_core::resolver::{StaticResolver, SubnetRef};

pub const HOST_PROJECT: &str = "host-net";
pub const USER: &str = "dev@example.com";
pub const MANIFEST: &str = "changed_files.csv";

pub const APP: SubnetRef<'static> = SubnetRef {
    project: HOST_PROJECT,
    region: "europe-west1",
    name: "app",
};

pub const DATA: SubnetRef<'static> = SubnetRef {
    project: HOST_PROJECT,
    region: "europe-west1",
    name: "data",
};

/// A throwaway repository checkout with a `firewall/` rules directory.
pub struct Repo {
    dir: TempDir,
}

impl Repo {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        fs::create_dir_all(dir.path().join("firewall")).expect("failed to create rules dir");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `contents` to `rel` below the repository root.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        fs::write(&path, contents).expect("failed to write file");
        path
    }

    pub fn config(&self, validate_all: bool) -> Config {
        let mut env: HashMap<&str, String> = HashMap::new();
        env.insert(ABS_PATH, self.root().display().to_string());
        env.insert(RULES_PATH, "firewall".to_string());
        env.insert(VALIDATE_ALL, validate_all.to_string());
        env.insert(USER_EMAIL, USER.to_string());
        env.insert(CHANGED_FILE_LIST, format!("/home/runner/work/{MANIFEST}"));
        env.insert(GCP_HOST_NETWORK_PROJECT, HOST_PROJECT.to_string());

        Config::from_lookup(|key| env.get(key).cloned()).expect("config should load")
    }
}

/// Both subnets exist and the user may use both.
pub fn granted_resolver() -> StaticResolver {
    let member = format!("user:{USER}");
    StaticResolver::new(ApprovedRoles::default())
        .with_subnet(APP, ["10.10.0.0/24", "10.20.0.0/16"])
        .with_subnet(DATA, ["10.30.0.0/24"])
        .with_binding(APP, NETWORK_USER, &member)
        .with_binding(DATA, NETWORK_USER, &member)
}

pub const CLEAN_RULES: &str = r#"
ingress:
  allow-https:
    subnet_name: app
    subnet_region: europe-west1
    destination_ranges: ["10.10.0.0/25", "10.20.4.0/22"]
egress:
  to-data:
    subnet_name: data
    subnet_region: europe-west1
    source_ranges: ["10.30.0.16/28"]
"#;

pub const BROKEN_RULES: &str = r#"
ingress:
  leaks-out:
    subnet_name: app
    subnet_region: europe-west1
    destination_ranges: ["10.10.0.0/23"]
  no-region:
    subnet_name: app
    destination_ranges: ["10.10.0.0/25"]
"#;
