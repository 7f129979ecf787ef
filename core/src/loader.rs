//! # Rule File Selection
//!
//! Decides which YAML files a run validates and loads them.
//!
//! * [`ValidationMode::All`]: every `.yaml`/`.yml` file below the rules directory.
//! * [`ValidationMode::ChangedOnly`]: the files listed in the changed-file
//!   manifest, a CSV file produced by the workflow.
//!
//! Every failure here is fatal for the run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use walkdir::WalkDir;

use vpcgate_common::config::{Config, ValidationMode};
use vpcgate_common::rules::RuleFile;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no firewall rule files selected for validation")]
    NoRuleFiles,
    #[error("cannot scan rules directory {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("changed file list {0} does not exist")]
    ManifestMissing(PathBuf),
    #[error("changed file list {0} is empty, no rules can be processed")]
    ManifestEmpty(PathBuf),
    #[error("cannot read changed file list {path}: {source}")]
    ManifestRead { path: PathBuf, source: csv::Error },
    #[error("cannot read firewall rule file {path}: {source}")]
    FileRead { path: PathBuf, source: io::Error },
    #[error("cannot parse firewall rule file {path}: {source}")]
    FileParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Selects the rule files for this run. An empty selection is an error.
pub fn select_rule_files(cfg: &Config) -> Result<Vec<PathBuf>, LoadError> {
    let files = match cfg.mode() {
        ValidationMode::All => {
            info!("Loading all firewall rule files in the current branch");
            find_rule_files(&cfg.rules_dir())?
        }
        ValidationMode::ChangedOnly => {
            info!("Loading changed firewall rule files from the changed file list");
            let manifest = manifest_path(&cfg.absolute_path, &cfg.changed_file_list);
            read_changed_files(&cfg.absolute_path, &manifest)?
        }
    };

    if files.is_empty() {
        return Err(LoadError::NoRuleFiles);
    }
    Ok(files)
}

/// Recursively collects YAML files below `dir`, sorted by path.
pub fn find_rule_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| LoadError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_yaml(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// The manifest is looked up by file name inside the repository root.
pub fn manifest_path(root: &Path, changed_file_list: &Path) -> PathBuf {
    match changed_file_list.file_name() {
        Some(name) => root.join(name),
        None => root.join(changed_file_list),
    }
}

/// Reads the changed-file manifest.
///
/// Every non-empty field is a path relative to `root`, so both a single
/// comma separated line and one file per line are accepted.
pub fn read_changed_files(root: &Path, manifest: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !manifest.is_file() {
        return Err(LoadError::ManifestMissing(manifest.to_path_buf()));
    }

    let read_err = |source| LoadError::ManifestRead {
        path: manifest.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(manifest)
        .map_err(read_err)?;

    let mut files = Vec::new();
    for record in reader.records() {
        let record = record.map_err(read_err)?;
        for field in record.iter().filter(|f| !f.is_empty()) {
            let path = root.join(field);
            info!("Changed firewall rule file {} will be validated", path.display());
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(LoadError::ManifestEmpty(manifest.to_path_buf()));
    }
    Ok(files)
}

/// Reads and parses one rule file.
pub fn load_rule_file(path: &Path) -> Result<RuleFile, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    RuleFile::parse(&text).map_err(|source| LoadError::FileParse {
        path: path.to_path_buf(),
        source,
    })
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
