//! Run-artefact retrieval from the backing object store.
//!
//! The store itself is an external collaborator reached through the `aws`
//! CLI; the gate only needs "list keys under a prefix" and "download one
//! object", so both sit behind a trait and tests substitute an in-memory
//! store.
use crate::gate::GateError;
use crate::report::RunReport;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Bucket holding run artefacts unless RESULTS_BUCKET overrides it.
pub const DEFAULT_BUCKET: &str = "mojap-derived-tables";

/// Listing and retrieval capabilities of the backing object store.
pub trait ObjectStore {
    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;
    fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<()>;
}

/// Object store reached by shelling out to the `aws` CLI on PATH, which
/// carries the ambient credential configuration of the calling workflow.
pub struct AwsCliStore {
    bin: PathBuf,
}

impl AwsCliStore {
    pub fn locate() -> Result<Self> {
        let bin = which::which("aws").context("locate aws CLI on PATH")?;
        Ok(Self { bin })
    }
}

impl ObjectStore for AwsCliStore {
    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let output = Command::new(&self.bin)
            .args([
                "s3api",
                "list-objects-v2",
                "--bucket",
                bucket,
                "--prefix",
                prefix,
                "--query",
                "Contents[].Key",
                "--output",
                "json",
            ])
            .output()
            .with_context(|| format!("run {} s3api list-objects-v2", self.bin.display()))?;
        if !output.status.success() {
            return Err(anyhow!(
                "list s3://{bucket}/{prefix}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let body = stdout.trim();
        // An empty prefix yields literal null from --query.
        if body.is_empty() || body == "null" {
            return Ok(Vec::new());
        }
        let keys: Vec<String> =
            serde_json::from_str(body).context("parse list-objects-v2 key listing")?;
        Ok(keys)
    }

    fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<()> {
        let uri = format!("s3://{bucket}/{key}");
        let output = Command::new(&self.bin)
            .args(["s3", "cp", &uri])
            .arg(dest)
            .arg("--only-show-errors")
            .output()
            .with_context(|| format!("run {} s3 cp", self.bin.display()))?;
        if !output.status.success() {
            return Err(anyhow!(
                "download {uri}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(())
    }
}

/// Fetch and parse every run_results shard for an environment/workflow pair,
/// ordered oldest attempt first.
///
/// Shard keys sort lexicographically in attempt order as written by the
/// upstream pipeline. Downloads stage into a temporary directory that is
/// removed on every exit path. Zero matching keys is fatal; so is a shard
/// that fails to parse, since a malformed artefact could hide a real failure.
pub fn fetch_run_reports(
    store: &dyn ObjectStore,
    bucket: &str,
    deploy_env: &str,
    workflow_name: &str,
) -> Result<Vec<RunReport>, GateError> {
    let prefix = format!("{deploy_env}/run_artefacts/{workflow_name}/latest/target/");
    let shard_re = Regex::new(r"run_results_\d+\.json$").expect("regex for shard keys");

    let mut keys: Vec<String> = store
        .list_keys(bucket, &prefix)?
        .into_iter()
        .filter(|key| shard_re.is_match(key) || key.ends_with("run_results.json"))
        .collect();
    if keys.is_empty() {
        return Err(GateError::NotFound { prefix });
    }
    keys.sort();

    let staging = tempfile::tempdir().map_err(GateError::Io)?;
    let mut reports = Vec::with_capacity(keys.len());
    for key in &keys {
        let file_name = Path::new(key)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("shard_{}.json", reports.len()));
        let dest = staging.path().join(file_name);
        tracing::info!(bucket, key = key.as_str(), "downloading run_results shard");
        store.download(bucket, key, &dest)?;
        let content = fs::read_to_string(&dest).map_err(GateError::Io)?;
        let report: RunReport = serde_json::from_str(&content).map_err(|source| {
            GateError::Parse {
                key: key.clone(),
                source,
            }
        })?;
        reports.push(report);
    }
    Ok(reports)
}
