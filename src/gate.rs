//! Status reconciliation across run_results shards.
//!
//! Retried pipeline runs append new shards, so reconciliation is a "did it
//! ever finish successfully" check: folding shards oldest-first, a success is
//! sticky and is never revoked by a later status, while the last-seen status
//! is retained purely for diagnostics on failure.
use crate::report::RunReport;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// The single terminal status accepted for explicitly requested ids.
pub const SUCCESS_STATUS: &str = "success";

/// Terminal statuses accepted in check-all-nodes mode; dbt tests report
/// "pass" or "warn" rather than "success".
const ACCEPTABLE_NODE_STATUSES: &[&str] = &["success", "pass", "warn"];

/// Everything that can stop the gate. All variants are fatal and propagate to
/// the process boundary; nothing is retried internally.
#[derive(Debug, Error)]
pub enum GateError {
    /// Required configuration is absent or resolves to nothing to check.
    #[error("{0}")]
    Config(String),
    /// No run_results artefacts exist for the environment/workflow pair.
    #[error("no run_results shards found under prefix {prefix}")]
    NotFound { prefix: String },
    /// A retrieved artefact is not valid run_results JSON.
    #[error("parse run_results shard {key}: {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// The gate itself failed: requested ids are missing or never succeeded.
    #[error("{}", validation_message(.missing, .failed))]
    Validation {
        missing: Vec<String>,
        failed: Vec<(String, String)>,
    },
    /// Check-all-nodes mode found nothing it is responsible for.
    #[error("no model or test nodes found in run_results shards")]
    NoNodes,
    /// The object-store collaborator failed to list or download.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn validation_message(missing: &[String], failed: &[(String, String)]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("Missing unique_id(s): {}", missing.join(", ")));
    }
    if !failed.is_empty() {
        let failed_msg = failed
            .iter()
            .map(|(unique_id, status)| format!("{unique_id}={status}"))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("Non-success status(es): {failed_msg}"));
    }
    parts.join("; ")
}

fn require_context(deploy_env: &str, workflow_name: &str) -> Result<(), GateError> {
    if deploy_env.is_empty() || workflow_name.is_empty() {
        return Err(GateError::Config(
            "DEPLOY_ENV and WORKFLOW_NAME are required to locate run_results shards".to_string(),
        ));
    }
    Ok(())
}

/// Check that every requested unique_id reached status "success" in at least
/// one shard.
///
/// Shards are folded in chronological order: each occurrence of a requested
/// id overwrites its last-seen status, and an exact "success" sets a sticky
/// flag that later statuses never clear. Ids never observed at all are
/// reported as missing, distinct from ids observed but never successful.
pub fn validate_unique_ids(
    unique_ids: &[String],
    deploy_env: &str,
    workflow_name: &str,
    reports: &[RunReport],
) -> Result<(), GateError> {
    require_context(deploy_env, workflow_name)?;

    let mut succeeded: HashMap<&str, bool> =
        unique_ids.iter().map(|id| (id.as_str(), false)).collect();
    let mut last_status: HashMap<&str, String> = HashMap::new();

    for report in reports {
        let statuses = report.status_index();
        for unique_id in unique_ids {
            let Some(status) = statuses.get(unique_id.as_str()) else {
                continue;
            };
            last_status.insert(unique_id, status.clone());
            if status == SUCCESS_STATUS {
                succeeded.insert(unique_id, true);
            }
        }
    }

    let mut missing = Vec::new();
    let mut failed = Vec::new();
    for unique_id in unique_ids {
        match last_status.get(unique_id.as_str()) {
            None => {
                tracing::error!(unique_id = unique_id.as_str(), "not found in any shard");
                missing.push(unique_id.clone());
            }
            Some(status) => {
                tracing::info!(
                    unique_id = unique_id.as_str(),
                    status = status.as_str(),
                    "final observed status"
                );
                if !succeeded[unique_id.as_str()] {
                    failed.push((unique_id.clone(), status.clone()));
                }
            }
        }
    }

    if !missing.is_empty() || !failed.is_empty() {
        return Err(GateError::Validation { missing, failed });
    }

    println!(
        "All {} unique_id(s) finished with status=success.",
        unique_ids.len()
    );
    Ok(())
}

/// Check that every model and test node observed across the shards reached an
/// acceptable terminal status, with the same sticky semantics as
/// [`validate_unique_ids`]. Other node kinds (snapshots, seeds) are ignored,
/// and finding no model or test node at all is an error.
pub fn validate_all_nodes(
    deploy_env: &str,
    workflow_name: &str,
    reports: &[RunReport],
) -> Result<(), GateError> {
    require_context(deploy_env, workflow_name)?;

    // BTreeMap keeps the failure enumeration in a stable order.
    let mut acceptable: BTreeMap<String, bool> = BTreeMap::new();
    let mut last_status: BTreeMap<String, String> = BTreeMap::new();

    for report in reports {
        for (unique_id, status) in report.status_index() {
            if !unique_id.starts_with("model.") && !unique_id.starts_with("test.") {
                continue;
            }
            let reached = ACCEPTABLE_NODE_STATUSES.contains(&status.as_str());
            last_status.insert(unique_id.clone(), status);
            let entry = acceptable.entry(unique_id).or_insert(false);
            if reached {
                *entry = true;
            }
        }
    }

    if acceptable.is_empty() {
        return Err(GateError::NoNodes);
    }

    let failed: Vec<(String, String)> = acceptable
        .iter()
        .filter(|(_, reached)| !**reached)
        .map(|(unique_id, _)| {
            let status = last_status
                .get(unique_id)
                .cloned()
                .unwrap_or_else(|| "unknown".to_string());
            (unique_id.clone(), status)
        })
        .collect();

    if !failed.is_empty() {
        return Err(GateError::Validation {
            missing: Vec::new(),
            failed,
        });
    }

    println!(
        "All {} model/test node(s) completed successfully.",
        acceptable.len()
    );
    Ok(())
}
