//! Integration coverage for the configuration-error exit paths, which need
//! neither credentials nor an object store.

use std::path::Path;
use std::process::{Command, Output};

fn run_gate(args: &[&str], env: &[(&str, &str)], cwd: &Path) -> Output {
    let bin = env!("CARGO_BIN_EXE_rgate");
    let mut command = Command::new(bin);
    command
        .args(args)
        .current_dir(cwd)
        .env_remove("DEPLOY_ENV")
        .env_remove("WORKFLOW_NAME")
        .env_remove("DATASET_TARGET")
        .env_remove("RESULTS_BUCKET");
    for (key, value) in env {
        command.env(key, value);
    }
    command.output().expect("run rgate")
}

#[test]
fn missing_deploy_env_fails_before_any_retrieval() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let output = run_gate(
        &["--unique-id", "model.foo"],
        &[("WORKFLOW_NAME", "wf")],
        temp_dir.path(),
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("DEPLOY_ENV"),
        "stderr should name the missing variable: {stderr}"
    );
}

#[test]
fn missing_workflow_name_fails_before_any_retrieval() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let output = run_gate(
        &["--unique-id", "model.foo"],
        &[("DEPLOY_ENV", "dev")],
        temp_dir.path(),
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("WORKFLOW_NAME"), "stderr: {stderr}");
}

#[test]
fn yaml_config_without_dataset_target_fails() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let yaml_path = temp_dir.path().join("trigger.yaml");
    std::fs::write(
        &yaml_path,
        "datasets:\n  - name: ds\n    models: \"model.foo\"\n",
    )
    .expect("write yaml fixture");

    let output = run_gate(
        &["--unique-id-yaml", yaml_path.to_str().expect("utf-8 path")],
        &[("DEPLOY_ENV", "dev"), ("WORKFLOW_NAME", "wf")],
        temp_dir.path(),
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("DATASET_TARGET"), "stderr: {stderr}");
}

#[test]
fn no_resolved_unique_ids_fails() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let output = run_gate(
        &[],
        &[("DEPLOY_ENV", "dev"), ("WORKFLOW_NAME", "wf")],
        temp_dir.path(),
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("at least one unique_id"),
        "stderr: {stderr}"
    );
}

#[test]
fn yaml_config_with_unmatched_target_resolves_no_ids() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let yaml_path = temp_dir.path().join("trigger.yaml");
    std::fs::write(
        &yaml_path,
        "datasets:\n  - name: ds\n    models: \"model.foo\"\n",
    )
    .expect("write yaml fixture");

    let output = run_gate(
        &["--unique-id-yaml", yaml_path.to_str().expect("utf-8 path")],
        &[
            ("DEPLOY_ENV", "dev"),
            ("WORKFLOW_NAME", "wf"),
            ("DATASET_TARGET", "other_ds"),
        ],
        temp_dir.path(),
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("at least one unique_id"),
        "stderr: {stderr}"
    );
}
