//! CLI argument parsing for the run_results gate.
//!
//! The CLI is intentionally thin: the deploy environment, workflow name, and
//! dataset target come from the process environment so the same invocation
//! works unchanged across automation environments.
use clap::Parser;
use std::path::PathBuf;

/// Conventional location of the generated trigger config when the upstream
/// repository is checked out alongside the gate. Mostly for local testing.
pub const DEFAULT_UNIQUE_ID_YAML: &str =
    "./create-a-derived-table/scripts/data/airflow-dag-trigger.yaml";

/// Root CLI entrypoint for the run_results gate.
#[derive(Parser, Debug)]
#[command(
    name = "rgate",
    version,
    about = "Check dbt run_results for specific unique_id statuses. Exits non-zero if any are missing or not success.",
    after_help = "Environment:\n  DEPLOY_ENV      Deploy environment the artefacts were written for (required)\n  WORKFLOW_NAME   Workflow whose run artefacts are checked (required)\n  DATASET_TARGET  Dataset block to read from the YAML config (required with --unique-id-yaml)\n  RESULTS_BUCKET  Bucket holding run artefacts (optional override)\n  LOG_LEVEL       Logging level when --log-level is not given\n\nExamples:\n  rgate --unique-id model.db.orders__base\n  rgate --unique-id model.a,model.b --unique-id model.c\n  rgate --unique-id-yaml ./airflow-dag-trigger.yaml\n  rgate --check-all-nodes"
)]
pub struct RootArgs {
    /// Unique ID(s) to check; repeat the flag or pass a comma-separated list
    #[arg(long = "unique-id", value_name = "ID", num_args = 1..)]
    pub unique_ids: Vec<String>,

    /// Path to a YAML config listing models per dataset; DATASET_TARGET
    /// selects the dataset block
    #[arg(long, value_name = "PATH")]
    pub unique_id_yaml: Option<PathBuf>,

    /// Validate every model and test node instead of a specific id list
    #[arg(long, conflicts_with_all = ["unique_ids", "unique_id_yaml"])]
    pub check_all_nodes: bool,

    /// Logging level (overrides LOG_LEVEL; default info)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}
