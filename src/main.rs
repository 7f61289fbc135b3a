use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cli;
mod datasets;
mod gate;
mod ids;
mod report;
mod store;

use cli::RootArgs;
use gate::GateError;
use ids::PROD_ENV;
use store::{AwsCliStore, DEFAULT_BUCKET};

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.log_level.as_deref());
    tracing::info!("starting run_results gate");

    let deploy_env = non_empty_env("DEPLOY_ENV");
    let workflow_name = non_empty_env("WORKFLOW_NAME");
    tracing::info!(
        deploy_env = deploy_env.as_deref().unwrap_or("<unset>"),
        workflow_name = workflow_name.as_deref().unwrap_or("<unset>"),
        "loaded environment"
    );

    let mut unique_ids = Vec::new();
    if !args.check_all_nodes {
        unique_ids = ids::parse_unique_ids(&args.unique_ids);
        if let Some(path) = resolve_yaml_path(args.unique_id_yaml.clone()) {
            let dataset_target = non_empty_env("DATASET_TARGET").ok_or_else(|| {
                GateError::Config(
                    "DATASET_TARGET is required when using --unique-id-yaml".to_string(),
                )
            })?;
            let content = fs::read_to_string(&path)
                .with_context(|| format!("read {}", path.display()))?;
            unique_ids.extend(datasets::dataset_model_ids(&content, &dataset_target));
        }
        if unique_ids.is_empty() {
            return Err(GateError::Config(
                "at least one unique_id is required via --unique-id or --unique-id-yaml"
                    .to_string(),
            )
            .into());
        }
        tracing::info!(count = unique_ids.len(), "resolved unique_ids");
    }

    let (Some(deploy_env), Some(workflow_name)) = (deploy_env, workflow_name) else {
        return Err(GateError::Config(
            "DEPLOY_ENV and WORKFLOW_NAME are required to locate run_results shards".to_string(),
        )
        .into());
    };

    if !args.check_all_nodes && deploy_env != PROD_ENV {
        unique_ids = unique_ids
            .iter()
            .map(|unique_id| ids::apply_env_to_model_id(unique_id, Some(&deploy_env)))
            .collect();
        tracing::info!(
            count = unique_ids.len(),
            deploy_env = deploy_env.as_str(),
            "adjusted unique_ids for deploy environment"
        );
    }

    let bucket = env::var("RESULTS_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string());
    let object_store = AwsCliStore::locate()?;
    let reports = store::fetch_run_reports(&object_store, &bucket, &deploy_env, &workflow_name)?;
    tracing::info!(count = reports.len(), "fetched run_results shards");

    if args.check_all_nodes {
        gate::validate_all_nodes(&deploy_env, &workflow_name, &reports)?;
    } else {
        gate::validate_unique_ids(&unique_ids, &deploy_env, &workflow_name, &reports)?;
    }
    tracing::info!("validation completed");
    Ok(())
}

fn init_tracing(cli_level: Option<&str>) {
    let level = cli_level
        .map(str::to_string)
        .or_else(|| env::var("LOG_LEVEL").ok())
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn resolve_yaml_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    let default = PathBuf::from(cli::DEFAULT_UNIQUE_ID_YAML);
    if default.exists() {
        tracing::info!(path = cli::DEFAULT_UNIQUE_ID_YAML, "using default unique_id YAML path");
        Some(default)
    } else {
        None
    }
}
