//! bpmn-forms-dashboard: prints the studio dashboard as JSON.
//!
//! Reads config from env vars (a `.env` file is honoured):
//!   BPMN_FORMS_CONFIG      : YAML config file (optional)
//!   BPMN_FORMS_STORE_DIR   : persist collections as JSON files under this dir
//!                             (default: in-memory)
//!   BPMN_FORMS_LATENCY_MS  : simulated store latency for reads and writes
//!   BPMN_FORMS_LINK_POLICY : `per_task` (default) or `per_process`

use bpmn_forms_core::{Studio, StudioConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bpmn_forms_core=debug".into()),
        )
        .init();

    let config = StudioConfig::from_env()?;
    let studio = Studio::open(&config);

    let summary = studio.dashboard().await?;
    tracing::info!(
        processes = summary.processes,
        forms = summary.forms,
        integrations = summary.integrations,
        "dashboard loaded"
    );

    let mut processes = Vec::new();
    for process in studio.list_processes().await? {
        let tasks = studio.process_tasks(process.id).await?;
        processes.push(serde_json::json!({
            "id": process.id,
            "name": process.name,
            "description": process.description,
            "tasks": tasks,
            "updatedAt": process.updated_at,
        }));
    }

    let integrations = studio.resolved_integrations().await?;
    for view in integrations.iter().filter(|v| !v.process_known || !v.form_known) {
        tracing::warn!(id = %view.integration.id, "integration references a deleted record");
    }

    let report = serde_json::json!({
        "summary": summary,
        "processes": processes,
        "integrations": integrations,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
