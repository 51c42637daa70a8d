//! Models command implementation.

use anyhow::Result;
use colored::Colorize;
use comfy_table::Table;
use rover_models::ModelType;
use serde::Serialize;

use crate::config::{RoverConfig, env_key_name};

/// One configured model.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ModelEntry {
    pub role: &'static str,
    pub model_id: String,
    pub provider: Option<String>,
    pub credential_status: &'static str,
}

/// Execute the models command.
pub fn execute(config: &RoverConfig, json_output: bool) -> Result<()> {
    let entries = entries(config);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}", format!("Configured Models ({})", entries.len()).bold().cyan());

    let mut table = Table::new();
    table.set_header(vec!["Role", "Model", "Provider", "Credentials"]);
    for entry in &entries {
        table.add_row(vec![
            entry.role.to_string(),
            entry.model_id.clone(),
            entry.provider.clone().unwrap_or_else(|| "unknown".to_string()),
            entry.credential_status.to_string(),
        ]);
    }
    println!("{table}");
    println!("Temperatures: {:?}, max tokens: {}", config.temperatures, config.max_tokens);
    Ok(())
}

fn entries(config: &RoverConfig) -> Vec<ModelEntry> {
    [("orchestrator", &config.orchestrator_model), ("codewriter", &config.codewriter_model)]
        .into_iter()
        .map(|(role, model_id)| {
            let provider = ModelType::detect(model_id).ok();
            let credential_status = match provider {
                None => "unsupported",
                Some(p) if !p.requires_api_key() => "not required",
                Some(p) if config.api_key(p).is_some() => "available",
                Some(p) => {
                    tracing::debug!(key = env_key_name(p), "API key missing");
                    "missing"
                }
            };
            ModelEntry {
                role,
                model_id: model_id.clone(),
                provider: provider.map(|p| p.to_string()),
                credential_status,
            }
        })
        .collect()
}
