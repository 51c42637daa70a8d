//! Command implementations for the rover CLI.

pub mod agent;
pub mod code;
pub mod models;

use std::sync::Arc;

use anyhow::{Context, Result};
use rover_abstraction::Model;
use rover_models::ModelFactory;

use crate::config::RoverConfig;

/// Builds the model for `model_id` from the loaded configuration.
pub fn build_model(config: &RoverConfig, model_id: &str) -> Result<Arc<dyn Model>> {
    let model_config = config.model_config(model_id)?;
    ModelFactory::create(&model_config)
        .with_context(|| format!("Failed to initialize model '{}'", model_id))
}
