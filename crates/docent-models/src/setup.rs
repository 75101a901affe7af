//! Model builder — constructs the configured backend at startup.
//!
//! This is the one place allowed to fail on bad configuration; once a
//! model is built, every call on it is total.

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::info;

use docent_core::config::schema::ModelConfig;

use crate::chat::ChatModel;
use crate::completion::CompletionModel;
use crate::hello::HelloModel;
use crate::traits::ResponseModel;

/// Build the backend named by `config.backend`.
pub fn build_model(config: &ModelConfig) -> Result<Arc<dyn ResponseModel>> {
    let model: Arc<dyn ResponseModel> = match config.backend.as_str() {
        "hello" => Arc::new(HelloModel::new()),
        "completion" => {
            require_api_key(config)?;
            Arc::new(CompletionModel::new(config))
        }
        "chat" => {
            require_api_key(config)?;
            Arc::new(ChatModel::new(config)?)
        }
        other => bail!(
            "unknown model backend '{other}' (expected 'hello', 'completion', or 'chat')"
        ),
    };

    info!(
        backend = model.display_name(),
        model = %config.name,
        "response model ready"
    );
    Ok(model)
}

fn require_api_key(config: &ModelConfig) -> Result<()> {
    if config.api_key.is_empty() {
        bail!(
            "backend '{}' needs an API key (set model.apiKey or OPENAI_API_KEY)",
            config.backend
        );
    }
    Ok(())
}
