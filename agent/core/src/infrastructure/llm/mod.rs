// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure - Anti-Corruption Layer Implementations
//
// Each adapter translates between the domain `LLMProvider` interface and one
// vendor API. `create_provider` picks the adapter named in the oracle config.

pub mod ollama;
pub mod openai;

use std::sync::Arc;
use tracing::info;

use crate::domain::agent_config::{resolve_secret, OracleConfig};
use crate::domain::errors::ConfigurationError;
use crate::domain::llm::LLMProvider;

use ollama::OllamaAdapter;
use openai::OpenAIAdapter;

/// Create a provider instance from configuration
pub fn create_provider(config: &OracleConfig) -> Result<Arc<dyn LLMProvider>, ConfigurationError> {
    let api_key = match &config.api_key {
        Some(reference) => resolve_secret(reference)?,
        // local providers without auth
        None => String::new(),
    };

    let provider: Arc<dyn LLMProvider> = match config.provider.as_str() {
        "openai" | "openai-compatible" => Arc::new(OpenAIAdapter::new(
            config.endpoint.clone(),
            api_key,
            config.model.clone(),
        )),
        "ollama" => Arc::new(OllamaAdapter::new(config.endpoint.clone(), config.model.clone())),
        other => {
            return Err(ConfigurationError::Invalid(format!(
                "Unsupported oracle provider: {}",
                other
            )))
        }
    };

    info!(
        "Initialized LLM provider '{}' (model {})",
        provider.provider_name(),
        config.model
    );
    Ok(provider)
}
