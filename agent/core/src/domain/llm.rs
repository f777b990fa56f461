// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! LLM provider seam.
//!
//! The LLM-backed language oracle talks to model vendors only through
//! [`LLMProvider`]. Adapters live in `crate::infrastructure::llm`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Complete `prompt` under a fixed system instruction.
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError>;

    /// Adapter name for logs, e.g. `"openai"`.
    fn provider_name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_tokens: Option<u32>,

    /// 0.0 = deterministic
    pub temperature: Option<f32>,

    /// Ask the vendor for a JSON-only answer where supported.
    #[serde(default)]
    pub json_output: bool,
}

impl GenerationOptions {
    /// Settings for intent/slot extraction: deterministic, JSON out.
    pub fn understanding() -> Self {
        Self {
            max_tokens: Some(2048),
            temperature: Some(0.0),
            json_output: true,
        }
    }

    /// Settings for user-facing replies.
    pub fn generation() -> Self {
        Self {
            max_tokens: Some(2048),
            temperature: Some(0.7),
            json_output: false,
        }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::generation()
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub text: String,
    pub model: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),
}
