// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! LLM-backed [`LanguageOracle`].
//!
//! Understanding runs at temperature 0 and must come back as a JSON
//! [`Interpretation`]; generation runs warmer and returns prose. Models often
//! wrap JSON in code fences or chatter, so [`extract_json_object`] keeps the
//! outermost `{...}` span before parsing.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::domain::conversation::ConversationState;
use crate::domain::llm::{GenerationOptions, LLMError, LLMProvider};
use crate::domain::manifest::AgentManifest;
use crate::domain::oracle::{Interpretation, LanguageOracle, OracleError};
use crate::infrastructure::prompt_template_engine::{
    PromptContext, PromptTemplateEngine, GENERATION_SYSTEM_PROMPT, UNDERSTANDING_SYSTEM_PROMPT,
};

pub struct LlmOracle {
    provider: Arc<dyn LLMProvider>,
    manifest: Arc<AgentManifest>,
    templates: PromptTemplateEngine,
    understanding_template: Option<String>,
    generation_template: Option<String>,
}

impl LlmOracle {
    pub fn new(provider: Arc<dyn LLMProvider>, manifest: Arc<AgentManifest>) -> Self {
        Self {
            provider,
            manifest,
            templates: PromptTemplateEngine::new(),
            understanding_template: None,
            generation_template: None,
        }
    }

    pub fn with_templates(mut self, understanding: Option<String>, generation: Option<String>) -> Self {
        self.understanding_template = understanding;
        self.generation_template = generation;
        self
    }

    /// Check configured template overrides compile.
    pub fn validate_templates(&self) -> anyhow::Result<()> {
        for template in [&self.understanding_template, &self.generation_template]
            .into_iter()
            .flatten()
        {
            self.templates.validate_template(template)?;
        }
        Ok(())
    }

    fn base_context(&self, state: &ConversationState) -> Result<PromptContext, OracleError> {
        let mut context = PromptContext::new()
            .manifest(&self.manifest)
            .state(to_pretty(state)?);
        if let Some(booking) = &state.booking_context {
            context = context.booking_context(to_pretty(booking)?);
        }
        Ok(context)
    }
}

fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String, OracleError> {
    serde_json::to_string_pretty(value).map_err(|e| OracleError::Malformed(e.to_string()))
}

fn unavailable(err: LLMError) -> OracleError {
    OracleError::Unavailable(err.to_string())
}

/// Outermost `{...}` span of `raw`, if any.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Parse model output into an [`Interpretation`].
pub fn parse_interpretation(raw: &str) -> Result<Interpretation, OracleError> {
    let json = extract_json_object(raw)
        .ok_or_else(|| OracleError::Malformed("no JSON object in oracle output".to_string()))?;
    let mut interpretation: Interpretation =
        serde_json::from_str(json).map_err(|e| OracleError::Malformed(e.to_string()))?;

    // Models sometimes answer "" instead of null
    if interpretation.intent.as_deref().is_some_and(|i| i.trim().is_empty()) {
        interpretation.intent = None;
    }
    Ok(interpretation)
}

#[async_trait]
impl LanguageOracle for LlmOracle {
    async fn understand(
        &self,
        state: &ConversationState,
        user_input: &str,
    ) -> Result<Interpretation, OracleError> {
        let context = self.base_context(state)?.input(user_input);
        let prompt = self
            .templates
            .render_understanding(self.understanding_template.as_deref(), &context)
            .map_err(|e| OracleError::Unavailable(format!("{:#}", e)))?;

        let response = self
            .provider
            .generate(UNDERSTANDING_SYSTEM_PROMPT, &prompt, &GenerationOptions::understanding())
            .await
            .map_err(unavailable)?;

        debug!(
            provider = self.provider.provider_name(),
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "Understanding completed"
        );

        parse_interpretation(&response.text)
    }

    async fn generate(
        &self,
        state: &ConversationState,
        task_results: &Value,
        user_prompt: &str,
    ) -> Result<String, OracleError> {
        let context = self
            .base_context(state)?
            .input(user_prompt)
            .task_results(to_pretty(task_results)?);
        let prompt = self
            .templates
            .render_generation(self.generation_template.as_deref(), &context)
            .map_err(|e| OracleError::Unavailable(format!("{:#}", e)))?;

        let response = self
            .provider
            .generate(GENERATION_SYSTEM_PROMPT, &prompt, &GenerationOptions::generation())
            .await
            .map_err(unavailable)?;

        let text = response.text.trim();
        if text.is_empty() {
            return Err(OracleError::Malformed("empty reply from oracle".to_string()));
        }
        Ok(text.to_string())
    }
}
