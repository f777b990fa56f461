// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Prompt Template Engine
//!
//! Renders the language oracle's prompts with Handlebars. HTML escaping is
//! disabled: prompts embed JSON verbatim.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Transform templates with placeholders into final prompts
//! - **Integration:** conversation state + manifest → LLM input
//!
//! # Supported Placeholders
//!
//! - `{{agent}}` - Manifest `metadata.name`
//! - `{{#each capabilities}}` - `name`, `description`, `slots` (`name`, `required`)
//! - `{{state}}` - Conversation state as pretty JSON
//! - `{{booking_context}}` - Remembered search item as JSON, when present
//! - `{{input}}` - The user's utterance or follow-up prompt
//! - `{{task_results}}` - Results of an executed task as pretty JSON

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};

use crate::domain::manifest::AgentManifest;

/// System instruction for intent and slot extraction.
pub const UNDERSTANDING_SYSTEM_PROMPT: &str = r#"You are the language understanding component of a task agent.
Read the conversation state and the user's latest message and answer with ONE JSON object, nothing else:
{"intent": <capability name or null>, "slot_updates": {<slot>: <value>}, "confirmation": <true, false or null>, "rejected_slots": [<slot>]}
Rules:
- "intent" is null when the user continues the current request; name a capability only when the user asks for one.
- "slot_updates" only contains values the user gave in THIS message, using declared slot names.
- "confirmation" is true or false only when the user answers a yes/no question.
- "rejected_slots" lists the slots the user wants to change when answering no."#;

/// System instruction for user-facing replies after a task ran.
pub const GENERATION_SYSTEM_PROMPT: &str = r#"You are a friendly, helpful conversational assistant.
Answer the user's request using the task results provided as JSON.
- Present the relevant details naturally; do not expose internal identifiers.
- If the results are empty, say politely that nothing matched.
- If the results contain an error, apologise and explain it in plain words."#;

const DEFAULT_UNDERSTANDING_TEMPLATE: &str = r#"Agent: {{agent}}
Capabilities:
{{#each capabilities}}
- {{name}}{{#if description}}: {{description}}{{/if}}
  slots: {{#each slots}}{{name}}{{#if required}} (required){{/if}}{{#unless @last}}, {{/unless}}{{/each}}
{{/each}}

Current conversation state:
{{state}}
{{#if booking_context}}
Item from the last search:
{{booking_context}}
{{/if}}

User: {{input}}"#;

const DEFAULT_GENERATION_TEMPLATE: &str = r#"Original request: "{{input}}"

Conversation state:
{{state}}

Task results:
{{task_results}}"#;

// ============================================================================
// Template Context
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityView {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub slots: Vec<SlotView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotView {
    pub name: String,
    pub required: bool,
}

/// Context data for prompt template rendering
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,

    #[serde(default)]
    pub capabilities: Vec<CapabilityView>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_context: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_results: Option<String>,
}

impl PromptContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agent name and capability list from the manifest
    pub fn manifest(mut self, manifest: &AgentManifest) -> Self {
        self.agent = Some(manifest.metadata.name.clone());
        self.capabilities = manifest
            .spec
            .capabilities
            .iter()
            .map(|c| CapabilityView {
                name: c.name.clone(),
                description: c.description.clone(),
                slots: c
                    .slots
                    .iter()
                    .map(|s| SlotView {
                        name: s.name.clone(),
                        required: s.required,
                    })
                    .collect(),
            })
            .collect();
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn booking_context(mut self, context: impl Into<String>) -> Self {
        self.booking_context = Some(context.into());
        self
    }

    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn task_results(mut self, results: impl Into<String>) -> Self {
        self.task_results = Some(results.into());
        self
    }
}

// ============================================================================
// Template Engine
// ============================================================================

pub struct PromptTemplateEngine {
    handlebars: Handlebars<'static>,
}

impl PromptTemplateEngine {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    pub fn render(&self, template: &str, context: &PromptContext) -> Result<String> {
        self.handlebars
            .render_template(template, context)
            .context("Failed to render prompt template")
    }

    pub fn render_understanding(&self, template: Option<&str>, context: &PromptContext) -> Result<String> {
        self.render(template.unwrap_or(DEFAULT_UNDERSTANDING_TEMPLATE), context)
    }

    pub fn render_generation(&self, template: Option<&str>, context: &PromptContext) -> Result<String> {
        self.render(template.unwrap_or(DEFAULT_GENERATION_TEMPLATE), context)
    }

    /// Validate template syntax without rendering
    pub fn validate_template(&self, template: &str) -> Result<()> {
        handlebars::template::Template::compile(template)
            .map(|_| ())
            .context("Invalid Handlebars template syntax")
    }
}

impl Default for PromptTemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}
