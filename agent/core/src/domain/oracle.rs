// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Language Oracle Domain Interface (Anti-Corruption Layer)
//!
//! Natural-language understanding and generation are external and
//! non-deterministic. This narrow interface is the only contact the dialogue
//! policy has with them: structured [`Interpretation`] in, plain text out.
//! Implementations live in `crate::infrastructure::llm_oracle`; tests use
//! scripted stubs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use crate::domain::conversation::ConversationState;

/// Structured reading of one user utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    /// Intent named by the utterance, if any. `None` keeps the current intent.
    #[serde(default)]
    pub intent: Option<String>,

    /// Slot values found in the utterance. A `null` value withdraws a slot.
    #[serde(default)]
    pub slot_updates: BTreeMap<String, Value>,

    /// Yes/no answer to a confirmation prompt.
    #[serde(default)]
    pub confirmation: Option<bool>,

    /// Slots the user declined when answering "no".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected_slots: Vec<String>,
}

impl Interpretation {
    pub fn with_intent(intent: impl Into<String>) -> Self {
        Self {
            intent: Some(intent.into()),
            ..Self::default()
        }
    }

    pub fn slot(mut self, name: impl Into<String>, value: Value) -> Self {
        self.slot_updates.insert(name.into(), value);
        self
    }

    pub fn confirm(mut self, answer: bool) -> Self {
        self.confirmation = Some(answer);
        self
    }
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle did not answer within {0:?}")]
    Timeout(Duration),

    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("oracle returned malformed output: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait LanguageOracle: Send + Sync {
    /// Map an utterance plus the current state to an [`Interpretation`].
    async fn understand(
        &self,
        state: &ConversationState,
        user_input: &str,
    ) -> Result<Interpretation, OracleError>;

    /// Phrase a reply to the user from the results of an executed task.
    async fn generate(
        &self,
        state: &ConversationState,
        task_results: &Value,
        user_prompt: &str,
    ) -> Result<String, OracleError>;
}
