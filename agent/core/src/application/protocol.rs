// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Protocol Facade
//!
//! The two operations the transport boundary exposes:
//!
//! - [`ProtocolFacade::advance_turn`]: oracle understanding, then dialogue policy
//! - [`ProtocolFacade::generate_followup`]: oracle generation over task results
//!
//! Both are stateless. The caller supplies [`ConversationState`] and stores the
//! returned one. Every oracle call is bounded by a timeout, and any failure
//! leaves the caller's state exactly as it was: the error carries no state,
//! the boundary hands back what it received.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::application::dialogue_engine::{DialogueEngine, TurnOutcome, TurnReply};
use crate::domain::conversation::ConversationState;
use crate::domain::errors::ProtocolError;
use crate::domain::manifest::AgentManifest;
use crate::domain::oracle::{LanguageOracle, OracleError};
use crate::domain::signature::TaskSigner;

pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub struct FollowupOutcome {
    pub new_state: ConversationState,
    pub response_text: String,
}

pub struct ProtocolFacade {
    manifest: Arc<AgentManifest>,
    engine: DialogueEngine,
    oracle: Arc<dyn LanguageOracle>,
    oracle_timeout: Duration,
}

impl ProtocolFacade {
    pub fn new(
        manifest: Arc<AgentManifest>,
        signer: Arc<dyn TaskSigner>,
        oracle: Arc<dyn LanguageOracle>,
    ) -> Self {
        Self {
            engine: DialogueEngine::new(manifest.clone(), signer),
            manifest,
            oracle,
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }

    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    pub fn manifest(&self) -> &AgentManifest {
        &self.manifest
    }

    pub fn oracle_timeout(&self) -> Duration {
        self.oracle_timeout
    }

    /// Run one dialogue turn.
    ///
    /// `user_auth_token` is the end user's token presented alongside the
    /// request; it is required for and echoed with tasks whose capability is
    /// flagged `requires_user_auth`.
    pub async fn advance_turn(
        &self,
        state: ConversationState,
        user_input: &str,
        user_auth_token: Option<&str>,
    ) -> Result<TurnOutcome, ProtocolError> {
        let result = self.try_advance_turn(&state, user_input, user_auth_token).await;
        record_turn(&result);
        result
    }

    async fn try_advance_turn(
        &self,
        state: &ConversationState,
        user_input: &str,
        user_auth_token: Option<&str>,
    ) -> Result<TurnOutcome, ProtocolError> {
        if user_input.trim().is_empty() {
            return Err(ProtocolError::Validation("user_input is empty".to_string()));
        }
        state.validate_against(&self.manifest)?;

        let interpretation = self.bounded(self.oracle.understand(state, user_input)).await?;
        debug!(
            intent = ?interpretation.intent,
            slots = interpretation.slot_updates.len(),
            confirmation = ?interpretation.confirmation,
            "Oracle interpretation"
        );

        let outcome = self.engine.advance(state, &interpretation, user_auth_token)?;
        if let TurnReply::Task { signed_task, .. } = &outcome.reply {
            info!(task = %signed_task.task.task_name(), "Emitting signed task");
        }
        Ok(outcome)
    }

    /// Phrase a reply from the results of an executed task. Never signs.
    ///
    /// On success the booking context is updated from `task_results`.
    pub async fn generate_followup(
        &self,
        state: ConversationState,
        task_results: &Value,
        user_prompt: &str,
    ) -> Result<FollowupOutcome, ProtocolError> {
        state.validate_against(&self.manifest)?;

        let response_text = self
            .bounded(self.oracle.generate(&state, task_results, user_prompt))
            .await
            .inspect_err(|e| warn!("Follow-up generation failed: {}", e))?;

        metrics::counter!("ztap_followups_total").increment(1);
        Ok(FollowupOutcome {
            new_state: state.with_task_results(task_results),
            response_text,
        })
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = Result<T, OracleError>>,
    ) -> Result<T, ProtocolError> {
        match tokio::time::timeout(self.oracle_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                metrics::counter!("ztap_oracle_failures_total", "reason" => "error").increment(1);
                Err(e.into())
            }
            Err(_) => {
                metrics::counter!("ztap_oracle_failures_total", "reason" => "timeout").increment(1);
                Err(OracleError::Timeout(self.oracle_timeout).into())
            }
        }
    }
}

fn record_turn(result: &Result<TurnOutcome, ProtocolError>) {
    let outcome = match result {
        Ok(TurnOutcome {
            reply: TurnReply::Task { .. },
            ..
        }) => {
            metrics::counter!("ztap_tasks_signed_total").increment(1);
            "task"
        }
        Ok(_) => "reply",
        Err(e) => {
            warn!(kind = e.kind(), "Turn rejected: {}", e);
            "rejected"
        }
    };
    metrics::counter!("ztap_turns_total", "outcome" => outcome).increment(1);
}
