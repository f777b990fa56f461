// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use thiserror::Error;
use ztap_core::domain::conversation::ConversationState;
use ztap_core::domain::signature::SignatureError;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The agent answered with its error envelope.
    #[error("agent returned {status} {kind}: {message}")]
    Agent {
        status: u16,
        kind: String,
        message: String,
        /// The state the agent handed back; equal to the state that was sent.
        new_state: Option<ConversationState>,
    },

    /// A signed task failed verification. The task must not be executed.
    #[error("integrity check failed: {0}")]
    Integrity(#[from] SignatureError),

    #[error("trust key unusable: {0}")]
    Trust(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl SdkError {
    /// Error kind as named by the protocol, when the agent supplied one.
    pub fn kind(&self) -> &str {
        match self {
            SdkError::Agent { kind, .. } => kind,
            SdkError::Integrity(_) => "IntegrityError",
            SdkError::Http(_) | SdkError::Trust(_) | SdkError::Decode(_) => "ClientError",
        }
    }
}
