// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Error taxonomy for the agent.
//!
//! [`ConfigurationError`] is startup-only and fatal. [`ProtocolError`] is
//! per-request: the transport maps each variant to a rejection and the caller's
//! state is handed back unchanged.

use thiserror::Error;

use crate::domain::oracle::OracleError;
use crate::domain::signature::SignatureError;

/// Fatal startup error. The process refuses to start when one of these occurs.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("agent credential is not configured")]
    MissingCredential,

    #[error("signing key is not configured")]
    MissingKey,

    #[error("signing key is invalid: {0}")]
    InvalidKey(String),

    #[error("manifest is invalid: {0}")]
    InvalidManifest(String),

    #[error("signing key does not match the manifest trust key")]
    TrustKeyMismatch,

    #[error("secret reference '{reference}' could not be resolved: {reason}")]
    UnresolvedSecret { reference: String, reason: String },

    #[error("configuration is invalid: {0}")]
    Invalid(String),
}

/// Per-request protocol failure.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("authorization failed: {0}")]
    Authorization(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("oracle failure: {0}")]
    Oracle(#[from] OracleError),

    #[error("integrity failure: {0}")]
    Integrity(#[from] SignatureError),
}

impl ProtocolError {
    /// Stable machine-readable name used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authorization(_) => "AuthorizationError",
            Self::Validation(_) => "ValidationError",
            Self::Oracle(_) => "OracleError",
            Self::Integrity(_) => "IntegrityError",
        }
    }
}
