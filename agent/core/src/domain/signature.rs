// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Task Signing (domain seam)
//!
//! Domain-level abstraction over task signing and verification. The dialogue
//! engine only knows [`TaskSigner`]; orchestrator-side code only knows
//! [`TaskVerifier`]. The Ed25519 implementation lives in
//! [`crate::infrastructure::signing`].
//!
//! ## Security
//!
//! Verifiers **must** recompute the canonical bytes from the task they were
//! handed. A verifier never accepts a caller-supplied digest or payload blob.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::task::{SignedTask, Task};

/// Signature schemes a verifier can dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    Ed25519,
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ed25519 => "Ed25519",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ed25519" => Ok(Self::Ed25519),
            other => Err(SignatureError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// No private key available. Raised at startup, never at first sign.
    #[error("signing key is missing")]
    MissingKey,

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Structurally unusable input: bad lengths, undecodable key, non-canonical task.
    #[error("malformed signed task: {0}")]
    Malformed(String),
}

/// Produces [`SignedTask`]s. Implementations hold immutable key material.
pub trait TaskSigner: Send + Sync {
    fn algorithm(&self) -> SignatureAlgorithm;

    /// Raw public key bytes matching the signing key.
    fn public_key(&self) -> Vec<u8>;

    fn sign(&self, task: Task) -> Result<SignedTask, SignatureError>;
}

/// Checks [`SignedTask`]s against a trusted public key.
pub trait TaskVerifier: Send + Sync {
    /// # Errors
    ///
    /// Every failure is an error value; malformed input never panics.
    fn verify(&self, signed: &SignedTask) -> Result<(), SignatureError>;

    fn is_valid(&self, signed: &SignedTask) -> bool {
        self.verify(signed).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_round_trips_through_identifier() {
        let alg: SignatureAlgorithm = "Ed25519".parse().unwrap();
        assert_eq!(alg, SignatureAlgorithm::Ed25519);
        assert_eq!(alg.to_string(), "Ed25519");
    }

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        assert_eq!(
            "ECDSA-P256".parse::<SignatureAlgorithm>(),
            Err(SignatureError::UnsupportedAlgorithm("ECDSA-P256".to_string()))
        );
        // identifiers are case sensitive
        assert!("ed25519".parse::<SignatureAlgorithm>().is_err());
    }
}
