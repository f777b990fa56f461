// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod canonical;
pub mod ed25519;

pub use canonical::{canonical_bytes, CANONICAL_DOMAIN_TAG};
pub use ed25519::{Ed25519TaskSigner, Ed25519TaskVerifier};

use crate::domain::manifest::TrustSpec;
use crate::domain::signature::{SignatureAlgorithm, SignatureError, TaskVerifier};

/// Build the verifier matching a manifest's trust section.
///
/// Fails on an unknown algorithm or a key that is not a valid public key.
pub fn verifier_for_trust(trust: &TrustSpec) -> Result<Box<dyn TaskVerifier>, SignatureError> {
    let algorithm: SignatureAlgorithm = trust.algorithm.parse()?;
    let key = trust.public_key_bytes().map_err(SignatureError::Malformed)?;
    match algorithm {
        SignatureAlgorithm::Ed25519 => Ok(Box::new(Ed25519TaskVerifier::from_bytes(&key)?)),
    }
}
