// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Ed25519 task signing and verification (`ed25519-dalek`).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey, SIGNATURE_LENGTH};
use std::fmt;

use super::canonical::canonical_bytes;
use crate::domain::signature::{SignatureAlgorithm, SignatureError, TaskSigner, TaskVerifier};
use crate::domain::task::{SignedTask, Task};

/// Holds the agent's private key. Built once at startup; immutable afterwards.
pub struct Ed25519TaskSigner {
    signing_key: SigningKey,
}

impl Ed25519TaskSigner {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Parse a 32-byte seed given as hex (64 chars) or base64.
    ///
    /// Error messages never echo the encoded key.
    pub fn from_encoded(encoded: &str) -> Result<Self, SignatureError> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(SignatureError::MissingKey);
        }

        let bytes = if encoded.len() == 64 && encoded.bytes().all(|b| b.is_ascii_hexdigit()) {
            hex::decode(encoded).map_err(|_| SignatureError::Malformed("signing key is not valid hex".to_string()))?
        } else {
            STANDARD
                .decode(encoded)
                .map_err(|_| SignatureError::Malformed("signing key is neither hex nor base64".to_string()))?
        };

        let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            SignatureError::Malformed(format!("signing key must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_seed(seed))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Public key in the manifest's `trust.public_key` encoding.
    pub fn public_key_base64(&self) -> String {
        STANDARD.encode(self.verifying_key().as_bytes())
    }
}

impl fmt::Debug for Ed25519TaskSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519TaskSigner")
            .field("public_key", &self.public_key_base64())
            .finish_non_exhaustive()
    }
}

impl TaskSigner for Ed25519TaskSigner {
    fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::Ed25519
    }

    fn public_key(&self) -> Vec<u8> {
        self.verifying_key().to_bytes().to_vec()
    }

    fn sign(&self, task: Task) -> Result<SignedTask, SignatureError> {
        if task.task_name().is_empty() {
            return Err(SignatureError::Malformed("task_name is empty".to_string()));
        }
        let message = canonical_bytes(&task)?;
        let signature = self.signing_key.sign(&message);
        Ok(SignedTask {
            task,
            signature: signature.to_bytes().to_vec(),
            algorithm: SignatureAlgorithm::Ed25519.to_string(),
        })
    }
}

/// Verifies against a single trusted Ed25519 public key.
#[derive(Debug, Clone)]
pub struct Ed25519TaskVerifier {
    verifying_key: VerifyingKey,
}

impl Ed25519TaskVerifier {
    pub fn new(verifying_key: VerifyingKey) -> Self {
        Self { verifying_key }
    }

    pub fn from_bytes(public_key: &[u8]) -> Result<Self, SignatureError> {
        let key: [u8; 32] = public_key.try_into().map_err(|_| {
            SignatureError::Malformed("Invalid public key length (must be 32 bytes)".to_string())
        })?;
        let verifying_key = VerifyingKey::from_bytes(&key)
            .map_err(|e| SignatureError::Malformed(format!("Invalid public key: {}", e)))?;
        Ok(Self { verifying_key })
    }
}

impl TaskVerifier for Ed25519TaskVerifier {
    fn verify(&self, signed: &SignedTask) -> Result<(), SignatureError> {
        match signed.algorithm.parse::<SignatureAlgorithm>()? {
            SignatureAlgorithm::Ed25519 => {}
        }

        if signed.task.task_name().is_empty() {
            return Err(SignatureError::Malformed("task_name is missing".to_string()));
        }

        let sig_bytes: [u8; SIGNATURE_LENGTH] = signed.signature.as_slice().try_into().map_err(|_| {
            SignatureError::Malformed(format!(
                "Invalid signature length (must be {} bytes, got {})",
                SIGNATURE_LENGTH,
                signed.signature.len()
            ))
        })?;
        let signature = Signature::from_bytes(&sig_bytes);

        // Recomputed from the task itself; nothing supplied by the sender is trusted.
        let message = canonical_bytes(&signed.task)?;

        self.verifying_key
            .verify_strict(&message, &signature)
            .map_err(|e| SignatureError::InvalidSignature(e.to_string()))
    }
}
