// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Credential Gate
//!
//! Single pre-shared bearer credential per deployment. Every request presents
//! it out-of-band; the gate answers authorized or denied before any protocol
//! logic runs.
//!
//! Both sides are reduced to SHA-256 digests and compared with
//! [`subtle::ConstantTimeEq`], so neither content nor length of the presented
//! value influences timing. Credential values are never logged; the `Debug`
//! impl is redacted.

use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;

use crate::domain::errors::ConfigurationError;

/// Opaque shared secret.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    /// Wrap a configured secret. Empty or whitespace-only values count as unset.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigurationError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(ConfigurationError::MissingCredential);
        }
        Ok(Self(secret))
    }

    fn digest(&self) -> [u8; 32] {
        Sha256::digest(self.0.as_bytes()).into()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Authorized,
    Denied,
}

/// Holds the expected credential for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct CredentialGate {
    expected_digest: [u8; 32],
}

impl CredentialGate {
    pub fn new(expected: &Credential) -> Self {
        Self {
            expected_digest: expected.digest(),
        }
    }

    /// Check a presented credential. `None` (nothing presented) is denied.
    pub fn check(&self, presented: Option<&str>) -> GateDecision {
        let Some(presented) = presented else {
            return GateDecision::Denied;
        };
        let presented: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        if bool::from(presented.as_slice().ct_eq(self.expected_digest.as_slice())) {
            GateDecision::Authorized
        } else {
            GateDecision::Denied
        }
    }

    pub fn is_authorized(&self, presented: Option<&str>) -> bool {
        self.check(presented) == GateDecision::Authorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_credential_is_authorized() {
        let gate = CredentialGate::new(&Credential::new("s3cret-token").unwrap());
        assert_eq!(gate.check(Some("s3cret-token")), GateDecision::Authorized);
    }

    #[test]
    fn test_mismatch_and_absence_are_denied() {
        let gate = CredentialGate::new(&Credential::new("s3cret-token").unwrap());
        assert_eq!(gate.check(Some("s3cret-tokeN")), GateDecision::Denied);
        assert_eq!(gate.check(Some("s3cret-token-and-more")), GateDecision::Denied);
        assert_eq!(gate.check(Some("")), GateDecision::Denied);
        assert_eq!(gate.check(None), GateDecision::Denied);
    }

    #[test]
    fn test_unset_credential_is_a_configuration_error() {
        assert!(matches!(
            Credential::new(""),
            Err(ConfigurationError::MissingCredential)
        ));
        assert!(matches!(
            Credential::new("   "),
            Err(ConfigurationError::MissingCredential)
        ));
    }

    #[test]
    fn test_debug_output_is_redacted() {
        let credential = Credential::new("hunter2").unwrap();
        let rendered = format!("{:?} {:?}", credential, CredentialGate::new(&credential));
        assert!(!rendered.contains("hunter2"));
    }
}
