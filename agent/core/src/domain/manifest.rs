// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Manifest
//!
//! Static, publicly readable description of what the agent can do and how to
//! verify what it signs. Loaded once at startup, shared read-only, served
//! verbatim on the manifest endpoint.
//!
//! ```yaml
//! apiVersion: ztap.dev/v1
//! kind: AgentManifest
//! metadata:
//!   name: flight-desk
//!   version: "1.0.0"
//! spec:
//!   capabilities:
//!     - name: BOOK_FLIGHT
//!       requires_user_auth: true
//!       slots:
//!         - name: origin
//!           prompt: "Where are you flying from?"
//!         - name: destination
//!         - name: date
//!   trust:
//!     algorithm: Ed25519
//!     public_key: "<base64 32-byte key>"
//! ```
//!
//! Intent names are resolved against `spec.capabilities` only through
//! [`AgentManifest::resolve_capability`]; an undeclared name is a
//! [`ProtocolError::Validation`], never a panic.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::domain::errors::ProtocolError;
use crate::domain::signature::SignatureAlgorithm;

pub const MANIFEST_API_VERSION: &str = "ztap.dev/v1";
pub const MANIFEST_KIND: &str = "AgentManifest";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentManifest {
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: AgentManifestSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestMetadata {
    pub name: String,

    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentManifestSpec {
    /// Reply used when no intent is active and the oracle found none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,

    pub capabilities: Vec<CapabilitySpec>,

    pub trust: TrustSpec,
}

/// One intent the agent understands and the task it emits for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilitySpec {
    /// Intent name; also the emitted `task_name`.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declaration order drives prompting order.
    pub slots: Vec<SlotSpec>,

    #[serde(default)]
    pub requires_confirmation: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_prompt: Option<String>,

    /// The caller's user token is echoed with the task and required for it.
    #[serde(default)]
    pub requires_user_auth: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotSpec {
    pub name: String,

    #[serde(default = "default_true")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Trust material a remote verifier needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrustSpec {
    pub algorithm: String,

    /// Base64 (standard alphabet) of the raw public key.
    pub public_key: String,
}

fn default_true() -> bool {
    true
}

impl TrustSpec {
    pub fn algorithm(&self) -> Result<SignatureAlgorithm, String> {
        self.algorithm.parse().map_err(|e| format!("{}", e))
    }

    pub fn public_key_bytes(&self) -> Result<Vec<u8>, String> {
        STANDARD
            .decode(self.public_key.trim())
            .map_err(|e| format!("trust.public_key is not valid base64: {}", e))
    }
}

impl CapabilitySpec {
    pub fn slot(&self, name: &str) -> Option<&SlotSpec> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Required slot names in declaration order.
    pub fn required_slots(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter(|s| s.required).map(|s| s.name.as_str())
    }
}

impl AgentManifest {
    /// Resolve an intent name to its capability.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Validation`] when the name is not declared.
    pub fn resolve_capability(&self, name: &str) -> Result<&CapabilitySpec, ProtocolError> {
        self.spec
            .capabilities
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ProtocolError::Validation(format!("unknown intent '{}'", name)))
    }

    pub fn capability_names(&self) -> impl Iterator<Item = &str> {
        self.spec.capabilities.iter().map(|c| c.name.as_str())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_version != MANIFEST_API_VERSION {
            return Err(format!(
                "Invalid apiVersion: expected '{}', got '{}'",
                MANIFEST_API_VERSION, self.api_version
            ));
        }

        if self.kind != MANIFEST_KIND {
            return Err(format!(
                "Invalid kind: expected '{}', got '{}'",
                MANIFEST_KIND, self.kind
            ));
        }

        if self.metadata.name.is_empty() {
            return Err("metadata.name cannot be empty".to_string());
        }

        if self.spec.capabilities.is_empty() {
            return Err("spec.capabilities must declare at least one capability".to_string());
        }

        let mut seen = HashSet::new();
        for capability in &self.spec.capabilities {
            if capability.name.is_empty() {
                return Err("capability name cannot be empty".to_string());
            }
            if !seen.insert(capability.name.as_str()) {
                return Err(format!("duplicate capability '{}'", capability.name));
            }

            let mut slot_names = HashSet::new();
            for slot in &capability.slots {
                if slot.name.is_empty() {
                    return Err(format!("capability '{}' has a slot with an empty name", capability.name));
                }
                if !slot_names.insert(slot.name.as_str()) {
                    return Err(format!(
                        "capability '{}' declares slot '{}' twice",
                        capability.name, slot.name
                    ));
                }
            }

            // An intent with nothing required would sit in the state with no slots,
            // which the conversation invariants forbid.
            if capability.required_slots().next().is_none() {
                return Err(format!(
                    "capability '{}' must declare at least one required slot",
                    capability.name
                ));
            }
        }

        let algorithm = self.spec.trust.algorithm()?;
        let key = self.spec.trust.public_key_bytes()?;
        // Point validity is checked when the verifier is built from this key.
        match algorithm {
            SignatureAlgorithm::Ed25519 if key.len() != 32 => Err(format!(
                "trust.public_key must be 32 bytes for Ed25519, got {}",
                key.len()
            )),
            SignatureAlgorithm::Ed25519 => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::flight_manifest;

    #[test]
    fn test_fixture_manifest_is_valid() {
        assert!(flight_manifest().validate().is_ok());
    }

    #[test]
    fn test_required_slots_follow_declaration_order() {
        let manifest = flight_manifest();
        let capability = manifest.resolve_capability("BOOK_FLIGHT").unwrap();
        let required: Vec<&str> = capability.required_slots().collect();
        assert_eq!(required, vec!["origin", "destination", "date"]);
    }

    #[test]
    fn test_optional_slots_are_not_required() {
        let manifest = flight_manifest();
        let capability = manifest.resolve_capability("SEARCH_HOTEL").unwrap();
        assert!(capability.slot("max_price").is_some());
        assert!(!capability.required_slots().any(|s| s == "max_price"));
    }

    #[test]
    fn test_resolve_unknown_capability_is_validation_error() {
        let manifest = flight_manifest();
        assert!(matches!(
            manifest.resolve_capability("ORDER_PIZZA"),
            Err(ProtocolError::Validation(_))
        ));
    }

    #[test]
    fn test_validation_rejects_bad_documents() {
        let mut manifest = flight_manifest();
        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());

        let mut manifest = flight_manifest();
        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());

        let mut manifest = flight_manifest();
        let duplicate = manifest.spec.capabilities[0].clone();
        manifest.spec.capabilities.push(duplicate);
        assert!(manifest.validate().unwrap_err().contains("duplicate capability"));

        let mut manifest = flight_manifest();
        manifest.spec.capabilities[0].slots.iter_mut().for_each(|s| s.required = false);
        assert!(manifest.validate().unwrap_err().contains("required slot"));

        let mut manifest = flight_manifest();
        manifest.spec.trust.algorithm = "RSA".to_string();
        assert!(manifest.validate().is_err());

        let mut manifest = flight_manifest();
        manifest.spec.trust.public_key = STANDARD.encode([1u8; 16]);
        assert!(manifest.validate().unwrap_err().contains("32 bytes"));
    }
}
