// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Startup wiring.
//!
//! [`AgentRuntime::bootstrap`] performs every fail-fast check before the
//! process accepts a request: credential present, signing key parses,
//! manifest valid, manifest trust key usable and equal to the signing key's
//! public half, oracle configured. Any failure is a [`ConfigurationError`] and
//! the process must not start. The resulting handles are read-only.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::application::protocol::ProtocolFacade;
use crate::domain::agent_config::{resolve_secret, AgentConfig};
use crate::domain::credential::{Credential, CredentialGate};
use crate::domain::errors::ConfigurationError;
use crate::domain::manifest::AgentManifest;
use crate::domain::oracle::LanguageOracle;
use crate::domain::signature::{SignatureError, TaskSigner};
use crate::infrastructure::llm::create_provider;
use crate::infrastructure::llm_oracle::LlmOracle;
use crate::infrastructure::manifest_parser::AgentManifestParser;
use crate::infrastructure::signing::{verifier_for_trust, Ed25519TaskSigner};

/// Immutable, process-wide handles shared by every request.
pub struct AgentRuntime {
    pub gate: CredentialGate,
    pub protocol: Arc<ProtocolFacade>,
    pub manifest: Arc<AgentManifest>,
}

impl AgentRuntime {
    /// Resolve secrets, load the manifest and build the LLM oracle from `config`.
    pub fn bootstrap(config: &AgentConfig) -> Result<Self, ConfigurationError> {
        let credential = match &config.spec.credential {
            Some(reference) => Credential::new(resolve_secret(reference)?)?,
            None => return Err(ConfigurationError::MissingCredential),
        };

        let signer = match &config.spec.signing_key {
            Some(reference) => load_signer(&resolve_secret(reference)?)?,
            None => return Err(ConfigurationError::MissingKey),
        };

        let manifest = AgentManifestParser::parse_file(&config.spec.manifest_path)
            .map_err(|e| ConfigurationError::InvalidManifest(format!("{:#}", e)))?;
        let manifest = Arc::new(manifest);

        let oracle_config = &config.spec.oracle;
        let provider = create_provider(oracle_config)?;
        let oracle = LlmOracle::new(provider, manifest.clone()).with_templates(
            oracle_config.understanding_template.clone(),
            oracle_config.generation_template.clone(),
        );
        oracle
            .validate_templates()
            .map_err(|e| ConfigurationError::Invalid(format!("{:#}", e)))?;

        Self::assemble(credential, signer, manifest, Arc::new(oracle), oracle_config.timeout())
    }

    /// Check and wire already-loaded parts.
    pub fn assemble(
        credential: Credential,
        signer: Ed25519TaskSigner,
        manifest: Arc<AgentManifest>,
        oracle: Arc<dyn LanguageOracle>,
        oracle_timeout: Duration,
    ) -> Result<Self, ConfigurationError> {
        manifest.validate().map_err(ConfigurationError::InvalidManifest)?;

        // Rejects keys that decode to 32 bytes but are not valid curve points.
        verifier_for_trust(&manifest.spec.trust)
            .map_err(|e| ConfigurationError::InvalidManifest(format!("trust: {}", e)))?;

        let trusted = manifest
            .spec
            .trust
            .public_key_bytes()
            .map_err(ConfigurationError::InvalidManifest)?;
        if trusted != signer.public_key() {
            return Err(ConfigurationError::TrustKeyMismatch);
        }

        if oracle_timeout.is_zero() {
            return Err(ConfigurationError::Invalid("oracle timeout must be greater than 0".to_string()));
        }

        info!(
            agent = %manifest.metadata.name,
            capabilities = manifest.spec.capabilities.len(),
            algorithm = %signer.algorithm(),
            oracle_timeout_ms = oracle_timeout.as_millis() as u64,
            "Agent runtime ready"
        );

        let protocol = ProtocolFacade::new(manifest.clone(), Arc::new(signer), oracle)
            .with_oracle_timeout(oracle_timeout);

        Ok(Self {
            gate: CredentialGate::new(&credential),
            protocol: Arc::new(protocol),
            manifest,
        })
    }
}

/// Parse the signing key, never echoing it.
pub fn load_signer(encoded: &str) -> Result<Ed25519TaskSigner, ConfigurationError> {
    Ed25519TaskSigner::from_encoded(encoded).map_err(|e| match e {
        SignatureError::MissingKey => ConfigurationError::MissingKey,
        other => ConfigurationError::InvalidKey(other.to_string()),
    })
}
