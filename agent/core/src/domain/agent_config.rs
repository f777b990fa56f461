// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Agent Configuration Types
//
// Kubernetes-style node configuration for a ZTAP agent process:
// - listen address and optional Prometheus exporter port
// - where the credential, signing key and manifest come from
// - which LLM backs the language oracle, and how long it may take
//
// Secret-bearing fields hold *references*, resolved once at startup by
// `resolve_secret`: `env:VAR`, `file:/path`, or a literal value.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::errors::ConfigurationError;

pub const CONFIG_API_VERSION: &str = "ztap.dev/v1";
pub const CONFIG_KIND: &str = "AgentConfig";

pub const ENV_CONFIG_PATH: &str = "ZTAP_CONFIG_PATH";
pub const ENV_AGENT_CREDENTIAL: &str = "ZTAP_AGENT_CREDENTIAL";
pub const ENV_SIGNING_KEY: &str = "ZTAP_SIGNING_KEY";
pub const ENV_MANIFEST_PATH: &str = "ZTAP_MANIFEST_PATH";
pub const ENV_ORACLE_TIMEOUT_MS: &str = "ZTAP_ORACLE_TIMEOUT_MS";

/// Top-level configuration document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    pub kind: String,

    pub metadata: ConfigMetadata,

    #[serde(default)]
    pub spec: AgentConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AgentConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    /// Pre-shared agent credential (secret reference)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,

    /// Base64 or hex Ed25519 seed (secret reference)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_key: Option<String>,

    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,

    #[serde(default)]
    pub oracle: OracleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Prometheus exporter port; disabled when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

/// LLM backing the language oracle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OracleConfig {
    /// "openai", "openai-compatible" or "ollama"
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key (secret reference); local providers may omit it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Handlebars override for the understanding prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub understanding_template: Option<String>,

    /// Handlebars override for the follow-up prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_template: Option<String>,
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("./agent-manifest.yaml")
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            metrics_port: None,
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            timeout_ms: default_timeout_ms(),
            understanding_template: None,
            generation_template: None,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_version: CONFIG_API_VERSION.to_string(),
            kind: CONFIG_KIND.to_string(),
            metadata: ConfigMetadata {
                name: "ztap-agent".to_string(),
                labels: None,
            },
            spec: AgentConfigSpec {
                manifest_path: default_manifest_path(),
                ..AgentConfigSpec::default()
            },
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl AgentConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Discover configuration file using precedence order
    /// 1. ZTAP_CONFIG_PATH environment variable
    /// 2. ./ztap-config.yaml (working directory)
    /// 3. ~/.ztap/config.yaml (user home)
    /// 4. /etc/ztap/config.yaml (system, Unix) or C:\ProgramData\Ztap\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./ztap-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".ztap").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/ztap/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Ztap\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // An explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            Self::from_yaml_file(&config_path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", config_path, e))?
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Secret overrides are stored as `env:` references, so the value itself
    /// never lands in the configuration struct.
    pub fn apply_env_overrides(&mut self) {
        if std::env::var_os(ENV_AGENT_CREDENTIAL).is_some() {
            tracing::info!("Environment override: {}", ENV_AGENT_CREDENTIAL);
            self.spec.credential = Some(format!("env:{}", ENV_AGENT_CREDENTIAL));
        }

        if std::env::var_os(ENV_SIGNING_KEY).is_some() {
            tracing::info!("Environment override: {}", ENV_SIGNING_KEY);
            self.spec.signing_key = Some(format!("env:{}", ENV_SIGNING_KEY));
        }

        if let Ok(path) = std::env::var(ENV_MANIFEST_PATH) {
            tracing::info!("Environment override: {}={}", ENV_MANIFEST_PATH, path);
            self.spec.manifest_path = PathBuf::from(path);
        }

        if let Ok(val) = std::env::var(ENV_ORACLE_TIMEOUT_MS) {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => {
                    tracing::info!("Environment override: {}={}", ENV_ORACLE_TIMEOUT_MS, ms);
                    self.spec.oracle.timeout_ms = ms;
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for {}: '{}'. Expected a positive integer. Ignoring.",
                        ENV_ORACLE_TIMEOUT_MS,
                        val
                    );
                }
            }
        }
    }

    /// Structural validation. Secrets are resolved later, at bootstrap.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != CONFIG_API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                CONFIG_API_VERSION
            );
        }

        if self.kind != CONFIG_KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, CONFIG_KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.server.port == 0 {
            anyhow::bail!("spec.server.port cannot be 0");
        }

        if self.spec.server.metrics_port == Some(self.spec.server.port) {
            anyhow::bail!("spec.server.metrics_port must differ from spec.server.port");
        }

        if self.spec.credential.is_none() {
            anyhow::bail!("spec.credential is not set");
        }

        if self.spec.signing_key.is_none() {
            anyhow::bail!("spec.signing_key is not set");
        }

        let oracle = &self.spec.oracle;
        match oracle.provider.as_str() {
            "openai" | "openai-compatible" | "ollama" => {}
            other => anyhow::bail!("Unsupported oracle provider: '{}'", other),
        }
        if oracle.endpoint.is_empty() {
            anyhow::bail!("spec.oracle.endpoint cannot be empty");
        }
        if oracle.model.is_empty() {
            anyhow::bail!("spec.oracle.model cannot be empty");
        }
        if oracle.timeout_ms == 0 {
            anyhow::bail!("spec.oracle.timeout_ms must be greater than 0");
        }

        Ok(())
    }
}

/// Resolve a secret reference: `env:VAR`, `file:/path`, or a literal.
///
/// File contents are trimmed. The resolved value is never included in errors.
pub fn resolve_secret(reference: &str) -> Result<String, ConfigurationError> {
    let unresolved = |reason: String| ConfigurationError::UnresolvedSecret {
        reference: redact_reference(reference),
        reason,
    };

    if let Some(var) = reference.strip_prefix("env:") {
        return std::env::var(var).map_err(|_| unresolved(format!("environment variable {} is not set", var)));
    }

    if let Some(path) = reference.strip_prefix("file:") {
        return std::fs::read_to_string(path)
            .map(|s| s.trim().to_string())
            .map_err(|e| unresolved(e.to_string()));
    }

    Ok(reference.to_string())
}

/// Display form of a secret reference: literals are hidden.
pub fn redact_reference(reference: &str) -> String {
    if reference.starts_with("env:") || reference.starts_with("file:") {
        reference.to_string()
    } else {
        "<literal>".to_string()
    }
}
