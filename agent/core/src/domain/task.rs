// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Tasks the agent asks an external system to perform, and their signed form.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A structured action. Immutable once built: fields are only readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    task_name: String,
    #[serde(default)]
    parameters: BTreeMap<String, Value>,
}

impl Task {
    pub fn new<I, K>(task_name: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            task_name: task_name.into(),
            parameters: parameters.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }
}

/// A task plus the issuing agent's signature over its canonical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTask {
    pub task: Task,
    /// Raw signature bytes; base64 (standard alphabet) on the wire.
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
    /// Short scheme identifier, e.g. `"Ed25519"`.
    pub algorithm: String,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
    }
}
