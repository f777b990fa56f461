// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ztap_core::application::bootstrap::AgentRuntime;
use ztap_core::domain::conversation::ConversationState;
use ztap_core::domain::credential::Credential;
use ztap_core::domain::manifest::AgentManifest;
use ztap_core::domain::oracle::{Interpretation, LanguageOracle, OracleError};
use ztap_core::infrastructure::manifest_parser::AgentManifestParser;
use ztap_core::infrastructure::signing::Ed25519TaskSigner;

pub const SEED: [u8; 32] = [0x11; 32];
pub const AGENT_CREDENTIAL: &str = "orchestrator-shared-secret";

pub fn signer() -> Ed25519TaskSigner {
    Ed25519TaskSigner::from_seed(SEED)
}

pub fn manifest() -> AgentManifest {
    let yaml = format!(
        r#"
apiVersion: ztap.dev/v1
kind: AgentManifest
metadata:
  name: travel-desk
  version: "1.0.0"
spec:
  capabilities:
    - name: BOOK_FLIGHT
      slots:
        - name: origin
        - name: destination
        - name: date
    - name: SEARCH_HOTEL
      slots:
        - name: city
          prompt: "Which city?"
    - name: BOOK_HOTEL
      requires_confirmation: true
      requires_user_auth: true
      slots:
        - name: hotel_id
        - name: nights
  trust:
    algorithm: Ed25519
    public_key: "{}"
"#,
        signer().public_key_base64()
    );
    AgentManifestParser::parse_yaml(&yaml).expect("fixture manifest is valid")
}

/// One scripted oracle answer.
pub enum Step {
    Understand(Interpretation),
    Fail,
    Hang,
}

/// Replays scripted understanding steps in order; counts every call.
pub struct ScriptedOracle {
    steps: Mutex<VecDeque<Step>>,
    pub calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageOracle for ScriptedOracle {
    async fn understand(
        &self,
        _state: &ConversationState,
        _user_input: &str,
    ) -> Result<Interpretation, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Understand(interpretation)) => Ok(interpretation),
            Some(Step::Fail) => Err(OracleError::Unavailable("scripted failure".to_string())),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(OracleError::Unavailable("woke up".to_string()))
            }
            None => Ok(Interpretation::default()),
        }
    }

    async fn generate(
        &self,
        _state: &ConversationState,
        task_results: &Value,
        _user_prompt: &str,
    ) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if task_results.get("error").is_some() {
            Ok("Sorry, the search failed.".to_string())
        } else {
            Ok("I found something for you.".to_string())
        }
    }
}

pub fn runtime(oracle: Arc<ScriptedOracle>) -> Arc<AgentRuntime> {
    Arc::new(
        AgentRuntime::assemble(
            Credential::new(AGENT_CREDENTIAL).unwrap(),
            signer(),
            Arc::new(manifest()),
            oracle,
            Duration::from_millis(100),
        )
        .expect("fixture runtime assembles"),
    )
}
