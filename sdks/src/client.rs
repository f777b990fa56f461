// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use ztap_core::domain::conversation::ConversationState;
use ztap_core::domain::manifest::{AgentManifest, TrustSpec};
use ztap_core::domain::signature::TaskVerifier;
use ztap_core::infrastructure::signing::verifier_for_trust;
use ztap_core::presentation::api::{FollowupResponse, TurnResponse, USER_AUTH_HEADER};

use crate::error::SdkError;

/// Client for calling a ZTAP agent from the orchestrator.
///
/// The trust key is either pinned with [`AgentClient::with_trust`] or fetched
/// once from the agent's manifest endpoint on first use. A fetched key is only
/// as trustworthy as the connection it came over.
pub struct AgentClient {
    base_url: String,
    client: Client,
    credential: Option<String>,
    verifier: OnceCell<Box<dyn TaskVerifier>>,
}

impl AgentClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
            credential: None,
            verifier: OnceCell::new(),
        }
    }

    /// Set the pre-shared agent credential.
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Pin the trust key instead of fetching it from the agent.
    pub fn with_trust(self, trust: &TrustSpec) -> Result<Self, SdkError> {
        let verifier = verifier_for_trust(trust).map_err(|e| SdkError::Trust(e.to_string()))?;
        let _ = self.verifier.set(verifier);
        Ok(self)
    }

    /// Run one dialogue turn. A returned `signed_task` has already been verified.
    pub async fn turn(
        &self,
        state: &ConversationState,
        user_input: &str,
        user_auth_token: Option<&str>,
    ) -> Result<TurnResponse, SdkError> {
        let url = format!("{}/ztap/v1/turn", self.base_url);
        let body = json!({"user_input": user_input, "conversation_state": state});

        let mut req = self.authorized(self.client.post(&url)).json(&body);
        if let Some(token) = user_auth_token {
            req = req.header(USER_AUTH_HEADER, token);
        }

        let response: TurnResponse = self.send(req).await?;

        if let Some(signed) = &response.signed_task {
            let verifier = self.verifier().await?;
            if let Err(e) = verifier.verify(signed) {
                warn!(task = %signed.task.task_name(), "Rejected signed task: {}", e);
                return Err(SdkError::Integrity(e));
            }
            debug!(task = %signed.task.task_name(), "Signed task verified");
        }

        Ok(response)
    }

    /// Ask the agent to phrase the results of an executed task.
    pub async fn followup(
        &self,
        state: &ConversationState,
        task_results: &Value,
        user_prompt: &str,
    ) -> Result<FollowupResponse, SdkError> {
        let url = format!("{}/ztap/v1/followup", self.base_url);
        let body = json!({
            "task_results": task_results,
            "user_prompt": user_prompt,
            "conversation_state": state,
        });

        self.send(self.authorized(self.client.post(&url)).json(&body)).await
    }

    /// Fetch the agent's published manifest.
    pub async fn manifest(&self) -> Result<AgentManifest, SdkError> {
        let url = format!("{}/ztap/v1/manifest", self.base_url);
        self.send(self.authorized(self.client.get(&url))).await
    }

    async fn verifier(&self) -> Result<&dyn TaskVerifier, SdkError> {
        let verifier = self
            .verifier
            .get_or_try_init(|| async {
                let manifest = self.manifest().await?;
                verifier_for_trust(&manifest.spec.trust).map_err(|e| SdkError::Trust(e.to_string()))
            })
            .await?;
        Ok(verifier.as_ref())
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.credential {
            Some(credential) => req.header("Authorization", format!("Bearer {}", credential)),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, SdkError> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(agent_error(status, &body));
        }

        serde_json::from_slice(&body).map_err(|e| SdkError::Decode(e.to_string()))
    }
}

fn agent_error(status: StatusCode, body: &[u8]) -> SdkError {
    let envelope: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let error = &envelope["error"];
    SdkError::Agent {
        status: status.as_u16(),
        kind: error["kind"].as_str().unwrap_or("UnknownError").to_string(),
        message: error["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned()),
        new_state: serde_json::from_value(envelope["new_state"].clone()).ok().flatten(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_error_reads_envelope() {
        let body = json!({
            "error": {"kind": "OracleError", "message": "oracle timed out after 10s"},
            "new_state": {"current_intent": "BOOK_FLIGHT", "missing_slots": ["date"], "filled_slots": {"origin": "YUL", "destination": "CDG"}},
        });
        let err = agent_error(StatusCode::BAD_GATEWAY, body.to_string().as_bytes());
        match err {
            SdkError::Agent {
                status,
                kind,
                new_state,
                ..
            } => {
                assert_eq!(status, 502);
                assert_eq!(kind, "OracleError");
                assert_eq!(new_state.unwrap().missing_slots, vec!["date"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_agent_error_without_envelope() {
        let err = agent_error(StatusCode::SERVICE_UNAVAILABLE, b"upstream down");
        assert_eq!(err.kind(), "UnknownError");
        assert!(err.to_string().contains("upstream down"));
    }

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let client = AgentClient::new("http://agent.local:8080/");
        assert_eq!(client.base_url, "http://agent.local:8080");
    }
}
