// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Dialogue Engine
//!
//! Deterministic slot-filling policy. Given the caller's
//! [`ConversationState`] and the oracle's [`Interpretation`] of the latest
//! utterance it decides whether to ask for a slot, ask for confirmation, or
//! emit a signed [`Task`]. It performs no inference and no I/O.
//!
//! ## Transition policy
//!
//! 1. Resolve the intent: a named intent must be a declared capability;
//!    switching intent drops the previous intent's slots.
//! 2. A "no" to a pending confirmation clears the declined slots.
//! 3. Merge slot updates, last write wins; `null` withdraws a slot.
//! 4. `missing_slots` = required slots not filled, in declaration order.
//! 5. Something missing → ask for the first missing slot.
//! 6. Nothing missing, confirmation required and not given → ask yes/no. A
//!    "yes" that arrives with changed values while a confirmation is pending
//!    re-asks with the new values.
//! 7. Otherwise sign the task and hand back a reset state.
//!
//! A turn that changes nothing returns the input state verbatim.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::domain::conversation::{ConversationState, DialoguePhase};
use crate::domain::errors::ProtocolError;
use crate::domain::manifest::{AgentManifest, CapabilitySpec};
use crate::domain::oracle::Interpretation;
use crate::domain::signature::TaskSigner;
use crate::domain::task::{SignedTask, Task};

const DEFAULT_GREETING: &str = "What would you like to do?";

/// What the agent says back for one turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnReply {
    /// Ask the user something; no task emitted.
    Text(String),
    /// A signed task for the orchestrator to execute.
    Task {
        signed_task: SignedTask,
        /// Caller's user token, echoed when the capability requires user auth.
        user_auth_token: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub new_state: ConversationState,
    pub phase: DialoguePhase,
    pub reply: TurnReply,
}

impl TurnOutcome {
    pub fn response_text(&self) -> Option<&str> {
        match &self.reply {
            TurnReply::Text(text) => Some(text),
            TurnReply::Task { .. } => None,
        }
    }

    pub fn signed_task(&self) -> Option<&SignedTask> {
        match &self.reply {
            TurnReply::Task { signed_task, .. } => Some(signed_task),
            TurnReply::Text(_) => None,
        }
    }
}

pub struct DialogueEngine {
    manifest: Arc<AgentManifest>,
    signer: Arc<dyn TaskSigner>,
}

impl DialogueEngine {
    pub fn new(manifest: Arc<AgentManifest>, signer: Arc<dyn TaskSigner>) -> Self {
        Self { manifest, signer }
    }

    pub fn manifest(&self) -> &AgentManifest {
        &self.manifest
    }

    /// Apply one interpreted utterance to `prior`.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Validation`] for an invalid `prior` or an undeclared intent
    /// - [`ProtocolError::Authorization`] when the task needs a user token and none was given
    /// - [`ProtocolError::Integrity`] when signing fails
    ///
    /// On error nothing about `prior` has changed; the caller keeps it.
    pub fn advance(
        &self,
        prior: &ConversationState,
        interpretation: &Interpretation,
        user_auth_token: Option<&str>,
    ) -> Result<TurnOutcome, ProtocolError> {
        let prior_capability = prior.validate_against(&self.manifest)?;

        let (capability, switched) = match interpretation.intent.as_deref() {
            Some(name) => {
                let capability = self.manifest.resolve_capability(name)?;
                let switched = prior.current_intent.as_deref() != Some(name);
                (Some(capability), switched)
            }
            None => (prior_capability, false),
        };

        let Some(capability) = capability else {
            if !interpretation.slot_updates.is_empty() {
                debug!(
                    slots = ?interpretation.slot_updates.keys().collect::<Vec<_>>(),
                    "Ignoring slot updates without an intent"
                );
            }
            return Ok(TurnOutcome {
                new_state: prior.clone(),
                phase: DialoguePhase::Empty,
                reply: TurnReply::Text(self.greeting()),
            });
        };

        let mut filled = if switched {
            if !prior.filled_slots.is_empty() {
                debug!(
                    from = ?prior.current_intent,
                    to = %capability.name,
                    "Intent switched, discarding collected slots"
                );
            }
            BTreeMap::new()
        } else {
            prior.filled_slots.clone()
        };

        let awaiting_confirmation = !switched && prior.phase() == DialoguePhase::AwaitingConfirmation;

        if awaiting_confirmation && interpretation.confirmation == Some(false) {
            for slot in declined_slots(capability, interpretation) {
                debug!(slot = %slot, "Clearing declined slot");
                filled.remove(&slot);
            }
        }

        merge_slot_updates(capability, &mut filled, &interpretation.slot_updates);
        let slots_changed = filled != prior.filled_slots;

        let missing: Vec<String> = capability
            .required_slots()
            .filter(|name| !filled.contains_key(*name))
            .map(str::to_string)
            .collect();

        let candidate = ConversationState {
            current_intent: Some(capability.name.clone()),
            filled_slots: filled,
            missing_slots: missing,
            turn_count: prior.turn_count,
            booking_context: prior.booking_context.clone(),
        };

        if let Some(first_missing) = candidate.missing_slots.first() {
            let text = slot_prompt(capability, first_missing);
            return Ok(self.reply(prior, candidate, DialoguePhase::Collecting, text));
        }

        if capability.requires_confirmation {
            let reconfirm = awaiting_confirmation && slots_changed;
            let confirmed = interpretation.confirmation == Some(true) && !reconfirm;
            if !confirmed {
                let text = confirmation_prompt(capability, &candidate.filled_slots);
                return Ok(self.reply(prior, candidate, DialoguePhase::AwaitingConfirmation, text));
            }
        }

        self.emit(capability, candidate, user_auth_token)
    }

    fn emit(
        &self,
        capability: &CapabilitySpec,
        state: ConversationState,
        user_auth_token: Option<&str>,
    ) -> Result<TurnOutcome, ProtocolError> {
        let user_auth_token = match user_auth_token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) if capability.requires_user_auth => Some(token.to_string()),
            None if capability.requires_user_auth => {
                return Err(ProtocolError::Authorization(format!(
                    "task '{}' requires user authorization",
                    capability.name
                )));
            }
            _ => None,
        };

        let new_state = state.reset();
        let task = Task::new(capability.name.clone(), state.filled_slots);
        let signed_task = self.signer.sign(task)?;

        debug!(task = %capability.name, "Task signed");

        Ok(TurnOutcome {
            new_state,
            phase: DialoguePhase::TaskEmitted,
            reply: TurnReply::Task {
                signed_task,
                user_auth_token,
            },
        })
    }

    /// Reply without a task. `turn_count` advances only when the dialogue moved.
    fn reply(
        &self,
        prior: &ConversationState,
        mut candidate: ConversationState,
        phase: DialoguePhase,
        text: String,
    ) -> TurnOutcome {
        if candidate != *prior {
            candidate.turn_count = prior.turn_count.saturating_add(1);
        }
        TurnOutcome {
            new_state: candidate,
            phase,
            reply: TurnReply::Text(text),
        }
    }

    fn greeting(&self) -> String {
        match &self.manifest.spec.greeting {
            Some(greeting) => greeting.clone(),
            None => {
                let names: Vec<&str> = self.manifest.capability_names().collect();
                format!("{} I can help with: {}.", DEFAULT_GREETING, names.join(", "))
            }
        }
    }
}

fn merge_slot_updates(
    capability: &CapabilitySpec,
    filled: &mut BTreeMap<String, Value>,
    updates: &BTreeMap<String, Value>,
) {
    for (name, value) in updates {
        if capability.slot(name).is_none() {
            debug!(slot = %name, capability = %capability.name, "Ignoring undeclared slot");
            continue;
        }
        if value.is_null() {
            filled.remove(name);
        } else {
            filled.insert(name.clone(), value.clone());
        }
    }
}

/// Slots to clear on a "no": the required ones the user named, else the last
/// required slot. Clearing only optional slots would leave nothing to collect.
fn declined_slots(capability: &CapabilitySpec, interpretation: &Interpretation) -> Vec<String> {
    let named: Vec<String> = interpretation
        .rejected_slots
        .iter()
        .filter(|name| capability.slot(name).is_some_and(|slot| slot.required))
        .cloned()
        .collect();
    if !named.is_empty() {
        return named;
    }
    capability
        .required_slots()
        .last()
        .map(|name| vec![name.to_string()])
        .unwrap_or_default()
}

fn slot_prompt(capability: &CapabilitySpec, slot: &str) -> String {
    capability
        .slot(slot)
        .and_then(|s| s.prompt.clone())
        .unwrap_or_else(|| format!("Please provide {}.", slot))
}

fn confirmation_prompt(capability: &CapabilitySpec, filled: &BTreeMap<String, Value>) -> String {
    if let Some(prompt) = &capability.confirmation_prompt {
        return prompt.clone();
    }
    let summary: Vec<String> = capability
        .slots
        .iter()
        .filter_map(|slot| filled.get(&slot.name).map(|v| format!("{}: {}", slot.name, display_value(v))))
        .collect();
    format!(
        "Please confirm {} with {}. Shall I proceed (yes or no)?",
        capability.name,
        summary.join(", ")
    )
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signature::TaskVerifier;
    use crate::infrastructure::signing::Ed25519TaskVerifier;
    use crate::test_support::{flight_manifest, test_signer};
    use serde_json::json;

    fn engine() -> DialogueEngine {
        DialogueEngine::new(Arc::new(flight_manifest()), Arc::new(test_signer()))
    }

    fn book_flight() -> Interpretation {
        Interpretation::with_intent("BOOK_FLIGHT")
    }

    fn hotel_awaiting_confirmation() -> ConversationState {
        ConversationState {
            current_intent: Some("BOOK_HOTEL".to_string()),
            filled_slots: BTreeMap::from([
                ("hotel_id".to_string(), json!("H-42")),
                ("nights".to_string(), json!(2)),
            ]),
            missing_slots: vec![],
            turn_count: 3,
            booking_context: None,
        }
    }

    #[test]
    fn test_first_slot_starts_collecting() {
        let outcome = engine()
            .advance(
                &ConversationState::new(),
                &book_flight().slot("origin", json!("YUL")),
                None,
            )
            .unwrap();

        assert_eq!(outcome.phase, DialoguePhase::Collecting);
        assert_eq!(outcome.new_state.current_intent.as_deref(), Some("BOOK_FLIGHT"));
        assert_eq!(outcome.new_state.missing_slots, vec!["destination", "date"]);
        assert_eq!(outcome.new_state.turn_count, 1);
        assert_eq!(outcome.response_text(), Some("Where are you flying to?"));
        assert!(outcome.signed_task().is_none());
    }

    #[test]
    fn test_completed_slots_emit_verifiable_task_and_reset() {
        let engine = engine();
        let first = engine
            .advance(
                &ConversationState::new(),
                &book_flight().slot("origin", json!("YUL")),
                None,
            )
            .unwrap();

        let second = engine
            .advance(
                &first.new_state,
                &Interpretation::default()
                    .slot("destination", json!("CDG"))
                    .slot("date", json!("2026-11-15"))
                    .confirm(true),
                None,
            )
            .unwrap();

        assert_eq!(second.phase, DialoguePhase::TaskEmitted);
        assert!(second.new_state.is_empty());
        assert_eq!(second.new_state.turn_count, 0);

        let signed = second.signed_task().unwrap();
        assert_eq!(signed.algorithm, "Ed25519");
        assert_eq!(signed.task.task_name(), "BOOK_FLIGHT");
        assert_eq!(signed.task.parameter("origin"), Some(&json!("YUL")));
        assert_eq!(signed.task.parameter("destination"), Some(&json!("CDG")));
        assert_eq!(signed.task.parameter("date"), Some(&json!("2026-11-15")));

        let verifier = Ed25519TaskVerifier::new(test_signer().verifying_key());
        assert!(verifier.verify(signed).is_ok());
    }

    #[test]
    fn test_empty_update_is_a_no_op() {
        let engine = engine();
        let collecting = engine
            .advance(
                &ConversationState::new(),
                &book_flight().slot("origin", json!("YUL")).slot("destination", json!("CDG")),
                None,
            )
            .unwrap()
            .new_state;

        let outcome = engine.advance(&collecting, &Interpretation::default(), None).unwrap();
        assert_eq!(outcome.new_state, collecting);
        assert_eq!(outcome.response_text(), Some("Please provide date."));

        // restating the current intent with nothing new is still a no-op
        let outcome = engine.advance(&collecting, &book_flight(), None).unwrap();
        assert_eq!(outcome.new_state, collecting);
    }

    #[test]
    fn test_later_values_override_earlier_ones() {
        let engine = engine();
        let state = engine
            .advance(&ConversationState::new(), &book_flight().slot("origin", json!("YUL")), None)
            .unwrap()
            .new_state;
        let state = engine
            .advance(&state, &Interpretation::default().slot("origin", json!("YQB")), None)
            .unwrap()
            .new_state;

        assert_eq!(state.filled_slots["origin"], json!("YQB"));
        assert_eq!(state.turn_count, 2);
    }

    #[test]
    fn test_null_withdraws_and_undeclared_slots_are_ignored() {
        let engine = engine();
        let state = engine
            .advance(
                &ConversationState::new(),
                &book_flight()
                    .slot("origin", json!("YUL"))
                    .slot("destination", json!("CDG"))
                    .slot("seat", json!("12A")),
                None,
            )
            .unwrap()
            .new_state;
        assert!(!state.filled_slots.contains_key("seat"));

        let state = engine
            .advance(&state, &Interpretation::default().slot("destination", Value::Null), None)
            .unwrap()
            .new_state;
        assert_eq!(state.missing_slots, vec!["destination", "date"]);
    }

    #[test]
    fn test_intent_switch_discards_previous_slots() {
        let engine = engine();
        let state = engine
            .advance(&ConversationState::new(), &book_flight().slot("origin", json!("YUL")), None)
            .unwrap()
            .new_state;

        let outcome = engine
            .advance(&state, &Interpretation::with_intent("SEARCH_HOTEL"), None)
            .unwrap();
        assert_eq!(outcome.new_state.current_intent.as_deref(), Some("SEARCH_HOTEL"));
        assert!(outcome.new_state.filled_slots.is_empty());
        assert_eq!(outcome.new_state.missing_slots, vec!["city"]);
        assert_eq!(outcome.response_text(), Some("Which city?"));
    }

    #[test]
    fn test_optional_slots_travel_with_the_task() {
        let outcome = engine()
            .advance(
                &ConversationState::new(),
                &Interpretation::with_intent("SEARCH_HOTEL")
                    .slot("city", json!("Paris"))
                    .slot("max_price", json!(150)),
                None,
            )
            .unwrap();
        let signed = outcome.signed_task().unwrap();
        assert_eq!(signed.task.parameter("max_price"), Some(&json!(150)));
    }

    #[test]
    fn test_unknown_intent_is_validation_error() {
        let err = engine()
            .advance(&ConversationState::new(), &Interpretation::with_intent("ORDER_PIZZA"), None)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Validation(_)));
    }

    #[test]
    fn test_no_intent_gets_greeting() {
        let outcome = engine()
            .advance(
                &ConversationState::new(),
                &Interpretation::default().slot("origin", json!("YUL")),
                None,
            )
            .unwrap();
        assert_eq!(outcome.phase, DialoguePhase::Empty);
        assert!(outcome.new_state.is_empty());
        assert_eq!(outcome.response_text(), Some("Hi! I can book flights and find hotels."));
    }

    #[test]
    fn test_confirmation_is_requested_before_emitting() {
        let outcome = engine()
            .advance(
                &ConversationState::new(),
                &Interpretation::with_intent("BOOK_HOTEL")
                    .slot("hotel_id", json!("H-42"))
                    .slot("nights", json!(2)),
                Some("user-token"),
            )
            .unwrap();

        assert_eq!(outcome.phase, DialoguePhase::AwaitingConfirmation);
        assert_eq!(
            outcome.response_text(),
            Some("Please confirm BOOK_HOTEL with hotel_id: H-42, nights: 2. Shall I proceed (yes or no)?")
        );
        assert_eq!(outcome.new_state, ConversationState {
            turn_count: 1,
            ..hotel_awaiting_confirmation()
        });
    }

    #[test]
    fn test_yes_with_the_last_slot_emits_at_once() {
        let outcome = engine()
            .advance(
                &ConversationState::new(),
                &Interpretation::with_intent("BOOK_HOTEL")
                    .slot("hotel_id", json!("H-42"))
                    .slot("nights", json!(2))
                    .confirm(true),
                Some("user-token"),
            )
            .unwrap();

        assert_eq!(outcome.phase, DialoguePhase::TaskEmitted);
        assert!(outcome.new_state.is_empty());
        let signed = outcome.signed_task().unwrap();
        assert_eq!(signed.task.task_name(), "BOOK_HOTEL");
        assert_eq!(signed.task.parameter("nights"), Some(&json!(2)));
    }

    #[test]
    fn test_positive_confirmation_emits_with_user_token() {
        let outcome = engine()
            .advance(
                &hotel_awaiting_confirmation(),
                &Interpretation::default().confirm(true),
                Some("user-token"),
            )
            .unwrap();

        match outcome.reply {
            TurnReply::Task {
                signed_task,
                user_auth_token,
            } => {
                assert_eq!(signed_task.task.task_name(), "BOOK_HOTEL");
                assert_eq!(user_auth_token.as_deref(), Some("user-token"));
            }
            other => panic!("expected a task, got {:?}", other),
        }
    }

    #[test]
    fn test_user_auth_is_required_for_flagged_capabilities() {
        let prior = hotel_awaiting_confirmation();
        for token in [None, Some(""), Some("   ")] {
            let err = engine()
                .advance(&prior, &Interpretation::default().confirm(true), token)
                .unwrap_err();
            assert!(matches!(err, ProtocolError::Authorization(_)));
        }
    }

    #[test]
    fn test_user_token_is_not_echoed_for_unflagged_capabilities() {
        let outcome = engine()
            .advance(
                &ConversationState::new(),
                &Interpretation::with_intent("SEARCH_HOTEL").slot("city", json!("Paris")),
                Some("user-token"),
            )
            .unwrap();
        assert!(matches!(
            outcome.reply,
            TurnReply::Task { user_auth_token: None, .. }
        ));
    }

    #[test]
    fn test_negative_confirmation_clears_last_required_slot() {
        let outcome = engine()
            .advance(&hotel_awaiting_confirmation(), &Interpretation::default().confirm(false), None)
            .unwrap();

        assert_eq!(outcome.phase, DialoguePhase::Collecting);
        assert_eq!(outcome.new_state.missing_slots, vec!["nights"]);
        assert!(outcome.new_state.filled_slots.contains_key("hotel_id"));
        assert_eq!(outcome.response_text(), Some("How many nights?"));
        assert!(outcome.signed_task().is_none());
    }

    #[test]
    fn test_negative_confirmation_clears_named_slots_then_merges() {
        let mut no = Interpretation::default().confirm(false);
        no.rejected_slots = vec!["hotel_id".to_string()];

        let outcome = engine()
            .advance(&hotel_awaiting_confirmation(), &no, None)
            .unwrap();
        assert_eq!(outcome.new_state.missing_slots, vec!["hotel_id"]);
        assert_eq!(outcome.new_state.filled_slots["nights"], json!(2));

        // "no, make it H-7" clears and refills in one turn, then asks again
        let mut correction = Interpretation::default().confirm(false).slot("hotel_id", json!("H-7"));
        correction.rejected_slots = vec!["hotel_id".to_string()];
        let outcome = engine()
            .advance(&hotel_awaiting_confirmation(), &correction, Some("user-token"))
            .unwrap();
        assert_eq!(outcome.phase, DialoguePhase::AwaitingConfirmation);
        assert_eq!(outcome.new_state.filled_slots["hotel_id"], json!("H-7"));
    }

    #[test]
    fn test_declining_only_an_optional_slot_goes_back_to_collecting() {
        let mut manifest = flight_manifest();
        manifest.spec.capabilities[1].requires_confirmation = true;
        let engine = DialogueEngine::new(Arc::new(manifest), Arc::new(test_signer()));

        let awaiting = engine
            .advance(
                &ConversationState::new(),
                &Interpretation::with_intent("SEARCH_HOTEL")
                    .slot("city", json!("Paris"))
                    .slot("max_price", json!(150)),
                None,
            )
            .unwrap();
        assert_eq!(awaiting.phase, DialoguePhase::AwaitingConfirmation);

        let mut no = Interpretation::default().confirm(false);
        no.rejected_slots = vec!["max_price".to_string()];
        let outcome = engine.advance(&awaiting.new_state, &no, None).unwrap();

        assert_eq!(outcome.phase, DialoguePhase::Collecting);
        assert_eq!(outcome.new_state.missing_slots, vec!["city"]);
        assert_eq!(outcome.new_state.filled_slots["max_price"], json!(150));
        assert_eq!(outcome.response_text(), Some("Which city?"));
        assert!(outcome.signed_task().is_none());
    }

    #[test]
    fn test_changing_a_slot_while_confirming_asks_again() {
        let outcome = engine()
            .advance(
                &hotel_awaiting_confirmation(),
                &Interpretation::default().slot("nights", json!(3)).confirm(true),
                Some("user-token"),
            )
            .unwrap();
        assert_eq!(outcome.phase, DialoguePhase::AwaitingConfirmation);
        assert_eq!(outcome.new_state.filled_slots["nights"], json!(3));
        assert_eq!(outcome.new_state.turn_count, 4);
    }

    #[test]
    fn test_invalid_prior_state_is_rejected() {
        let mut prior = hotel_awaiting_confirmation();
        prior.missing_slots = vec!["nights".to_string()];
        let err = engine()
            .advance(&prior, &Interpretation::default(), None)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Validation(_)));
    }

    #[test]
    fn test_emission_keeps_booking_context() {
        let mut prior = ConversationState::new();
        prior.booking_context = Some(crate::domain::conversation::BookingContext {
            item_type: "hotel".to_string(),
            item_id: "H-42".to_string(),
            price: Some(json!(120)),
        });

        let outcome = engine()
            .advance(
                &prior,
                &Interpretation::with_intent("SEARCH_HOTEL").slot("city", json!("Lyon")),
                None,
            )
            .unwrap();
        assert_eq!(outcome.new_state.booking_context, prior.booking_context);
    }
}
