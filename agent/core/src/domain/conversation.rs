// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Conversation State (client-carried dialogue memory)
//!
//! [`ConversationState`] is the only memory the agent has of a dialogue. It is
//! never stored server-side: every turn receives it from the caller, the
//! [`crate::application::dialogue_engine::DialogueEngine`] derives a new value,
//! and the caller stores that value for the next turn.
//!
//! ## Invariants
//!
//! - `missing_slots ∩ keys(filled_slots) = ∅`
//! - `current_intent` is `None` iff both slot collections are empty
//!
//! States arriving from the wire are checked with
//! [`ConversationState::validate_against`] before any policy runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::errors::ProtocolError;
use crate::domain::manifest::{AgentManifest, CapabilitySpec};

/// Observable dialogue phase derived from a [`ConversationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DialoguePhase {
    /// No active intent.
    Empty,
    /// An intent is active and at least one required slot is missing.
    Collecting,
    /// Every required slot is filled; waiting for a yes/no from the user.
    AwaitingConfirmation,
    /// The turn produced a signed task. Only ever reported on a turn outcome,
    /// the state handed back is already reset.
    TaskEmitted,
}

/// Item remembered from a successful search so that a later booking turn can
/// refer to it. Opaque to the dialogue policy; only the oracle reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingContext {
    pub item_type: String,
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    #[serde(default)]
    pub current_intent: Option<String>,

    #[serde(default)]
    pub filled_slots: BTreeMap<String, Value>,

    /// Required slots still unfilled, in manifest declaration order.
    #[serde(default)]
    pub missing_slots: Vec<String>,

    #[serde(default)]
    pub turn_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_context: Option<BookingContext>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no intent is active. The booking context is auxiliary and
    /// does not make a state non-empty.
    pub fn is_empty(&self) -> bool {
        self.current_intent.is_none() && self.filled_slots.is_empty() && self.missing_slots.is_empty()
    }

    pub fn phase(&self) -> DialoguePhase {
        match &self.current_intent {
            None => DialoguePhase::Empty,
            Some(_) if !self.missing_slots.is_empty() => DialoguePhase::Collecting,
            Some(_) => DialoguePhase::AwaitingConfirmation,
        }
    }

    /// Drop intent and slots for the next dialogue, keeping the booking context.
    pub fn reset(&self) -> Self {
        Self {
            booking_context: self.booking_context.clone(),
            ..Self::default()
        }
    }

    /// Fold the results of an executed task into the booking context.
    ///
    /// A search result (`search_type` FLIGHT or HOTEL) remembers its first item,
    /// a `BOOKING_CONFIRMED` status clears the context, and results carrying an
    /// `error` (or anything unrecognised) leave the state as it was.
    pub fn with_task_results(&self, results: &Value) -> Self {
        let mut next = self.clone();
        let Some(results) = results.as_object() else {
            return next;
        };
        if results.is_empty() || results.contains_key("error") {
            return next;
        }

        let item_type = match results.get("search_type").and_then(Value::as_str) {
            Some("FLIGHT") => Some("flight"),
            Some("HOTEL") => Some("hotel"),
            _ => None,
        };

        if let Some(item_type) = item_type {
            let best = results
                .get("results")
                .and_then(Value::as_array)
                .and_then(|items| items.first());
            let item_id = best.and_then(|b| b.get("item_id")).and_then(|id| match id {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });
            if let (Some(best), Some(item_id)) = (best, item_id) {
                next.booking_context = Some(BookingContext {
                    item_type: item_type.to_string(),
                    item_id,
                    price: best.get("price").filter(|p| !p.is_null()).cloned(),
                });
            }
        } else if results.get("status").and_then(Value::as_str) == Some("BOOKING_CONFIRMED") {
            next.booking_context = None;
        }

        next
    }

    /// Check a caller-supplied state against the manifest and the state invariants.
    ///
    /// Returns the capability for the active intent, if any.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Validation`] when the intent is not a declared capability,
    /// a slot name is not declared by that capability, or an invariant is broken.
    pub fn validate_against<'m>(
        &self,
        manifest: &'m AgentManifest,
    ) -> Result<Option<&'m CapabilitySpec>, ProtocolError> {
        let Some(intent) = &self.current_intent else {
            if !self.filled_slots.is_empty() || !self.missing_slots.is_empty() {
                return Err(ProtocolError::Validation(
                    "conversation_state has slots but no current_intent".to_string(),
                ));
            }
            return Ok(None);
        };

        let capability = manifest.resolve_capability(intent)?;

        if self.filled_slots.is_empty() && self.missing_slots.is_empty() {
            return Err(ProtocolError::Validation(format!(
                "conversation_state names intent '{}' but carries no slots",
                intent
            )));
        }

        for name in self.filled_slots.keys().chain(self.missing_slots.iter()) {
            if capability.slot(name).is_none() {
                return Err(ProtocolError::Validation(format!(
                    "slot '{}' is not declared by capability '{}'",
                    name, capability.name
                )));
            }
        }

        if let Some(overlap) = self
            .missing_slots
            .iter()
            .find(|name| self.filled_slots.contains_key(*name))
        {
            return Err(ProtocolError::Validation(format!(
                "slot '{}' is both filled and missing",
                overlap
            )));
        }

        Ok(Some(capability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::flight_manifest;
    use serde_json::json;

    fn collecting_state() -> ConversationState {
        ConversationState {
            current_intent: Some("BOOK_FLIGHT".to_string()),
            filled_slots: BTreeMap::from([("origin".to_string(), json!("YUL"))]),
            missing_slots: vec!["destination".to_string(), "date".to_string()],
            turn_count: 1,
            booking_context: None,
        }
    }

    #[test]
    fn test_empty_state_deserializes_from_empty_object() {
        let state: ConversationState = serde_json::from_str("{}").unwrap();
        assert!(state.is_empty());
        assert_eq!(state.phase(), DialoguePhase::Empty);
    }

    #[test]
    fn test_phase_is_derived_from_slots() {
        let mut state = collecting_state();
        assert_eq!(state.phase(), DialoguePhase::Collecting);

        state.missing_slots.clear();
        assert_eq!(state.phase(), DialoguePhase::AwaitingConfirmation);
    }

    #[test]
    fn test_reset_keeps_booking_context() {
        let mut state = collecting_state();
        state.booking_context = Some(BookingContext {
            item_type: "flight".to_string(),
            item_id: "AF006".to_string(),
            price: Some(json!(489.99)),
        });

        let reset = state.reset();
        assert!(reset.is_empty());
        assert_eq!(reset.turn_count, 0);
        assert_eq!(reset.booking_context, state.booking_context);
    }

    #[test]
    fn test_search_results_are_remembered() {
        let state = collecting_state();
        let next = state.with_task_results(&json!({
            "search_type": "FLIGHT",
            "results": [
                {"item_id": "AF006", "price": 489.99, "airline": "Air France"},
                {"item_id": "AC870", "price": 512.0}
            ]
        }));

        assert_eq!(
            next.booking_context,
            Some(BookingContext {
                item_type: "flight".to_string(),
                item_id: "AF006".to_string(),
                price: Some(json!(489.99)),
            })
        );
        // dialogue fields are untouched
        assert_eq!(next.filled_slots, state.filled_slots);
        assert_eq!(next.turn_count, state.turn_count);
    }

    #[test]
    fn test_booking_confirmation_clears_context() {
        let mut state = ConversationState::new();
        state.booking_context = Some(BookingContext {
            item_type: "hotel".to_string(),
            item_id: "H-42".to_string(),
            price: None,
        });

        let cleared = state.with_task_results(&json!({"status": "BOOKING_CONFIRMED"}));
        assert_eq!(cleared.booking_context, None);
    }

    #[test]
    fn test_failed_or_unusable_results_change_nothing() {
        let mut state = ConversationState::new();
        state.booking_context = Some(BookingContext {
            item_type: "hotel".to_string(),
            item_id: "H-42".to_string(),
            price: None,
        });

        for results in [
            json!({"error": "supplier timeout", "search_type": "FLIGHT", "results": [{"item_id": "X"}]}),
            json!({"search_type": "HOTEL", "results": []}),
            json!({"search_type": "HOTEL", "results": [{"price": 90}]}),
            json!({}),
            json!([1, 2, 3]),
        ] {
            assert_eq!(state.with_task_results(&results), state);
        }
    }

    #[test]
    fn test_validate_accepts_consistent_state() {
        let manifest = flight_manifest();
        let capability = collecting_state().validate_against(&manifest).unwrap();
        assert_eq!(capability.unwrap().name, "BOOK_FLIGHT");
    }

    #[test]
    fn test_validate_rejects_unknown_intent() {
        let manifest = flight_manifest();
        let mut state = collecting_state();
        state.current_intent = Some("LAUNCH_ROCKET".to_string());
        assert!(matches!(
            state.validate_against(&manifest),
            Err(ProtocolError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_overlapping_slots() {
        let manifest = flight_manifest();
        let mut state = collecting_state();
        state.missing_slots.push("origin".to_string());
        assert!(state.validate_against(&manifest).is_err());
    }

    #[test]
    fn test_validate_rejects_slots_without_intent() {
        let manifest = flight_manifest();
        let mut state = collecting_state();
        state.current_intent = None;
        assert!(state.validate_against(&manifest).is_err());
    }

    #[test]
    fn test_validate_rejects_undeclared_slot() {
        let manifest = flight_manifest();
        let mut state = collecting_state();
        state.filled_slots.insert("seat".to_string(), json!("12A"));
        assert!(state.validate_against(&manifest).is_err());
    }
}
