// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Shared fixtures for unit tests.

use std::collections::HashMap;

use crate::domain::manifest::{
    AgentManifest, AgentManifestSpec, CapabilitySpec, ManifestMetadata, SlotSpec, TrustSpec,
    MANIFEST_API_VERSION, MANIFEST_KIND,
};
use crate::infrastructure::signing::Ed25519TaskSigner;

pub const TEST_SEED: [u8; 32] = [0x5a; 32];

pub fn test_signer() -> Ed25519TaskSigner {
    Ed25519TaskSigner::from_seed(TEST_SEED)
}

fn slot(name: &str, required: bool, prompt: Option<&str>) -> SlotSpec {
    SlotSpec {
        name: name.to_string(),
        required,
        prompt: prompt.map(str::to_string),
        description: None,
    }
}

/// Travel-desk manifest trusting [`test_signer`].
///
/// - `BOOK_FLIGHT`: origin, destination, date; no confirmation.
/// - `SEARCH_HOTEL`: city, optional max_price.
/// - `BOOK_HOTEL`: hotel_id, nights; confirmation and user auth required.
pub fn flight_manifest() -> AgentManifest {
    AgentManifest {
        api_version: MANIFEST_API_VERSION.to_string(),
        kind: MANIFEST_KIND.to_string(),
        metadata: ManifestMetadata {
            name: "travel-desk".to_string(),
            version: "1.0.0".to_string(),
            description: Some("Flight and hotel assistant".to_string()),
            labels: HashMap::new(),
        },
        spec: AgentManifestSpec {
            greeting: Some("Hi! I can book flights and find hotels.".to_string()),
            capabilities: vec![
                CapabilitySpec {
                    name: "BOOK_FLIGHT".to_string(),
                    description: Some("Book a one-way flight".to_string()),
                    slots: vec![
                        slot("origin", true, Some("Where are you flying from?")),
                        slot("destination", true, Some("Where are you flying to?")),
                        slot("date", true, None),
                    ],
                    requires_confirmation: false,
                    confirmation_prompt: None,
                    requires_user_auth: false,
                },
                CapabilitySpec {
                    name: "SEARCH_HOTEL".to_string(),
                    description: None,
                    slots: vec![
                        slot("city", true, Some("Which city?")),
                        slot("max_price", false, None),
                    ],
                    requires_confirmation: false,
                    confirmation_prompt: None,
                    requires_user_auth: false,
                },
                CapabilitySpec {
                    name: "BOOK_HOTEL".to_string(),
                    description: Some("Book a hotel found by a previous search".to_string()),
                    slots: vec![slot("hotel_id", true, None), slot("nights", true, Some("How many nights?"))],
                    requires_confirmation: true,
                    confirmation_prompt: None,
                    requires_user_auth: true,
                },
            ],
            trust: TrustSpec {
                algorithm: "Ed25519".to_string(),
                public_key: test_signer().public_key_base64(),
            },
        },
    }
}
