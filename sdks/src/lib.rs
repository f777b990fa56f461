// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! ZTAP Rust SDK
//!
//! Orchestrator-side client for a Zero-Trust Agent Protocol agent. Every
//! signed task the agent returns is verified against the manifest trust key
//! before the caller sees it.

pub mod client;
pub mod error;

pub use client::AgentClient;
pub use error::SdkError;

pub use ztap_core::domain::conversation::{BookingContext, ConversationState, DialoguePhase};
pub use ztap_core::domain::manifest::{AgentManifest, TrustSpec};
pub use ztap_core::domain::task::{SignedTask, Task};
pub use ztap_core::presentation::api::{FollowupResponse, TurnResponse};
