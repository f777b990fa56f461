// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod bootstrap;
pub mod dialogue_engine;
pub mod protocol;

pub use bootstrap::AgentRuntime;
pub use dialogue_engine::{DialogueEngine, TurnOutcome, TurnReply};
pub use protocol::{FollowupOutcome, ProtocolFacade};
