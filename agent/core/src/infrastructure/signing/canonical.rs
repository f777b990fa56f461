// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Canonical task encoding.
//!
//! Signer and verifier both call [`canonical_bytes`]; nothing else defines the
//! signed message. Layout:
//!
//! ```text
//! ztap-task-v1\n<RFC 8785 JSON of {"parameters": {..}, "task_name": ".."}>
//! ```
//!
//! The body is JSON Canonicalization Scheme output: keys sorted at every
//! depth, no insignificant whitespace, ECMAScript number formatting (`2.0`
//! and `2` encode the same). Any JCS implementation can rebuild it from the
//! wire form of a task.

use serde_json::json;

use crate::domain::signature::SignatureError;
use crate::domain::task::Task;

pub const CANONICAL_DOMAIN_TAG: &[u8] = b"ztap-task-v1\n";

pub fn canonical_bytes(task: &Task) -> Result<Vec<u8>, SignatureError> {
    let body = serde_jcs::to_vec(&json!({
        "task_name": task.task_name(),
        "parameters": task.parameters(),
    }))
    .map_err(|e| SignatureError::Malformed(format!("task is not canonicalizable: {}", e)))?;

    let mut out = Vec::with_capacity(CANONICAL_DOMAIN_TAG.len() + body.len());
    out.extend_from_slice(CANONICAL_DOMAIN_TAG);
    out.extend_from_slice(&body);
    Ok(out)
}
