/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use thiserror::Error;

/// Failures from the UDP relay's per-query state machine (spec §4.6),
/// matching the teacher's per-module error enum pattern
/// (`g3proxy/src/module/udp_relay/error.rs`).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    #[error("query exceeds the relay's UDP send buffer")]
    QueryTooLong,
    #[error("no response after {0} attempts")]
    ResponseTimedOut(u32),
    #[error("all four candidate UDP query ids collided with in-flight queries")]
    IdExhausted,
    #[error("response exceeds the query's response buffer")]
    ResponseTooLong,
}
