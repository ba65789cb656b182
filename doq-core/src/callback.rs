/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! The application callback contract (spec §4.4), realized as a trait
//! with one async method per case rather than a C-style dispatch on an
//! event enum (§9 design note).

use async_trait::async_trait;

use crate::error::{DoqError, DoqErrorCode};
use crate::query::{Query, QueryDisposition};

/// Implemented by whatever sits above the DoQ engine — here, the UDP
/// relay. Every method takes ownership of the `Query` it is handed and
/// either returns it (to the caller, on the client side) or surrenders it
/// back to the service via its return value (server side, via
/// [`QueryDisposition`]).
#[async_trait]
pub trait DoqHandler: Send + Sync + 'static {
    /// Server side: a fully-framed query has arrived on a fresh stream.
    /// The implementation must eventually resolve to either a response to
    /// post or a reason to cancel.
    async fn incoming_query(&self, query: Query) -> QueryDisposition;

    /// Client side, terminal: the response buffer holds the complete
    /// answer.
    async fn response_complete(&self, query: Query);

    /// Client side, intermediate: an interim response has overwritten the
    /// Query's response buffer; a further `Complete`/`Partial`/`Cancelled`
    /// is still pending on this stream.
    async fn response_partial(&self, query: &Query);

    /// Either side: the peer reset the stream or the local side cancelled
    /// it; `code` is the application error code that accompanied the
    /// reset.
    async fn response_cancelled(&self, query: Query, code: DoqErrorCode);

    /// Local transport or protocol failure, terminal.
    async fn query_failed(&self, query: Query, err: DoqError);
}
