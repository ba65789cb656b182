/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! The DoQ (DNS-over-QUIC) protocol engine: stream framing, connection
//! registry, application callback contract and the QUIC event adapter
//! built on top of [`doq_proto`]'s DNS codec.

pub mod adapter;
pub mod callback;
pub mod connection;
pub mod error;
pub mod query;
pub mod service;
pub mod stream;

pub use callback::DoqHandler;
pub use error::{DoqError, DoqErrorCode};
pub use query::{Query, QueryDisposition};
pub use service::{DoqService, ALPN_DOQ, DEFAULT_PORT};
