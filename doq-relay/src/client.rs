/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! Client-mode driver (spec §6): connects to a DoQ server, sends each
//! requested query over its own stream, and prints the parsed response,
//! mirroring `original_source/quicdoq_cli_app/quicdoq_app.c`'s demo
//! client loop.

use std::net::SocketAddr;

use async_trait::async_trait;
use slog::{info, warn, Logger};
use tokio::sync::Mutex;

use doq_core::{DoqError, DoqErrorCode, DoqHandler, DoqService, Query, QueryDisposition};
use doq_proto::{json, query::encode_query, rrtype::get_rr_type, Message};

use crate::opts::QuerySpec;

const DEFAULT_QUERY_MAX_SIZE: usize = 512;
const DEFAULT_RESPONSE_MAX_SIZE: usize = 4096;
const EDNS_UDP_PAYLOAD_SIZE: u16 = 1232;

/// Minimal [`DoqHandler`] for the client side: queries are always driven
/// through [`doq_core::adapter::post_query`] directly rather than an
/// accept loop, so only the completion/partial/cancel/failure callbacks
/// are ever exercised here.
pub struct PrintingHandler {
    logger: Logger,
    completed: Mutex<u32>,
}

impl PrintingHandler {
    pub fn new(logger: Logger) -> Self {
        PrintingHandler {
            logger,
            completed: Mutex::new(0),
        }
    }

    pub async fn completed_count(&self) -> u32 {
        *self.completed.lock().await
    }
}

#[async_trait]
impl DoqHandler for PrintingHandler {
    async fn incoming_query(&self, query: Query) -> QueryDisposition {
        // the client never accepts server-initiated streams in this demo
        QueryDisposition::Cancel(query, DoqErrorCode::Internal)
    }

    async fn response_complete(&self, query: Query) {
        *self.completed.lock().await += 1;
        print_response(&self.logger, &query);
    }

    async fn response_partial(&self, query: &Query) {
        info!(self.logger, "partial response received"; "bytes" => query.response.len());
    }

    async fn response_cancelled(&self, query: Query, code: DoqErrorCode) {
        warn!(self.logger, "query cancelled"; "sni" => %query.sni, "code" => ?code);
    }

    async fn query_failed(&self, query: Query, err: DoqError) {
        warn!(self.logger, "query failed"; "sni" => %query.sni, "error" => %err);
    }
}

fn print_response(logger: &Logger, query: &Query) {
    match Message::parse(&query.response) {
        Ok(msg) => println!("{}", json::to_json(&msg)),
        Err(e) => warn!(logger, "response did not parse as DNS"; "error" => %e),
    }
}

/// Run every query in `specs` sequentially over its own bidirectional
/// stream on `connection`, printing each parsed response as it completes.
pub async fn run_queries(
    service: &DoqService<PrintingHandler>,
    connection: &quinn::Connection,
    specs: &[QuerySpec],
    logger: &Logger,
) -> anyhow::Result<()> {
    for (i, spec) in specs.iter().enumerate() {
        let qtype = get_rr_type(&spec.rrtype);
        if qtype == u16::MAX {
            warn!(logger, "unknown RRTYPE, skipping"; "rrtype" => %spec.rrtype);
            continue;
        }
        let qname = if spec.name.ends_with('.') {
            spec.name.clone()
        } else {
            format!("{}.", spec.name)
        };

        let wire = encode_query(&qname, 0, qtype, 1, EDNS_UDP_PAYLOAD_SIZE)?;
        let peer_addr = peer_addr_of(connection);
        let query = Query::new(
            i as u16,
            spec.name.clone(),
            peer_addr,
            peer_addr,
            wire,
            DEFAULT_QUERY_MAX_SIZE,
            DEFAULT_RESPONSE_MAX_SIZE,
        );

        info!(logger, "sending query"; "name" => %spec.name, "rrtype" => %spec.rrtype);
        doq_core::adapter::post_query(service, connection, query).await?;
    }
    Ok(())
}

fn peer_addr_of(connection: &quinn::Connection) -> SocketAddr {
    connection.remote_address()
}
