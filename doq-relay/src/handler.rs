/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! Implements [`DoqHandler`] for the server side by driving a query
//! through the UDP relay to completion before returning a disposition
//! (spec §2's data flow: "accepts the query... retransmits on RTO until
//! a response arrives or attempts are exhausted").
//!
//! A single driver task owns the UDP socket and the [`RelayState`]; many
//! `incoming_query` calls can be in flight at once (one per accepted
//! stream), so they talk to the driver over a channel rather than each
//! racing to read the shared socket themselves. Without this, two
//! concurrent queries could each observe *some* reply on the socket and
//! resolve against it regardless of whether it was theirs.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use slog::{debug, o, warn, Logger};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, oneshot};

use doq_core::{DoqError, DoqErrorCode, DoqHandler, Query, QueryDisposition};

use crate::relay::{RelayError, RelayState};

const UDP_RECV_BUF: usize = 4096;

enum RelayCommand {
    Submit {
        query: Query,
        respond_to: oneshot::Sender<QueryDisposition>,
    },
}

/// Binds one UDP socket to the configured backend DNS server and drives
/// queries through a background task holding the single [`RelayState`].
pub struct RelayHandler {
    commands: mpsc::UnboundedSender<RelayCommand>,
    logger: Logger,
}

impl RelayHandler {
    pub async fn bind(upstream: SocketAddr, logger: Logger) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let (tx, rx) = mpsc::unbounded_channel();
        let driver_logger = logger.new(o!("module" => "relay"));
        tokio::spawn(drive(socket, upstream, rx, driver_logger));
        Ok(RelayHandler {
            commands: tx,
            logger,
        })
    }
}

#[async_trait]
impl DoqHandler for RelayHandler {
    async fn incoming_query(&self, query: Query) -> QueryDisposition {
        let (respond_to, recv) = oneshot::channel();
        let query = match self.commands.send(RelayCommand::Submit { query, respond_to }) {
            Ok(()) => None,
            // driver task is gone; the channel hands the command back so
            // we still have the query to report failure against.
            Err(mpsc::error::SendError(RelayCommand::Submit { query, .. })) => Some(query),
        };
        if let Some(query) = query {
            return QueryDisposition::Cancel(query, DoqErrorCode::Internal);
        }

        match recv.await {
            Ok(disposition) => disposition,
            // driver dropped the sender without replying; it never had
            // the chance to hand the query back, so there is nothing
            // left to build a disposition from but an empty one.
            Err(_) => QueryDisposition::Cancel(
                Query::new(0, String::new(), dead_addr(), dead_addr(), Vec::new(), 0, 0),
                DoqErrorCode::Internal,
            ),
        }
    }

    async fn response_complete(&self, _query: Query) {}
    async fn response_partial(&self, _query: &Query) {}

    async fn response_cancelled(&self, query: Query, code: DoqErrorCode) {
        warn!(self.logger, "query cancelled"; "sni" => %query.sni, "code" => ?code);
    }

    async fn query_failed(&self, query: Query, err: DoqError) {
        warn!(self.logger, "query failed"; "sni" => %query.sni, "error" => %err);
    }
}

fn dead_addr() -> SocketAddr {
    "0.0.0.0:0".parse().unwrap()
}

fn relay_error_code(err: RelayError) -> DoqErrorCode {
    match err {
        RelayError::QueryTooLong => DoqErrorCode::QueryTooLong,
        RelayError::ResponseTimedOut(_) => DoqErrorCode::ResponseTimeOut,
        RelayError::ResponseTooLong => DoqErrorCode::ResponseTooLong,
        RelayError::IdExhausted => DoqErrorCode::Internal,
    }
}

/// Owns the socket and [`RelayState`] exclusively; every `incoming_query`
/// call only ever talks to this loop through `commands`, so a UDP reply
/// is always routed back to the task that submitted the matching query.
async fn drive(
    socket: UdpSocket,
    upstream: SocketAddr,
    mut commands: mpsc::UnboundedReceiver<RelayCommand>,
    logger: Logger,
) {
    let mut state = RelayState::new();
    let mut waiters: HashMap<u16, oneshot::Sender<QueryDisposition>> = HashMap::new();
    let mut buf = [0u8; UDP_RECV_BUF];

    loop {
        let wait = match state.next_wake_time() {
            Some(at) => at.saturating_duration_since(Instant::now()),
            None => Duration::from_secs(3600),
        };

        tokio::select! {
            cmd = commands.recv() => {
                match cmd {
                    Some(RelayCommand::Submit { query, respond_to }) => {
                        match state.submit(query, Instant::now()) {
                            Ok(id) => {
                                waiters.insert(id, respond_to);
                            }
                            Err((query, err)) => {
                                let _ = respond_to.send(QueryDisposition::Cancel(query, relay_error_code(err)));
                            }
                        }
                    }
                    None => {
                        debug!(logger, "relay command channel closed, shutting down driver");
                        return;
                    }
                }
            }
            recv = socket.recv_from(&mut buf) => {
                if let Ok((n, from)) = recv {
                    if from != upstream {
                        continue;
                    }
                    if let Some(outcome) = state.receive(&buf[..n], Instant::now()) {
                        match outcome {
                            Ok(received) => {
                                if let Some(waiter) = waiters.remove(&received.udp_query_id) {
                                    let _ = waiter.send(QueryDisposition::Respond(received.query));
                                }
                            }
                            Err((pending, err)) => {
                                if let Some(waiter) = waiters.remove(&pending.udp_query_id) {
                                    let _ = waiter.send(QueryDisposition::Cancel(pending.query, relay_error_code(err)));
                                }
                            }
                        }
                    }
                }
            }
            _ = tokio::time::sleep(wait) => {
                while let Some(result) = state.next_to_transmit(Instant::now(), UDP_RECV_BUF) {
                    match result {
                        Ok(tx) => {
                            if let Err(e) = socket.send_to(&tx.payload, upstream).await {
                                warn!(logger, "send to upstream failed"; "error" => %e);
                            }
                        }
                        Err((pending, err)) => {
                            if let Some(waiter) = waiters.remove(&pending.udp_query_id) {
                                let _ = waiter.send(QueryDisposition::Cancel(pending.query, relay_error_code(err)));
                            }
                        }
                    }
                }
            }
        }
    }
}
