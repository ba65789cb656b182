/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! The QUIC event adapter (spec §4.5): async tasks driven by `quinn`
//! connection/stream futures, one per accepted or opened connection,
//! implementing the event → DoQ-action table as call sites rather than a
//! literal callback-per-event dispatcher (§9 design note).
//!
//! This module is intentionally thin and largely untested directly — the
//! framing invariants it relies on are exercised in [`crate::stream`]'s
//! unit tests; here we trust the plumbing and log failures at the
//! service layer instead of threading a logger through every call.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use doq_proto::DOQ_WIRE_ID;

use crate::callback::DoqHandler;
use crate::connection::Connection as DoqConnection;
use crate::error::{DoqError, DoqErrorCode};
use crate::query::{Query, QueryDisposition};
use crate::service::DoqService;
use crate::stream::{frame_message, StreamRole};

/// Queries currently in flight on one connection, keyed by QUIC stream id.
/// Populated right before a query is handed to the application and
/// drained on transport close, so every query still outstanding when the
/// connection goes away gets a terminal `query_failed` (spec §7) instead
/// of silently vanishing.
type LiveQueries = Arc<Mutex<HashMap<u64, Query>>>;

/// Read one length-prefixed DNS message off `recv`, or `None` if the
/// stream ended cleanly before any more bytes arrived.
async fn read_framed(recv: &mut quinn::RecvStream, max_len: usize) -> Result<Option<Vec<u8>>, DoqError> {
    let mut len_buf = [0u8; 2];
    match recv.read_exact(&mut len_buf).await {
        Ok(()) => {}
        Err(quinn::ReadExactError::FinishedEarly(0)) => return Ok(None),
        Err(e) => return Err(DoqError::Read(e)),
    }
    let declared = u16::from_be_bytes(len_buf) as usize;
    if declared > max_len {
        return Err(DoqError::Stream(
            recv.id().index(),
            DoqErrorCode::Protocol,
        ));
    }
    let mut payload = vec![0u8; declared];
    recv.read_exact(&mut payload).await.map_err(DoqError::Read)?;
    Ok(Some(payload))
}

/// Drive one accepted server connection until it closes, dispatching
/// every inbound stream to `service.handler`.
///
/// Registers the connection in `service.registry` for the connection's
/// lifetime (spec §9 item 1) and fans `query_failed` out to every query
/// still live when the peer's stream acceptance ends (spec §7 "transport
/// close").
pub async fn run_server_connection<H: DoqHandler>(
    service: Arc<DoqService<H>>,
    connection: quinn::Connection,
    peer_addr: SocketAddr,
    query_max_size: usize,
    response_max_size: usize,
) {
    let handler = service.handler.clone();
    service.check_transport_param(
        "initial_max_stream_data_bidi_remote",
        response_max_size as u64,
    );

    let conn_id = {
        let mut registry = service.registry.lock().await;
        registry.insert_server(DoqConnection::new(StreamRole::Server, None, peer_addr))
    };

    let live: LiveQueries = Arc::new(Mutex::new(HashMap::new()));

    loop {
        match connection.accept_bi().await {
            Ok((send, recv)) => {
                let handler = handler.clone();
                let connection = connection.clone();
                let live = live.clone();
                tokio::spawn(async move {
                    let stream_id = recv.id().index();
                    let result = serve_one_stream(
                        send,
                        recv,
                        peer_addr,
                        query_max_size,
                        response_max_size,
                        handler,
                        live.clone(),
                    )
                    .await;
                    live.lock()
                        .expect("live-query map poisoned")
                        .remove(&stream_id);
                    if let Err(err) = result {
                        // A framing violation is the peer's entire
                        // connection misbehaving, not just one stream —
                        // spec §7 says to close the connection with
                        // PROTOCOL, not just reset the one stream.
                        let code = err.code().unwrap_or(DoqErrorCode::Internal);
                        connection.close(code.into(), b"");
                    }
                });
            }
            Err(_) => break,
        }
    }

    let stranded: Vec<Query> = live
        .lock()
        .expect("live-query map poisoned")
        .drain()
        .map(|(_, q)| q)
        .collect();
    for query in stranded {
        handler
            .query_failed(query, DoqError::ConnectionClosed(peer_addr.to_string()))
            .await;
    }

    service.registry.lock().await.remove(conn_id);
}

async fn serve_one_stream<H: DoqHandler>(
    mut send: quinn::SendStream,
    mut recv: quinn::RecvStream,
    peer_addr: SocketAddr,
    query_max_size: usize,
    response_max_size: usize,
    handler: Arc<H>,
    live: LiveQueries,
) -> Result<(), DoqError> {
    let query_bytes = match read_framed(&mut recv, query_max_size).await? {
        Some(bytes) => bytes,
        None => return Ok(()), // stream closed before sending anything
    };

    if query_bytes.len() < 2 {
        return Err(DoqError::Stream(recv.id().index(), DoqErrorCode::Protocol));
    }
    let wire_id = u16::from_be_bytes([query_bytes[0], query_bytes[1]]);
    if wire_id != DOQ_WIRE_ID {
        return Err(DoqError::Stream(recv.id().index(), DoqErrorCode::Protocol));
    }

    let stream_id = recv.id().index();
    let mut query = Query::new(
        0,
        String::new(),
        peer_addr,
        peer_addr,
        query_bytes,
        query_max_size,
        response_max_size,
    );
    query.stream_id = Some(stream_id);
    live.lock()
        .expect("live-query map poisoned")
        .insert(stream_id, query.clone());

    let disposition = handler.incoming_query(query).await;
    live.lock().expect("live-query map poisoned").remove(&stream_id);

    match disposition {
        QueryDisposition::Respond(query) => {
            let framed = frame_message(&query.response)?;
            send.write_all(&framed).await.map_err(DoqError::Write)?;
            send.finish()
                .map_err(|_| DoqError::Stream(recv.id().index(), DoqErrorCode::Internal))?;
            Ok(())
        }
        QueryDisposition::Cancel(_query, code) => {
            send.reset(code.into())
                .map_err(|_| DoqError::Stream(recv.id().index(), code))?;
            Ok(())
        }
    }
}

/// Report `err` to `handler` via the terminal `query_failed` callback,
/// then hand back an owned `DoqError` carrying the same application code
/// for the caller to propagate — `err` itself is consumed by the
/// callback, so this is how the caller still gets something to return.
async fn fail_query<H: DoqHandler>(
    handler: &Arc<H>,
    query: Query,
    stream_id: u64,
    err: DoqError,
) -> DoqError {
    let code = err.code().unwrap_or(DoqErrorCode::Internal);
    handler.query_failed(query, err).await;
    DoqError::Stream(stream_id, code)
}

/// Client side: open a fresh bidirectional stream, send `query.query`
/// framed, then read back either one complete response, or a sequence of
/// intermediate ones (`response_partial`) followed by a final one
/// (`response_complete`) — the multi-response pattern from spec §4.4.
///
/// Every failure path reports through `service.handler.query_failed`
/// before returning an error, so a caller that only logs the `Result` (or
/// ignores it) still sees the terminal notification spec §7 requires.
pub async fn post_query<H: DoqHandler>(
    service: &DoqService<H>,
    connection: &quinn::Connection,
    mut query: Query,
) -> Result<(), DoqError> {
    let handler = service.handler.clone();

    let (mut send, mut recv) = match connection.open_bi().await {
        Ok(pair) => pair,
        Err(e) => return Err(fail_query(&handler, query, 0, DoqError::Quic(e)).await),
    };
    let stream_id = send.id().index();
    query.stream_id = Some(stream_id);

    service.check_transport_param(
        "initial_max_stream_data_bidi_local",
        query.response_max_size as u64,
    );

    let framed = match frame_message(&query.query) {
        Ok(framed) => framed,
        Err(e) => return Err(fail_query(&handler, query, stream_id, e).await),
    };
    if let Err(e) = send.write_all(&framed).await {
        return Err(fail_query(&handler, query, stream_id, DoqError::Write(e)).await);
    }
    if send.finish().is_err() {
        let err = DoqError::Stream(stream_id, DoqErrorCode::Internal);
        return Err(fail_query(&handler, query, stream_id, err).await);
    }

    let max_len = query.response_max_size;
    let mut pending: Option<Vec<u8>> = None;
    loop {
        let read = match read_framed(&mut recv, max_len).await {
            Ok(read) => read,
            Err(e) => return Err(fail_query(&handler, query, stream_id, e).await),
        };
        match read {
            Some(payload) => {
                if let Some(prior) = pending.replace(payload) {
                    if let Err(e) = query.set_response(prior) {
                        return Err(fail_query(&handler, query, stream_id, e).await);
                    }
                    handler.response_partial(&query).await;
                }
            }
            None => {
                match pending {
                    Some(last) => {
                        if let Err(e) = query.set_response(last) {
                            return Err(fail_query(&handler, query, stream_id, e).await);
                        }
                        handler.response_complete(query).await;
                    }
                    None => {
                        let err = DoqError::Stream(stream_id, DoqErrorCode::Protocol);
                        return Err(fail_query(&handler, query, stream_id, err).await);
                    }
                }
                return Ok(());
            }
        }
    }
}

/// `cancel_query` per the documented (not the source's no-op) behavior:
/// reset the send side and stop the receive side, then deliver
/// `response_cancelled` — the resolved Open Question from §9.
pub async fn cancel_query<H: DoqHandler>(
    mut send: quinn::SendStream,
    mut recv: quinn::RecvStream,
    query: Query,
    handler: Arc<H>,
    code: DoqErrorCode,
) {
    let varint: quinn::VarInt = code.into();
    let _ = send.reset(varint);
    let _ = recv.stop(varint);
    handler.response_cancelled(query, code).await;
}
