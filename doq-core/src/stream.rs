/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! Per-stream DoQ framing: the length-prefix receive accumulator and the
//! stream lifecycle it drives (spec §4.2).
//!
//! Sending is comparatively trivial in an async-Rust rewrite: unlike the
//! C source's "transmit callback requests up to `space` bytes" cursor,
//! `quinn::SendStream::write_all` already retries partial writes
//! internally, so there is no cursor to hand-roll on the send side; see
//! [`frame_message`] and [`adapter`](crate::adapter) for how a frame is
//! built and written in one call.

use crate::error::{DoqError, DoqErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRole {
    Client,
    Server,
}

/// Lifecycle states from spec §4.2's state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Receiving,
    Sending,
    Done,
    Aborted,
}

/// Prefix a DNS message with its 2-byte big-endian length, ready to hand
/// to `SendStream::write_all`.
pub fn frame_message(payload: &[u8]) -> Result<Vec<u8>, DoqError> {
    let len = u16::try_from(payload.len())
        .map_err(|_| DoqError::Stream(0, DoqErrorCode::QueryTooLong))?;
    let mut framed = Vec::with_capacity(2 + payload.len());
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(payload);
    Ok(framed)
}

/// Accumulates length-prefixed payloads arriving on a stream's receive
/// side, implementing the receive rule from spec §4.2.
///
/// `max_payload` bounds the length prefix itself (a raw protocol sanity
/// check, effectively always 65535 since `L` is 16 bits); it is distinct
/// from a `Query`'s `response_max_size`, which is an application-level
/// bound checked by the caller against each completed payload (see
/// [`crate::query::Query::fits_response`]).
pub struct ReceiveCursor {
    role: StreamRole,
    max_payload: usize,
    len_buf: Vec<u8>,
    declared_len: Option<usize>,
    payload: Vec<u8>,
    completed_count: u64,
}

impl ReceiveCursor {
    pub fn new(role: StreamRole, max_payload: usize) -> Self {
        ReceiveCursor {
            role,
            max_payload,
            len_buf: Vec::with_capacity(2),
            declared_len: None,
            payload: Vec::new(),
            completed_count: 0,
        }
    }

    /// How many full responses have completed on this stream so far.
    /// Used to enforce "the client stream MUST have observed at least
    /// one complete response" before FIN is accepted.
    pub fn completed_count(&self) -> u64 {
        self.completed_count
    }

    /// Feed newly-arrived bytes. Returns the payloads of any responses
    /// that completed as a result — ordinarily 0 or 1, but more than one
    /// if a single feed spans several back-to-back responses on a client
    /// stream (the multi-response / `ResponsePartial` pattern).
    pub fn feed(&mut self, mut data: &[u8]) -> Result<Vec<Vec<u8>>, DoqError> {
        let mut completed = Vec::new();
        loop {
            if self.declared_len.is_none() {
                if data.is_empty() {
                    break;
                }
                let need = 2 - self.len_buf.len();
                let take = need.min(data.len());
                self.len_buf.extend_from_slice(&data[..take]);
                data = &data[take..];
                if self.len_buf.len() < 2 {
                    break;
                }
                let declared = u16::from_be_bytes([self.len_buf[0], self.len_buf[1]]) as usize;
                if declared > self.max_payload {
                    return Err(DoqError::Stream(0, DoqErrorCode::Protocol));
                }
                self.declared_len = Some(declared);
                self.len_buf.clear();
            }

            let declared = self.declared_len.expect("checked above");
            let remaining = declared - self.payload.len();
            if remaining > 0 {
                if data.is_empty() {
                    break;
                }
                let take = remaining.min(data.len());
                self.payload.extend_from_slice(&data[..take]);
                data = &data[take..];
                if self.payload.len() < declared {
                    break;
                }
            }

            completed.push(std::mem::take(&mut self.payload));
            self.declared_len = None;
            self.completed_count += 1;

            if !data.is_empty() {
                if self.role == StreamRole::Server {
                    // A server stream carries exactly one query; anything
                    // after it completes is a framing violation.
                    return Err(DoqError::Stream(0, DoqErrorCode::Protocol));
                }
                // Client: the leftover bytes are the start of the next
                // response on this stream; loop around and keep parsing.
            }
        }
        Ok(completed)
    }

    /// Called when the peer signals FIN. `Ok(())` iff the receive state
    /// is consistent with a clean end-of-stream: no partial length
    /// prefix or payload pending, and (client-only) at least one
    /// response was completed.
    pub fn on_fin(&self) -> Result<(), DoqError> {
        let mid_prefix = !self.len_buf.is_empty();
        let mid_payload = self.declared_len.is_some();
        if mid_prefix || mid_payload {
            return Err(DoqError::Stream(0, DoqErrorCode::Protocol));
        }
        if self.role == StreamRole::Client && self.completed_count == 0 {
            return Err(DoqError::Stream(0, DoqErrorCode::Protocol));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(payload: &[u8]) -> Vec<u8> {
        frame_message(payload).unwrap()
    }

    #[test]
    fn single_response_in_one_feed() {
        let mut cursor = ReceiveCursor::new(StreamRole::Client, 65535);
        let wire = framed(b"hello");
        let completed = cursor.feed(&wire).unwrap();
        assert_eq!(completed, vec![b"hello".to_vec()]);
        assert_eq!(cursor.completed_count(), 1);
        cursor.on_fin().unwrap();
    }

    #[test]
    fn response_split_across_many_feeds() {
        let mut cursor = ReceiveCursor::new(StreamRole::Server, 65535);
        let wire = framed(b"0123456789");
        let mut got = Vec::new();
        for byte in &wire {
            got.extend(cursor.feed(std::slice::from_ref(byte)).unwrap());
        }
        assert_eq!(got, vec![b"0123456789".to_vec()]);
    }

    #[test]
    fn client_multi_response_in_one_feed_yields_both() {
        let mut cursor = ReceiveCursor::new(StreamRole::Client, 65535);
        let mut wire = framed(b"first");
        wire.extend(framed(b"second"));
        let completed = cursor.feed(&wire).unwrap();
        assert_eq!(completed, vec![b"first".to_vec(), b"second".to_vec()]);
        assert_eq!(cursor.completed_count(), 2);
    }

    #[test]
    fn server_excess_bytes_after_one_response_is_protocol_error() {
        let mut cursor = ReceiveCursor::new(StreamRole::Server, 65535);
        let mut wire = framed(b"query");
        wire.push(0xAA); // stray trailing byte
        let err = cursor.feed(&wire).unwrap_err();
        assert!(matches!(
            err,
            DoqError::Stream(_, DoqErrorCode::Protocol)
        ));
    }

    #[test]
    fn declared_length_over_max_payload_is_protocol_error() {
        let mut cursor = ReceiveCursor::new(StreamRole::Client, 4);
        let wire = framed(b"12345"); // declares length 5 > max_payload 4
        let err = cursor.feed(&wire).unwrap_err();
        assert!(matches!(
            err,
            DoqError::Stream(_, DoqErrorCode::Protocol)
        ));
    }

    #[test]
    fn fin_before_any_response_fails_for_client() {
        let cursor = ReceiveCursor::new(StreamRole::Client, 65535);
        assert!(cursor.on_fin().is_err());
    }

    #[test]
    fn fin_mid_payload_fails() {
        let mut cursor = ReceiveCursor::new(StreamRole::Server, 65535);
        let wire = framed(b"hello");
        cursor.feed(&wire[..4]).unwrap();
        assert!(cursor.on_fin().is_err());
    }

    #[test]
    fn zero_length_response_is_rejected_at_the_stream_layer() {
        // Spec §8 boundary: an encoded length of 0 on the wire must be
        // rejected on receive. We model this as the caller checking the
        // decoded payload, not the cursor itself (an empty payload is a
        // structurally valid frame); confirm it decodes to an empty vec
        // so callers have something concrete to reject.
        let mut cursor = ReceiveCursor::new(StreamRole::Server, 65535);
        let wire = [0u8, 0u8];
        let completed = cursor.feed(&wire).unwrap();
        assert_eq!(completed, vec![Vec::<u8>::new()]);
    }
}
