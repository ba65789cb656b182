/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! UDP relay (spec §4.6): forwards queries arriving over DoQ to a
//! backend DNS server over UDP, retransmitting on RTO until a response
//! arrives or attempts are exhausted.
//!
//! `now` is threaded through every method as an explicit `Instant`
//! parameter rather than read internally via `Instant::now()`, so the
//! scheduling invariants here are testable with a fake clock (spec
//! §4.10 test tooling note).

pub mod error;

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use doq_core::Query;

pub use error::RelayError;

/// `QUICDOQ_UDP_MAX_REPEAT`.
pub const MAX_REPEAT: u32 = 4;
/// `QUICDOQ_UDP_DEFAULT_RTO`, in microseconds in the source; kept here as
/// a `Duration` for ergonomics.
pub const DEFAULT_RTO: Duration = Duration::from_micros(1_000_000);

/// One query queued for UDP transmission/retransmission.
pub struct PendingQuery {
    pub query: Query,
    pub arrival_time: Instant,
    pub next_send_time: Instant,
    pub attempts: u32,
    pub udp_query_id: u16,
}

/// What `submit_transmit` found ready to send.
pub struct Transmission {
    pub udp_query_id: u16,
    pub payload: Vec<u8>,
}

/// What a UDP response matched and produced.
pub struct ReceivedResponse {
    pub udp_query_id: u16,
    pub query: Query,
    pub response: Vec<u8>,
}

/// Holds every in-flight relayed query, ordered by `next_send_time`
/// (spec §3: "the pending list is non-decreasing in next_send_time").
///
/// `srtt`/`drtt`(rttvar)/`rtt_min`/`rto` are sampled on every matched
/// response (Jacobson/Karels-style) but `effective_rto` still returns the
/// constant [`DEFAULT_RTO`] — the source carries these fields without
/// ever reading them for a live RTO decision, and this keeps that
/// behavior while exercising the sampling math under test.
pub struct RelayState {
    pending: VecDeque<PendingQuery>,
    next_id: u16,
    srtt: Option<Duration>,
    rttvar: Duration,
    rtt_min: Option<Duration>,
}

impl Default for RelayState {
    fn default() -> Self {
        RelayState {
            pending: VecDeque::new(),
            next_id: 0,
            srtt: None,
            rttvar: Duration::ZERO,
            rtt_min: None,
        }
    }
}

impl RelayState {
    pub fn new() -> Self {
        RelayState::default()
    }

    /// The RTO actually used for scheduling — constant, per source
    /// behavior, independent of the sampled `srtt`/`rttvar`.
    pub fn effective_rto(&self) -> Duration {
        DEFAULT_RTO
    }

    pub fn sampled_srtt(&self) -> Option<Duration> {
        self.srtt
    }

    /// `IncomingQuery` → ID assignment (spec §4.6): scan up to four
    /// candidate ids starting at `next_id`, rejecting any currently
    /// pending. Queues the query with `next_send_time = now` on success.
    ///
    /// Returns the query back to the caller on failure, since at that
    /// point it has not been queued anywhere else.
    pub fn submit(&mut self, query: Query, now: Instant) -> Result<u16, (Query, RelayError)> {
        let mut candidate = self.next_id;
        let mut chosen = None;
        for _ in 0..4 {
            if !self.pending.iter().any(|p| p.udp_query_id == candidate) {
                chosen = Some(candidate);
                break;
            }
            candidate = candidate.wrapping_add(1);
        }
        let id = match chosen {
            Some(id) => id,
            None => return Err((query, RelayError::IdExhausted)),
        };
        self.next_id = id.wrapping_add(1);

        let pending = PendingQuery {
            query,
            arrival_time: now,
            next_send_time: now,
            attempts: 0,
            udp_query_id: id,
        };
        self.insert_sorted(pending);
        Ok(id)
    }

    fn insert_sorted(&mut self, pending: PendingQuery) {
        let pos = self
            .pending
            .iter()
            .position(|p| p.next_send_time > pending.next_send_time)
            .unwrap_or(self.pending.len());
        self.pending.insert(pos, pending);
    }

    /// `Transmission` / retransmission (spec §4.6): if the head of the
    /// pending list is due (`next_send_time <= now`), build its UDP
    /// payload (the first two bytes replaced with `udp_query_id`),
    /// advance its schedule and re-insert it in order. Returns `None` if
    /// nothing is due yet.
    pub fn next_to_transmit(
        &mut self,
        now: Instant,
        send_buf_max: usize,
    ) -> Option<Result<Transmission, (PendingQuery, RelayError)>> {
        if self.pending.front()?.next_send_time > now {
            return None;
        }
        let pending = self.pending.pop_front()?;

        if pending.query.query.len() > send_buf_max {
            return Some(Err((pending, RelayError::QueryTooLong)));
        }
        if pending.attempts >= MAX_REPEAT {
            let attempts = pending.attempts;
            return Some(Err((pending, RelayError::ResponseTimedOut(attempts))));
        }
        let mut pending = pending;

        let mut payload = pending.query.query.clone();
        payload[0..2].copy_from_slice(&pending.udp_query_id.to_be_bytes());

        pending.attempts += 1;
        pending.next_send_time = now + self.effective_rto();
        let id = pending.udp_query_id;
        self.insert_sorted(pending);

        Some(Ok(Transmission {
            udp_query_id: id,
            payload,
        }))
    }

    /// `Reception` (spec §4.6): an arriving UDP packet's first two bytes
    /// are the relay-assigned id. Looks it up in `pending`; `None` for a
    /// stray or duplicate reply. On a genuine match, restores the
    /// query's original two-byte DNS id into the response and samples
    /// the round trip time.
    pub fn receive(
        &mut self,
        payload: &[u8],
        now: Instant,
    ) -> Option<Result<ReceivedResponse, (PendingQuery, RelayError)>> {
        if payload.len() < 2 {
            return None;
        }
        let id = u16::from_be_bytes([payload[0], payload[1]]);
        let idx = self.pending.iter().position(|p| p.udp_query_id == id)?;
        let pending = self.pending.remove(idx)?;

        if !pending.query.fits_response(payload.len()) {
            return Some(Err((pending, RelayError::ResponseTooLong)));
        }

        self.sample_rtt(now.saturating_duration_since(pending.arrival_time));

        let mut response = payload.to_vec();
        let original_id = pending.query.id.to_be_bytes();
        response[0..2].copy_from_slice(&original_id);

        let PendingQuery {
            mut query,
            udp_query_id,
            ..
        } = pending;
        query.response = response.clone();
        Some(Ok(ReceivedResponse {
            udp_query_id,
            query,
            response,
        }))
    }

    /// `Cancellation` (spec §4.6): drop a pending query with no further
    /// transmits. Returns it so the caller can still log/account for it.
    pub fn cancel(&mut self, udp_query_id: u16) -> Option<PendingQuery> {
        let idx = self
            .pending
            .iter()
            .position(|p| p.udp_query_id == udp_query_id)?;
        self.pending.remove(idx)
    }

    /// `next_wake_time` (spec §4.6): the head's `next_send_time`, or
    /// `None` standing in for the spec's `+∞` when the list is empty.
    pub fn next_wake_time(&self) -> Option<Instant> {
        self.pending.front().map(|p| p.next_send_time)
    }

    /// Jacobson/Karels-style RTT sampling, mirroring
    /// `original_source/quicdoq/udp_relay.c`'s carried-but-unused
    /// `srtt`/`drtt`/`rtt_min` fields. `effective_rto` never consults
    /// this; it only keeps the sampling math alive and tested.
    fn sample_rtt(&mut self, sample: Duration) {
        self.rtt_min = Some(match self.rtt_min {
            Some(min) => min.min(sample),
            None => sample,
        });
        match self.srtt {
            None => {
                self.srtt = Some(sample);
                self.rttvar = sample / 2;
            }
            Some(srtt) => {
                let diff = if sample > srtt {
                    sample - srtt
                } else {
                    srtt - sample
                };
                self.rttvar = (self.rttvar * 3 + diff) / 4;
                self.srtt = Some((srtt * 7 + sample) / 8);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn addr() -> SocketAddr {
        "127.0.0.1:53".parse().unwrap()
    }

    fn query(wire_id: u16) -> Query {
        let mut bytes = vec![0u8; 12];
        bytes[0..2].copy_from_slice(&wire_id.to_be_bytes());
        Query::new(wire_id, "example.com".into(), addr(), addr(), bytes, 512, 1232)
    }

    #[test]
    fn submit_and_wake_time_track_the_head() {
        let mut relay = RelayState::new();
        let now = Instant::now();
        assert_eq!(relay.next_wake_time(), None);
        let id = relay.submit(query(7), now).unwrap();
        assert_eq!(relay.next_wake_time(), Some(now));
        assert_eq!(id, 0);
    }

    #[test]
    fn four_id_collisions_fail_submission() {
        let mut relay = RelayState::new();
        let now = Instant::now();
        for _ in 0..4 {
            relay.submit(query(1), now).unwrap();
        }
        // ids 0..=3 are now all occupied; force the scan to restart at 0
        // so every one of the four candidates collides.
        relay.next_id = 0;
        let err = relay.submit(query(1), now).unwrap_err();
        assert_eq!(err.1, RelayError::IdExhausted);
    }

    #[test]
    fn transmission_reschedules_at_now_plus_rto() {
        let mut relay = RelayState::new();
        let now = Instant::now();
        relay.submit(query(1), now).unwrap();
        let result = relay.next_to_transmit(now, 4096).unwrap().unwrap();
        assert_eq!(result.udp_query_id, 0);
        assert_eq!(&result.payload[0..2], &[0u8, 0u8]);
        assert_eq!(relay.next_wake_time(), Some(now + relay.effective_rto()));
    }

    #[test]
    fn exceeding_max_repeat_fails_with_timeout() {
        let mut relay = RelayState::new();
        let mut now = Instant::now();
        relay.submit(query(1), now).unwrap();
        for _ in 0..MAX_REPEAT {
            relay.next_to_transmit(now, 4096).unwrap().unwrap();
            now += relay.effective_rto();
        }
        let outcome = relay.next_to_transmit(now, 4096).unwrap();
        assert!(matches!(
            outcome,
            Err((_, RelayError::ResponseTimedOut(n))) if n == MAX_REPEAT
        ));
        assert_eq!(relay.next_wake_time(), None);
    }

    #[test]
    fn reception_restores_original_id_and_removes_pending() {
        let mut relay = RelayState::new();
        let now = Instant::now();
        let original_id = 0xBEEF;
        relay.submit(query(original_id), now).unwrap();
        let sent = relay.next_to_transmit(now, 4096).unwrap().unwrap();

        let mut udp_reply = vec![0u8; 12];
        udp_reply[0..2].copy_from_slice(&sent.udp_query_id.to_be_bytes());
        let received = relay.receive(&udp_reply, now).unwrap().unwrap();

        assert_eq!(&received.response[0..2], &original_id.to_be_bytes());
        assert_eq!(relay.next_wake_time(), None);
    }

    #[test]
    fn unmatched_reply_is_dropped() {
        let mut relay = RelayState::new();
        let now = Instant::now();
        relay.submit(query(1), now).unwrap();
        let udp_reply = vec![0xFFu8, 0xFFu8, 0, 0];
        assert!(relay.receive(&udp_reply, now).is_none());
    }

    #[test]
    fn cancellation_removes_pending_with_no_further_transmits() {
        let mut relay = RelayState::new();
        let now = Instant::now();
        relay.submit(query(1), now).unwrap();
        assert!(relay.cancel(0).is_some());
        assert_eq!(relay.next_wake_time(), None);
    }

    #[test]
    fn rtt_sampling_updates_srtt_without_changing_effective_rto() {
        let mut relay = RelayState::new();
        let now = Instant::now();
        relay.submit(query(1), now).unwrap();
        relay.next_to_transmit(now, 4096).unwrap().unwrap();
        let later = now + Duration::from_millis(50);
        let mut udp_reply = vec![0u8; 12];
        udp_reply[0..2].copy_from_slice(&0u16.to_be_bytes());
        relay.receive(&udp_reply, later).unwrap().unwrap();

        assert!(relay.sampled_srtt().is_some());
        assert_eq!(relay.effective_rto(), DEFAULT_RTO);
    }
}
