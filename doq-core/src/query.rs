/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! The unit of application work flowing through a DoQ stream (spec §3).

use std::net::SocketAddr;

use crate::error::{DoqError, DoqErrorCode};

/// What a [`crate::callback::DoqHandler::incoming_query`] implementation
/// decided to do with a query, once it has a result in hand. Modeled as a
/// return value rather than a later `post_response`/`cancel_response` call
/// back into the service: the handler's async method already runs to
/// completion (e.g. the whole UDP relay round trip) before returning, so
/// there is nothing to hand back into later.
pub enum QueryDisposition {
    Respond(Query),
    Cancel(Query, DoqErrorCode),
}

/// A DNS query/response exchange bound to one DoQ stream.
///
/// `sni`/addresses are owned `String`/`SocketAddr` rather than borrowed, a
/// deliberate departure from the source's borrowed-pointer fields: a
/// `Query` here crosses an `await` point (and often a channel) on its way
/// to the relay and back, so it cannot borrow from a caller-local stack
/// frame the way the original's synchronous callback could.
#[derive(Clone)]
pub struct Query {
    pub id: u16,
    pub sni: String,
    pub peer_addr: SocketAddr,
    pub local_addr: SocketAddr,
    pub query: Vec<u8>,
    pub query_max_size: usize,
    pub response: Vec<u8>,
    pub response_max_size: usize,
    pub stream_id: Option<u64>,
    pub rcode: Option<u8>,
}

impl Query {
    pub fn new(
        id: u16,
        sni: String,
        peer_addr: SocketAddr,
        local_addr: SocketAddr,
        query: Vec<u8>,
        query_max_size: usize,
        response_max_size: usize,
    ) -> Self {
        Query {
            id,
            sni,
            peer_addr,
            local_addr,
            query,
            query_max_size,
            response: Vec::new(),
            response_max_size,
            stream_id: None,
            rcode: None,
        }
    }

    /// Whether a response of `len` bytes fits this query's response
    /// buffer bound (spec §8: "A response whose declared L exceeds
    /// response_max_size must cancel with RESPONSE_TOO_LONG").
    pub fn fits_response(&self, len: usize) -> bool {
        len <= self.response_max_size
    }

    /// Install a completed response payload, checking it against
    /// `response_max_size` first.
    pub fn set_response(&mut self, data: Vec<u8>) -> Result<(), DoqError> {
        if !self.fits_response(data.len()) {
            return Err(DoqError::Stream(
                self.stream_id.unwrap_or(0),
                DoqErrorCode::ResponseTooLong,
            ));
        }
        self.response = data;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:784".parse().unwrap()
    }

    #[test]
    fn response_within_bound_is_accepted() {
        let mut q = Query::new(1, "example.com".into(), addr(), addr(), vec![], 512, 1232);
        assert!(q.set_response(vec![0u8; 100]).is_ok());
        assert_eq!(q.response.len(), 100);
    }

    #[test]
    fn response_over_bound_is_rejected() {
        let mut q = Query::new(1, "example.com".into(), addr(), addr(), vec![], 512, 10);
        q.stream_id = Some(42);
        let err = q.set_response(vec![0u8; 11]).unwrap_err();
        assert!(matches!(
            err,
            DoqError::Stream(42, DoqErrorCode::ResponseTooLong)
        ));
        assert!(q.response.is_empty());
    }
}
