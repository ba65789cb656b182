/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! The QUIC application error codes DoQ closes streams/connections with,
//! and the library-level error type that carries them.

use quinn::VarInt;
use thiserror::Error;

/// QUIC application error codes used when resetting a stream or closing a
/// connection (spec §6). `Unknown` covers codes signalled by a peer that
/// don't match one of ours — most commonly a peer's own protocol-violation
/// close, which this side just forwards rather than renaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoqErrorCode {
    Internal,
    ResponseTooLong,
    ResponseTimeOut,
    QueryTooLong,
    Protocol,
    Unknown(u32),
}

const INTERNAL: u32 = 0x201;
const RESPONSE_TOO_LONG: u32 = 0x202;
const RESPONSE_TIME_OUT: u32 = 0x203;
const QUERY_TOO_LONG: u32 = 0x204;
/// Not part of the source's four named application codes; used locally
/// when closing a connection for a framing violation (spec §7).
const PROTOCOL: u32 = 0x200;

impl From<DoqErrorCode> for VarInt {
    fn from(code: DoqErrorCode) -> Self {
        use DoqErrorCode::*;
        let raw = match code {
            Internal => INTERNAL,
            ResponseTooLong => RESPONSE_TOO_LONG,
            ResponseTimeOut => RESPONSE_TIME_OUT,
            QueryTooLong => QUERY_TOO_LONG,
            Protocol => PROTOCOL,
            Unknown(v) => v,
        };
        VarInt::from_u32(raw)
    }
}

impl From<VarInt> for DoqErrorCode {
    fn from(v: VarInt) -> Self {
        let raw: u64 = v.into_inner();
        match u32::try_from(raw) {
            Ok(INTERNAL) => DoqErrorCode::Internal,
            Ok(RESPONSE_TOO_LONG) => DoqErrorCode::ResponseTooLong,
            Ok(RESPONSE_TIME_OUT) => DoqErrorCode::ResponseTimeOut,
            Ok(QUERY_TOO_LONG) => DoqErrorCode::QueryTooLong,
            Ok(PROTOCOL) => DoqErrorCode::Protocol,
            Ok(other) => DoqErrorCode::Unknown(other),
            Err(_) => DoqErrorCode::Unknown(u32::MAX),
        }
    }
}

/// Library-level error, covering both pure protocol-engine failures and
/// the ones propagated up from the underlying QUIC stack.
#[derive(Error, Debug)]
pub enum DoqError {
    #[error("stream {0} failed: {1:?}")]
    Stream(u64, DoqErrorCode),
    #[error("connection closed: {0}")]
    ConnectionClosed(String),
    #[error("codec error: {0}")]
    Codec(#[from] doq_proto::CodecError),
    #[error("transport error: {0}")]
    Quic(#[from] quinn::ConnectionError),
    #[error("write error: {0}")]
    Write(#[from] quinn::WriteError),
    #[error("read error: {0}")]
    Read(#[from] quinn::ReadExactError),
}

impl DoqError {
    /// The application error code to close the affected stream/connection
    /// with, per the §7 error taxonomy. `None` for errors that never
    /// reach the wire (e.g. a transport error already tearing things down).
    pub fn code(&self) -> Option<DoqErrorCode> {
        match self {
            DoqError::Stream(_, code) => Some(*code),
            DoqError::Codec(_) => Some(DoqErrorCode::Protocol),
            DoqError::ConnectionClosed(_) => None,
            DoqError::Quic(_) | DoqError::Write(_) | DoqError::Read(_) => {
                Some(DoqErrorCode::Internal)
            }
        }
    }
}
