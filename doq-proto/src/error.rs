/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use thiserror::Error;

/// Failures from DNS name/message encoding and decoding.
///
/// Encode failures are the "out-of-buffer" sentinel from the wire format
/// description: callers must treat any of these as fatal for the message
/// under construction. Decode failures mean the cursor could not be
/// advanced past the offending field; callers that only need a best-effort
/// rendering (see [`crate::message::Message::parse`]) truncate instead of
/// propagating these.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("message is truncated before the end of a declared field")]
    Truncated,
    #[error("name label exceeds 63 octets")]
    LabelTooLong,
    #[error("empty label is only allowed as the terminating root label")]
    EmptyLabel,
    #[error("name contains an incomplete or malformed \\DDD escape")]
    InvalidEscape,
    #[error("compression pointer does not refer to a strictly earlier offset")]
    BadCompressionPointer,
    #[error("label has an unsupported two-bit type (01/10)")]
    UnknownLabelType,
    #[error("encoded message would exceed the caller's buffer")]
    BufferTooSmall,
}
