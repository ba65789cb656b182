/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! DNS name encoding/decoding: textual form <-> wire form, including
//! compression pointer handling on decode.

use crate::error::CodecError;

/// Encode a textual name (`.`-separated labels, optional trailing dot,
/// `\DDD` octet escapes) into its wire form and append it to `out`.
///
/// No case normalization is performed; escaped and literal octets are
/// copied verbatim.
pub fn encode_name(name: &str, out: &mut Vec<u8>) -> Result<(), CodecError> {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    if trimmed.is_empty() {
        out.push(0);
        return Ok(());
    }
    for part in trimmed.split('.') {
        if part.is_empty() {
            return Err(CodecError::EmptyLabel);
        }
        let label = decode_escapes(part)?;
        if label.len() > 63 {
            return Err(CodecError::LabelTooLong);
        }
        out.push(label.len() as u8);
        out.extend_from_slice(&label);
    }
    out.push(0);
    Ok(())
}

fn decode_escapes(part: &str) -> Result<Vec<u8>, CodecError> {
    let bytes = part.as_bytes();
    let mut label = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 1;
            if i + 3 > bytes.len() {
                return Err(CodecError::InvalidEscape);
            }
            let mut v: u16 = 0;
            for _ in 0..3 {
                let d = bytes[i];
                if !d.is_ascii_digit() {
                    return Err(CodecError::InvalidEscape);
                }
                v = v * 10 + (d - b'0') as u16;
                i += 1;
            }
            if v > 255 {
                return Err(CodecError::InvalidEscape);
            }
            label.push(v as u8);
        } else {
            label.push(bytes[i]);
            i += 1;
        }
    }
    Ok(label)
}

/// Walk the labels of a wire-form name starting at `start`, invoking
/// `on_label` with each label's raw octets. Returns the offset immediately
/// following the name in `msg` (i.e. after the first compression pointer
/// taken, or after the terminating zero if none was taken).
fn walk_labels<F: FnMut(&[u8])>(
    msg: &[u8],
    start: usize,
    mut on_label: F,
) -> Result<usize, CodecError> {
    let mut pos = start;
    let mut jumped = false;
    let mut after_pointer = start;
    loop {
        if pos >= msg.len() {
            return Err(CodecError::Truncated);
        }
        let b = msg[pos];
        match b & 0xC0 {
            0x00 => {
                let len = (b & 0x3F) as usize;
                pos += 1;
                if len == 0 {
                    if !jumped {
                        after_pointer = pos;
                    }
                    break;
                }
                if pos + len > msg.len() {
                    return Err(CodecError::Truncated);
                }
                on_label(&msg[pos..pos + len]);
                pos += len;
                if !jumped {
                    after_pointer = pos;
                }
            }
            0xC0 => {
                if pos + 1 >= msg.len() {
                    return Err(CodecError::Truncated);
                }
                let ptr = (((b & 0x3F) as usize) << 8) | msg[pos + 1] as usize;
                // Must point strictly backward, or a chain of pointers could loop forever.
                if ptr >= pos {
                    return Err(CodecError::BadCompressionPointer);
                }
                if !jumped {
                    after_pointer = pos + 2;
                }
                jumped = true;
                pos = ptr;
            }
            _ => return Err(CodecError::UnknownLabelType),
        }
    }
    Ok(after_pointer)
}

/// Decode a wire-form name at `start` into its textual form, returning
/// `(text, next_offset)`. `next_offset` is always relative to the
/// un-jumped stream, even when compression pointers were followed.
pub fn decode_name(msg: &[u8], start: usize) -> Result<(String, usize), CodecError> {
    let mut text = String::new();
    let mut first = true;
    let consumed = walk_labels(msg, start, |label| {
        if !first {
            text.push('.');
        }
        first = false;
        push_label_text(label, &mut text);
    })?;
    text.push('.');
    Ok((text, consumed))
}

/// Like [`decode_name`] but discards the text, only reporting where the
/// name ends. Used to skip over names embedded in RRs we don't render.
pub fn skip_name(msg: &[u8], start: usize) -> Result<usize, CodecError> {
    walk_labels(msg, start, |_| {})
}

fn push_label_text(label: &[u8], text: &mut String) {
    let n = label.len();
    for (i, &c) in label.iter().enumerate() {
        let needs_escape = match c {
            0..=0x1F | 0x7F..=0xFF => true,
            b'.' | b'\\' => true,
            b' ' => i == 0 || i == n - 1,
            _ => false,
        };
        if needs_escape {
            text.push('\\');
            text.push((b'0' + c / 100) as char);
            text.push((b'0' + (c / 10) % 10) as char);
            text.push((b'0' + c % 10) as char);
        } else {
            text.push(c as char);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASES: &[(&[u8], &str)] = &[
        (
            &[7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0],
            "example.com.",
        ),
        (
            &[
                9, b'e', b'x', b'a', b'm', b'p', b'l', b'e', b'-', b'2', 3, b'c', b'o', b'm', 0,
            ],
            "example-2.com.",
        ),
        (
            &[
                9, b'e', b'x', b'a', b'm', b'p', b'l', b'e', b'_', b'3', 3, b'c', b'o', b'm', 0,
            ],
            "example_3.com.",
        ),
        (
            &[
                9, b'e', b'x', b'a', b'm', b'p', b'l', b'e', b':', b'4', 3, b'c', b'o', b'm', 0,
            ],
            "example:4.com.",
        ),
        (
            &[
                9, b'e', b'x', b'a', b'm', b'p', b'l', b'e', b'.', b'5', 3, b'c', b'o', b'm', 0,
            ],
            "example\\0465.com.",
        ),
        (
            &[
                9, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0x7F, b'6', 3, b'c', b'o', b'm', 0,
            ],
            "example\\1276.com.",
        ),
        (
            &[
                9, b'e', b'x', b'a', b'm', b'p', b'l', b'e', b' ', b'7', 3, b'c', b'o', b'm', 0,
            ],
            "example 7.com.",
        ),
        (
            &[
                10, b' ', b'e', b'x', b'a', b'm', b'p', b'l', b'e', b'-', b'8', 3, b'c', b'o',
                b'm', 0,
            ],
            "\\032example-8.com.",
        ),
        (
            &[
                9, b'e', b'x', b'a', b'm', b'p', b'l', b'e', b'-', b'9', 3, 0x8c, 0xFF, 0x81, 0,
            ],
            "example-9.\\140\\255\\129.",
        ),
    ];

    #[test]
    fn decode_matches_reference_vectors() {
        for (wire, text) in CASES {
            let (decoded, next) = decode_name(wire, 0).unwrap();
            assert_eq!(&decoded, text);
            assert_eq!(next, wire.len());
        }
    }

    #[test]
    fn encode_matches_reference_vectors() {
        for (wire, text) in CASES {
            let mut out = Vec::new();
            encode_name(text, &mut out).unwrap();
            assert_eq!(&out, wire);
        }
    }

    #[test]
    fn root_name_is_single_zero_byte() {
        let mut out = Vec::new();
        encode_name(".", &mut out).unwrap();
        assert_eq!(out, vec![0]);
        let (text, next) = decode_name(&[0], 0).unwrap();
        assert_eq!(text, ".");
        assert_eq!(next, 1);
    }

    #[test]
    fn double_dot_is_rejected() {
        let mut out = Vec::new();
        assert_eq!(
            encode_name("example..com.", &mut out),
            Err(CodecError::EmptyLabel)
        );
    }

    #[test]
    fn label_over_63_octets_is_rejected() {
        let long_label = "a".repeat(64);
        let mut out = Vec::new();
        assert_eq!(
            encode_name(&format!("{long_label}.com."), &mut out),
            Err(CodecError::LabelTooLong)
        );
    }

    #[test]
    fn compression_pointer_must_go_strictly_backward() {
        // Pointer at offset 0 pointing at itself: not strictly earlier.
        let msg = [0xC0, 0x00];
        assert_eq!(
            skip_name(&msg, 0),
            Err(CodecError::BadCompressionPointer)
        );
    }

    #[test]
    fn compression_pointer_is_followed() {
        // "com." at offset 0, then "example" pointing at "com." via a
        // pointer at offset 5.
        let mut msg = vec![3, b'c', b'o', b'm', 0];
        let base = msg.len();
        msg.extend_from_slice(&[7, b'e', b'x', b'a', b'm', b'p', b'l', b'e']);
        msg.push(0xC0);
        msg.push(0x00);
        let (text, next) = decode_name(&msg, base).unwrap();
        assert_eq!(text, "example.com.");
        assert_eq!(next, msg.len());
    }
}
