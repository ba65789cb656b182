/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! Synthesize a REFUSED response from a well-formed query, optionally
//! carrying an Extended DNS Error (EDE, RFC 8914) option.

use crate::error::CodecError;
use crate::name;

const OPT_RRTYPE: u16 = 41;
const EDE_OPTION_CODE: u16 = 15;
const RCODE_REFUSED: u8 = 5;

/// Build a REFUSED response for `query`. The question section is copied
/// byte-for-byte from the input; everything else in the header is kept
/// except QR (set), RCODE (REFUSED) and the RR counts (zeroed, then
/// ARCOUNT set to 1 if `ede_info_code` is present).
///
/// `ede_info_code` is the 16-bit EDE info code (RFC 8914 §4) to report, if
/// any; when `None`, no OPT RR is appended.
pub fn refuse(query: &[u8], ede_info_code: Option<u16>) -> Result<Vec<u8>, CodecError> {
    if query.len() < 12 {
        return Err(CodecError::Truncated);
    }
    let qdcount = u16::from_be_bytes([query[4], query[5]]);

    let mut pos = 12usize;
    for _ in 0..qdcount {
        pos = name::skip_name(query, pos)?;
        if pos + 4 > query.len() {
            return Err(CodecError::Truncated);
        }
        pos += 4; // QTYPE + QCLASS
    }
    let question_section = &query[12..pos];

    let mut out = Vec::with_capacity(pos + 21);
    out.extend_from_slice(&query[0..2]); // ID, copied verbatim
    out.push(query[2] | 0x80); // keep Opcode/AA/TC/RD, set QR
    out.push((query[3] & 0xF0) | RCODE_REFUSED); // keep RA/Z/AD/CD, set RCODE
    out.extend_from_slice(&qdcount.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // ANCOUNT
    out.extend_from_slice(&0u16.to_be_bytes()); // NSCOUNT
    let arcount: u16 = if ede_info_code.is_some() { 1 } else { 0 };
    out.extend_from_slice(&arcount.to_be_bytes());
    out.extend_from_slice(question_section);

    if let Some(info_code) = ede_info_code {
        out.push(0); // OPT RR name: root
        out.extend_from_slice(&OPT_RRTYPE.to_be_bytes());
        out.extend_from_slice(&0xFFFFu16.to_be_bytes()); // CLASS
        out.extend_from_slice(&0u32.to_be_bytes()); // TTL: ext rcode/version/flags=0
        out.extend_from_slice(&6u16.to_be_bytes()); // RDLEN: 2(option-code)+2(option-length)+2(info-code)
        out.extend_from_slice(&EDE_OPTION_CODE.to_be_bytes());
        out.extend_from_slice(&2u16.to_be_bytes());
        out.extend_from_slice(&info_code.to_be_bytes());
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::query::encode_query;

    #[test]
    fn refusal_without_ede_preserves_question() {
        let query = encode_query("example.com.", 511, 1, 0, 2048).unwrap();
        let response = refuse(&query, None).unwrap();

        let msg = Message::parse(&response).unwrap();
        assert!(msg.header.qr);
        assert_eq!(msg.header.rcode, RCODE_REFUSED);
        assert_eq!(msg.header.ancount, 0);
        assert_eq!(msg.header.nscount, 0);
        assert_eq!(msg.header.arcount, 0);
        assert_eq!(msg.questions.len(), 1);
        assert_eq!(msg.questions[0].qname, "example.com.");
        assert_eq!(msg.questions[0].qtype, 1);
        assert_eq!(msg.questions[0].qclass, 0);
        assert!(msg.additionals.is_empty());
    }

    #[test]
    fn refusal_with_ede_appends_option() {
        let query = encode_query("example.com.", 511, 1, 0, 2048).unwrap();
        // EDE code 18 = "prohibited".
        let response = refuse(&query, Some(18)).unwrap();

        let msg = Message::parse(&response).unwrap();
        assert_eq!(msg.header.arcount, 1);
        assert_eq!(msg.additionals.len(), 1);
        let opt = &msg.additionals[0];
        assert_eq!(opt.rtype, OPT_RRTYPE);
        assert_eq!(opt.rclass, 0xFFFF);
        // RDATA: option-code=15, option-length=2, info-code=18
        assert_eq!(opt.rdata, vec![0x00, 0x0F, 0x00, 0x02, 0x00, 0x12]);
    }

    #[test]
    fn question_bytes_are_copied_verbatim() {
        let query = encode_query("a.example.com.", 7, 28, 1, 1232).unwrap();
        let response = refuse(&query, None).unwrap();
        // Question section starts right after the 12-byte header in both.
        let q_end = 12 + query[12..].iter().position(|&b| b == 0).unwrap() + 1 + 4;
        assert_eq!(&response[12..q_end], &query[12..q_end]);
    }
}
