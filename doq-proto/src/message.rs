/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! Best-effort parser from wire-form DNS messages to a structured form,
//! used by [`crate::json`] to render arbitrary messages for logging.

use crate::error::CodecError;
use crate::name;

#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub id: u16,
    pub qr: bool,
    pub opcode: u8,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    pub ad: bool,
    pub cd: bool,
    pub rcode: u8,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl Header {
    pub fn parse(msg: &[u8]) -> Result<Self, CodecError> {
        if msg.len() < 12 {
            return Err(CodecError::Truncated);
        }
        let flags1 = msg[2];
        let flags2 = msg[3];
        Ok(Header {
            id: u16::from_be_bytes([msg[0], msg[1]]),
            qr: flags1 & 0x80 != 0,
            opcode: (flags1 >> 3) & 0x0F,
            aa: flags1 & 0x04 != 0,
            tc: flags1 & 0x02 != 0,
            rd: flags1 & 0x01 != 0,
            ra: flags2 & 0x80 != 0,
            ad: flags2 & 0x20 != 0,
            cd: flags2 & 0x10 != 0,
            rcode: flags2 & 0x0F,
            qdcount: u16::from_be_bytes([msg[4], msg[5]]),
            ancount: u16::from_be_bytes([msg[6], msg[7]]),
            nscount: u16::from_be_bytes([msg[8], msg[9]]),
            arcount: u16::from_be_bytes([msg[10], msg[11]]),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Question {
    pub qname: String,
    pub qtype: u16,
    pub qclass: u16,
}

#[derive(Debug, Clone)]
pub struct ResourceRecord {
    pub name: String,
    pub rtype: u16,
    pub rclass: u16,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

/// A parsed DNS message. Parsing is best-effort past the fixed header:
/// a malformed question or RR truncates the remaining sections rather
/// than failing the whole parse (the header counts are then understood
/// as upper bounds, not promises), matching the wire codec's truncate-
/// on-malformed-input behavior.
#[derive(Debug, Clone)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
    pub truncated: bool,
}

impl Message {
    pub fn parse(msg: &[u8]) -> Result<Message, CodecError> {
        let header = Header::parse(msg)?;
        let mut pos = 12usize;
        let mut truncated = false;

        let mut questions = Vec::new();
        for _ in 0..header.qdcount {
            match parse_question(msg, &mut pos) {
                Ok(q) => questions.push(q),
                Err(_) => {
                    truncated = true;
                    break;
                }
            }
        }

        let answers = parse_rr_section(msg, &mut pos, header.ancount, &mut truncated);
        let authorities = parse_rr_section(msg, &mut pos, header.nscount, &mut truncated);
        let additionals = parse_rr_section(msg, &mut pos, header.arcount, &mut truncated);

        Ok(Message {
            header,
            questions,
            answers,
            authorities,
            additionals,
            truncated,
        })
    }
}

fn parse_question(msg: &[u8], pos: &mut usize) -> Result<Question, CodecError> {
    let (qname, next) = name::decode_name(msg, *pos)?;
    if next + 4 > msg.len() {
        return Err(CodecError::Truncated);
    }
    let qtype = u16::from_be_bytes([msg[next], msg[next + 1]]);
    let qclass = u16::from_be_bytes([msg[next + 2], msg[next + 3]]);
    *pos = next + 4;
    Ok(Question {
        qname,
        qtype,
        qclass,
    })
}

fn parse_rr_section(
    msg: &[u8],
    pos: &mut usize,
    count: u16,
    truncated: &mut bool,
) -> Vec<ResourceRecord> {
    let mut out = Vec::new();
    if *truncated {
        return out;
    }
    for _ in 0..count {
        match parse_rr(msg, pos) {
            Ok(rr) => out.push(rr),
            Err(_) => {
                *truncated = true;
                break;
            }
        }
    }
    out
}

fn parse_rr(msg: &[u8], pos: &mut usize) -> Result<ResourceRecord, CodecError> {
    let (name, next) = name::decode_name(msg, *pos)?;
    if next + 10 > msg.len() {
        return Err(CodecError::Truncated);
    }
    let rtype = u16::from_be_bytes([msg[next], msg[next + 1]]);
    let rclass = u16::from_be_bytes([msg[next + 2], msg[next + 3]]);
    let ttl = u32::from_be_bytes([msg[next + 4], msg[next + 5], msg[next + 6], msg[next + 7]]);
    let rdlen = u16::from_be_bytes([msg[next + 8], msg[next + 9]]) as usize;
    let rdata_start = next + 10;
    if rdata_start + rdlen > msg.len() {
        return Err(CodecError::Truncated);
    }
    *pos = rdata_start + rdlen;
    Ok(ResourceRecord {
        name,
        rtype,
        rclass,
        ttl,
        rdata: msg[rdata_start..rdata_start + rdlen].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::encode_query;

    #[test]
    fn parses_encoded_query() {
        let wire = encode_query("example.com.", 511, 1, 0, 2048).unwrap();
        let msg = Message::parse(&wire).unwrap();
        assert!(!msg.truncated);
        assert!(!msg.header.qr);
        assert_eq!(msg.header.rcode, 0);
        assert_eq!(msg.questions.len(), 1);
        assert_eq!(msg.additionals[0].name, ".");
    }

    #[test]
    fn truncates_rather_than_erroring_on_bad_rr_section() {
        let mut wire = encode_query("example.com.", 1, 1, 1, 512).unwrap();
        // Claim one more additional RR than actually present.
        wire[11] = 2;
        let msg = Message::parse(&wire).unwrap();
        assert!(msg.truncated);
        assert_eq!(msg.additionals.len(), 1);
    }

    #[test]
    fn rejects_header_shorter_than_12_bytes() {
        assert!(matches!(
            Message::parse(&[0u8; 11]),
            Err(CodecError::Truncated)
        ));
    }
}
