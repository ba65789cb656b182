/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! Message -> JSON text rendering, the stable external shape used for
//! DoQ/DoH-style logging.

use std::io::{self, Write};

use crate::message::{Message, Question, ResourceRecord};

/// Render `msg` to a JSON `String`.
pub fn to_json(msg: &Message) -> String {
    let mut buf = Vec::new();
    write_json(msg, &mut buf, usize::MAX).expect("writing to a Vec<u8> never fails");
    String::from_utf8(buf).expect("writer only emits ASCII")
}

/// Render `msg` to `w`, stopping once `max_len` output bytes have been
/// written and appending a `"...(truncated)"` marker. Used by callers that
/// log into a bounded buffer or line.
pub fn write_json(msg: &Message, w: &mut dyn Write, max_len: usize) -> io::Result<()> {
    let mut sink = BoundedWriter::new(w, max_len);
    let h = &msg.header;
    write!(
        sink,
        "{{ \"ID\":{}, \"QR\":{}, \"Opcode\":{}, \"AA\":{}, \"TC\":{}, \"RD\":{}, \"RA\":{}, \"AD\":{}, \"CD\":{}, \"RCODE\":{}, \
         \"QDCOUNT\":{}, \"ANCOUNT\":{}, \"NSCOUNT\":{}, \"ARCOUNT\":{}",
        h.id,
        h.qr as u8,
        h.opcode,
        h.aa as u8,
        h.tc as u8,
        h.rd as u8,
        h.ra as u8,
        h.ad as u8,
        h.cd as u8,
        h.rcode,
        h.qdcount,
        h.ancount,
        h.nscount,
        h.arcount
    )?;
    write_questions(&mut sink, &msg.questions)?;
    write!(sink, ", \"answerRRs\":[")?;
    write_rrs(&mut sink, &msg.answers)?;
    write!(sink, "], \"authorityRRs\":[")?;
    write_rrs(&mut sink, &msg.authorities)?;
    write!(sink, "], \"additionalRRs\":[")?;
    write_rrs(&mut sink, &msg.additionals)?;
    write!(sink, "]}}")?;

    if sink.truncated {
        write!(sink.inner, "...(truncated)")?;
    }
    Ok(())
}

fn write_questions(w: &mut dyn Write, questions: &[Question]) -> io::Result<()> {
    for q in questions {
        write!(
            w,
            ", \"QNAME\": {}, \"QTYPE\":{}, \"QCLASS\":{}",
            json_string(&q.qname),
            q.qtype,
            q.qclass
        )?;
    }
    Ok(())
}

fn write_rrs(w: &mut dyn Write, rrs: &[ResourceRecord]) -> io::Result<()> {
    for (i, rr) in rrs.iter().enumerate() {
        if i > 0 {
            write!(w, ", ")?;
        }
        write!(
            w,
            "{{ \"NAME\": {}, \"TYPE\":{}, \"CLASS\":{}, \"TTL\":{}, \"RDATAHEX\": \"{}\" }}",
            json_string(&rr.name),
            rr.rtype,
            rr.rclass,
            rr.ttl,
            hex::encode_upper(&rr.rdata)
        )?;
    }
    Ok(())
}

fn json_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Wraps a `Write` and silently drops anything past `max_len` bytes,
/// tracking whether it had to.
struct BoundedWriter<'a> {
    inner: &'a mut dyn Write,
    max_len: usize,
    written: usize,
    truncated: bool,
}

impl<'a> BoundedWriter<'a> {
    fn new(inner: &'a mut dyn Write, max_len: usize) -> Self {
        BoundedWriter {
            inner,
            max_len,
            written: 0,
            truncated: false,
        }
    }
}

impl<'a> Write for BoundedWriter<'a> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written >= self.max_len {
            self.truncated = true;
            return Ok(buf.len());
        }
        let remaining = self.max_len - self.written;
        let to_write = remaining.min(buf.len());
        self.inner.write_all(&buf[..to_write])?;
        self.written += to_write;
        if to_write < buf.len() {
            self.truncated = true;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::encode_query;

    #[test]
    fn renders_query_with_opt_rr() {
        let wire = encode_query("example.com.", 511, 1, 0, 2048).unwrap();
        let msg = Message::parse(&wire).unwrap();
        let text = to_json(&msg);
        assert!(text.starts_with("{ \"ID\":511,"));
        assert!(text.contains("\"ARCOUNT\":1, \"QNAME\": \"example.com.\", \"QTYPE\":1, \"QCLASS\":0, \"answerRRs\":["));
        assert!(text.contains("\"additionalRRs\":[{ \"NAME\": \".\","));
        assert!(text.contains("\"TYPE\":41, \"CLASS\":2048, \"TTL\":0, \"RDATAHEX\": \"\""));
        assert!(text.ends_with('}'));
    }

    #[test]
    fn truncation_marker_is_appended_when_bounded() {
        let wire = encode_query("example.com.", 511, 1, 0, 2048).unwrap();
        let msg = Message::parse(&wire).unwrap();
        let mut buf = Vec::new();
        write_json(&msg, &mut buf, 10).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.len(), 10 + "...(truncated)".len());
        assert!(text.ends_with("...(truncated)"));
    }

    #[test]
    fn escapes_quotes_and_backslashes_in_names() {
        assert_eq!(json_string("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }
}
