/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! RRTYPE mnemonic <-> numeric code lookup.

/// `(mnemonic, code)` pairs, case-sensitive, in IANA registration order.
const RR_TABLE: &[(&str, u16)] = &[
    ("A", 1),
    ("NS", 2),
    ("MD", 3),
    ("MF", 4),
    ("CNAME", 5),
    ("SOA", 6),
    ("MB", 7),
    ("MG", 8),
    ("MR", 9),
    ("NULL", 10),
    ("WKS", 11),
    ("PTR", 12),
    ("HINFO", 13),
    ("MINFO", 14),
    ("MX", 15),
    ("TXT", 16),
    ("RP", 17),
    ("AFSDB", 18),
    ("X25", 19),
    ("ISDN", 20),
    ("RT", 21),
    ("NSAP", 22),
    ("NSAP-PTR", 23),
    ("SIG", 24),
    ("KEY", 25),
    ("PX", 26),
    ("GPOS", 27),
    ("AAAA", 28),
    ("LOC", 29),
    ("NXT", 30),
    ("EID", 31),
    ("NIMLOC", 32),
    ("SRV", 33),
    ("ATMA", 34),
    ("NAPTR", 35),
    ("KX", 36),
    ("CERT", 37),
    ("A6", 38),
    ("DNAME", 39),
    ("SINK", 40),
    ("OPT", 41),
    ("APL", 42),
    ("DS", 43),
    ("SSHFP", 44),
    ("IPSECKEY", 45),
    ("RRSIG", 46),
    ("NSEC", 47),
    ("DNSKEY", 48),
    ("DHCID", 49),
    ("NSEC3", 50),
    ("NSEC3PARAM", 51),
    ("TLSA", 52),
    ("SMIMEA", 53),
    ("Unassigned", 54),
    ("HIP", 55),
    ("NINFO", 56),
    ("RKEY", 57),
    ("TALINK", 58),
    ("CDS", 59),
    ("CDNSKEY", 60),
    ("OPENPGPKEY", 61),
    ("CSYNC", 62),
    ("ZONEMD", 63),
    ("SPF", 99),
    ("UINFO", 100),
    ("UID", 101),
    ("GID", 102),
    ("UNSPEC", 103),
    ("NID", 104),
    ("L32", 105),
    ("L64", 106),
    ("LP", 107),
    ("EUI48", 108),
    ("EUI64", 109),
    ("TKEY", 249),
    ("TSIG", 250),
    ("IXFR", 251),
    ("AXFR", 252),
    ("MAILB", 253),
    ("MAILA", 254),
    ("*", 255),
    ("URI", 256),
    ("CAA", 257),
    ("AVC", 258),
    ("DOA", 259),
    ("AMTRELAY", 260),
    ("TA", 32768),
    ("DLV", 32769),
];

/// Resolve an RRTYPE mnemonic (case-sensitive) to its numeric code.
///
/// Falls back to parsing `name` as a base-10 integer if it isn't in the
/// table. An empty string resolves to `0`: the fallback walk never finds a
/// non-digit byte to reject, so it leaves the accumulator at its initial
/// value. Any other non-digit byte in the fallback path resolves to
/// `0xFFFF`.
pub fn get_rr_type(name: &str) -> u16 {
    for (mnemonic, code) in RR_TABLE {
        if *mnemonic == name {
            return *code;
        }
    }
    if name.is_empty() {
        return 0;
    }
    if !name.bytes().all(|c| c.is_ascii_digit()) {
        return u16::MAX;
    }
    name.parse::<u32>()
        .map(|v| if v > u16::MAX as u32 { u16::MAX } else { v as u16 })
        .unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_mnemonics() {
        assert_eq!(get_rr_type("A"), 1);
        assert_eq!(get_rr_type("AAAA"), 28);
        assert_eq!(get_rr_type("OPT"), 41);
        assert_eq!(get_rr_type("DLV"), 32769);
    }

    #[test]
    fn case_sensitive() {
        assert_eq!(get_rr_type("a"), u16::MAX);
    }

    #[test]
    fn numeric_fallback() {
        assert_eq!(get_rr_type("12345"), 12345);
        assert_eq!(get_rr_type("0"), 0);
    }

    #[test]
    fn garbage_is_0xffff() {
        assert_eq!(get_rr_type("not-a-type"), u16::MAX);
    }

    #[test]
    fn empty_name_falls_back_to_zero() {
        assert_eq!(get_rr_type(""), 0);
    }
}
