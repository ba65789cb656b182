/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{value_parser, Arg, ArgAction, Command};

const ARGS_VERBOSE: &str = "verbose";
const ARGS_VERSION: &str = "version";
const ARGS_CERT: &str = "cert";
const ARGS_KEY: &str = "key";
const ARGS_PORT: &str = "port";
const ARGS_UPSTREAM: &str = "upstream";
const ARGS_SNI: &str = "sni";
const ARGS_ALPN: &str = "alpn";
const ARGS_BIN_LOG_DIR: &str = "bin-log-dir";
const ARGS_QLOG_DIR: &str = "qlog-dir";
const ARGS_TRUST_FILE: &str = "trust-file";
const ARGS_CC_ALGO: &str = "cc-algo";
const ARGS_SERVER_NAME: &str = "server-name";
const ARGS_SERVER_PORT: &str = "server-port";
const ARGS_QUERIES: &str = "queries";
const ARGS_SESSION_FILE: &str = "session-file";

pub const DEFAULT_CERT_FILE: &str = "cert.pem";
pub const DEFAULT_KEY_FILE: &str = "key.pem";

/// One `name:RRTYPE` entry from the client-mode scenario positional args.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub name: String,
    pub rrtype: String,
}

/// Which half of the demo binary to run; determined by whether a
/// `server_name` positional argument was given (spec §6).
#[derive(Debug)]
pub enum Mode {
    Server,
    Client {
        server_name: String,
        server_port: u16,
        queries: Vec<QuerySpec>,
    },
}

#[derive(Debug)]
pub struct ProcArgs {
    pub verbose_level: u8,
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
    pub port: u16,
    pub upstream: Option<String>,
    pub sni: Option<String>,
    pub alpn: String,
    pub bin_log_dir: Option<PathBuf>,
    pub qlog_dir: Option<PathBuf>,
    pub trust_file: Option<PathBuf>,
    pub cc_algo: Option<String>,
    pub session_file: Option<PathBuf>,
    pub mode: Mode,
}

fn build_cli_args() -> Command {
    Command::new(crate::build::PKG_NAME)
        .disable_version_flag(true)
        .arg(
            Arg::new(ARGS_VERBOSE)
                .help("Show verbose output")
                .action(ArgAction::Count)
                .short('v')
                .long("verbose"),
        )
        .arg(
            Arg::new(ARGS_VERSION)
                .help("Show version")
                .action(ArgAction::SetTrue)
                .short('V')
                .long("version"),
        )
        .arg(
            Arg::new(ARGS_CERT)
                .help("Server certificate chain, PEM format")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .default_value(DEFAULT_CERT_FILE)
                .short('c')
                .long("cert"),
        )
        .arg(
            Arg::new(ARGS_KEY)
                .help("Server private key, PEM format")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .default_value(DEFAULT_KEY_FILE)
                .short('k')
                .long("key"),
        )
        .arg(
            Arg::new(ARGS_PORT)
                .help("Server UDP/QUIC port")
                .num_args(1)
                .value_parser(value_parser!(u16))
                .default_value("784") // doq_core::DEFAULT_PORT
                .short('p')
                .long("port"),
        )
        .arg(
            Arg::new(ARGS_UPSTREAM)
                .help("Backend DNS server to relay queries to, host:port")
                .num_args(1)
                .short('d')
                .long("upstream"),
        )
        .arg(
            Arg::new(ARGS_SNI)
                .help("TLS server name indication (default: server name in client mode)")
                .num_args(1)
                .short('n')
                .long("sni"),
        )
        .arg(
            Arg::new(ARGS_ALPN)
                .help("ALPN token")
                .num_args(1)
                .default_value("doq")
                .short('a')
                .long("alpn"),
        )
        .arg(
            Arg::new(ARGS_BIN_LOG_DIR)
                .help("Directory for QUIC binary logs")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .short('b')
                .long("bin-log-dir"),
        )
        .arg(
            Arg::new(ARGS_QLOG_DIR)
                .help("Directory for qlog output")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .short('q')
                .long("qlog-dir"),
        )
        .arg(
            Arg::new(ARGS_TRUST_FILE)
                .help("Root trust anchor file (client mode)")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .short('t')
                .long("trust-file"),
        )
        .arg(
            Arg::new(ARGS_CC_ALGO)
                .help("Congestion control algorithm: reno, cubic, bbr")
                .num_args(1)
                .short('G')
                .long("cc-algo"),
        )
        .arg(
            Arg::new(ARGS_SESSION_FILE)
                .help("File to persist QUIC address-validation tokens across runs (client mode)")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .short('S')
                .long("session-file"),
        )
        .arg(
            Arg::new(ARGS_SERVER_NAME)
                .help("Server to connect to in client mode")
                .num_args(1)
                .index(1),
        )
        .arg(
            Arg::new(ARGS_SERVER_PORT)
                .help("Server port in client mode")
                .num_args(1)
                .index(2),
        )
        .arg(
            Arg::new(ARGS_QUERIES)
                .help("name:RRTYPE queries to issue in client mode")
                .num_args(0..)
                .index(3),
        )
}

pub fn parse_clap() -> anyhow::Result<Option<ProcArgs>> {
    let args = build_cli_args().get_matches();

    let verbose_level = args.get_count(ARGS_VERBOSE);
    if args.get_flag(ARGS_VERSION) {
        crate::build::print_version(verbose_level);
        return Ok(None);
    }

    let cert_file = args.get_one::<PathBuf>(ARGS_CERT).unwrap().clone();
    let key_file = args.get_one::<PathBuf>(ARGS_KEY).unwrap().clone();
    let port = *args.get_one::<u16>(ARGS_PORT).unwrap();
    let upstream = args.get_one::<String>(ARGS_UPSTREAM).cloned();
    let sni = args.get_one::<String>(ARGS_SNI).cloned();
    let alpn = args.get_one::<String>(ARGS_ALPN).unwrap().clone();
    let bin_log_dir = args.get_one::<PathBuf>(ARGS_BIN_LOG_DIR).cloned();
    let qlog_dir = args.get_one::<PathBuf>(ARGS_QLOG_DIR).cloned();
    let trust_file = args.get_one::<PathBuf>(ARGS_TRUST_FILE).cloned();
    let cc_algo = args.get_one::<String>(ARGS_CC_ALGO).cloned();
    let session_file = args.get_one::<PathBuf>(ARGS_SESSION_FILE).cloned();

    let mode = if let Some(server_name) = args.get_one::<String>(ARGS_SERVER_NAME) {
        let server_port = match args.get_one::<String>(ARGS_SERVER_PORT) {
            Some(p) => p
                .parse::<u16>()
                .context(format!("invalid server port {p}"))?,
            None => port,
        };
        let queries = match args.get_many::<String>(ARGS_QUERIES) {
            Some(values) => values
                .map(|q| parse_query_spec(q))
                .collect::<anyhow::Result<Vec<_>>>()?,
            None => vec![QuerySpec {
                name: "example.com".to_string(),
                rrtype: "A".to_string(),
            }],
        };
        Mode::Client {
            server_name: server_name.clone(),
            server_port,
            queries,
        }
    } else {
        Mode::Server
    };

    Ok(Some(ProcArgs {
        verbose_level,
        cert_file,
        key_file,
        port,
        upstream,
        sni,
        alpn,
        bin_log_dir,
        qlog_dir,
        trust_file,
        cc_algo,
        session_file,
        mode,
    }))
}

fn parse_query_spec(text: &str) -> anyhow::Result<QuerySpec> {
    let (name, rrtype) = text
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("query {text:?} is not in name:RRTYPE form"))?;
    Ok(QuerySpec {
        name: name.to_string(),
        rrtype: rrtype.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_rrtype() {
        let q = parse_query_spec("www.example.com:AAAA").unwrap();
        assert_eq!(q.name, "www.example.com");
        assert_eq!(q.rrtype, "AAAA");
    }

    #[test]
    fn rejects_missing_colon() {
        assert!(parse_query_spec("www.example.com").is_err());
    }
}
