/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

mod build;
mod client;
mod handler;
mod log;
mod opts;
mod relay;
mod session;
mod signal;
mod tls;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use slog::{error, info};

use doq_core::stream::StreamRole;
use doq_core::DoqService;

use opts::Mode;

fn main() -> anyhow::Result<()> {
    let Some(proc_args) = opts::parse_clap().context("failed to parse command line options")? else {
        return Ok(());
    };

    let (logger, _log_guard) = log::setup(proc_args.verbose_level);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(run(proc_args, logger))
}

async fn run(proc_args: opts::ProcArgs, logger: slog::Logger) -> anyhow::Result<()> {
    let alpn = vec![proc_args.alpn.clone().into_bytes()];

    match &proc_args.mode {
        Mode::Server => run_server(proc_args, alpn, logger).await,
        Mode::Client {
            server_name,
            server_port,
            queries,
        } => {
            let server_name = server_name.clone();
            let server_port = *server_port;
            let queries = queries.clone();
            run_client(server_name, server_port, queries, proc_args, alpn, logger).await
        }
    }
}

async fn run_server(proc_args: opts::ProcArgs, alpn: Vec<Vec<u8>>, logger: slog::Logger) -> anyhow::Result<()> {
    let certs = tls::load_certs(&proc_args.cert_file)?;
    let key = tls::load_key(&proc_args.key_file)?;

    let mut server_crypto = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("failed to build TLS server config")?;
    server_crypto.alpn_protocols = alpn;

    let quic_server_config = quinn::crypto::rustls::QuicServerConfig::try_from(server_crypto)
        .context("rustls server config is not a valid QUIC config")?;
    let mut server_config = quinn::ServerConfig::with_crypto(Arc::new(quic_server_config));
    server_config.transport_config(Arc::new(doq_core::service::transport_config(StreamRole::Server)));

    let bind_addr: SocketAddr = format!("0.0.0.0:{}", proc_args.port).parse()?;
    let endpoint = quinn::Endpoint::server(server_config, bind_addr)
        .with_context(|| format!("failed to bind QUIC endpoint on {bind_addr}"))?;

    let upstream: SocketAddr = proc_args
        .upstream
        .as_deref()
        .unwrap_or("127.0.0.1:53")
        .parse()
        .context("invalid --upstream address")?;

    let handler = Arc::new(handler::RelayHandler::bind(upstream, logger.clone()).await?);
    let service = Arc::new(DoqService::new(StreamRole::Server, endpoint.clone(), handler));

    info!(logger, "doq-relay listening"; "addr" => %bind_addr, "upstream" => %upstream);

    let shutdown_logger = logger.clone();
    tokio::spawn(async move {
        signal::wait_for_shutdown(&shutdown_logger).await;
        // quinn keeps serving in-flight connections; closing the endpoint
        // stops accepting new ones.
    });

    loop {
        tokio::select! {
            incoming = service.endpoint.accept() => {
                let Some(incoming) = incoming else { break };
                let service = service.clone();
                let logger = logger.clone();
                tokio::spawn(async move {
                    match incoming.await {
                        Ok(connection) => {
                            let peer_addr = connection.remote_address();
                            doq_core::adapter::run_server_connection(
                                service.clone(),
                                connection,
                                peer_addr,
                                512,
                                4096,
                            )
                            .await;
                        }
                        Err(e) => {
                            error!(logger, "connection handshake failed"; "error" => %e);
                        }
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

async fn run_client(
    server_name: String,
    server_port: u16,
    queries: Vec<opts::QuerySpec>,
    proc_args: opts::ProcArgs,
    alpn: Vec<Vec<u8>>,
    logger: slog::Logger,
) -> anyhow::Result<()> {
    let roots = tls::load_roots(proc_args.trust_file.as_deref())?;
    let mut client_crypto = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    client_crypto.alpn_protocols = alpn;

    let quic_client_config = quinn::crypto::rustls::QuicClientConfig::try_from(client_crypto)
        .context("rustls client config is not a valid QUIC config")?;
    let mut client_config = quinn::ClientConfig::new(Arc::new(quic_client_config));

    let session_path = proc_args
        .session_file
        .clone()
        .unwrap_or_else(|| session::default_path().to_path_buf());
    let token_store = Arc::new(session::FileTokenStore::open(&session_path));
    client_config.token_store(token_store.clone() as Arc<dyn quinn::TokenStore>);

    let mut endpoint = quinn::Endpoint::client("0.0.0.0:0".parse()?)
        .context("failed to bind client QUIC endpoint")?;
    endpoint.set_default_client_config(client_config);

    let sni = proc_args.sni.clone().unwrap_or_else(|| server_name.clone());
    let remote = tokio::net::lookup_host((server_name.as_str(), server_port))
        .await
        .with_context(|| format!("failed to resolve {server_name}:{server_port}"))?
        .next()
        .ok_or_else(|| anyhow::anyhow!("{server_name} resolved to no addresses"))?;

    let handler = Arc::new(client::PrintingHandler::new(logger.clone()));
    let service = Arc::new(DoqService::new(StreamRole::Client, endpoint.clone(), handler));

    let conn_id = {
        let mut registry = service.registry.lock().await;
        match registry.find_client(remote, Some(sni.as_str())) {
            Some(id) => id,
            None => registry.insert_client(doq_core::connection::Connection::new(
                StreamRole::Client,
                Some(sni.clone()),
                remote,
            )),
        }
    };

    info!(logger, "connecting"; "server" => %server_name, "port" => server_port, "sni" => %sni);
    let connection = endpoint
        .connect(remote, &sni)
        .context("failed to start QUIC handshake")?
        .await
        .context("QUIC handshake failed")?;

    client::run_queries(&service, &connection, &queries, &logger).await?;

    connection.close(0u32.into(), b"done");
    endpoint.wait_idle().await;
    service.registry.lock().await.remove(conn_id);
    token_store
        .persist()
        .with_context(|| format!("failed to persist session file {}", session_path.display()))?;
    Ok(())
}
