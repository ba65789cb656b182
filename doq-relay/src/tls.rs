/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! Certificate/key loading, adapted from the teacher's
//! `g3bench/src/target/rustls.rs` `load_certs`/`load_key` pair for the
//! current `rustls-pki-types` owned-certificate API.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{anyhow, Context};
use rustls_pki_types::{CertificateDer, PrivateKeyDer};

pub fn load_certs(path: &Path) -> anyhow::Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path).with_context(|| format!("unable to open file {}", path.display()))?;
    let certs: Vec<_> = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<_, _>>()
        .with_context(|| format!("failed to read certs from file {}", path.display()))?;
    if certs.is_empty() {
        Err(anyhow!("no valid certificate found in file {}", path.display()))
    } else {
        Ok(certs)
    }
}

pub fn load_key(path: &Path) -> anyhow::Result<PrivateKeyDer<'static>> {
    let file = File::open(path).with_context(|| format!("unable to open file {}", path.display()))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .with_context(|| format!("failed to read private key from file {}", path.display()))?
        .ok_or_else(|| anyhow!("no valid private key found in file {}", path.display()))
}

/// Root trust anchors for client mode: the system's webpki roots, plus
/// anything named by `--trust-file`.
pub fn load_roots(trust_file: Option<&Path>) -> anyhow::Result<rustls::RootCertStore> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    if let Some(path) = trust_file {
        for cert in load_certs(path)? {
            roots.add(cert)?;
        }
    }
    Ok(roots)
}
