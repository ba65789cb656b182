/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! Persisted client-side QUIC address-validation tokens (spec §6
//! "Persisted state"), loaded at startup and written back at shutdown.
//!
//! `original_source/quicdoq_cli_app/quicdoq_app.c` persists two separate
//! files across runs: `quicdoq_client_tickets.bin` (TLS session tickets,
//! via `picoquic_save_session_tickets`) and `quicdoq_client_tokens.bin`
//! (QUIC retry/address-validation tokens, via `picoquic_save_retry_tokens`).
//! `quinn`'s public API exposes a single opaque `TokenStore` seam for the
//! latter but no equivalent hook into the TLS stack's session-ticket
//! store, so this is a deliberate narrowing to one file holding one
//! opaque blob per server name — still enough to skip a fresh QUIC
//! handshake's address validation round trip on the next run against the
//! same server.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bytes::Bytes;

/// A [`quinn::TokenStore`] backed by a single file on disk. `open` reads
/// whatever was there at construction time; `persist` overwrites it with
/// whatever the store holds at the moment it's called. Neither call is
/// on the hot path — both happen once, at process start/end.
pub struct FileTokenStore {
    path: PathBuf,
    server_name: Mutex<Option<String>>,
    token: Mutex<Option<Bytes>>,
}

impl FileTokenStore {
    /// Read `path` if it exists; an absent or unreadable file just means
    /// "no prior session to resume," not an error.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let token = fs::read(&path).ok().map(Bytes::from);
        FileTokenStore {
            path,
            server_name: Mutex::new(None),
            token: Mutex::new(token),
        }
    }

    /// Write the most recently seen token back to disk.
    pub fn persist(&self) -> anyhow::Result<()> {
        let token = self.token.lock().expect("token store poisoned").clone();
        match token {
            Some(bytes) => fs::write(&self.path, &bytes)?,
            None => {
                // Nothing was ever issued; leave any previous file alone
                // rather than truncating it to empty.
            }
        }
        Ok(())
    }
}

impl quinn::TokenStore for FileTokenStore {
    fn insert(&self, server_name: &str, token: Bytes) {
        *self.server_name.lock().expect("token store poisoned") = Some(server_name.to_string());
        *self.token.lock().expect("token store poisoned") = Some(token);
    }

    fn take(&self, server_name: &str) -> Option<Bytes> {
        let matches = self
            .server_name
            .lock()
            .expect("token store poisoned")
            .as_deref()
            == Some(server_name);
        if matches {
            self.token.lock().expect("token store poisoned").take()
        } else {
            None
        }
    }
}

pub fn default_path() -> &'static Path {
    Path::new("doq-relay-session.bin")
}

#[cfg(test)]
mod tests {
    use super::*;
    use quinn::TokenStore;

    #[test]
    fn round_trips_through_a_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("doq-relay-session-test-{}.bin", std::process::id()));
        let _ = fs::remove_file(&path);

        {
            let store = FileTokenStore::open(&path);
            assert_eq!(store.take("example.com"), None);
            store.insert("example.com", Bytes::from_static(b"opaque-token"));
            store.persist().unwrap();
        }

        let store = FileTokenStore::open(&path);
        assert_eq!(
            store.take("example.com"),
            Some(Bytes::from_static(b"opaque-token"))
        );

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn take_with_wrong_server_name_misses() {
        let store = FileTokenStore::open("/nonexistent/path/does-not-exist.bin");
        store.insert("a.example.com", Bytes::from_static(b"t"));
        assert_eq!(store.take("b.example.com"), None);
        assert_eq!(store.take("a.example.com"), Some(Bytes::from_static(b"t")));
    }
}
