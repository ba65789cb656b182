/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! Per-connection context and the service-wide connection registry
//! (spec §4.3), replacing the source's intrusive doubly-linked connection
//! and stream lists with ordinary maps keyed by plain id values (§9).

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::stream::{Stream, StreamRole};

/// Generational id handed out by [`ConnectionRegistry`]; never reused
/// while a connection with the same numeric id could still be reachable
/// from a stale reference, which is what "generational" buys over a bare
/// counter for a long-running service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

pub type StreamId = u64;

pub struct Connection {
    pub role: StreamRole,
    pub sni: Option<String>,
    pub peer_addr: SocketAddr,
    pub streams: HashMap<StreamId, Stream>,
    next_client_stream_id: StreamId,
}

impl Connection {
    pub fn new(role: StreamRole, sni: Option<String>, peer_addr: SocketAddr) -> Self {
        Connection {
            role,
            sni,
            peer_addr,
            streams: HashMap::new(),
            next_client_stream_id: 0,
        }
    }

    /// Allocate the next client-initiated bidirectional stream id.
    /// QUIC stream ids for client-initiated bidi streams are spaced by 4
    /// (the low two bits encode initiator/directionality), so each
    /// outgoing query gets a strictly increasing id per spec §3.
    pub fn next_stream_id(&mut self) -> StreamId {
        let id = self.next_client_stream_id;
        self.next_client_stream_id += 4;
        id
    }

    pub fn insert_stream(&mut self, id: StreamId, stream: Stream) {
        self.streams.insert(id, stream);
    }

    pub fn remove_stream(&mut self, id: StreamId) -> Option<Stream> {
        self.streams.remove(&id)
    }
}

/// Lookup key for client connection reuse (spec §4.3): exact peer address
/// plus byte-exact SNI comparison, `None` matching `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    peer_addr: SocketAddr,
    sni: Option<String>,
}

/// Owns every live `Connection` for a `DoqService`. Server connections are
/// only ever looked up by id (they are created lazily on first inbound
/// stream data, spec §4.3); client connections additionally support
/// reuse lookup by `(peer_addr, sni)`.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
    client_index: HashMap<ClientKey, ConnectionId>,
    next_id: u64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        ConnectionRegistry::default()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    /// Find an existing reusable client connection for `peer_addr`/`sni`.
    pub fn find_client(&self, peer_addr: SocketAddr, sni: Option<&str>) -> Option<ConnectionId> {
        let key = ClientKey {
            peer_addr,
            sni: sni.map(str::to_owned),
        };
        self.client_index.get(&key).copied()
    }

    /// Insert a new client connection, indexing it for future reuse.
    pub fn insert_client(&mut self, connection: Connection) -> ConnectionId {
        let key = ClientKey {
            peer_addr: connection.peer_addr,
            sni: connection.sni.clone(),
        };
        let id = self.allocate_id();
        self.connections.insert(id, connection);
        self.client_index.insert(key, id);
        id
    }

    /// Insert a freshly-accepted server connection (spec §4.3: created on
    /// first QUIC callback that targets the service rather than a live
    /// connection).
    pub fn insert_server(&mut self, connection: Connection) -> ConnectionId {
        let id = self.allocate_id();
        self.connections.insert(id, connection);
        id
    }

    /// Remove a connection on QUIC close/application-close/stateless-reset
    /// (spec §4.3). The caller is responsible for delivering `QueryFailed`
    /// to every Query still bound to the connection's streams first.
    pub fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        let removed = self.connections.remove(&id);
        if let Some(conn) = &removed {
            let key = ClientKey {
                peer_addr: conn.peer_addr,
                sni: conn.sni.clone(),
            };
            if self.client_index.get(&key) == Some(&id) {
                self.client_index.remove(&key);
            }
        }
        removed
    }

    fn allocate_id(&mut self) -> ConnectionId {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn client_stream_ids_increase_by_four() {
        let mut conn = Connection::new(StreamRole::Client, None, addr(1));
        assert_eq!(conn.next_stream_id(), 0);
        assert_eq!(conn.next_stream_id(), 4);
        assert_eq!(conn.next_stream_id(), 8);
    }

    #[test]
    fn client_connection_is_reused_by_addr_and_sni() {
        let mut registry = ConnectionRegistry::new();
        let conn = Connection::new(StreamRole::Client, Some("example.com".into()), addr(2));
        let id = registry.insert_client(conn);

        assert_eq!(
            registry.find_client(addr(2), Some("example.com")),
            Some(id)
        );
        assert_eq!(registry.find_client(addr(2), None), None);
        assert_eq!(registry.find_client(addr(3), Some("example.com")), None);
    }

    #[test]
    fn removing_a_connection_clears_its_reuse_entry() {
        let mut registry = ConnectionRegistry::new();
        let conn = Connection::new(StreamRole::Client, None, addr(4));
        let id = registry.insert_client(conn);
        assert!(registry.remove(id).is_some());
        assert_eq!(registry.find_client(addr(4), None), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn server_connections_are_not_reuse_indexed() {
        let mut registry = ConnectionRegistry::new();
        let conn = Connection::new(StreamRole::Server, None, addr(5));
        let id = registry.insert_server(conn);
        assert!(registry.get(id).is_some());
        assert_eq!(registry.find_client(addr(5), None), None);
    }
}
