/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! The DoQ service: a `quinn::Endpoint` plus connection registry plus
//! application handler (spec §4.4).

use std::sync::Arc;

use quinn::TransportConfig;
#[cfg(feature = "log")]
use slog::{warn, Logger};

use crate::callback::DoqHandler;
use crate::connection::ConnectionRegistry;
use crate::stream::StreamRole;

/// `"doq"`, 3 bytes, used as the sole ALPN entry unless overridden.
pub const ALPN_DOQ: &[u8] = b"doq";

/// Historical DoQ port.
pub const DEFAULT_PORT: u16 = 784;

/// The minimum value each side's matching transport parameter is expected
/// to advertise; violating it is logged, not a hard close (spec §4.4).
const EXPECTED_MIN_STREAM_DATA: u64 = 65535;

/// Maximum size of a UDP datagram quinn will send/accept for this
/// endpoint (spec §4.4's `max_packet_size`).
const MAX_UDP_PAYLOAD_SIZE: u16 = 1232;

/// Number of connection ids a peer may issue us at once (spec §4.4's
/// `active_connection_id_limit`).
const ACTIVE_CONNECTION_ID_LIMIT: u8 = 3;

/// Exponent used to scale ACK delays (spec §4.4's `ack_delay_exponent`).
const ACK_DELAY_EXPONENT: u8 = 3;

/// Build the transport parameter set from spec §4.4's table for `role`.
pub fn transport_config(role: StreamRole) -> TransportConfig {
    let mut cfg = TransportConfig::default();
    match role {
        StreamRole::Server => {
            cfg.max_concurrent_bidi_streams(quinn::VarInt::from_u32(256));
        }
        StreamRole::Client => {
            cfg.max_concurrent_bidi_streams(quinn::VarInt::from_u32(0));
        }
    }
    cfg.receive_window(quinn::VarInt::from_u32(65536));
    cfg.stream_receive_window(quinn::VarInt::from_u32(65536));
    cfg.max_udp_payload_size(MAX_UDP_PAYLOAD_SIZE);
    cfg.active_connection_id_limit(ACTIVE_CONNECTION_ID_LIMIT.into());
    cfg.ack_delay_exponent(ACK_DELAY_EXPONENT.into());
    cfg.max_idle_timeout(Some(
        std::time::Duration::from_millis(20_000)
            .try_into()
            .expect("20s fits in an IdleTimeout"),
    ));
    cfg
}

/// Warn (never hard-close) if the peer's advertised stream-data parameter
/// falls below the expected minimum (spec §4.4 `ready`/`almost_ready`).
#[cfg(feature = "log")]
pub fn check_transport_param(logger: Option<&Arc<Logger>>, name: &str, advertised: u64) {
    if advertised < EXPECTED_MIN_STREAM_DATA {
        if let Some(logger) = logger {
            warn!(
                logger,
                "peer transport parameter below expected minimum";
                "parameter" => name,
                "advertised" => advertised,
                "expected_min" => EXPECTED_MIN_STREAM_DATA,
            );
        }
    }
}

#[cfg(not(feature = "log"))]
pub fn check_transport_param(_logger: Option<&()>, _name: &str, _advertised: u64) {}

/// Ties together the QUIC endpoint, the connection registry and the
/// application handler for one DoQ role (client or server).
pub struct DoqService<H: DoqHandler> {
    pub role: StreamRole,
    pub endpoint: quinn::Endpoint,
    pub handler: Arc<H>,
    pub registry: tokio::sync::Mutex<ConnectionRegistry>,
    #[cfg(feature = "log")]
    pub logger: Option<Arc<Logger>>,
}

impl<H: DoqHandler> DoqService<H> {
    pub fn new(role: StreamRole, endpoint: quinn::Endpoint, handler: Arc<H>) -> Self {
        DoqService {
            role,
            endpoint,
            handler,
            registry: tokio::sync::Mutex::new(ConnectionRegistry::new()),
            #[cfg(feature = "log")]
            logger: None,
        }
    }

    #[cfg(feature = "log")]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// `true` once every connection the service tracked has been removed
    /// and its queries freed — the shutdown invariant from spec §8.
    pub async fn is_drained(&self) -> bool {
        self.registry.lock().await.is_empty()
    }

    /// Instance-level wrapper around [`check_transport_param`] so call
    /// sites only need a `&DoqService`, not a bare logger, regardless of
    /// whether the `log` feature is enabled.
    pub fn check_transport_param(&self, name: &str, advertised: u64) {
        #[cfg(feature = "log")]
        check_transport_param(self.logger.as_ref(), name, advertised);
        #[cfg(not(feature = "log"))]
        check_transport_param(None, name, advertised);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_minimum_does_not_panic_without_logger() {
        check_transport_param(None, "initial_max_stream_data_bidi_remote", 1000);
        check_transport_param(None, "initial_max_stream_data_bidi_remote", 65535);
    }
}
