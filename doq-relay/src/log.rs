/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

//! Wires a concrete logging backend for the binary, the way
//! `demo/test-resolver/src/main.rs`'s `setup_log` wires a root `slog::Logger`
//! for its own standalone binary rather than the full daemon stack in
//! `g3-daemon`; `doq-core`/`doq-proto` stay backend-agnostic and only see the
//! `slog::Logger` handed to them. The `slog-term` + `slog-async` pairing
//! itself isn't drawn from any one file in the pack — there's no
//! `src/` under `g3-stdlog` to copy a backend from — it's the standard
//! terminal-drain setup used throughout the slog ecosystem.

use slog::{o, Drain, Logger};

/// Guard that keeps the async logging worker alive; drop it at the very
/// end of `main` so buffered log records are flushed on exit.
pub struct LogGuard {
    _async_guard: slog_async::AsyncGuard,
}

pub fn setup(verbose_level: u8) -> (Logger, LogGuard) {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let (drain, async_guard) = slog_async::Async::new(drain).build_with_guard();
    let drain = drain.fuse();

    let level_filter = match verbose_level {
        0 => slog::Level::Info,
        1 => slog::Level::Debug,
        _ => slog::Level::Trace,
    };
    let drain = slog::LevelFilter::new(drain, level_filter).fuse();

    let logger = Logger::root(drain, o!("component" => "doq-relay"));
    (
        logger,
        LogGuard {
            _async_guard: async_guard,
        },
    )
}
