/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2024-2025 ByteDance and/or its affiliates.
 */

mod basic;
pub use basic::check_basic;

mod openssl;
pub use openssl::check_openssl;

mod rustls;
pub use rustls::check_rustls_provider;
