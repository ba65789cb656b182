/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

fn main() {
    g3_build_env::check_basic();
}
