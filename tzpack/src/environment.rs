// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//log
pub const ENV_RUST_LOG: &str = "RUST_LOG";

//tools
pub const ENV_TZPACK_ZIC: &str = "TZPACK_ZIC";
pub const ENV_TZPACK_ZDUMP: &str = "TZPACK_ZDUMP";
pub const ENV_TZPACK_CONCURRENCY: &str = "TZPACK_CONCURRENCY";

//release
pub const ENV_TZPACK_OUT_DIR: &str = "TZPACK_OUT_DIR";
