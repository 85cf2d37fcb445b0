// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // data sinks
pub mod config;     // plan loading + validation
pub mod engine;     // task group + graph executor
pub mod errors;     // error handling
pub mod observability;
pub mod seed;       // seeding nodes
pub mod sync;       // one-shot futures
pub mod traits;     // unified abstractions
pub mod utils;
