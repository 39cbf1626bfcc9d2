// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default cap on the candidate population
pub const DEFAULT_MAX_POPULATION: usize = 100;
/// Default cap on new candidates accepted per generation
pub const DEFAULT_GENERATION_SIZE: usize = 100;
/// Default number of lowest-scoring candidates dropped once the population overflows
pub const DEFAULT_DISCARD_SIZE: usize = 20;
/// Default planning window for `suggest`, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Default cap on idle rounds a speculative context gets to go quiet
pub const DEFAULT_MAX_SETTLE_ROUNDS: usize = 16;
/// Plans scoring strictly above this are relevant
pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 0.0;

/// Default number of trailing digest hex characters used as a plan hash
pub const DEFAULT_DIGEST_SUFFIX_LENGTH: usize = 4;
/// Upper bound on the plan hash length (a full BLAKE3 hex digest)
pub const MAX_DIGEST_SUFFIX_LENGTH: usize = 64;
