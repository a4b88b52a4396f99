//! Block clock access.
//!
//! The host environment reports block time in milliseconds; protocol state
//! stores seconds.

use odra::ContractEnv;

const MILLIS_PER_SECOND: u64 = 1_000;

/// Current block time in seconds.
pub fn now_secs(env: &ContractEnv) -> u64 {
    env.get_block_time() / MILLIS_PER_SECOND
}
