//! Defaults for optional config fields.

use rpsledger_types::ledger::UNITS_PER_COIN;

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_PLAYERS: usize = 8;
pub const DEFAULT_ROUNDS: u64 = 64;
pub const DEFAULT_SEED: u64 = 42;

/// Balance credited to every simulated player at genesis.
pub const DEFAULT_FUNDING: u64 = UNITS_PER_COIN;

/// Balance the administrator deposits into custody before the first round.
pub const DEFAULT_BANKROLL: u64 = 10 * UNITS_PER_COIN;

pub const DEFAULT_START_TIMESTAMP: u64 = 1_700_000_000;
pub const DEFAULT_BLOCK_INTERVAL_SECS: u64 = 10;

/// Blocks between administrator fee withdrawals and pool resyncs.
pub const DEFAULT_ADMIN_INTERVAL: u64 = 16;
