/// Native units per whole coin (0.005 coin = 5_000_000 units).
pub const UNITS_PER_COIN: u64 = 1_000_000_000;

/// Default stake for [`super::Tier::Low`] (0.005 coin).
pub const DEFAULT_TIER_LOW: u64 = 5_000_000;

/// Default stake for [`super::Tier::Medium`] (0.01 coin).
pub const DEFAULT_TIER_MEDIUM: u64 = 10_000_000;

/// Default stake for [`super::Tier::High`] (0.05 coin).
pub const DEFAULT_TIER_HIGH: u64 = 50_000_000;

/// Upper bound an administrator may configure for any tier (1 coin).
pub const DEFAULT_MAX_TIER_AMOUNT: u64 = UNITS_PER_COIN;

/// Minimum seconds between two wagers from the same player.
pub const DEFAULT_COOLDOWN_SECS: u64 = 30;

/// Index reported in the `Claimed` event of a batch claim.
pub const CLAIM_ALL_INDEX: u64 = u64::MAX;

/// Maximum number of reward entries decoded for a single player.
pub const MAX_REWARD_ENTRIES: usize = 1 << 20;

/// Maximum length of a rejection reason carried in an output.
pub const MAX_REASON_LENGTH: usize = 64;

// Split table, in percent of the stake.
pub const WIN_PAYOUT_BONUS_PERCENT: u64 = 92;
pub const WIN_FEE_PERCENT: u64 = 3;
pub const WIN_POOL_PERCENT: u64 = 7;
pub const DRAW_REFUND_PERCENT: u64 = 98;
pub const DRAW_FEE_PERCENT: u64 = 2;
pub const LOSE_FEE_PERCENT: u64 = 3;
pub const LOSE_POOL_PERCENT: u64 = 97;

/// Error codes for rejected operations.
pub const ERROR_UNAUTHORIZED: u8 = 1;
pub const ERROR_PAUSED: u8 = 2;
pub const ERROR_NOT_PAUSED: u8 = 3;
pub const ERROR_COOLDOWN_ACTIVE: u8 = 4;
pub const ERROR_NOTHING_TO_CLAIM: u8 = 5;
pub const ERROR_STAKE_MISMATCH: u8 = 6;
pub const ERROR_TIER_AMOUNT_TOO_HIGH: u8 = 7;
pub const ERROR_INVALID_TIER_AMOUNT: u8 = 8;
pub const ERROR_OVERFLOW: u8 = 9;
pub const ERROR_INDEX_OUT_OF_RANGE: u8 = 10;
pub const ERROR_ALREADY_CLAIMED: u8 = 11;
pub const ERROR_REENTRANCY: u8 = 12;
pub const ERROR_TRANSFER_FAILED: u8 = 13;
pub const ERROR_INSUFFICIENT_FUNDS: u8 = 14;
pub const ERROR_DEPRECATED: u8 = 15;
pub const ERROR_UNEXPECTED_VALUE: u8 = 16;
pub const ERROR_REWARD_LIMIT_REACHED: u8 = 17;
