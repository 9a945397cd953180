use thiserror::Error as ThisError;

use super::{
    Tier, ERROR_ALREADY_CLAIMED, ERROR_COOLDOWN_ACTIVE, ERROR_DEPRECATED,
    ERROR_INDEX_OUT_OF_RANGE, ERROR_INSUFFICIENT_FUNDS, ERROR_INVALID_TIER_AMOUNT,
    ERROR_NOTHING_TO_CLAIM, ERROR_NOT_PAUSED, ERROR_OVERFLOW, ERROR_PAUSED, ERROR_REENTRANCY,
    ERROR_REWARD_LIMIT_REACHED, ERROR_STAKE_MISMATCH, ERROR_TIER_AMOUNT_TOO_HIGH, ERROR_TRANSFER_FAILED, ERROR_UNAUTHORIZED,
    ERROR_UNEXPECTED_VALUE,
};

/// Coarse classification of a rejected operation.
///
/// [`ErrorKind::as_str`] is the machine-readable reason surfaced to callers; clients translate
/// it into user-facing messaging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authorization,
    State,
    Value,
    Index,
    AlreadyClaimed,
    Reentrancy,
    TransferFailed,
    Deprecated,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authorization => "AuthorizationError",
            Self::State => "StateError",
            Self::Value => "ValueError",
            Self::Index => "IndexError",
            Self::AlreadyClaimed => "AlreadyClaimedError",
            Self::Reentrancy => "ReentrancyError",
            Self::TransferFailed => "TransferFailed",
            Self::Deprecated => "DeprecatedError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every way a ledger operation can be rejected.
///
/// A rejection aborts the whole operation: none of its writes are committed.
#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum LedgerError {
    #[error("caller is not the administrator")]
    Unauthorized,
    #[error("wagering is paused")]
    Paused,
    #[error("operation requires the ledger to be paused")]
    NotPaused,
    #[error("cooldown active until {ready_at} (now={now})")]
    CooldownActive { now: u64, ready_at: u64 },
    #[error("no unclaimed rewards")]
    NothingToClaim,
    #[error("reward sequence is full (limit={limit})")]
    RewardLimitReached { limit: u64 },
    #[error("stake mismatch for {tier:?} (expected={expected}, attached={attached})")]
    StakeMismatch {
        tier: Tier,
        expected: u64,
        attached: u64,
    },
    #[error("tier amount above cap (amount={amount}, max={max})")]
    TierAmountTooHigh { amount: u64, max: u64 },
    #[error("operation does not accept attached value (attached={attached})")]
    UnexpectedValue { attached: u64 },
    #[error("tier amount must be non-zero")]
    InvalidTierAmount,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("reward index out of range (index={index}, len={len})")]
    IndexOutOfRange { index: u64, len: u64 },
    #[error("reward {index} already claimed")]
    AlreadyClaimed { index: u64 },
    #[error("reentrant call into a guarded operation")]
    Reentrancy,
    #[error("recipient rejected transfer: {reason}")]
    TransferFailed { reason: String },
    #[error("insufficient funds (needed={needed}, available={available})")]
    InsufficientFunds { needed: u64, available: u64 },
    #[error("two-phase move commitment is deprecated")]
    Deprecated,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Authorization,
            Self::Paused
            | Self::NotPaused
            | Self::CooldownActive { .. }
            | Self::NothingToClaim
            | Self::RewardLimitReached { .. } => ErrorKind::State,
            Self::StakeMismatch { .. }
            | Self::TierAmountTooHigh { .. }
            | Self::UnexpectedValue { .. }
            | Self::InvalidTierAmount
            | Self::Overflow => ErrorKind::Value,
            Self::IndexOutOfRange { .. } => ErrorKind::Index,
            Self::AlreadyClaimed { .. } => ErrorKind::AlreadyClaimed,
            Self::Reentrancy => ErrorKind::Reentrancy,
            Self::TransferFailed { .. } | Self::InsufficientFunds { .. } => {
                ErrorKind::TransferFailed
            }
            Self::Deprecated => ErrorKind::Deprecated,
        }
    }

    /// Short machine-readable reason string.
    pub fn reason(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn error_code(&self) -> u8 {
        match self {
            Self::Unauthorized => ERROR_UNAUTHORIZED,
            Self::Paused => ERROR_PAUSED,
            Self::NotPaused => ERROR_NOT_PAUSED,
            Self::CooldownActive { .. } => ERROR_COOLDOWN_ACTIVE,
            Self::NothingToClaim => ERROR_NOTHING_TO_CLAIM,
            Self::RewardLimitReached { .. } => ERROR_REWARD_LIMIT_REACHED,
            Self::StakeMismatch { .. } => ERROR_STAKE_MISMATCH,
            Self::TierAmountTooHigh { .. } => ERROR_TIER_AMOUNT_TOO_HIGH,
            Self::UnexpectedValue { .. } => ERROR_UNEXPECTED_VALUE,
            Self::InvalidTierAmount => ERROR_INVALID_TIER_AMOUNT,
            Self::Overflow => ERROR_OVERFLOW,
            Self::IndexOutOfRange { .. } => ERROR_INDEX_OUT_OF_RANGE,
            Self::AlreadyClaimed { .. } => ERROR_ALREADY_CLAIMED,
            Self::Reentrancy => ERROR_REENTRANCY,
            Self::TransferFailed { .. } => ERROR_TRANSFER_FAILED,
            Self::InsufficientFunds { .. } => ERROR_INSUFFICIENT_FUNDS,
            Self::Deprecated => ERROR_DEPRECATED,
        }
    }
}
