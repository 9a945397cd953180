use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};

use super::{
    LedgerError, Outcome, DRAW_FEE_PERCENT, DRAW_REFUND_PERCENT, LOSE_FEE_PERCENT,
    LOSE_POOL_PERCENT, WIN_FEE_PERCENT, WIN_PAYOUT_BONUS_PERCENT, WIN_POOL_PERCENT,
};

/// The two pooled balances fed by every resolved wager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Treasury {
    /// Operator revenue. Drained only by fee withdrawal, always to zero.
    pub creator_fees: u64,
    /// Funds reserved to cover future payouts. Drawn down by every win and resynchronized
    /// from custody by `sync_pool`.
    pub game_bank: u64,
}

impl Treasury {
    /// Books a resolved wager: fees and pool share are added, then the part of the
    /// obligation the stake does not cover is drawn from the pool.
    ///
    /// The draw saturates at zero. Whatever the pool cannot back stays owed and surfaces
    /// as a failed claim once custody runs short.
    pub fn credit(&mut self, settlement: &Settlement) -> Result<(), LedgerError> {
        let creator_fees = self
            .creator_fees
            .checked_add(settlement.fee)
            .ok_or(LedgerError::Overflow)?;
        let game_bank = self
            .game_bank
            .checked_add(settlement.pool)
            .ok_or(LedgerError::Overflow)?
            .saturating_sub(settlement.funded);
        self.creator_fees = creator_fees;
        self.game_bank = game_bank;
        Ok(())
    }

    /// Custody that may be paid out without touching accrued fees.
    pub fn payable(&self, custody: u64) -> u64 {
        custody.saturating_sub(self.creator_fees)
    }
}

impl Write for Treasury {
    fn write(&self, writer: &mut impl BufMut) {
        self.creator_fees.write(writer);
        self.game_bank.write(writer);
    }
}

impl Read for Treasury {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            creator_fees: u64::read(reader)?,
            game_bank: u64::read(reader)?,
        })
    }
}

impl FixedSize for Treasury {
    const SIZE: usize = 2 * u64::SIZE;
}

/// Persisted global switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Switches {
    pub paused: bool,
}

impl Write for Switches {
    fn write(&self, writer: &mut impl BufMut) {
        self.paused.write(writer);
    }
}

impl Read for Switches {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            paused: bool::read(reader)?,
        })
    }
}

impl FixedSize for Switches {
    const SIZE: usize = bool::SIZE;
}

/// How a single stake is split once its outcome is known.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    /// Amount appended to the player's reward sequence (zero means no entry).
    pub reward: u64,
    /// Added to `creator_fees`.
    pub fee: u64,
    /// Added to `game_bank`.
    pub pool: u64,
    /// Drawn from `game_bank`: what `reward + fee + pool` owes beyond the stake itself.
    pub funded: u64,
    /// Net gain reported in the `Resolved` event.
    pub net_gain: u64,
}

/// `percent` of `stake`, truncated.
fn percent_of(stake: u64, percent: u64) -> u64 {
    // u128 intermediate: percent <= 100 so the result always fits back into u64.
    ((stake as u128 * percent as u128) / 100) as u64
}

impl Settlement {
    /// Applies the fixed split table to `stake`.
    pub fn compute(outcome: Outcome, stake: u64) -> Result<Self, LedgerError> {
        Ok(match outcome {
            Outcome::Win => {
                let bonus = percent_of(stake, WIN_PAYOUT_BONUS_PERCENT);
                let fee = percent_of(stake, WIN_FEE_PERCENT);
                let pool = percent_of(stake, WIN_POOL_PERCENT);
                // Everything but the returned stake is backed by the pool.
                let funded = bonus
                    .checked_add(fee)
                    .and_then(|total| total.checked_add(pool))
                    .ok_or(LedgerError::Overflow)?;
                Self {
                    reward: stake.checked_add(bonus).ok_or(LedgerError::Overflow)?,
                    fee,
                    pool,
                    funded,
                    net_gain: bonus,
                }
            }
            Outcome::Draw => Self {
                reward: percent_of(stake, DRAW_REFUND_PERCENT),
                fee: percent_of(stake, DRAW_FEE_PERCENT),
                pool: 0,
                funded: 0,
                net_gain: 0,
            },
            Outcome::Lose => Self {
                reward: 0,
                fee: percent_of(stake, LOSE_FEE_PERCENT),
                pool: percent_of(stake, LOSE_POOL_PERCENT),
                funded: 0,
                net_gain: 0,
            },
        })
    }
}
