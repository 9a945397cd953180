use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};

/// One of the three moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Move {
    Rock = 0,
    Paper = 1,
    Scissors = 2,
}

impl Move {
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// Maps any integer onto a move by reducing it modulo 3.
    pub fn from_index(index: u64) -> Self {
        Self::ALL[(index % 3) as usize]
    }

    /// Returns true if `self` beats `other`.
    pub fn beats(self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors) | (Move::Scissors, Move::Paper) | (Move::Paper, Move::Rock)
        )
    }

    /// Result of playing `self` against `counter`.
    pub fn against(self, counter: Move) -> Outcome {
        if self == counter {
            Outcome::Draw
        } else if self.beats(counter) {
            Outcome::Win
        } else {
            Outcome::Lose
        }
    }
}

impl TryFrom<u8> for Move {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Move::Rock),
            1 => Ok(Move::Paper),
            2 => Ok(Move::Scissors),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl Write for Move {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Move {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Move::try_from(u8::read(reader)?)
    }
}

impl FixedSize for Move {
    const SIZE: usize = u8::SIZE;
}

/// Result of a resolved wager, from the player's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Outcome {
    Win = 0,
    Draw = 1,
    Lose = 2,
}

impl Outcome {
    pub const fn label(self) -> &'static str {
        match self {
            Outcome::Win => "Win",
            Outcome::Draw => "Draw",
            Outcome::Lose => "Lose",
        }
    }
}

impl Write for Outcome {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Outcome {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Outcome::Win),
            1 => Ok(Outcome::Draw),
            2 => Ok(Outcome::Lose),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for Outcome {
    const SIZE: usize = u8::SIZE;
}

/// Stake tier. Each tier maps to exactly one accepted stake amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Tier {
    Low = 0,
    Medium = 1,
    High = 2,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Low, Tier::Medium, Tier::High];

    fn index(self) -> usize {
        self as usize
    }
}

impl Write for Tier {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Tier {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Tier::Low),
            1 => Ok(Tier::Medium),
            2 => Ok(Tier::High),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for Tier {
    const SIZE: usize = u8::SIZE;
}

/// Tier → stake table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TierRegistry {
    amounts: [u64; 3],
}

impl Default for TierRegistry {
    fn default() -> Self {
        Self {
            amounts: [
                super::DEFAULT_TIER_LOW,
                super::DEFAULT_TIER_MEDIUM,
                super::DEFAULT_TIER_HIGH,
            ],
        }
    }
}

impl TierRegistry {
    pub fn amount(&self, tier: Tier) -> u64 {
        self.amounts[tier.index()]
    }

    pub fn set(&mut self, tier: Tier, amount: u64) {
        self.amounts[tier.index()] = amount;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, u64)> + '_ {
        Tier::ALL.into_iter().map(|tier| (tier, self.amount(tier)))
    }
}

impl Write for TierRegistry {
    fn write(&self, writer: &mut impl BufMut) {
        for amount in self.amounts {
            amount.write(writer);
        }
    }
}

impl Read for TierRegistry {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            amounts: [u64::read(reader)?, u64::read(reader)?, u64::read(reader)?],
        })
    }
}

impl FixedSize for TierRegistry {
    const SIZE: usize = 3 * u64::SIZE;
}
