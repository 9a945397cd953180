use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};

use super::{LedgerError, MAX_REWARD_ENTRIES};

/// Per-player wagering state. Created lazily on the first resolved wager and never deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Player {
    /// Timestamp (seconds) of the most recent resolved wager.
    pub last_play_time: u64,
    pub total_wins: u64,
}

impl Player {
    /// Earliest timestamp at which the next wager is accepted.
    pub fn ready_at(&self, cooldown_secs: u64) -> u64 {
        self.last_play_time.saturating_add(cooldown_secs)
    }
}

impl Write for Player {
    fn write(&self, writer: &mut impl BufMut) {
        self.last_play_time.write(writer);
        self.total_wins.write(writer);
    }
}

impl Read for Player {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            last_play_time: u64::read(reader)?,
            total_wins: u64::read(reader)?,
        })
    }
}

impl FixedSize for Player {
    const SIZE: usize = 2 * u64::SIZE;
}

/// A claimable amount owed to a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingReward {
    pub amount: u64,
    /// Write-once: only ever moves from `false` to `true`.
    pub claimed: bool,
}

impl PendingReward {
    pub fn new(amount: u64) -> Self {
        Self {
            amount,
            claimed: false,
        }
    }
}

impl Write for PendingReward {
    fn write(&self, writer: &mut impl BufMut) {
        self.amount.write(writer);
        self.claimed.write(writer);
    }
}

impl Read for PendingReward {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            amount: u64::read(reader)?,
            claimed: bool::read(reader)?,
        })
    }
}

impl FixedSize for PendingReward {
    const SIZE: usize = u64::SIZE + bool::SIZE;
}

/// Append-only sequence of a player's reward entries.
///
/// Entries are never removed or reordered, so an index handed out once stays valid forever.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PendingRewards {
    entries: Vec<PendingReward>,
}

impl PendingRewards {
    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PendingReward] {
        &self.entries
    }

    pub fn get(&self, index: u64) -> Option<&PendingReward> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.entries.get(index))
    }

    /// Appends an unclaimed entry and returns its index.
    ///
    /// The sequence is capped at [`MAX_REWARD_ENTRIES`] so a persisted record always decodes.
    pub fn push(&mut self, amount: u64) -> Result<u64, LedgerError> {
        if self.entries.len() >= MAX_REWARD_ENTRIES {
            return Err(LedgerError::RewardLimitReached {
                limit: MAX_REWARD_ENTRIES as u64,
            });
        }
        self.entries.push(PendingReward::new(amount));
        Ok(self.len() - 1)
    }

    /// Sum of all entries not yet claimed.
    pub fn outstanding(&self) -> Result<u64, LedgerError> {
        self.entries
            .iter()
            .filter(|entry| !entry.claimed)
            .try_fold(0u64, |total, entry| {
                total.checked_add(entry.amount).ok_or(LedgerError::Overflow)
            })
    }

    /// Marks a single entry claimed and returns its amount.
    pub fn mark_claimed(&mut self, index: u64) -> Result<u64, LedgerError> {
        let len = self.len();
        let entry = usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get_mut(i))
            .ok_or(LedgerError::IndexOutOfRange { index, len })?;
        if entry.claimed {
            return Err(LedgerError::AlreadyClaimed { index });
        }
        entry.claimed = true;
        Ok(entry.amount)
    }

    /// Marks every unclaimed entry claimed and returns the folded total.
    pub fn mark_all_claimed(&mut self) -> Result<u64, LedgerError> {
        let total = self.outstanding()?;
        if !self.entries.iter().any(|entry| !entry.claimed) {
            return Err(LedgerError::NothingToClaim);
        }
        for entry in self.entries.iter_mut() {
            entry.claimed = true;
        }
        Ok(total)
    }
}

impl Write for PendingRewards {
    fn write(&self, writer: &mut impl BufMut) {
        // `push` caps the length at MAX_REWARD_ENTRIES, which fits in a u32.
        (self.entries.len() as u32).write(writer);
        for entry in &self.entries {
            entry.write(writer);
        }
    }
}

impl Read for PendingRewards {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let len = u32::read(reader)? as usize;
        if len > MAX_REWARD_ENTRIES {
            return Err(Error::Invalid("PendingRewards", "too many entries"));
        }
        if reader.remaining() < len.saturating_mul(PendingReward::SIZE) {
            return Err(Error::EndOfBuffer);
        }
        let mut entries = Vec::with_capacity(len);
        for _ in 0..len {
            entries.push(PendingReward::read(reader)?);
        }
        Ok(Self { entries })
    }
}

impl EncodeSize for PendingRewards {
    fn encode_size(&self) -> usize {
        u32::SIZE + self.entries.len() * PendingReward::SIZE
    }
}
