use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{
    ed25519::{self, PublicKey},
    sha256::{Digest, Sha256},
    Digestible, Hasher, Signer, Verifier,
};
use commonware_utils::union;

use crate::ledger::{
    read_string, string_encode_size, write_string, Move, Outcome, PendingRewards, Player, Switches,
    Tier, TierRegistry, Treasury, MAX_REASON_LENGTH,
};

pub const NAMESPACE: &[u8] = b"_RPSLEDGER";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

/// Block-level environment an operation executes under.
///
/// `entropy` is the block's randomness beacon. It is known to whoever produces the block, so
/// anything derived from it is only as fair as block production is honest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockEnv {
    pub height: u64,
    /// Seconds.
    pub timestamp: u64,
    pub entropy: Digest,
}

impl BlockEnv {
    pub fn new(height: u64, timestamp: u64, entropy: Digest) -> Self {
        Self {
            height,
            timestamp,
            entropy,
        }
    }

    /// Environment whose entropy is derived from the height alone (tests and simulation).
    pub fn at(height: u64, timestamp: u64) -> Self {
        Self::new(height, timestamp, Sha256::hash(&height.to_be_bytes()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub instruction: Instruction,
    /// Native units attached to the call.
    pub value: u64,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    fn payload(nonce: &u64, instruction: &Instruction, value: &u64) -> Vec<u8> {
        let mut payload = Vec::new();
        nonce.write(&mut payload);
        instruction.write(&mut payload);
        value.write(&mut payload);

        payload
    }

    pub fn sign(private: &ed25519::PrivateKey, nonce: u64, instruction: Instruction) -> Self {
        Self::sign_with_value(private, nonce, instruction, 0)
    }

    pub fn sign_with_value(
        private: &ed25519::PrivateKey,
        nonce: u64,
        instruction: Instruction,
        value: u64,
    ) -> Self {
        let signature = private.sign(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&nonce, &instruction, &value),
        );

        Self {
            nonce,
            instruction,
            value,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&self.nonce, &self.instruction, &self.value),
            &self.signature,
        )
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.instruction.write(writer);
        self.value.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let nonce = u64::read(reader)?;
        let instruction = Instruction::read(reader)?;
        let value = u64::read(reader)?;
        let public = ed25519::PublicKey::read(reader)?;
        let signature = ed25519::Signature::read(reader)?;

        Ok(Self {
            nonce,
            instruction,
            value,
            public,
            signature,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
            + self.instruction.encode_size()
            + self.value.encode_size()
            + self.public.encode_size()
            + self.signature.encode_size()
    }
}

impl Digestible for Transaction {
    type Digest = Digest;

    fn digest(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(self.nonce.to_be_bytes().as_ref());
        hasher.update(&Self::payload(&self.nonce, &self.instruction, &self.value));
        hasher.update(self.public.as_ref());
        // We don't include the signature as part of the digest (any valid
        // signature will be valid for the transaction)
        hasher.finalize()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Wager `value` on `player_move` at `tier` (tag 0).
    SubmitWager { player_move: Move, tier: Tier },
    /// Claim one reward entry (tag 1).
    Claim { index: u64 },
    /// Claim every unclaimed reward entry in one transfer (tag 2).
    ClaimAll,

    // Administrative (tags 3-7)
    WithdrawFees,
    SetPaused { paused: bool },
    UpdateTierAmount { tier: Tier, amount: u64 },
    EmergencyRecover,
    SyncPool,

    /// Plain transfer of `value` into custody with no bookkeeping (tag 8).
    Deposit,

    // Two-phase move commitment; always rejected (tags 9-10)
    CommitMove { commitment: [u8; 32] },
    RevealMove { player_move: Move, salt: [u8; 32] },
}

impl Instruction {
    /// Whether the instruction accepts attached value.
    pub fn is_payable(&self) -> bool {
        matches!(self, Self::SubmitWager { .. } | Self::Deposit)
    }
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::SubmitWager { player_move, tier } => {
                0u8.write(writer);
                player_move.write(writer);
                tier.write(writer);
            }
            Self::Claim { index } => {
                1u8.write(writer);
                index.write(writer);
            }
            Self::ClaimAll => 2u8.write(writer),
            Self::WithdrawFees => 3u8.write(writer),
            Self::SetPaused { paused } => {
                4u8.write(writer);
                paused.write(writer);
            }
            Self::UpdateTierAmount { tier, amount } => {
                5u8.write(writer);
                tier.write(writer);
                amount.write(writer);
            }
            Self::EmergencyRecover => 6u8.write(writer),
            Self::SyncPool => 7u8.write(writer),
            Self::Deposit => 8u8.write(writer),
            Self::CommitMove { commitment } => {
                9u8.write(writer);
                commitment.write(writer);
            }
            Self::RevealMove { player_move, salt } => {
                10u8.write(writer);
                player_move.write(writer);
                salt.write(writer);
            }
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match u8::read(reader)? {
            0 => Self::SubmitWager {
                player_move: Move::read(reader)?,
                tier: Tier::read(reader)?,
            },
            1 => Self::Claim {
                index: u64::read(reader)?,
            },
            2 => Self::ClaimAll,
            3 => Self::WithdrawFees,
            4 => Self::SetPaused {
                paused: bool::read(reader)?,
            },
            5 => Self::UpdateTierAmount {
                tier: Tier::read(reader)?,
                amount: u64::read(reader)?,
            },
            6 => Self::EmergencyRecover,
            7 => Self::SyncPool,
            8 => Self::Deposit,
            9 => Self::CommitMove {
                commitment: <[u8; 32]>::read(reader)?,
            },
            10 => Self::RevealMove {
                player_move: Move::read(reader)?,
                salt: <[u8; 32]>::read(reader)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::SubmitWager { .. } => Move::SIZE + Tier::SIZE,
                Self::Claim { .. } => u64::SIZE,
                Self::SetPaused { .. } => bool::SIZE,
                Self::UpdateTierAmount { .. } => Tier::SIZE + u64::SIZE,
                Self::CommitMove { .. } => 32,
                Self::RevealMove { .. } => Move::SIZE + 32,
                Self::ClaimAll
                | Self::WithdrawFees
                | Self::EmergencyRecover
                | Self::SyncPool
                | Self::Deposit => 0,
            }
    }
}

/// Minimal account structure for transaction nonce tracking.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Account {
    pub nonce: u64,
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Account {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
    }
}

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    /// Account for nonce tracking (tag 0)
    Account(PublicKey),
    /// Native units held by an identity outside the ledger (tag 1)
    Balance(PublicKey),
    /// Native units held by the ledger itself (tag 2)
    Custody,

    // Ledger keys (tags 10-14)
    Player(PublicKey),
    Rewards(PublicKey),
    Tiers,
    Treasury,
    Switches,
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(pk) => {
                0u8.write(writer);
                pk.write(writer);
            }
            Self::Balance(pk) => {
                1u8.write(writer);
                pk.write(writer);
            }
            Self::Custody => 2u8.write(writer),

            Self::Player(pk) => {
                10u8.write(writer);
                pk.write(writer);
            }
            Self::Rewards(pk) => {
                11u8.write(writer);
                pk.write(writer);
            }
            Self::Tiers => 12u8.write(writer),
            Self::Treasury => 13u8.write(writer),
            Self::Switches => 14u8.write(writer),
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match u8::read(reader)? {
            0 => Self::Account(PublicKey::read(reader)?),
            1 => Self::Balance(PublicKey::read(reader)?),
            2 => Self::Custody,

            10 => Self::Player(PublicKey::read(reader)?),
            11 => Self::Rewards(PublicKey::read(reader)?),
            12 => Self::Tiers,
            13 => Self::Treasury,
            14 => Self::Switches,

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(_) | Self::Balance(_) | Self::Player(_) | Self::Rewards(_) => {
                    PublicKey::SIZE
                }
                Self::Custody | Self::Tiers | Self::Treasury | Self::Switches => 0,
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Value {
    Account(Account),
    Balance(u64),
    Custody(u64),

    Player(Player),
    Rewards(PendingRewards),
    Tiers(TierRegistry),
    Treasury(Treasury),
    Switches(Switches),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(account) => {
                0u8.write(writer);
                account.write(writer);
            }
            Self::Balance(amount) => {
                1u8.write(writer);
                amount.write(writer);
            }
            Self::Custody(amount) => {
                2u8.write(writer);
                amount.write(writer);
            }

            Self::Player(player) => {
                10u8.write(writer);
                player.write(writer);
            }
            Self::Rewards(rewards) => {
                11u8.write(writer);
                rewards.write(writer);
            }
            Self::Tiers(tiers) => {
                12u8.write(writer);
                tiers.write(writer);
            }
            Self::Treasury(treasury) => {
                13u8.write(writer);
                treasury.write(writer);
            }
            Self::Switches(switches) => {
                14u8.write(writer);
                switches.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match u8::read(reader)? {
            0 => Self::Account(Account::read(reader)?),
            1 => Self::Balance(u64::read(reader)?),
            2 => Self::Custody(u64::read(reader)?),

            10 => Self::Player(Player::read(reader)?),
            11 => Self::Rewards(PendingRewards::read(reader)?),
            12 => Self::Tiers(TierRegistry::read(reader)?),
            13 => Self::Treasury(Treasury::read(reader)?),
            14 => Self::Switches(Switches::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(account) => account.encode_size(),
                Self::Balance(amount) | Self::Custody(amount) => amount.encode_size(),

                Self::Player(player) => player.encode_size(),
                Self::Rewards(rewards) => rewards.encode_size(),
                Self::Tiers(tiers) => tiers.encode_size(),
                Self::Treasury(treasury) => treasury.encode_size(),
                Self::Switches(switches) => switches.encode_size(),
            }
    }
}

/// Ledger events: the only data contract off-chain consumers may rely on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Resolved {
        player: PublicKey,
        player_move: Move,
        counter_move: Move,
        outcome: Outcome,
        net_gain: u64,
    },
    /// `index` is [`crate::ledger::CLAIM_ALL_INDEX`] for a batch claim.
    Claimed {
        player: PublicKey,
        index: u64,
        amount: u64,
    },
    FeesWithdrawn {
        amount: u64,
    },
    PauseChanged {
        paused: bool,
    },
    TierUpdated {
        tier: Tier,
        amount: u64,
    },
    EmergencyRecovered {
        admin: PublicKey,
        amount: u64,
    },
    PoolSynced {
        amount: u64,
    },
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Resolved {
                player,
                player_move,
                counter_move,
                outcome,
                net_gain,
            } => {
                0u8.write(writer);
                player.write(writer);
                player_move.write(writer);
                counter_move.write(writer);
                outcome.write(writer);
                net_gain.write(writer);
            }
            Self::Claimed {
                player,
                index,
                amount,
            } => {
                1u8.write(writer);
                player.write(writer);
                index.write(writer);
                amount.write(writer);
            }
            Self::FeesWithdrawn { amount } => {
                2u8.write(writer);
                amount.write(writer);
            }
            Self::PauseChanged { paused } => {
                3u8.write(writer);
                paused.write(writer);
            }
            Self::TierUpdated { tier, amount } => {
                4u8.write(writer);
                tier.write(writer);
                amount.write(writer);
            }
            Self::EmergencyRecovered { admin, amount } => {
                5u8.write(writer);
                admin.write(writer);
                amount.write(writer);
            }
            Self::PoolSynced { amount } => {
                6u8.write(writer);
                amount.write(writer);
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match u8::read(reader)? {
            0 => Self::Resolved {
                player: PublicKey::read(reader)?,
                player_move: Move::read(reader)?,
                counter_move: Move::read(reader)?,
                outcome: Outcome::read(reader)?,
                net_gain: u64::read(reader)?,
            },
            1 => Self::Claimed {
                player: PublicKey::read(reader)?,
                index: u64::read(reader)?,
                amount: u64::read(reader)?,
            },
            2 => Self::FeesWithdrawn {
                amount: u64::read(reader)?,
            },
            3 => Self::PauseChanged {
                paused: bool::read(reader)?,
            },
            4 => Self::TierUpdated {
                tier: Tier::read(reader)?,
                amount: u64::read(reader)?,
            },
            5 => Self::EmergencyRecovered {
                admin: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
            },
            6 => Self::PoolSynced {
                amount: u64::read(reader)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Resolved { .. } => {
                    PublicKey::SIZE + Move::SIZE + Move::SIZE + Outcome::SIZE + u64::SIZE
                }
                Self::Claimed { .. } => PublicKey::SIZE + u64::SIZE + u64::SIZE,
                Self::FeesWithdrawn { .. } | Self::PoolSynced { .. } => u64::SIZE,
                Self::PauseChanged { .. } => bool::SIZE,
                Self::TierUpdated { .. } => Tier::SIZE + u64::SIZE,
                Self::EmergencyRecovered { .. } => PublicKey::SIZE + u64::SIZE,
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Event(Event),
    Transaction(Transaction),
    /// A transaction that passed nonce checks but whose operation was rolled back.
    Rejected {
        public: PublicKey,
        nonce: u64,
        error_code: u8,
        reason: String,
    },
}

impl Write for Output {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Event(event) => {
                0u8.write(writer);
                event.write(writer);
            }
            Self::Transaction(transaction) => {
                1u8.write(writer);
                transaction.write(writer);
            }
            Self::Rejected {
                public,
                nonce,
                error_code,
                reason,
            } => {
                2u8.write(writer);
                public.write(writer);
                nonce.write(writer);
                error_code.write(writer);
                write_string(reason, writer);
            }
        }
    }
}

impl Read for Output {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Self::Event(Event::read(reader)?)),
            1 => Ok(Self::Transaction(Transaction::read(reader)?)),
            2 => Ok(Self::Rejected {
                public: PublicKey::read(reader)?,
                nonce: u64::read(reader)?,
                error_code: u8::read(reader)?,
                reason: read_string(reader, MAX_REASON_LENGTH)?,
            }),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Output {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Event(event) => event.encode_size(),
            Self::Transaction(transaction) => transaction.encode_size(),
            Self::Rejected {
                public,
                nonce,
                error_code,
                reason,
            } => {
                public.encode_size()
                    + nonce.encode_size()
                    + error_code.encode_size()
                    + string_encode_size(reason)
            }
        }
    }
}
