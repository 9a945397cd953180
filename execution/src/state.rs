use anyhow::Result;
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;
use rpsledger_types::{
    execution::{Account, Key, Value},
    ledger::{PendingRewards, Player, Switches, TierRegistry, Treasury},
};
use std::collections::HashMap;

#[derive(Debug)]
pub enum PrepareError {
    NonceMismatch { expected: u64, got: u64 },
    InvalidSignature,
    State(anyhow::Error),
}

/// Key-value storage the ledger commits to.
///
/// Execution never awaits: every read and write completes before the call returns.
pub trait State {
    fn get(&self, key: &Key) -> Result<Option<Value>>;
    fn insert(&mut self, key: Key, value: Value) -> Result<()>;
    fn delete(&mut self, key: &Key) -> Result<()>;

    fn apply(&mut self, changes: Vec<(Key, Status)>) -> Result<()> {
        for (key, status) in changes {
            match status {
                Status::Update(value) => self.insert(key, value)?,
                Status::Delete => self.delete(&key)?,
            }
        }
        Ok(())
    }
}

/// In-memory state.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct Memory {
    state: HashMap<Key, Value>,
}

impl Memory {
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

impl State for Memory {
    fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(self.state.get(key).cloned())
    }

    fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.state.insert(key, value);
        Ok(())
    }

    fn delete(&mut self, key: &Key) -> Result<()> {
        self.state.remove(key);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Update(Value),
    Delete,
}

impl Write for Status {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Status::Update(value) => {
                0u8.write(writer);
                value.write(writer);
            }
            Status::Delete => 1u8.write(writer),
        }
    }
}

impl Read for Status {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Status::Update(Value::read(reader)?)),
            1 => Ok(Status::Delete),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Status {
    fn encode_size(&self) -> usize {
        1 + match self {
            Status::Update(value) => value.encode_size(),
            Status::Delete => 0,
        }
    }
}

pub fn nonce<S: State + ?Sized>(state: &S, public: &PublicKey) -> Result<u64> {
    Ok(load_account(state, public)?.nonce)
}

pub(crate) fn load_account<S: State + ?Sized>(state: &S, public: &PublicKey) -> Result<Account> {
    Ok(match state.get(&Key::Account(public.clone()))? {
        Some(Value::Account(account)) => account,
        _ => Account::default(),
    })
}

pub(crate) fn validate_and_increment_nonce(
    account: &mut Account,
    provided_nonce: u64,
) -> Result<(), PrepareError> {
    if account.nonce != provided_nonce {
        return Err(PrepareError::NonceMismatch {
            expected: account.nonce,
            got: provided_nonce,
        });
    }
    account.nonce += 1;
    Ok(())
}

pub(crate) fn load_balance<S: State + ?Sized>(state: &S, public: &PublicKey) -> Result<u64> {
    Ok(match state.get(&Key::Balance(public.clone()))? {
        Some(Value::Balance(balance)) => balance,
        _ => 0,
    })
}

pub(crate) fn load_custody<S: State + ?Sized>(state: &S) -> Result<u64> {
    Ok(match state.get(&Key::Custody)? {
        Some(Value::Custody(amount)) => amount,
        _ => 0,
    })
}

pub(crate) fn load_player<S: State + ?Sized>(
    state: &S,
    public: &PublicKey,
) -> Result<Option<Player>> {
    Ok(match state.get(&Key::Player(public.clone()))? {
        Some(Value::Player(player)) => Some(player),
        _ => None,
    })
}

pub(crate) fn load_rewards<S: State + ?Sized>(
    state: &S,
    public: &PublicKey,
) -> Result<PendingRewards> {
    Ok(match state.get(&Key::Rewards(public.clone()))? {
        Some(Value::Rewards(rewards)) => rewards,
        _ => PendingRewards::default(),
    })
}

pub(crate) fn load_tiers<S: State + ?Sized>(state: &S) -> Result<TierRegistry> {
    Ok(match state.get(&Key::Tiers)? {
        Some(Value::Tiers(tiers)) => tiers,
        _ => TierRegistry::default(),
    })
}

pub(crate) fn load_treasury<S: State + ?Sized>(state: &S) -> Result<Treasury> {
    Ok(match state.get(&Key::Treasury)? {
        Some(Value::Treasury(treasury)) => treasury,
        _ => Treasury::default(),
    })
}

pub(crate) fn load_switches<S: State + ?Sized>(state: &S) -> Result<Switches> {
    Ok(match state.get(&Key::Switches)? {
        Some(Value::Switches(switches)) => switches,
        _ => Switches::default(),
    })
}
