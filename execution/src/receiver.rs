//! Identities that run logic when they receive value.
//!
//! An outbound transfer to an identity with a registered [`Receiver`] hands control to that
//! receiver before the paying operation has finished. The receiver gets a [`Reentry`] handle
//! and may call back into the ledger as itself; guarded operations reject such calls while the
//! outer operation holds the reentrancy lock.

use commonware_cryptography::ed25519::PublicKey;
use rpsledger_types::{
    execution::{Event, Instruction},
    ledger::{Move, Tier},
};
use std::collections::HashMap;
use thiserror::Error as ThisError;

use crate::ExecutionError;

/// Reason a receiver refused an incoming transfer.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{0}")]
pub struct Rejection(pub String);

impl Rejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl From<ExecutionError> for Rejection {
    fn from(err: ExecutionError) -> Self {
        Self(err.to_string())
    }
}

/// Logic run by an identity on receipt of value. Returning an error fails the transfer, which
/// rolls back the whole paying operation.
pub trait Receiver {
    fn on_receive(&mut self, ledger: &mut dyn Reentry, amount: u64) -> Result<(), Rejection>;
}

impl<F> Receiver for F
where
    F: FnMut(&mut dyn Reentry, u64) -> Result<(), Rejection>,
{
    fn on_receive(&mut self, ledger: &mut dyn Reentry, amount: u64) -> Result<(), Rejection> {
        self(ledger, amount)
    }
}

pub type Receivers = HashMap<PublicKey, Box<dyn Receiver>>;

/// Re-entry into the ledger from inside a transfer, acting as the receiving identity.
///
/// A failed call is rolled back on its own; the enclosing operation continues.
pub trait Reentry {
    fn caller(&self) -> &PublicKey;

    fn invoke(&mut self, instruction: Instruction, value: u64)
        -> Result<Vec<Event>, ExecutionError>;

    fn submit_wager(
        &mut self,
        player_move: Move,
        tier: Tier,
        stake: u64,
    ) -> Result<Vec<Event>, ExecutionError> {
        self.invoke(Instruction::SubmitWager { player_move, tier }, stake)
    }

    fn claim(&mut self, index: u64) -> Result<Vec<Event>, ExecutionError> {
        self.invoke(Instruction::Claim { index }, 0)
    }

    fn claim_all(&mut self) -> Result<Vec<Event>, ExecutionError> {
        self.invoke(Instruction::ClaimAll, 0)
    }

    fn withdraw_fees(&mut self) -> Result<Vec<Event>, ExecutionError> {
        self.invoke(Instruction::WithdrawFees, 0)
    }
}
