use crate::{
    oracle::OutcomeOracle, receiver::Reentry, ExecutionError, Ledger, LedgerConfig, Memory,
    Receiver, Rejection,
};
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use rpsledger_types::{
    execution::{BlockEnv, Event, Instruction},
    ledger::{LedgerError, Move, Outcome},
};
use std::{cell::RefCell, rc::Rc};

/// Creates an account keypair for Ed25519 signatures used by players and the administrator
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let private = PrivateKey::from_seed(seed);
    let public = private.public_key();
    (private, public)
}

/// Block environment at `height` with entropy derived from the height
pub fn create_env(height: u64, timestamp: u64) -> BlockEnv {
    BlockEnv::at(height, timestamp)
}

/// Creates an in-memory ledger administered by `admin`
pub fn create_ledger(admin: &PublicKey) -> Ledger<Memory> {
    Ledger::new(Memory::default(), LedgerConfig::new(admin.clone()))
        .expect("default ledger config must be valid")
}

/// Oracle that always picks the counter-move producing a fixed outcome.
#[derive(Clone, Copy, Debug)]
pub struct ForcedOutcome(pub Outcome);

impl OutcomeOracle for ForcedOutcome {
    fn counter_move(&self, _: &BlockEnv, _: &PublicKey, player_move: Move) -> Move {
        Move::ALL
            .into_iter()
            .find(|counter| player_move.against(*counter) == self.0)
            .unwrap_or(player_move)
    }
}

/// Oracle that always plays the same move.
#[derive(Clone, Copy, Debug)]
pub struct FixedOracle(pub Move);

impl OutcomeOracle for FixedOracle {
    fn counter_move(&self, _: &BlockEnv, _: &PublicKey, _: Move) -> Move {
        self.0
    }
}

/// Receiver that refuses every transfer.
#[derive(Clone, Debug, Default)]
pub struct RejectingReceiver;

impl Receiver for RejectingReceiver {
    fn on_receive(&mut self, _: &mut dyn Reentry, amount: u64) -> Result<(), Rejection> {
        Err(Rejection::new(format!("refusing {amount}")))
    }
}

/// Outcome of one attempted re-entry, as observed by the receiver.
pub type Attempt = Result<Vec<Event>, Option<LedgerError>>;

/// Receiver that re-enters the ledger with `instruction` on every transfer it receives and
/// records what happened. Accepts the transfer regardless of the outcome.
#[derive(Clone, Debug)]
pub struct ReentrantReceiver {
    instruction: Instruction,
    value: u64,
    attempts: Rc<RefCell<Vec<Attempt>>>,
}

impl ReentrantReceiver {
    pub fn new(instruction: Instruction) -> Self {
        Self::with_value(instruction, 0)
    }

    pub fn with_value(instruction: Instruction, value: u64) -> Self {
        Self {
            instruction,
            value,
            attempts: Rc::default(),
        }
    }

    /// Shared view of the attempts, readable after the receiver is handed to a ledger.
    pub fn attempts(&self) -> Rc<RefCell<Vec<Attempt>>> {
        self.attempts.clone()
    }
}

impl Receiver for ReentrantReceiver {
    fn on_receive(&mut self, ledger: &mut dyn Reentry, _: u64) -> Result<(), Rejection> {
        let attempt = ledger
            .invoke(self.instruction.clone(), self.value)
            .map_err(|err: ExecutionError| err.rejection().cloned());
        self.attempts.borrow_mut().push(attempt);
        Ok(())
    }
}
