use anyhow::{anyhow, Context as _, Result};
use commonware_cryptography::ed25519::PublicKey;
use rpsledger_types::{
    execution::{BlockEnv, Event, Instruction, Key, Output, Transaction, Value},
    ledger::LedgerError,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::{
    guard::ReentrancyLock,
    ledger::LedgerConfig,
    oracle::OutcomeOracle,
    receiver::{Receivers, Reentry},
    state::{load_account, validate_and_increment_nonce, PrepareError, State, Status},
    ExecutionError,
};

mod handlers;

/// Marks in the undo journal and event log to roll back to.
struct Savepoint {
    journal: usize,
    events: usize,
}

/// Staged overlay of uncommitted writes on top of a [`State`].
///
/// Every operation runs against a layer. Nothing reaches the underlying state until
/// [`Layer::commit`] hands the staged changes back to the owner, so dropping a layer discards
/// every write it holds.
pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,
    events: Vec<Event>,
    // Staged status each write replaced, newest last. Cleared once a transaction settles.
    journal: Vec<(Key, Option<Status>)>,

    env: &'a BlockEnv,
    config: &'a LedgerConfig,
    oracle: &'a dyn OutcomeOracle,
    receivers: &'a mut Receivers,
    lock: &'a ReentrancyLock,

    // Storage failure raised inside receiver logic, surfaced once control returns.
    fault: Option<anyhow::Error>,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(
        state: &'a S,
        env: &'a BlockEnv,
        config: &'a LedgerConfig,
        oracle: &'a dyn OutcomeOracle,
        receivers: &'a mut Receivers,
        lock: &'a ReentrancyLock,
    ) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),
            events: Vec::new(),
            journal: Vec::new(),

            env,
            config,
            oracle,
            receivers,
            lock,

            fault: None,
        }
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.stage(key, Status::Update(value));
    }

    fn stage(&mut self, key: Key, status: Status) {
        let previous = self.pending.insert(key.clone(), status);
        self.journal.push((key, previous));
    }

    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    fn savepoint(&self) -> Savepoint {
        Savepoint {
            journal: self.journal.len(),
            events: self.events.len(),
        }
    }

    fn rollback(&mut self, savepoint: Savepoint) {
        for (key, previous) in self.journal.drain(savepoint.journal..).rev() {
            match previous {
                Some(status) => {
                    self.pending.insert(key, status);
                }
                None => {
                    self.pending.remove(&key);
                }
            }
        }
        self.events.truncate(savepoint.events);
    }

    pub fn env(&self) -> &BlockEnv {
        self.env
    }

    fn prepare(&mut self, transaction: &Transaction) -> Result<(), PrepareError> {
        if !transaction.verify() {
            return Err(PrepareError::InvalidSignature);
        }
        let mut account =
            load_account(self, &transaction.public).map_err(PrepareError::State)?;
        validate_and_increment_nonce(&mut account, transaction.nonce)?;
        self.insert(
            Key::Account(transaction.public.clone()),
            Value::Account(account),
        );

        Ok(())
    }

    /// Runs one operation as `public` with `value` attached.
    ///
    /// On error the layer may hold partial writes; callers either discard the layer or roll
    /// back to a savepoint taken beforehand.
    pub fn apply(
        &mut self,
        public: &PublicKey,
        instruction: &Instruction,
        value: u64,
    ) -> Result<(), ExecutionError> {
        if value != 0 && !instruction.is_payable() {
            return Err(LedgerError::UnexpectedValue { attached: value }.into());
        }

        match instruction {
            Instruction::SubmitWager { player_move, tier } => {
                self.handle_submit_wager(public, *player_move, *tier, value)
            }
            Instruction::Claim { index } => self.handle_claim(public, *index),
            Instruction::ClaimAll => self.handle_claim_all(public),
            Instruction::WithdrawFees => self.handle_withdraw_fees(public),
            Instruction::SetPaused { paused } => self.handle_set_paused(public, *paused),
            Instruction::UpdateTierAmount { tier, amount } => {
                self.handle_update_tier_amount(public, *tier, *amount)
            }
            Instruction::EmergencyRecover => self.handle_emergency_recover(public),
            Instruction::SyncPool => self.handle_sync_pool(public),
            Instruction::Deposit => self.handle_deposit(public, value),
            Instruction::CommitMove { .. } | Instruction::RevealMove { .. } => {
                self.handle_deprecated(public)
            }
        }
    }

    /// Runs an operation issued from receiver logic. A failure rolls back only this call.
    fn nested(
        &mut self,
        public: &PublicKey,
        instruction: &Instruction,
        value: u64,
    ) -> Result<Vec<Event>, ExecutionError> {
        let savepoint = self.savepoint();
        let mark = savepoint.events;
        match self.apply(public, instruction, value) {
            Ok(()) => Ok(self.events[mark..].to_vec()),
            Err(err) => {
                self.rollback(savepoint);
                debug!(public = ?public, ?instruction, error = %err, "re-entrant call rolled back");
                Err(err)
            }
        }
    }

    /// Drains the events emitted so far.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Executes a batch of signed transactions.
    ///
    /// Transactions with a bad signature or an unexpected nonce are dropped. A rejected
    /// operation still consumes its nonce and is reported as [`Output::Rejected`]. Storage
    /// failures abort the batch.
    pub fn execute(
        &mut self,
        transactions: Vec<Transaction>,
    ) -> Result<(Vec<Output>, BTreeMap<PublicKey, u64>)> {
        let mut processed_nonces = BTreeMap::new();
        let mut outputs = Vec::new();

        for tx in transactions {
            match self.prepare(&tx) {
                Ok(()) => {}
                Err(PrepareError::NonceMismatch { expected, got }) => {
                    debug!(
                        public = ?tx.public,
                        expected,
                        got,
                        "nonce mismatch; dropping transaction"
                    );
                    continue;
                }
                Err(PrepareError::InvalidSignature) => {
                    debug!(public = ?tx.public, nonce = tx.nonce, "invalid signature; dropping transaction");
                    continue;
                }
                Err(PrepareError::State(err)) => {
                    return Err(err).context("state error during prepare");
                }
            }
            processed_nonces.insert(tx.public.clone(), tx.nonce.saturating_add(1));

            let savepoint = self.savepoint();
            match self.apply(&tx.public, &tx.instruction, tx.value) {
                Ok(()) => {
                    outputs.extend(self.take_events().into_iter().map(Output::Event));
                }
                Err(ExecutionError::Rejected(err)) => {
                    self.rollback(savepoint);
                    warn!(
                        public = ?tx.public,
                        nonce = tx.nonce,
                        reason = err.reason(),
                        error = %err,
                        "transaction rejected"
                    );
                    outputs.push(Output::Rejected {
                        public: tx.public.clone(),
                        nonce: tx.nonce,
                        error_code: err.error_code(),
                        reason: err.reason().to_string(),
                    });
                }
                Err(ExecutionError::State(err)) => {
                    return Err(err).context("state error during apply");
                }
            }
            self.journal.clear();
            outputs.push(Output::Transaction(tx));
        }

        Ok((outputs, processed_nonces))
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key)?,
        })
    }

    fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.stage(key, Status::Update(value));
        Ok(())
    }

    fn delete(&mut self, key: &Key) -> Result<()> {
        self.stage(key.clone(), Status::Delete);
        Ok(())
    }
}

/// [`Reentry`] handle given to receiver logic during an outbound transfer.
struct NestedCall<'r, 'a, S: State> {
    layer: &'r mut Layer<'a, S>,
    caller: PublicKey,
}

impl<'r, 'a, S: State> Reentry for NestedCall<'r, 'a, S> {
    fn caller(&self) -> &PublicKey {
        &self.caller
    }

    fn invoke(
        &mut self,
        instruction: Instruction,
        value: u64,
    ) -> Result<Vec<Event>, ExecutionError> {
        match self.layer.nested(&self.caller, &instruction, value) {
            Err(ExecutionError::State(err)) => {
                let message = format!("{err:#}");
                self.layer.fault = Some(err);
                Err(ExecutionError::State(anyhow!(message)))
            }
            result => result,
        }
    }
}
