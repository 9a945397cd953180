//! Access, pause and reentrancy gates.

use commonware_cryptography::ed25519::PublicKey;
use rpsledger_types::ledger::{LedgerError, Switches};
use std::cell::Cell;

/// Reentrancy mutex owned by the ledger aggregate.
///
/// Held only while a guarded operation is running, including any receiver
/// logic that operation hands control to.
#[derive(Debug, Default)]
pub struct ReentrancyLock {
    held: Cell<bool>,
}

impl ReentrancyLock {
    pub fn is_held(&self) -> bool {
        self.held.get()
    }
}

/// Scoped acquisition of a [`ReentrancyLock`]. Released on drop.
#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ReentrancyGuard<'a> {
    lock: &'a ReentrancyLock,
}

impl<'a> ReentrancyGuard<'a> {
    pub fn enter(lock: &'a ReentrancyLock) -> Result<Self, LedgerError> {
        if lock.held.replace(true) {
            return Err(LedgerError::Reentrancy);
        }
        Ok(Self { lock })
    }
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.lock.held.set(false);
    }
}

pub fn require_admin(admin: &PublicKey, caller: &PublicKey) -> Result<(), LedgerError> {
    if admin != caller {
        return Err(LedgerError::Unauthorized);
    }
    Ok(())
}

pub fn require_active(switches: &Switches) -> Result<(), LedgerError> {
    if switches.paused {
        return Err(LedgerError::Paused);
    }
    Ok(())
}

pub fn require_paused(switches: &Switches) -> Result<(), LedgerError> {
    if !switches.paused {
        return Err(LedgerError::NotPaused);
    }
    Ok(())
}
