pub mod execution;
pub mod ledger;

pub use execution::{
    transaction_namespace, Account, BlockEnv, Event, Instruction, Key, Output, Transaction,
    Value, NAMESPACE,
};
pub use ledger::{ErrorKind, LedgerError};
