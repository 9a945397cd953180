use rpsledger_types::LedgerError;
use thiserror::Error as ThisError;

/// Failure of a single ledger operation.
#[derive(Debug, ThisError)]
pub enum ExecutionError {
    /// The operation was rejected and none of its writes were kept.
    #[error("rejected: {0}")]
    Rejected(#[from] LedgerError),
    /// The backing store failed. Not attributable to the caller.
    #[error("state error: {0:#}")]
    State(#[from] anyhow::Error),
}

impl ExecutionError {
    /// The ledger rejection, if this is one.
    pub fn rejection(&self) -> Option<&LedgerError> {
        match self {
            Self::Rejected(err) => Some(err),
            Self::State(_) => None,
        }
    }
}
