//! Closing Protocol Errors

use thiserror::Error;

/// Reasons a closing round terminates without reaching the observer state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClosingError {
    #[error("unanimous assertion unexpectedly superseded (local sequence {local}, remote {remote})")]
    Superseded { local: u64, remote: u64 },

    #[error("unanimous assertion unexpectedly superseded by final assert")]
    SupersededByFinalAssert,

    #[error("unanimous assertion unexpectedly superseded by sequence number {remote}")]
    SupersededBySequenceNumber { remote: u64 },

    #[error("{state}: VM state got unsynchronized on {event}")]
    Desync {
        state: &'static str,
        event: &'static str,
    },

    #[error("closing round already terminated")]
    RoundTerminated,
}

impl ClosingError {
    /// A conflicting proposal replaced ours
    pub fn is_supersession(&self) -> bool {
        matches!(
            self,
            ClosingError::Superseded { .. }
                | ClosingError::SupersededByFinalAssert
                | ClosingError::SupersededBySequenceNumber { .. }
        )
    }

    /// Local state and L1-observed state diverged
    pub fn is_desync(&self) -> bool {
        matches!(self, ClosingError::Desync { .. })
    }
}
