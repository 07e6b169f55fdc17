//! L1 Bridge Errors

use thiserror::Error;

/// Errors raised by the L1 bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid bridge input on line {line}: {source}")]
    InvalidInput {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("L1 transport closed")]
    TransportClosed,
}
