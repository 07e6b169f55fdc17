//! L1 Bridge - Settlement transport and L1 event source
//!
//! Handles communication with L1:
//! - Sending validator messages (unanimous assertion confirmations) to L1
//! - Reading bridge events and time ticks for the closing driver

pub mod committer;
pub mod error;
pub mod l1_reader;

pub use committer::{MessageSender, StateCommitter};
pub use error::BridgeError;
pub use l1_reader::L1Reader;
