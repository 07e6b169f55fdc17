//! L2 Consensus - Unanimous assertion closing protocol
//!
//! Architecture:
//! - A closing round starts once this validator has proposed an assertion
//!   for unanimous agreement (off-chain or final)
//! - The round is a state machine fed L1 bridge events and time ticks
//! - Agreement ends in a confirmation on L1, pending inbox messages are
//!   delivered to the VM, and the validator returns to observing
//! - Every round reports its outcome at most once through a result handoff

pub mod validator_core;
pub mod driver;
pub mod error;
pub mod handoff;
pub mod state;
pub mod types;
pub mod unanimous;


pub use validator_core::{Inbox, ValidatorCore, VmCore};
pub use driver::{ClosingDriver, DriverOutcome};
pub use error::ClosingError;
pub use handoff::ResultHandoff;
pub use state::{ValidatorState, WaitingObserver};
pub use types::*;
pub use unanimous::{
    AttemptingOffchainClosing, AttemptingUnanimousClosing, FinalizingOffchainClosing,
    WaitingOffchainClosing,
};
