//! Core types shared by every closing state

use crate::state::ValidatorState;
use crate::validator_core::VmCore;
use l1_integration::OutgoingMessage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default grace period in L1 time units
pub const DEFAULT_GRACE_PERIOD: u64 = 20;

/// Configuration for the closing protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingConfig {
    /// How long to wait after sequence number agreement before asking L1
    /// to confirm the unanimous assertion
    pub grace_period: u64,
}

impl Default for ClosingConfig {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

/// Read-only configuration and shared core, handed from state to state
#[derive(Clone)]
pub struct ClosingContext {
    pub config: Arc<ClosingConfig>,
    pub core: Arc<dyn VmCore>,
}

impl ClosingContext {
    pub fn new(config: ClosingConfig, core: Arc<dyn VmCore>) -> Self {
        Self {
            config: Arc::new(config),
            core,
        }
    }

    pub fn grace_period(&self) -> u64 {
        self.config.grace_period
    }
}

impl fmt::Debug for ClosingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosingContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Result of feeding one tick or event to a state
#[derive(Debug)]
pub struct Transition {
    /// State to continue from
    pub state: ValidatorState,
    /// Messages the driver must send to L1
    pub messages: Vec<OutgoingMessage>,
}

impl Transition {
    /// Move to `state` without sending anything
    pub fn to(state: impl Into<ValidatorState>) -> Self {
        Self {
            state: state.into(),
            messages: Vec::new(),
        }
    }

    /// Move to `state` and send `messages`
    pub fn with_messages(state: impl Into<ValidatorState>, messages: Vec<OutgoingMessage>) -> Self {
        Self {
            state: state.into(),
            messages,
        }
    }
}
