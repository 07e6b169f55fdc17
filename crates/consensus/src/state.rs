//! Validator state - the closing states plus the observer they return to

use crate::error::ClosingError;
use crate::handoff::ResultHandoff;
use crate::types::{ClosingContext, Transition};
use crate::unanimous::{
    AttemptingOffchainClosing, AttemptingUnanimousClosing, FinalizingOffchainClosing,
    WaitingOffchainClosing,
};
use l1_integration::{Assertion, L1Event};

/// Passive state after a successful round
///
/// Resumes monitoring the bridge; the closing protocol never leaves it.
#[derive(Debug)]
pub struct WaitingObserver {
    ctx: ClosingContext,
}

impl WaitingObserver {
    pub const NAME: &'static str = "WaitingObserver";

    pub fn new(ctx: ClosingContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ClosingContext {
        &self.ctx
    }

    pub fn advance_time(self, _time: u64) -> Result<Transition, ClosingError> {
        Ok(Transition::to(self))
    }

    pub fn handle_event(self, event: &L1Event, time: u64) -> Result<Transition, ClosingError> {
        tracing::debug!("{}: observed {} at {}", Self::NAME, event.name(), time);
        Ok(Transition::to(self))
    }
}

/// Current state of one validator's closing round
#[derive(Debug)]
pub enum ValidatorState {
    AttemptingUnanimous(AttemptingUnanimousClosing),
    AttemptingOffchain(AttemptingOffchainClosing),
    WaitingOffchain(WaitingOffchainClosing),
    FinalizingOffchain(FinalizingOffchainClosing),
    WaitingObserver(WaitingObserver),
}

impl ValidatorState {
    /// Entry point after broadcasting a final unanimous assertion
    pub fn attempting_unanimous(
        ctx: ClosingContext,
        assertion: Assertion,
        handoff: ResultHandoff,
    ) -> Self {
        AttemptingUnanimousClosing::new(ctx, assertion, handoff).into()
    }

    /// Entry point after broadcasting a tentative unanimous assertion
    pub fn attempting_offchain(
        ctx: ClosingContext,
        sequence_num: u64,
        assertion: Assertion,
        handoff: ResultHandoff,
    ) -> Self {
        AttemptingOffchainClosing::new(ctx, sequence_num, assertion, handoff).into()
    }

    pub fn waiting_observer(ctx: ClosingContext) -> Self {
        WaitingObserver::new(ctx).into()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValidatorState::AttemptingUnanimous(_) => AttemptingUnanimousClosing::NAME,
            ValidatorState::AttemptingOffchain(_) => AttemptingOffchainClosing::NAME,
            ValidatorState::WaitingOffchain(_) => WaitingOffchainClosing::NAME,
            ValidatorState::FinalizingOffchain(_) => FinalizingOffchainClosing::NAME,
            ValidatorState::WaitingObserver(_) => WaitingObserver::NAME,
        }
    }

    /// The round has completed successfully
    pub fn is_terminal(&self) -> bool {
        matches!(self, ValidatorState::WaitingObserver(_))
    }

    /// Drop the round after a failure outside the state machine
    ///
    /// Reports `false` to the caller if the round still holds its handoff.
    pub fn abandon(self) {
        tracing::warn!("Abandoning closing round in {}", self.name());
        match self {
            ValidatorState::AttemptingUnanimous(s) => s.abandon(),
            ValidatorState::AttemptingOffchain(s) => s.abandon(),
            ValidatorState::WaitingOffchain(s) => s.abandon(),
            ValidatorState::FinalizingOffchain(s) => s.abandon(),
            ValidatorState::WaitingObserver(_) => {}
        }
    }

    /// Feed a time tick
    pub fn advance_time(self, time: u64) -> Result<Transition, ClosingError> {
        match self {
            ValidatorState::AttemptingUnanimous(s) => s.advance_time(time),
            ValidatorState::AttemptingOffchain(s) => s.advance_time(time),
            ValidatorState::WaitingOffchain(s) => s.advance_time(time),
            ValidatorState::FinalizingOffchain(s) => s.advance_time(time),
            ValidatorState::WaitingObserver(s) => s.advance_time(time),
        }
    }

    /// Feed an L1 bridge event observed at `time`
    pub fn handle_event(self, event: &L1Event, time: u64) -> Result<Transition, ClosingError> {
        match self {
            ValidatorState::AttemptingUnanimous(s) => s.handle_event(event, time),
            ValidatorState::AttemptingOffchain(s) => s.handle_event(event, time),
            ValidatorState::WaitingOffchain(s) => s.handle_event(event, time),
            ValidatorState::FinalizingOffchain(s) => s.handle_event(event, time),
            ValidatorState::WaitingObserver(s) => s.handle_event(event, time),
        }
    }
}

impl From<AttemptingUnanimousClosing> for ValidatorState {
    fn from(state: AttemptingUnanimousClosing) -> Self {
        ValidatorState::AttemptingUnanimous(state)
    }
}

impl From<AttemptingOffchainClosing> for ValidatorState {
    fn from(state: AttemptingOffchainClosing) -> Self {
        ValidatorState::AttemptingOffchain(state)
    }
}

impl From<WaitingOffchainClosing> for ValidatorState {
    fn from(state: WaitingOffchainClosing) -> Self {
        ValidatorState::WaitingOffchain(state)
    }
}

impl From<FinalizingOffchainClosing> for ValidatorState {
    fn from(state: FinalizingOffchainClosing) -> Self {
        ValidatorState::FinalizingOffchain(state)
    }
}

impl From<WaitingObserver> for ValidatorState {
    fn from(state: WaitingObserver) -> Self {
        ValidatorState::WaitingObserver(state)
    }
}
