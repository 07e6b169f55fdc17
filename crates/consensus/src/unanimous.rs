//! Unanimous closing states
//!
//! A round enters at `AttemptingUnanimousClosing` (a final proposal was
//! broadcast) or `AttemptingOffchainClosing` (a tentative proposal at some
//! sequence number was broadcast). The off-chain path waits for every party
//! to agree on the sequence number, sits out the grace period, asks L1 to
//! confirm, and finishes when L1 reports the confirmation.
//!
//! Every exit other than success reports `false` on the result handoff
//! before returning the error.

use crate::error::ClosingError;
use crate::handoff::ResultHandoff;
use crate::state::WaitingObserver;
use crate::types::{ClosingContext, Transition};
use l1_integration::{Assertion, L1Event, OutgoingMessage};
use std::cmp::Ordering;

fn desync(state: &'static str, event: &L1Event) -> ClosingError {
    ClosingError::Desync {
        state,
        event: event.name(),
    }
}

/// Report failure to the caller and end the round
fn abort(handoff: ResultHandoff, err: ClosingError) -> Result<Transition, ClosingError> {
    if err.is_desync() {
        tracing::error!("Closing round failed: {}", err);
    } else {
        tracing::warn!("Closing round aborted: {}", err);
    }
    handoff.send(false);
    Err(err)
}

/// Final unanimous assertion broadcast, waiting for L1 to accept it
#[derive(Debug)]
pub struct AttemptingUnanimousClosing {
    ctx: ClosingContext,
    assertion: Assertion,
    handoff: ResultHandoff,
}

impl AttemptingUnanimousClosing {
    pub const NAME: &'static str = "AttemptingUnanimous";

    /// End the round from outside the state machine, reporting failure
    pub(crate) fn abandon(self) {
        self.handoff.send(false);
    }

    pub fn new(ctx: ClosingContext, assertion: Assertion, handoff: ResultHandoff) -> Self {
        Self {
            ctx,
            assertion,
            handoff,
        }
    }

    pub fn assertion(&self) -> &Assertion {
        &self.assertion
    }

    pub fn advance_time(self, _time: u64) -> Result<Transition, ClosingError> {
        Ok(Transition::to(self))
    }

    pub fn handle_event(self, event: &L1Event, _time: u64) -> Result<Transition, ClosingError> {
        match event {
            // Final update has already been sent
            L1Event::ProposedUnanimousAssertion { .. } | L1Event::DisputableAssertionProposed => {
                tracing::debug!("{}: ignoring {}", Self::NAME, event.name());
                Ok(Transition::to(self))
            }
            L1Event::FinalUnanimousAssertion => {
                tracing::info!("Final unanimous assertion {} accepted", self.assertion.hash());
                self.handoff.send(true);
                self.ctx.core.deliver_pending_messages_to_vm();
                Ok(Transition::to(WaitingObserver::new(self.ctx)))
            }
            other => abort(self.handoff, desync(Self::NAME, other)),
        }
    }
}

/// Tentative unanimous assertion proposed at `sequence_num`
#[derive(Debug)]
pub struct AttemptingOffchainClosing {
    ctx: ClosingContext,
    sequence_num: u64,
    assertion: Assertion,
    handoff: ResultHandoff,
}

impl AttemptingOffchainClosing {
    pub const NAME: &'static str = "AttemptingOffchain";

    /// End the round from outside the state machine, reporting failure
    pub(crate) fn abandon(self) {
        self.handoff.send(false);
    }

    pub fn new(
        ctx: ClosingContext,
        sequence_num: u64,
        assertion: Assertion,
        handoff: ResultHandoff,
    ) -> Self {
        Self {
            ctx,
            sequence_num,
            assertion,
            handoff,
        }
    }

    pub fn sequence_num(&self) -> u64 {
        self.sequence_num
    }

    pub fn assertion(&self) -> &Assertion {
        &self.assertion
    }

    pub fn advance_time(self, _time: u64) -> Result<Transition, ClosingError> {
        Ok(Transition::to(self))
    }

    pub fn handle_event(self, event: &L1Event, time: u64) -> Result<Transition, ClosingError> {
        match event {
            L1Event::ProposedUnanimousAssertion { sequence_num } => {
                match sequence_num.cmp(&self.sequence_num) {
                    Ordering::Less => {
                        // Newer update has already been sent
                        tracing::debug!(
                            "{}: ignoring stale proposal {} (ours {})",
                            Self::NAME,
                            sequence_num,
                            self.sequence_num
                        );
                        Ok(Transition::to(self))
                    }
                    Ordering::Greater => {
                        let err = ClosingError::Superseded {
                            local: self.sequence_num,
                            remote: *sequence_num,
                        };
                        abort(self.handoff, err)
                    }
                    Ordering::Equal => {
                        let deadline = time.saturating_add(self.ctx.grace_period());
                        tracing::info!(
                            "Sequence number {} agreed at {}, waiting until {}",
                            self.sequence_num,
                            time,
                            deadline
                        );
                        Ok(Transition::to(WaitingOffchainClosing::new(
                            self.ctx,
                            self.assertion,
                            deadline,
                            self.handoff,
                        )))
                    }
                }
            }
            // Unanimous proposal has already been sent
            L1Event::DisputableAssertionProposed => {
                tracing::debug!("{}: ignoring {}", Self::NAME, event.name());
                Ok(Transition::to(self))
            }
            L1Event::FinalUnanimousAssertion => {
                abort(self.handoff, ClosingError::SupersededByFinalAssert)
            }
            other => abort(self.handoff, desync(Self::NAME, other)),
        }
    }
}

/// Sequence number agreed, sitting out the grace period
#[derive(Debug)]
pub struct WaitingOffchainClosing {
    ctx: ClosingContext,
    assertion: Assertion,
    deadline: u64,
    handoff: ResultHandoff,
}

impl WaitingOffchainClosing {
    pub const NAME: &'static str = "WaitingOffchain";

    /// End the round from outside the state machine, reporting failure
    pub(crate) fn abandon(self) {
        self.handoff.send(false);
    }

    pub fn new(
        ctx: ClosingContext,
        assertion: Assertion,
        deadline: u64,
        handoff: ResultHandoff,
    ) -> Self {
        Self {
            ctx,
            assertion,
            deadline,
            handoff,
        }
    }

    pub fn deadline(&self) -> u64 {
        self.deadline
    }

    pub fn assertion(&self) -> &Assertion {
        &self.assertion
    }

    /// Leaves only once `time` is strictly past the deadline
    pub fn advance_time(self, time: u64) -> Result<Transition, ClosingError> {
        if time <= self.deadline {
            return Ok(Transition::to(self));
        }

        let new_inbox_hash = self.ctx.core.inbox_hash();
        tracing::info!(
            "Grace period over at {}, confirming assertion {} with inbox {}",
            time,
            self.assertion.hash(),
            new_inbox_hash
        );
        let msg = OutgoingMessage::ConfirmUnanimousAsserted {
            new_inbox_hash,
            assertion: self.assertion,
        };
        Ok(Transition::with_messages(
            FinalizingOffchainClosing::new(self.ctx, self.handoff),
            vec![msg],
        ))
    }

    pub fn handle_event(self, event: &L1Event, _time: u64) -> Result<Transition, ClosingError> {
        match event {
            L1Event::ProposedUnanimousAssertion { sequence_num } => abort(
                self.handoff,
                ClosingError::SupersededBySequenceNumber {
                    remote: *sequence_num,
                },
            ),
            L1Event::FinalUnanimousAssertion => {
                abort(self.handoff, ClosingError::SupersededByFinalAssert)
            }
            // DisputableAssertionProposed lands here too, unlike the other states.
            other => abort(self.handoff, desync(Self::NAME, other)),
        }
    }
}

/// Confirmation sent to L1, waiting for it to land
#[derive(Debug)]
pub struct FinalizingOffchainClosing {
    ctx: ClosingContext,
    handoff: ResultHandoff,
}

impl FinalizingOffchainClosing {
    pub const NAME: &'static str = "FinalizingOffchain";

    /// End the round from outside the state machine, reporting failure
    pub(crate) fn abandon(self) {
        self.handoff.send(false);
    }

    pub fn new(ctx: ClosingContext, handoff: ResultHandoff) -> Self {
        Self { ctx, handoff }
    }

    pub fn advance_time(self, _time: u64) -> Result<Transition, ClosingError> {
        Ok(Transition::to(self))
    }

    pub fn handle_event(self, event: &L1Event, _time: u64) -> Result<Transition, ClosingError> {
        match event {
            L1Event::ConfirmedUnanimousAssertion => {
                tracing::info!("Unanimous assertion confirmed on L1");
                self.ctx.core.deliver_pending_messages_to_vm();
                self.handoff.send(true);
                Ok(Transition::to(WaitingObserver::new(self.ctx)))
            }
            other => abort(self.handoff, desync(Self::NAME, other)),
        }
    }
}
