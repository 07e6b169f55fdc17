//! Closing driver - feeds bridge inputs to the state machine one at a time
//!
//! Owns the current state, forwards outgoing messages to the L1 transport,
//! and stops once the round completes or fails.

use crate::error::ClosingError;
use crate::state::ValidatorState;
use anyhow::Context;
use l1_bridge::MessageSender;
use l1_integration::{BridgeInput, OutgoingMessage};
use tokio::sync::mpsc;

/// Summary of a driver run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOutcome {
    /// State the round ended in
    pub final_state: &'static str,
    /// Whether the round reached the observer state
    pub completed: bool,
    /// Inputs applied to the state machine
    pub inputs_processed: u64,
    /// Messages handed to the L1 transport
    pub messages_sent: u64,
}

/// Drives one closing round
pub struct ClosingDriver {
    /// `None` once the round has failed
    state: Option<ValidatorState>,
    inputs_processed: u64,
    messages_sent: u64,
}

impl ClosingDriver {
    pub fn new(state: ValidatorState) -> Self {
        Self {
            state: Some(state),
            inputs_processed: 0,
            messages_sent: 0,
        }
    }

    /// Current state, if the round has not failed
    pub fn state(&self) -> Option<&ValidatorState> {
        self.state.as_ref()
    }

    /// Apply one input and return the messages to send
    ///
    /// After an error the round is over and every further call fails with
    /// `RoundTerminated`.
    pub fn step(&mut self, input: &BridgeInput) -> Result<Vec<OutgoingMessage>, ClosingError> {
        let state = self.state.take().ok_or(ClosingError::RoundTerminated)?;
        let from = state.name();

        let transition = match input {
            BridgeInput::Tick { time } => state.advance_time(*time)?,
            BridgeInput::Event { time, event } => state.handle_event(event, *time)?,
        };
        self.inputs_processed += 1;

        if transition.state.name() != from {
            tracing::debug!("Closing state {} -> {}", from, transition.state.name());
        }
        self.state = Some(transition.state);
        Ok(transition.messages)
    }

    fn outcome(&self) -> DriverOutcome {
        DriverOutcome {
            final_state: self.state.as_ref().map_or("Failed", ValidatorState::name),
            completed: self.state.as_ref().is_some_and(ValidatorState::is_terminal),
            inputs_processed: self.inputs_processed,
            messages_sent: self.messages_sent,
        }
    }

    /// Run until the round completes, fails, or `inputs` closes
    pub async fn run<S>(
        mut self,
        mut inputs: mpsc::Receiver<BridgeInput>,
        sender: &S,
    ) -> anyhow::Result<DriverOutcome>
    where
        S: MessageSender + ?Sized,
    {
        if let Some(state) = self.state() {
            tracing::info!("Closing round started in {}", state.name());
        }

        while let Some(input) = inputs.recv().await {
            let messages = self
                .step(&input)
                .with_context(|| format!("closing round failed at time {}", input.time()))?;

            for msg in &messages {
                if let Err(e) = sender.send_message(msg).await {
                    if let Some(state) = self.state.take() {
                        state.abandon();
                    }
                    return Err(e).context("failed to hand message to L1 transport");
                }
                self.messages_sent += 1;
            }

            if self.state().is_some_and(ValidatorState::is_terminal) {
                break;
            }
        }

        let outcome = self.outcome();
        if outcome.completed {
            tracing::info!(
                "Closing round completed after {} inputs, {} messages sent",
                outcome.inputs_processed,
                outcome.messages_sent
            );
        } else {
            tracing::warn!("Bridge input ended with round still in {}", outcome.final_state);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff::ResultHandoff;
    use crate::types::{ClosingConfig, ClosingContext};
    use crate::validator_core::ValidatorCore;
    use l1_bridge::StateCommitter;
    use l1_integration::{Assertion, Hash, L1Event};
    use std::sync::Arc;

    fn offchain_state(handoff: ResultHandoff) -> ValidatorState {
        let ctx = ClosingContext::new(
            ClosingConfig { grace_period: 20 },
            Arc::new(ValidatorCore::new()),
        );
        ValidatorState::attempting_offchain(ctx, 5, Assertion::new(Hash::digest(b"vm"), 8), handoff)
    }

    #[test]
    fn test_step_after_failure_is_rejected() {
        let mut driver = ClosingDriver::new(offchain_state(ResultHandoff::none()));

        let err = driver
            .step(&BridgeInput::Event {
                time: 3,
                event: L1Event::FinalUnanimousAssertion,
            })
            .unwrap_err();
        assert_eq!(err, ClosingError::SupersededByFinalAssert);
        assert!(driver.state().is_none());

        let err = driver.step(&BridgeInput::Tick { time: 4 }).unwrap_err();
        assert_eq!(err, ClosingError::RoundTerminated);
    }

    #[tokio::test]
    async fn test_run_stops_when_inputs_end() {
        let driver = ClosingDriver::new(offchain_state(ResultHandoff::none()));
        let committer = StateCommitter::new("http://localhost:8545");
        let (tx, rx) = mpsc::channel(4);

        tx.send(BridgeInput::Tick { time: 1 }).await.unwrap();
        tx.send(BridgeInput::Event {
            time: 2,
            event: L1Event::ProposedUnanimousAssertion { sequence_num: 5 },
        })
        .await
        .unwrap();
        drop(tx);

        let outcome = driver.run(rx, &committer).await.unwrap();
        assert_eq!(
            outcome,
            DriverOutcome {
                final_state: "WaitingOffchain",
                completed: false,
                inputs_processed: 2,
                messages_sent: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_run_abandons_round_when_transport_closes() {
        let (handoff, rx_result) = ResultHandoff::channel();
        let ctx = ClosingContext::new(
            ClosingConfig { grace_period: 0 },
            Arc::new(ValidatorCore::new()),
        );
        let driver = ClosingDriver::new(ValidatorState::attempting_offchain(
            ctx,
            5,
            Assertion::new(Hash::digest(b"vm"), 8),
            handoff,
        ));
        let committer = StateCommitter::new("http://localhost:8545");
        committer.close().await;
        let (tx, rx) = mpsc::channel(4);

        tx.send(BridgeInput::Event {
            time: 2,
            event: L1Event::ProposedUnanimousAssertion { sequence_num: 5 },
        })
        .await
        .unwrap();
        tx.send(BridgeInput::Tick { time: 3 }).await.unwrap();
        drop(tx);

        let err = driver.run(rx, &committer).await.unwrap_err();
        assert!(err.downcast_ref::<l1_bridge::BridgeError>().is_some());
        assert!(committer.sent_messages().await.is_empty());
        assert_eq!(rx_result.await, Ok(false));
    }

    #[tokio::test]
    async fn test_run_propagates_round_failure() {
        let (handoff, rx_result) = ResultHandoff::channel();
        let driver = ClosingDriver::new(offchain_state(handoff));
        let committer = StateCommitter::new("http://localhost:8545");
        let (tx, rx) = mpsc::channel(4);

        tx.send(BridgeInput::Event {
            time: 2,
            event: L1Event::ProposedUnanimousAssertion { sequence_num: 9 },
        })
        .await
        .unwrap();
        drop(tx);

        let err = driver.run(rx, &committer).await.unwrap_err();
        let closing = err.downcast_ref::<ClosingError>().unwrap();
        assert!(closing.is_supersession());
        assert!(!rx_result.await.unwrap());
    }
}
