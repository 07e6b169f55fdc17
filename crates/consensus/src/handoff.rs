//! One-shot outcome channel for a closing round
//!
//! Whoever started the round may hold the receiving end and block on it.
//! `send` consumes the handoff, so a round can report at most once, and a
//! oneshot send never blocks the state machine.

use tokio::sync::oneshot;

/// Optional sink for the round outcome (`true` = unanimous success)
#[derive(Debug, Default)]
pub struct ResultHandoff {
    tx: Option<oneshot::Sender<bool>>,
}

impl ResultHandoff {
    /// Handoff with no listener
    pub fn none() -> Self {
        Self { tx: None }
    }

    pub fn new(tx: oneshot::Sender<bool>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Create a handoff together with the receiver for the caller
    pub fn channel() -> (Self, oneshot::Receiver<bool>) {
        let (tx, rx) = oneshot::channel();
        (Self::new(tx), rx)
    }

    pub fn is_present(&self) -> bool {
        self.tx.is_some()
    }

    /// Report the outcome; a missing or departed listener is not an error
    pub fn send(self, result: bool) {
        let Some(tx) = self.tx else {
            return;
        };
        if tx.send(result).is_err() {
            tracing::warn!("Closing result {} dropped: caller stopped listening", result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_delivers_once() {
        let (handoff, mut rx) = ResultHandoff::channel();
        assert!(handoff.is_present());

        handoff.send(true);
        assert_eq!(rx.try_recv(), Ok(true));
    }

    #[test]
    fn test_absent_and_dropped_listeners() {
        ResultHandoff::none().send(false);

        let (handoff, rx) = ResultHandoff::channel();
        drop(rx);
        handoff.send(false);
    }
}
