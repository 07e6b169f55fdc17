//! State Committer - Sends validator messages to L1
//!
//! Currently a stub transport: messages are logged and recorded instead of
//! being wrapped in L1 transactions. Signing and submission live outside
//! the validator.

use crate::error::BridgeError;
use async_trait::async_trait;
use l1_integration::OutgoingMessage;
use tokio::sync::RwLock;

/// Transport for messages produced by the closing state machine
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Hand one message to L1
    async fn send_message(&self, msg: &OutgoingMessage) -> Result<(), BridgeError>;
}

/// Commits validator messages to L1 (stub implementation)
pub struct StateCommitter {
    /// L1 RPC URL (stored for future use)
    rpc_url: String,
    /// Messages handed to the transport, in send order
    sent: RwLock<Vec<OutgoingMessage>>,
    /// Reject sends once closed
    closed: RwLock<bool>,
}

impl StateCommitter {
    /// Create a new state committer
    pub fn new(rpc_url: &str) -> Self {
        Self {
            rpc_url: rpc_url.to_string(),
            sent: RwLock::new(Vec::new()),
            closed: RwLock::new(false),
        }
    }

    /// Get the RPC URL
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Messages sent so far
    pub async fn sent_messages(&self) -> Vec<OutgoingMessage> {
        self.sent.read().await.clone()
    }

    /// Stop accepting messages
    pub async fn close(&self) {
        *self.closed.write().await = true;
    }
}

#[async_trait]
impl MessageSender for StateCommitter {
    async fn send_message(&self, msg: &OutgoingMessage) -> Result<(), BridgeError> {
        if *self.closed.read().await {
            return Err(BridgeError::TransportClosed);
        }

        match msg {
            OutgoingMessage::ConfirmUnanimousAsserted {
                new_inbox_hash,
                assertion,
            } => {
                tracing::info!(
                    "Would confirm unanimous assertion {} with inbox {} via {}",
                    assertion.hash(),
                    new_inbox_hash,
                    self.rpc_url
                );
            }
        }

        self.sent.write().await.push(msg.clone());
        Ok(())
    }
}
