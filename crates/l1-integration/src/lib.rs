//! Shared types for L1/L2 integration
//!
//! Wire vocabulary exchanged between the validator and the L1 bridge:
//! - Assertions proposed for unanimous closing
//! - Events reported by the L1 bridge
//! - Messages the validator asks the bridge to send to L1

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-byte digest used for inbox and assertion hashes
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash,
)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// Hash arbitrary bytes with blake3
    pub fn digest(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Snapshot of proposed VM state (matches the L1 assertion layout)
///
/// Built elsewhere and carried unchanged through a closing round.
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Assertion {
    /// VM machine hash after executing the assertion
    pub after_hash: Hash,
    /// Number of VM steps covered
    pub num_steps: u32,
    /// Outgoing messages produced by the VM
    pub out_msgs: Vec<Vec<u8>>,
    /// Log values emitted by the VM
    pub logs: Vec<u64>,
}

impl Assertion {
    pub fn new(after_hash: Hash, num_steps: u32) -> Self {
        Self {
            after_hash,
            num_steps,
            out_msgs: Vec::new(),
            logs: Vec::new(),
        }
    }

    /// Compute the hash of this assertion
    pub fn hash(&self) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.after_hash.as_bytes());
        hasher.update(&self.num_steps.to_le_bytes());
        for msg in &self.out_msgs {
            hasher.update(&(msg.len() as u64).to_le_bytes());
            hasher.update(msg);
        }
        for log in &self.logs {
            hasher.update(&log.to_le_bytes());
        }
        Hash(*hasher.finalize().as_bytes())
    }
}

/// Events reported by the L1 bridge
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum L1Event {
    /// A non-final unanimous assertion was proposed at `sequence_num`
    ProposedUnanimousAssertion { sequence_num: u64 },
    /// Someone proposed a disputable assertion
    DisputableAssertionProposed,
    /// A final unanimous assertion was accepted
    FinalUnanimousAssertion,
    /// The pending unanimous assertion was confirmed on L1
    ConfirmedUnanimousAssertion,
    /// A disputable assertion passed its challenge window
    ConfirmedDisputableAssertion,
    /// A challenge was launched against a disputable assertion
    InitiateChallenge,
}

impl L1Event {
    pub fn name(&self) -> &'static str {
        match self {
            L1Event::ProposedUnanimousAssertion { .. } => "ProposedUnanimousAssertion",
            L1Event::DisputableAssertionProposed => "DisputableAssertionProposed",
            L1Event::FinalUnanimousAssertion => "FinalUnanimousAssertion",
            L1Event::ConfirmedUnanimousAssertion => "ConfirmedUnanimousAssertion",
            L1Event::ConfirmedDisputableAssertion => "ConfirmedDisputableAssertion",
            L1Event::InitiateChallenge => "InitiateChallenge",
        }
    }
}

/// Messages the validator hands to the L1 transport
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutgoingMessage {
    /// Ask L1 to confirm the agreed unanimous assertion
    ConfirmUnanimousAsserted {
        /// Inbox hash pinning which messages are committed
        new_inbox_hash: Hash,
        assertion: Assertion,
    },
}

impl OutgoingMessage {
    /// Serialize for network transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).expect("OutgoingMessage serialization should not fail")
    }

    /// Deserialize from network
    pub fn from_bytes(data: &[u8]) -> Result<Self, borsh::io::Error> {
        borsh::from_slice(data)
    }
}

/// One input for the closing driver: a time tick or a timestamped event
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BridgeInput {
    Tick { time: u64 },
    Event { time: u64, event: L1Event },
}

impl BridgeInput {
    pub fn time(&self) -> u64 {
        match self {
            BridgeInput::Tick { time } | BridgeInput::Event { time, .. } => *time,
        }
    }
}
