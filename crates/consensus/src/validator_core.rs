//! Validator core - inbox of pending VM messages
//!
//! Shared by every closing round. States only read the inbox hash and ask
//! the core to deliver; all synchronization lives here.

use l1_integration::Hash;
use parking_lot::RwLock;

/// Operations the closing protocol needs from the validator core
pub trait VmCore: Send + Sync {
    /// Hash of the pending inbox, as committed in the confirm message
    fn inbox_hash(&self) -> Hash;

    /// Move pending inbox messages into the VM
    fn deliver_pending_messages_to_vm(&self);
}

/// Pending messages with a chained hash
///
/// `hash = blake3(prev_hash || blake3(message))` per appended message; an
/// empty inbox hashes to zero.
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    messages: Vec<Vec<u8>>,
    hash: Hash,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and extend the hash chain
    pub fn push(&mut self, message: Vec<u8>) {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.hash.as_bytes());
        hasher.update(blake3::hash(&message).as_bytes());
        self.hash = Hash(*hasher.finalize().as_bytes());
        self.messages.push(message);
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Remove all messages and reset the hash chain
    pub fn take(&mut self) -> Vec<Vec<u8>> {
        self.hash = Hash::default();
        std::mem::take(&mut self.messages)
    }
}

#[derive(Debug, Default)]
struct VmInbox {
    /// Messages already handed to the VM, in delivery order
    delivered: Vec<Vec<u8>>,
    /// Number of delivery calls
    deliveries: u64,
}

/// In-process validator core
#[derive(Debug, Default)]
pub struct ValidatorCore {
    inbox: RwLock<Inbox>,
    vm: RwLock<VmInbox>,
}

impl ValidatorCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a core whose inbox already holds `messages`
    pub fn with_messages(messages: impl IntoIterator<Item = Vec<u8>>) -> Self {
        let core = Self::new();
        for message in messages {
            core.send_message(message);
        }
        core
    }

    /// Queue a message for the VM
    pub fn send_message(&self, message: Vec<u8>) {
        self.inbox.write().push(message);
    }

    pub fn pending_count(&self) -> usize {
        self.inbox.read().len()
    }

    /// Messages the VM has received so far
    pub fn delivered_messages(&self) -> Vec<Vec<u8>> {
        self.vm.read().delivered.clone()
    }

    /// How many times delivery was requested
    pub fn delivery_count(&self) -> u64 {
        self.vm.read().deliveries
    }

    /// Pending and delivered message counts read under one view
    pub fn message_counts(&self) -> (usize, usize) {
        let inbox = self.inbox.read();
        let vm = self.vm.read();
        (inbox.len(), vm.delivered.len())
    }
}

impl VmCore for ValidatorCore {
    fn inbox_hash(&self) -> Hash {
        self.inbox.read().hash()
    }

    fn deliver_pending_messages_to_vm(&self) {
        // Lock order: inbox, then vm. Both are held so the move is atomic.
        let mut inbox = self.inbox.write();
        let mut vm = self.vm.write();
        let pending = inbox.take();
        vm.deliveries += 1;
        tracing::debug!("Delivering {} inbox messages to VM", pending.len());
        vm.delivered.extend(pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_inbox_hash_chain() {
        let mut a = Inbox::new();
        assert_eq!(a.hash(), Hash::default());

        a.push(b"one".to_vec());
        a.push(b"two".to_vec());

        let mut b = Inbox::new();
        b.push(b"two".to_vec());
        b.push(b"one".to_vec());

        assert_eq!(a.len(), 2);
        assert_ne!(a.hash(), Hash::default());
        assert_ne!(a.hash(), b.hash(), "order must affect the hash");
    }

    #[test]
    fn test_deliver_moves_pending_to_vm() {
        let core = ValidatorCore::with_messages(vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(core.pending_count(), 2);
        let before = core.inbox_hash();

        core.deliver_pending_messages_to_vm();

        assert_eq!(core.pending_count(), 0);
        assert_eq!(core.delivery_count(), 1);
        assert_eq!(core.delivered_messages(), vec![b"a".to_vec(), b"b".to_vec()]);
        assert_ne!(core.inbox_hash(), before);
        assert_eq!(core.inbox_hash(), Hash::default());
    }

    #[test]
    fn test_delivery_is_atomic_for_readers() {
        let core = Arc::new(ValidatorCore::new());
        let total = 64;

        for round in 0..50 {
            for i in 0..total {
                core.send_message(format!("msg-{}-{}", round, i).into_bytes());
            }
            let (pending, delivered) = core.message_counts();
            let expected = pending + delivered;

            let deliverer = {
                let core = core.clone();
                std::thread::spawn(move || core.deliver_pending_messages_to_vm())
            };
            let reader = {
                let core = core.clone();
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let (pending, delivered) = core.message_counts();
                        assert_eq!(pending + delivered, expected);
                    }
                })
            };
            deliverer.join().unwrap();
            reader.join().unwrap();

            assert_eq!(core.message_counts(), (0, expected));
        }
        assert_eq!(core.delivery_count(), 50);
    }
}
