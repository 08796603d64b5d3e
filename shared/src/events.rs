//! Exactly-once replication of discrete events.
//!
//! Discrete events ride the same lossy channel as the snapshot stream, so
//! they are transmitted redundantly for a few consecutive ticks and
//! de-duplicated on receipt by their sender-scoped event id. Duplicates
//! are expected traffic, suppressed silently rather than treated as
//! errors.

use crate::wire::Message;
use log::debug;
use std::collections::HashSet;

#[derive(Debug)]
struct Pending {
    message: Message,
    sends_left: u32,
}

pub struct EventReplicator {
    next_event_id: u64,
    resend_ticks: u32,
    pending: Vec<Pending>,
    seen_remote: HashSet<u64>,
}

impl EventReplicator {
    pub fn new(resend_ticks: u32) -> Self {
        Self {
            next_event_id: 0,
            resend_ticks: resend_ticks.max(1),
            pending: Vec::new(),
            seen_remote: HashSet::new(),
        }
    }

    /// Allocates the next sender-scoped event id. Ids start at 1 and
    /// strictly increase for the lifetime of the session.
    pub fn next_id(&mut self) -> u64 {
        self.next_event_id += 1;
        self.next_event_id
    }

    /// Queues an already locally-applied event for redundant transmission.
    pub fn queue(&mut self, message: Message) {
        self.pending.push(Pending {
            message,
            sends_left: self.resend_ticks,
        });
    }

    /// Marks a remote event id as seen. Returns false if it was already
    /// applied; callers must skip the side effect in that case.
    pub fn accept_remote(&mut self, event_id: u64) -> bool {
        if self.seen_remote.insert(event_id) {
            true
        } else {
            debug!("Duplicate event {} suppressed", event_id);
            false
        }
    }

    /// Messages to transmit this tick. Each queued event appears in the
    /// output of `resend_ticks` consecutive calls, then drops out.
    pub fn drain_sends(&mut self) -> Vec<Message> {
        let mut out = Vec::with_capacity(self.pending.len());
        for pending in &mut self.pending {
            out.push(pending.message.clone());
            pending.sends_left -= 1;
        }
        self.pending.retain(|pending| pending.sends_left > 0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Side;

    fn goal(event_id: u64) -> Message {
        Message::Goal {
            event_id,
            side: Side::Home,
        }
    }

    #[test]
    fn test_ids_are_monotonic_from_one() {
        let mut replicator = EventReplicator::new(3);
        assert_eq!(replicator.next_id(), 1);
        assert_eq!(replicator.next_id(), 2);
        assert_eq!(replicator.next_id(), 3);
    }

    #[test]
    fn test_remote_dedup_is_idempotent() {
        let mut replicator = EventReplicator::new(3);

        assert!(replicator.accept_remote(7));
        assert!(!replicator.accept_remote(7));
        assert!(!replicator.accept_remote(7));
        assert!(replicator.accept_remote(8));
    }

    #[test]
    fn test_queued_event_resent_exactly_n_ticks() {
        let mut replicator = EventReplicator::new(3);
        replicator.queue(goal(1));

        assert_eq!(replicator.drain_sends().len(), 1);
        assert_eq!(replicator.drain_sends().len(), 1);
        assert_eq!(replicator.drain_sends().len(), 1);
        assert!(replicator.drain_sends().is_empty());
    }

    #[test]
    fn test_overlapping_events_interleave() {
        let mut replicator = EventReplicator::new(2);
        replicator.queue(goal(1));

        assert_eq!(replicator.drain_sends().len(), 1);
        replicator.queue(goal(2));
        assert_eq!(replicator.drain_sends().len(), 2);
        assert_eq!(replicator.drain_sends().len(), 1);
        assert!(replicator.drain_sends().is_empty());
    }
}
