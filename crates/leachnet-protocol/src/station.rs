//! Base-station data aggregation.

use std::collections::BTreeMap;

use tracing::info;

use crate::address::Address;
use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::message::Message;
use crate::time::Timestamp;

/// Terminal sink collecting relayed sensor data from cluster heads.
///
/// The station sits in the same broadcast domain as the nodes, so it also
/// hears announcements and schedules; everything except [`Message::Relay`]
/// is rejected as unsupported and dropped without touching any counter.
#[derive(Debug)]
pub struct BaseStation {
    addr: Address,
    received: u64,
    per_head: BTreeMap<Address, u64>,
    reception_ledger: Vec<Fingerprint>,
    running_counts: Vec<u64>,
}

impl BaseStation {
    /// Create a station listening at `addr`.
    #[must_use]
    pub fn new(addr: Address) -> Self {
        BaseStation {
            addr,
            received: 0,
            per_head: BTreeMap::new(),
            reception_ledger: Vec::new(),
            running_counts: Vec::new(),
        }
    }

    /// The station's address.
    #[must_use]
    pub const fn addr(&self) -> Address {
        self.addr
    }

    /// Handle a delivered message.
    ///
    /// Identical fingerprints arriving in separate relays each count;
    /// the station performs no deduplication.
    pub fn on_message(&mut self, message: &Message, now: Timestamp) -> Result<()> {
        match message {
            Message::Relay { head, fingerprint } => {
                self.received += 1;
                let count = self.per_head.entry(*head).or_insert(0);
                *count += 1;
                self.running_counts.push(*count);
                self.reception_ledger.push(*fingerprint);
                info!(station = %self.addr, head = %head, total = *count, at = %now,
                      %fingerprint, "relay received");
                Ok(())
            }
            other => Err(Error::UnsupportedMessage {
                receiver: self.addr,
                kind: other.kind().label(),
            }),
        }
    }

    /// Total relays received.
    #[must_use]
    pub const fn received(&self) -> u64 {
        self.received
    }

    /// Relays received per cluster head.
    #[must_use]
    pub fn per_head(&self) -> &BTreeMap<Address, u64> {
        &self.per_head
    }

    /// Relays received from one head.
    #[must_use]
    pub fn count_for(&self, head: Address) -> u64 {
        self.per_head.get(&head).copied().unwrap_or(0)
    }

    /// Fingerprints in reception order, duplicates included.
    #[must_use]
    pub fn reception_ledger(&self) -> &[Fingerprint] {
        &self.reception_ledger
    }

    /// The per-head running total sampled at each relay, in reception
    /// order.
    #[must_use]
    pub fn running_counts(&self) -> &[u64] {
        &self.running_counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATION: Address = Address::new(0);
    const HEAD_A: Address = Address::new(1);
    const HEAD_B: Address = Address::new(2);

    fn relay(head: Address, seq: u64) -> Message {
        Message::Relay {
            head,
            fingerprint: Fingerprint::derive(head, Address::new(99), Timestamp::from_millis(seq)),
        }
    }

    #[test]
    fn counts_relays_per_head() {
        let mut station = BaseStation::new(STATION);
        station.on_message(&relay(HEAD_A, 1), Timestamp::ZERO).unwrap();
        station.on_message(&relay(HEAD_A, 2), Timestamp::ZERO).unwrap();
        station.on_message(&relay(HEAD_B, 3), Timestamp::ZERO).unwrap();

        assert_eq!(station.received(), 3);
        assert_eq!(station.count_for(HEAD_A), 2);
        assert_eq!(station.count_for(HEAD_B), 1);
        assert_eq!(station.count_for(Address::new(9)), 0);
        assert_eq!(station.running_counts(), &[1, 2, 1]);
    }

    #[test]
    fn identical_fingerprints_both_count() {
        let mut station = BaseStation::new(STATION);
        let msg = relay(HEAD_A, 1);
        station.on_message(&msg, Timestamp::ZERO).unwrap();
        station.on_message(&msg, Timestamp::ZERO).unwrap();

        assert_eq!(station.received(), 2);
        assert_eq!(station.reception_ledger().len(), 2);
        assert_eq!(
            station.reception_ledger()[0],
            station.reception_ledger()[1]
        );
    }

    #[test]
    fn non_relay_messages_are_unsupported() {
        let mut station = BaseStation::new(STATION);
        let err = station
            .on_message(
                &Message::HeadAnnouncement { head: HEAD_A },
                Timestamp::ZERO,
            )
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedMessage { .. }));
        assert_eq!(station.received(), 0);
        assert!(station.per_head().is_empty());
    }
}
