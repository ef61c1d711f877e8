//! Data fingerprints and the per-node send ledger.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::time::Timestamp;

/// Opaque tag identifying one sensor data item.
///
/// Derived from the destination head, the sending member, and the send
/// time; used both as an integrity tag on the wire and as the key stored
/// in the sender's [`FingerprintLedger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Derive the fingerprint for a data item.
    #[must_use]
    pub fn derive(head: Address, sender: Address, at: Timestamp) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&head.raw().to_be_bytes());
        hasher.update(&sender.raw().to_be_bytes());
        hasher.update(&at.as_millis().to_be_bytes());
        Fingerprint(*hasher.finalize().as_bytes())
    }

    /// The raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short prefix is enough to tell fingerprints apart in logs.
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

/// Append-only ledger of fingerprints this node has generated.
///
/// Inbound data is checked against this ledger. Since it only ever holds
/// locally generated fingerprints, the check passes for replayed or
/// self-delivered items and for nothing else; the ledger is never cleared
/// for the lifetime of the node.
#[derive(Debug, Default)]
pub struct FingerprintLedger {
    entries: Vec<Fingerprint>,
}

impl FingerprintLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fingerprint. Duplicates are kept.
    pub fn record(&mut self, fingerprint: Fingerprint) {
        self.entries.push(fingerprint);
    }

    /// Whether the fingerprint was generated by this node.
    #[must_use]
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains(fingerprint)
    }

    /// Number of recorded fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All recorded fingerprints, in generation order.
    pub fn iter(&self) -> impl Iterator<Item = &Fingerprint> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic() {
        let a = Fingerprint::derive(Address::new(1), Address::new(2), Timestamp::from_secs(5));
        let b = Fingerprint::derive(Address::new(1), Address::new(2), Timestamp::from_secs(5));
        assert_eq!(a, b);
    }

    #[test]
    fn derive_varies_with_each_input() {
        let base = Fingerprint::derive(Address::new(1), Address::new(2), Timestamp::from_secs(5));
        let other_head =
            Fingerprint::derive(Address::new(9), Address::new(2), Timestamp::from_secs(5));
        let other_sender =
            Fingerprint::derive(Address::new(1), Address::new(9), Timestamp::from_secs(5));
        let other_time =
            Fingerprint::derive(Address::new(1), Address::new(2), Timestamp::from_secs(6));
        assert_ne!(base, other_head);
        assert_ne!(base, other_sender);
        assert_ne!(base, other_time);
    }

    #[test]
    fn ledger_tracks_own_fingerprints() {
        let mut ledger = FingerprintLedger::new();
        let own = Fingerprint::derive(Address::new(1), Address::new(2), Timestamp::ZERO);
        let foreign = Fingerprint::derive(Address::new(3), Address::new(4), Timestamp::ZERO);

        ledger.record(own);
        assert!(ledger.contains(&own));
        assert!(!ledger.contains(&foreign));
    }

    #[test]
    fn ledger_keeps_duplicates() {
        let mut ledger = FingerprintLedger::new();
        let fp = Fingerprint::derive(Address::new(1), Address::new(2), Timestamp::ZERO);
        ledger.record(fp);
        ledger.record(fp);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn display_is_short_hex() {
        let fp = Fingerprint::derive(Address::new(1), Address::new(2), Timestamp::ZERO);
        assert_eq!(fp.to_string().len(), 16);
    }
}
