//! Cluster-head association memory.

use crate::address::Address;

/// One cluster head heard this election cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssociationEntry {
    /// The node that heard the announcement.
    pub member: Address,
    /// The announcing head.
    pub head: Address,
    /// Signal strength observed on the first announcement from this head.
    pub signal: f64,
}

/// Per-node table of cluster heads heard this cycle.
///
/// At most one entry per head: the first announcement heard for a given
/// head wins and later ones are dropped, so the recorded signal strength
/// is the one observed first. Cleared at every election cycle boundary.
#[derive(Debug, Default)]
pub struct AssociationMemory {
    entries: Vec<AssociationEntry>,
}

impl AssociationMemory {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a head heard by `member`, unless that head is already known
    /// this cycle. Returns whether an entry was inserted.
    pub fn record(&mut self, member: Address, head: Address, signal: f64) -> bool {
        if self.contains_head(head) {
            return false;
        }
        self.entries.push(AssociationEntry {
            member,
            head,
            signal,
        });
        true
    }

    /// Whether the head was already heard this cycle.
    #[must_use]
    pub fn contains_head(&self, head: Address) -> bool {
        self.entries.iter().any(|entry| entry.head == head)
    }

    /// The head with the strongest observed signal, if any was heard.
    ///
    /// Ties keep the earliest entry.
    #[must_use]
    pub fn ideal_head(&self) -> Option<Address> {
        let mut best_signal = -1.0;
        let mut best = None;
        for entry in &self.entries {
            if entry.signal > best_signal {
                best_signal = entry.signal;
                best = Some(entry.head);
            }
        }
        best
    }

    /// Entries in the order they were heard.
    #[must_use]
    pub fn entries(&self) -> &[AssociationEntry] {
        &self.entries
    }

    /// Number of distinct heads heard.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no head has been heard this cycle.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything; called at the cycle boundary.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
