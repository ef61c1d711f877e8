//! TDMA slot assignment and distribution.

use crate::address::Address;
use crate::message::ScheduleEntry;

/// Cluster-head side slot table, grown as member acknowledgments arrive.
///
/// The first acknowledgment from a member wins; slot indices come from a
/// counter that starts at 1 each cycle and never reuses a value, so for N
/// distinct members the table holds exactly the slots `1..=N` in arrival
/// order.
#[derive(Debug, Default)]
pub struct SlotTable {
    entries: Vec<ScheduleEntry>,
    next_slot: u32,
}

impl SlotTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        SlotTable {
            entries: Vec::new(),
            next_slot: 1,
        }
    }

    /// Grant the next slot to `member` unless it already holds one.
    /// Returns the granted slot index, or `None` for a repeat member.
    pub fn assign(&mut self, member: Address) -> Option<u32> {
        if self.contains(member) {
            return None;
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        self.entries.push(ScheduleEntry { member, slot });
        Some(slot)
    }

    /// Whether the member already holds a slot.
    #[must_use]
    pub fn contains(&self, member: Address) -> bool {
        self.entries.iter().any(|entry| entry.member == member)
    }

    /// All grants, in assignment order.
    #[must_use]
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// Number of granted slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no slot has been granted this cycle.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all grants and restart the slot counter at 1.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_slot = 1;
    }
}

/// Member-side cache of received schedule broadcasts.
///
/// Baseline behavior appends every received entry, so repeated broadcasts
/// grow the cache and lookups return the first match. With `dedup`
/// enabled, entries for members already cached are skipped instead; the
/// default is off to match the wire behavior peers expect.
#[derive(Debug)]
pub struct ScheduleCache {
    entries: Vec<ScheduleEntry>,
    dedup: bool,
}

impl ScheduleCache {
    /// Create an empty cache with the given dedup policy.
    #[must_use]
    pub fn new(dedup: bool) -> Self {
        ScheduleCache {
            entries: Vec::new(),
            dedup,
        }
    }

    /// Append entries from a received schedule broadcast.
    pub fn extend(&mut self, incoming: &[ScheduleEntry]) {
        for entry in incoming {
            if self.dedup && self.entries.iter().any(|e| e.member == entry.member) {
                continue;
            }
            self.entries.push(*entry);
        }
    }

    /// The first cached slot for `member`, if any.
    #[must_use]
    pub fn slot_for(&self, member: Address) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.member == member)
            .map(|entry| entry.slot)
    }

    /// Number of cached entries, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all cached entries; called at the cycle boundary.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
