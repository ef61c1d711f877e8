//! Node addressing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Network address of a sensor node or the base station.
///
/// Addresses are opaque to the protocol; the hosting harness assigns them.
/// [`Address::BROADCAST`] is reserved as the all-nodes destination and as
/// the fallback target when a node knows no cluster head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(u32);

impl Address {
    /// Reserved all-nodes destination.
    pub const BROADCAST: Address = Address(u32::MAX);

    /// Create an address from a raw value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Address(raw)
    }

    /// The raw address value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this is the broadcast sentinel.
    #[must_use]
    pub const fn is_broadcast(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_broadcast() {
            write!(f, "broadcast")
        } else {
            write!(f, "node-{}", self.0)
        }
    }
}

impl From<u32> for Address {
    fn from(raw: u32) -> Self {
        Address(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_sentinel() {
        assert!(Address::BROADCAST.is_broadcast());
        assert!(!Address::new(0).is_broadcast());
        assert!(!Address::new(17).is_broadcast());
    }

    #[test]
    fn display() {
        assert_eq!(Address::new(3).to_string(), "node-3");
        assert_eq!(Address::BROADCAST.to_string(), "broadcast");
    }
}
