//! Wire messages exchanged between nodes and the base station.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::fingerprint::Fingerprint;

/// One slot grant inside a [`Message::Schedule`] broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Member the slot is granted to.
    pub member: Address,
    /// TDMA slot index; doubles as the relative send delay in seconds.
    pub slot: u32,
}

/// Protocol messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// A freshly elected cluster head announcing itself.
    HeadAnnouncement {
        /// The announcing head.
        head: Address,
    },
    /// A member acknowledging the head it currently considers best.
    Ack {
        /// The acknowledging member.
        member: Address,
    },
    /// Full slot table broadcast by a cluster head.
    Schedule {
        /// The head that issued the schedule.
        head: Address,
        /// Slot grants in assignment order.
        entries: Vec<ScheduleEntry>,
    },
    /// Sensor data from a member, sent during its assigned slot.
    Data {
        sender: Address,
        fingerprint: Fingerprint,
        temperature: f64,
        humidity: f64,
    },
    /// Aggregated data relayed from a cluster head to the base station.
    Relay {
        head: Address,
        fingerprint: Fingerprint,
    },
}

impl Message {
    /// The wire tag of this message, for logs and event records.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Message::HeadAnnouncement { .. } => MessageKind::Announcement,
            Message::Ack { .. } => MessageKind::Ack,
            Message::Schedule { .. } => MessageKind::Schedule,
            Message::Data { .. } => MessageKind::Data,
            Message::Relay { .. } => MessageKind::Relay,
        }
    }
}

/// Wire tags for the five message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Announcement,
    Ack,
    Schedule,
    Data,
    Relay,
}

impl MessageKind {
    /// Short label used in event records.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            MessageKind::Announcement => "CTRL",
            MessageKind::Ack => "ACK",
            MessageKind::Schedule => "SCH",
            MessageKind::Data => "DATA",
            MessageKind::Relay => "BS",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels() {
        let msg = Message::HeadAnnouncement {
            head: Address::new(1),
        };
        assert_eq!(msg.kind(), MessageKind::Announcement);
        assert_eq!(msg.kind().to_string(), "CTRL");
        assert_eq!(MessageKind::Relay.label(), "BS");
    }
}
