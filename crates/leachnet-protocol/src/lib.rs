//! LEACH clustering protocol core.
//!
//! Implements the round-based cluster-head election, member association,
//! TDMA slot scheduling, and base-station data relay of the LEACH
//! (Low-Energy Adaptive Clustering Hierarchy) protocol for wireless
//! sensor networks.
//!
//! The crate is scheduler- and transport-agnostic: a [`Node`] consumes
//! timer and message events carrying explicit timestamps and returns
//! [`Command`]s — sends, broadcasts, timer requests — for the hosting
//! harness to execute. Many nodes plus one [`BaseStation`] make up a
//! network; all cross-node interaction happens through [`Message`]s.
//!
//! ```
//! use leachnet_protocol::{
//!     Address, Message, NoEnergy, Node, ProtocolConfig, Timer, Timestamp,
//! };
//!
//! // A share of 1.0 elects every node on its first tick.
//! let config = ProtocolConfig::default().with_cluster_head_share(1.0);
//! let mut node = Node::new(Address::new(1), config, NoEnergy, 42).unwrap();
//!
//! let commands = node.on_timer(Timer::RoundTick, Timestamp::ZERO);
//! assert!(node.role().is_head());
//! assert!(!commands.is_empty());
//! ```

pub mod address;
pub mod association;
pub mod config;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod message;
pub mod node;
pub mod schedule;
pub mod station;
pub mod time;

pub use address::Address;
pub use association::{AssociationEntry, AssociationMemory};
pub use config::ProtocolConfig;
pub use error::{Error, Result};
pub use events::{Direction, EnergyProbe, EventRecord, NoEnergy, NodeCounters};
pub use fingerprint::{Fingerprint, FingerprintLedger};
pub use message::{Message, MessageKind, ScheduleEntry};
pub use node::{election_threshold, Command, Node, Role, Timer};
pub use schedule::{ScheduleCache, SlotTable};
pub use station::BaseStation;
pub use time::{Duration, Timestamp};
