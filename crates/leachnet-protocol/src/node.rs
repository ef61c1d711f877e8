//! The LEACH node state machine.
//!
//! A node cycles through election rounds driven by an external timer. Each
//! round it may promote itself to cluster head with a probability that
//! grows over the election cycle, announce itself, collect member
//! acknowledgments into TDMA slots, and relay received sensor data to the
//! base station. Handlers run to completion and return [`Command`]s for
//! the hosting harness to execute; the core performs no I/O of its own.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::address::Address;
use crate::association::AssociationMemory;
use crate::config::ProtocolConfig;
use crate::error::Result;
use crate::events::{Direction, EnergyProbe, EventRecord, NoEnergy, NodeCounters};
use crate::fingerprint::{Fingerprint, FingerprintLedger};
use crate::message::{Message, MessageKind, ScheduleEntry};
use crate::schedule::{ScheduleCache, SlotTable};
use crate::time::{Duration, Timestamp};

/// Current protocol role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Ordinary member node.
    Nch,
    /// Cluster head since the given time.
    Ch {
        /// When the head term began.
        since: Timestamp,
    },
}

impl Role {
    /// Whether the node currently serves as cluster head.
    #[must_use]
    pub const fn is_head(self) -> bool {
        matches!(self, Role::Ch { .. })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Nch => f.write_str("nch"),
            Role::Ch { .. } => f.write_str("ch"),
        }
    }
}

/// Timers a node asks the scheduler to deliver back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// Periodic election round tick.
    RoundTick,
    /// A granted TDMA slot came due; send sensor data.
    DataSlot,
}

/// Side effects a handler wants the harness to perform.
///
/// Handlers never call back into the scheduler or transport; they return
/// the sends and timer requests for the harness to execute, which keeps
/// the core deterministic and single-threaded.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Deliver to every reachable node and station.
    Broadcast(Message),
    /// Deliver to one address after `delay`. A broadcast destination is
    /// fanned out by the transport.
    Send {
        to: Address,
        message: Message,
        delay: Duration,
    },
    /// Deliver `timer` back to this node after `delay`.
    StartTimer { timer: Timer, delay: Duration },
}

/// Election threshold for the given round within its cycle.
///
/// Grows as the cycle progresses so nodes that have not served yet become
/// increasingly likely to be drawn; reaches 1 or above in the final
/// sub-intervals, at which point any draw qualifies. The denominator stays
/// positive because `round mod ceil(1/share)` never reaches `1/share`.
#[must_use]
pub fn election_threshold(share: f64, round: u32) -> f64 {
    let cycle = (1.0 / share).ceil() as u32;
    share / (1.0 - share * f64::from(round % cycle))
}

/// A LEACH protocol node.
pub struct Node<P = NoEnergy> {
    addr: Address,
    config: ProtocolConfig,
    role: Role,
    round: u32,
    weight: u32,
    was_ch: bool,
    round_start: Timestamp,
    threshold: f64,
    association: AssociationMemory,
    slots: SlotTable,
    schedule_cache: ScheduleCache,
    ledger: FingerprintLedger,
    counters: NodeCounters,
    events: Vec<EventRecord>,
    probe: P,
    rng: StdRng,
    running: bool,
}

impl<P: EnergyProbe> Node<P> {
    /// Create a node with the given identity, configuration, energy probe,
    /// and RNG seed.
    pub fn new(addr: Address, config: ProtocolConfig, probe: P, seed: u64) -> Result<Self> {
        config.validate()?;
        let schedule_cache = ScheduleCache::new(config.dedup_schedule_cache);
        Ok(Node {
            addr,
            config,
            role: Role::Nch,
            round: 0,
            weight: 0,
            was_ch: false,
            round_start: Timestamp::ZERO,
            threshold: 0.0,
            association: AssociationMemory::new(),
            slots: SlotTable::new(),
            schedule_cache,
            ledger: FingerprintLedger::new(),
            counters: NodeCounters::default(),
            events: Vec::new(),
            probe,
            rng: StdRng::seed_from_u64(seed),
            running: false,
        })
    }

    /// This node's address.
    #[must_use]
    pub const fn addr(&self) -> Address {
        self.addr
    }

    /// Current role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Rounds ticked so far.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Times this node has been elected cluster head.
    #[must_use]
    pub const fn weight(&self) -> u32 {
        self.weight
    }

    /// Whether this node already served as head in the current cycle.
    #[must_use]
    pub const fn was_head_this_cycle(&self) -> bool {
        self.was_ch
    }

    /// Threshold computed for the most recent election.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Protocol counters.
    #[must_use]
    pub const fn counters(&self) -> NodeCounters {
        self.counters
    }

    /// Heads heard this cycle.
    #[must_use]
    pub fn association(&self) -> &AssociationMemory {
        &self.association
    }

    /// Slots granted while serving as head.
    #[must_use]
    pub fn slot_table(&self) -> &SlotTable {
        &self.slots
    }

    /// Cached schedule broadcasts.
    #[must_use]
    pub fn schedule_cache(&self) -> &ScheduleCache {
        &self.schedule_cache
    }

    /// Fingerprints generated by this node.
    #[must_use]
    pub fn ledger(&self) -> &FingerprintLedger {
        &self.ledger
    }

    /// Whether the protocol instance is started.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Drain buffered event records.
    pub fn take_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }

    /// Start the protocol instance.
    ///
    /// Schedules the first round tick at a random offset within the
    /// configured start variance so nodes do not tick in lockstep.
    pub fn start(&mut self, now: Timestamp) -> Vec<Command> {
        self.running = true;
        let bound = self.config.max_start_variance.as_millis();
        let jitter = Duration::from_millis(self.rng.gen_range(0..=bound));
        debug!(node = %self.addr, at = %(now + jitter), "protocol started");
        vec![Command::StartTimer {
            timer: Timer::RoundTick,
            delay: jitter,
        }]
    }

    /// Stop the protocol instance.
    ///
    /// Pending timers are dropped by the harness once the instance is
    /// stopped; tables reset and the node returns to member role.
    pub fn stop(&mut self) {
        self.running = false;
        self.association.clear();
        self.slots.clear();
        self.schedule_cache.clear();
        self.set_role(Role::Nch);
        debug!(node = %self.addr, "protocol stopped");
    }

    /// Handle a timer delivered by the scheduler.
    pub fn on_timer(&mut self, timer: Timer, now: Timestamp) -> Vec<Command> {
        match timer {
            Timer::RoundTick => self.on_round_tick(now),
            Timer::DataSlot => self.on_data_slot(now),
        }
    }

    /// Handle a message delivered by the transport, along with the signal
    /// strength the radio observed for it.
    pub fn on_message(&mut self, message: Message, signal: f64, now: Timestamp) -> Vec<Command> {
        match message {
            Message::HeadAnnouncement { head } => self.on_announcement(head, signal, now),
            Message::Ack { member } => self.on_ack(member, now),
            Message::Schedule { head, entries } => self.on_schedule(head, &entries, now),
            Message::Data {
                sender,
                fingerprint,
                ..
            } => self.on_data(sender, fingerprint, now),
            Message::Relay { .. } => {
                // Station-bound; a node that hears one drops it.
                trace!(node = %self.addr, "dropping station-bound relay");
                Vec::new()
            }
        }
    }

    fn on_round_tick(&mut self, now: Timestamp) -> Vec<Command> {
        let mut out = Vec::new();

        // Two separate demotion guards, evaluated in this order: first the
        // expired head term, then the election tick hitting a still-active
        // head.
        self.apply_term_timeout(now);
        self.apply_election_reset();

        let draw: f64 = self.rng.gen_range(0.0..1.0);
        self.threshold = election_threshold(self.config.cluster_head_share, self.round);

        if draw < self.threshold && !self.was_ch {
            self.weight += 1;
            self.set_role(Role::Ch { since: now });
            self.was_ch = true;
            out.extend(self.announce(now));
        }

        self.round += 1;
        if self.round % self.config.cycle_length() == 0 {
            trace!(node = %self.addr, round = self.round, "cycle boundary, clearing election state");
            self.was_ch = false;
            self.association.clear();
            self.slots.clear();
            self.schedule_cache.clear();
        }

        self.round_start = now;
        out.push(Command::StartTimer {
            timer: Timer::RoundTick,
            delay: self.config.round_duration,
        });
        out
    }

    /// Demote a head whose term has run out. Returns whether it fired.
    fn apply_term_timeout(&mut self, now: Timestamp) -> bool {
        if self.role.is_head() && now >= self.round_start + self.config.round_duration {
            debug!(node = %self.addr, "head term timed out, reverting to member");
            self.set_role(Role::Nch);
            return true;
        }
        false
    }

    /// Demote a head hit by the election tick itself. Returns whether it
    /// fired.
    fn apply_election_reset(&mut self) -> bool {
        if self.role.is_head() {
            debug!(node = %self.addr, "election tick while head, reverting to member");
            self.set_role(Role::Nch);
            return true;
        }
        false
    }

    fn announce(&mut self, now: Timestamp) -> Vec<Command> {
        debug!(node = %self.addr, weight = self.weight, threshold = self.threshold,
               "announcing cluster-head role");
        self.counters.control_sent += 1;
        self.log_event(
            now,
            self.addr,
            Address::BROADCAST,
            MessageKind::Announcement,
            Direction::Sent,
        );
        vec![Command::Broadcast(Message::HeadAnnouncement {
            head: self.addr,
        })]
    }

    fn on_announcement(&mut self, head: Address, signal: f64, now: Timestamp) -> Vec<Command> {
        self.counters.control_received += 1;
        self.log_event(now, head, self.addr, MessageKind::Announcement, Direction::Received);

        if self.association.record(self.addr, head, signal) {
            trace!(node = %self.addr, %head, signal, "recorded cluster head");
        }

        // Acknowledge whichever head currently looks best, which is not
        // necessarily the one that just announced.
        let target = self.ideal_head();
        self.log_event(now, self.addr, target, MessageKind::Ack, Direction::Sent);
        vec![Command::Send {
            to: target,
            message: Message::Ack { member: self.addr },
            delay: Duration::ZERO,
        }]
    }

    fn on_ack(&mut self, member: Address, now: Timestamp) -> Vec<Command> {
        if !self.role.is_head() {
            trace!(node = %self.addr, %member, "ack while not head, ignoring");
            return Vec::new();
        }
        self.log_event(now, member, self.addr, MessageKind::Ack, Direction::Received);

        if let Some(slot) = self.slots.assign(member) {
            debug!(node = %self.addr, %member, slot, "granted TDMA slot");
        }

        // Every ack processed while the table is non-empty triggers a
        // fresh full-table rebroadcast.
        if self.slots.is_empty() {
            return Vec::new();
        }
        self.log_event(
            now,
            self.addr,
            Address::BROADCAST,
            MessageKind::Schedule,
            Direction::Sent,
        );
        vec![Command::Broadcast(Message::Schedule {
            head: self.addr,
            entries: self.slots.entries().to_vec(),
        })]
    }

    fn on_schedule(&mut self, head: Address, entries: &[ScheduleEntry], now: Timestamp) -> Vec<Command> {
        self.log_event(now, head, self.addr, MessageKind::Schedule, Direction::Received);
        self.schedule_cache.extend(entries);

        match self.schedule_cache.slot_for(self.addr) {
            Some(slot) => {
                trace!(node = %self.addr, slot, "slot granted, scheduling data send");
                vec![Command::StartTimer {
                    timer: Timer::DataSlot,
                    delay: Duration::from_secs(u64::from(slot)),
                }]
            }
            None => Vec::new(),
        }
    }

    fn on_data_slot(&mut self, now: Timestamp) -> Vec<Command> {
        let target = self.ideal_head();
        let temperature: f64 = self.rng.gen_range(0.0..1.0);
        let humidity: f64 = self.rng.gen_range(0.0..1.0);
        let fingerprint = Fingerprint::derive(target, self.addr, now);
        self.ledger.record(fingerprint);

        self.counters.data_sent += 1;
        self.log_event(now, self.addr, target, MessageKind::Data, Direction::Sent);
        vec![Command::Send {
            to: target,
            message: Message::Data {
                sender: self.addr,
                fingerprint,
                temperature,
                humidity,
            },
            delay: Duration::ZERO,
        }]
    }

    fn on_data(&mut self, sender: Address, fingerprint: Fingerprint, now: Timestamp) -> Vec<Command> {
        self.log_event(now, sender, self.addr, MessageKind::Data, Direction::Received);

        // The ledger holds fingerprints this node generated itself, so
        // this check passes only for replayed or self-delivered items.
        if self.ledger.contains(&fingerprint) {
            self.counters.data_received_verified += 1;
        }
        self.counters.data_received += 1;

        self.counters.relays_sent += 1;
        let relay = Command::Send {
            to: self.config.base_station,
            message: Message::Relay {
                head: self.addr,
                fingerprint,
            },
            delay: Duration::ZERO,
        };

        // A head's term ends with its first relayed item.
        self.set_role(Role::Nch);
        vec![relay]
    }

    /// The best-known head, falling back to broadcast when none was heard
    /// this cycle.
    fn ideal_head(&self) -> Address {
        match self.association.ideal_head() {
            Some(head) => head,
            None => {
                warn!(node = %self.addr, "no cluster head recorded, falling back to broadcast");
                Address::BROADCAST
            }
        }
    }

    fn set_role(&mut self, role: Role) {
        if role != self.role {
            debug!(node = %self.addr, from = %self.role, to = %role, "role transition");
        }
        self.role = role;
    }

    fn log_event(
        &mut self,
        time: Timestamp,
        src: Address,
        dst: Address,
        kind: MessageKind,
        direction: Direction,
    ) {
        let residual_energy = match self.probe.residual_energy() {
            Ok(energy) => energy,
            Err(err) => {
                warn!(node = %self.addr, %err, "energy probe failed, recording zero");
                0.0
            }
        };
        self.events.push(EventRecord {
            time,
            src,
            dst,
            kind,
            direction,
            residual_energy,
            role: self.role,
        });
    }
}
