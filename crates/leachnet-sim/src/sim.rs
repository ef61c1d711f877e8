//! Discrete-event simulation engine.
//!
//! Executes one event at a time in (time, sequence) order: timer fires go
//! to the owning node, deliveries go to a node or the base station, and
//! the commands each handler returns become new events. Nothing runs
//! concurrently; determinism follows from the seeded node RNGs and the
//! FIFO tie-break.

use std::collections::{BTreeMap, BinaryHeap};

use leachnet_protocol::{
    Address, BaseStation, Command, Duration, Error, Message, ProtocolConfig, Result, Timestamp,
};
use tracing::{debug, trace, warn};

use crate::event::{ScheduledEvent, SimEvent};
use crate::metrics::{NodeSummary, SimMetrics, SimulationResult, StationSummary};
use crate::node::SimNode;
use crate::topology::Topology;

/// Discrete-event simulator for a leachnet network.
pub struct Simulator {
    nodes: BTreeMap<Address, SimNode>,
    station: Option<BaseStation>,
    topology: Topology,
    queue: BinaryHeap<ScheduledEvent>,
    now: Timestamp,
    next_seq: u64,
    metrics: SimMetrics,
    config: ProtocolConfig,
    seed: u64,
}

impl Simulator {
    /// Create a simulator. All nodes added later share `config`; `seed`
    /// derives each node's RNG seed.
    pub fn new(config: ProtocolConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Simulator {
            nodes: BTreeMap::new(),
            station: None,
            topology: Topology::new(),
            queue: BinaryHeap::new(),
            now: Timestamp::ZERO,
            next_seq: 0,
            metrics: SimMetrics::default(),
            config,
            seed,
        })
    }

    /// Replace the topology.
    #[must_use]
    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    /// The topology.
    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The topology, mutably, for placement and link changes mid-run.
    pub fn topology_mut(&mut self) -> &mut Topology {
        &mut self.topology
    }

    /// Register a node.
    pub fn add_node(&mut self, addr: Address) -> Result<()> {
        if self.nodes.contains_key(&addr) || self.station.as_ref().is_some_and(|s| s.addr() == addr)
        {
            return Err(Error::DuplicateAddress(addr));
        }
        let node_seed = self.seed.wrapping_add(u64::from(addr.raw()).wrapping_mul(0x9E37_79B9));
        let node = SimNode::new(addr, self.config.clone(), node_seed)?;
        self.nodes.insert(addr, node);
        Ok(())
    }

    /// Register the base station at the address the shared config names.
    pub fn add_station(&mut self) -> Result<()> {
        let addr = self.config.base_station;
        if self.nodes.contains_key(&addr) || self.station.is_some() {
            return Err(Error::DuplicateAddress(addr));
        }
        self.station = Some(BaseStation::new(addr));
        Ok(())
    }

    /// Start every registered node, scheduling each first round tick.
    pub fn start(&mut self) {
        let addrs: Vec<Address> = self.nodes.keys().copied().collect();
        for addr in addrs {
            if let Some(node) = self.nodes.get_mut(&addr) {
                let commands = node.inner_mut().start(self.now);
                self.execute(addr, commands);
            }
        }
    }

    /// Stop every node. Their pending timers are discarded as they fire.
    pub fn stop(&mut self) {
        for node in self.nodes.values_mut() {
            node.inner_mut().stop();
        }
    }

    /// Current simulated time.
    #[must_use]
    pub const fn now(&self) -> Timestamp {
        self.now
    }

    /// Whether no further events are queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Metrics collected so far.
    #[must_use]
    pub fn metrics(&self) -> &SimMetrics {
        &self.metrics
    }

    /// A registered node.
    #[must_use]
    pub fn node(&self, addr: Address) -> Option<&SimNode> {
        self.nodes.get(&addr)
    }

    /// A registered node, mutably.
    pub fn node_mut(&mut self, addr: Address) -> Option<&mut SimNode> {
        self.nodes.get_mut(&addr)
    }

    /// The base station, if registered.
    #[must_use]
    pub fn station(&self) -> Option<&BaseStation> {
        self.station.as_ref()
    }

    /// Process the next queued event. Returns false when the queue is
    /// empty.
    pub fn step(&mut self) -> bool {
        let Some(scheduled) = self.queue.pop() else {
            return false;
        };
        self.now = scheduled.time;
        self.dispatch(scheduled.event);
        true
    }

    /// Run until no queued event is due at or before `deadline`, then
    /// advance the clock to it.
    pub fn run_until(&mut self, deadline: Timestamp) {
        while let Some(next) = self.queue.peek() {
            if next.time > deadline {
                break;
            }
            self.step();
        }
        if deadline > self.now {
            self.now = deadline;
        }
    }

    /// Run for a span of simulated time.
    pub fn run_for(&mut self, span: Duration) {
        let deadline = self.now + span;
        self.run_until(deadline);
    }

    /// Consume the simulator and produce the final summary.
    pub fn finish(mut self) -> SimulationResult {
        for node in self.nodes.values_mut() {
            let events = node.take_events();
            self.metrics.event_log.extend(events);
        }
        let nodes = self
            .nodes
            .values()
            .map(|node| NodeSummary {
                addr: node.addr(),
                weight: node.inner().weight(),
                counters: node.counters(),
            })
            .collect();
        let station = self.station.as_ref().map(|station| StationSummary {
            addr: station.addr(),
            received: station.received(),
            per_head: station
                .per_head()
                .iter()
                .map(|(addr, count)| (*addr, *count))
                .collect(),
        });
        SimulationResult {
            ended_at: self.now,
            ch_elections: self.metrics.ch_elections,
            messages_sent: self.metrics.messages_sent,
            messages_delivered: self.metrics.messages_delivered,
            messages_dropped: self.metrics.messages_dropped,
            timer_fires: self.metrics.timer_fires,
            timers_canceled: self.metrics.timers_canceled,
            events_logged: self.metrics.event_log.len(),
            nodes,
            station,
        }
    }

    fn dispatch(&mut self, event: SimEvent) {
        match event {
            SimEvent::Timer { node: addr, timer } => {
                let Some(node) = self.nodes.get_mut(&addr) else {
                    warn!(%addr, "timer for unregistered node");
                    return;
                };
                if !node.inner().is_running() {
                    trace!(%addr, "discarding timer for stopped node");
                    self.metrics.timers_canceled += 1;
                    return;
                }
                let weight_before = node.inner().weight();
                let commands = node.inner_mut().on_timer(timer, self.now);
                let events = node.take_events();
                let weight_after = node.inner().weight();

                self.metrics.timer_fires += 1;
                self.metrics.ch_elections += u64::from(weight_after - weight_before);
                self.metrics.event_log.extend(events);
                self.execute(addr, commands);
            }
            SimEvent::Deliver { to, from, message } => {
                if self.station.as_ref().is_some_and(|s| s.addr() == to) {
                    self.metrics.messages_delivered += 1;
                    if let Some(station) = self.station.as_mut() {
                        if let Err(err) = station.on_message(&message, self.now) {
                            debug!(%err, "station dropped message");
                        }
                    }
                    return;
                }
                let signal = self.topology.signal_strength(from, to);
                let Some(node) = self.nodes.get_mut(&to) else {
                    warn!(err = %Error::UnknownAddress(to), "dropping delivery");
                    self.metrics.messages_dropped += 1;
                    return;
                };
                let commands = node.inner_mut().on_message(message, signal, self.now);
                let events = node.take_events();

                self.metrics.messages_delivered += 1;
                self.metrics.event_log.extend(events);
                self.execute(to, commands);
            }
        }
    }

    fn execute(&mut self, origin: Address, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Broadcast(message) => {
                    self.broadcast(origin, message, Duration::ZERO);
                }
                Command::Send { to, message, delay } => {
                    if to.is_broadcast() {
                        // The fallback target for nodes that know no head.
                        self.broadcast(origin, message, delay);
                    } else {
                        self.metrics.messages_sent += 1;
                        self.unicast(origin, to, message, delay);
                    }
                }
                Command::StartTimer { timer, delay } => {
                    let at = self.now + delay;
                    self.schedule(at, SimEvent::Timer {
                        node: origin,
                        timer,
                    });
                }
            }
        }
    }

    fn unicast(&mut self, from: Address, to: Address, message: Message, delay: Duration) {
        if !self.topology.connected(from, to) {
            trace!(%from, %to, "link severed, dropping");
            self.metrics.messages_dropped += 1;
            return;
        }
        let at = self.now + delay + self.topology.delay(from, to);
        self.schedule(at, SimEvent::Deliver { to, from, message });
    }

    fn broadcast(&mut self, origin: Address, message: Message, delay: Duration) {
        self.metrics.messages_sent += 1;
        let mut targets: Vec<Address> = self
            .nodes
            .keys()
            .copied()
            .filter(|addr| *addr != origin)
            .collect();
        if let Some(station) = &self.station {
            if station.addr() != origin {
                targets.push(station.addr());
            }
        }
        for to in targets {
            if !self.topology.connected(origin, to) {
                self.metrics.messages_dropped += 1;
                continue;
            }
            let at = self.now + delay + self.topology.delay(origin, to);
            self.schedule(at, SimEvent::Deliver {
                to,
                from: origin,
                message: message.clone(),
            });
        }
    }

    fn schedule(&mut self, at: Timestamp, event: SimEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(ScheduledEvent::new(at, seq, event));
    }
}
