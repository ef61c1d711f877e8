//! Run metrics and summaries.

use leachnet_protocol::{Address, EventRecord, NodeCounters, Timestamp};
use serde::Serialize;

/// Metrics collected while a simulation runs.
///
/// The cluster-head tally lives here, owned by the run, rather than in
/// any node or process-wide state.
#[derive(Debug, Default)]
pub struct SimMetrics {
    /// Transmissions initiated (a broadcast counts once).
    pub messages_sent: u64,
    /// Individual deliveries completed.
    pub messages_delivered: u64,
    /// Deliveries dropped: severed links or unknown receivers.
    pub messages_dropped: u64,
    /// Timer events delivered.
    pub timer_fires: u64,
    /// Timer events discarded because the owning node had stopped.
    pub timers_canceled: u64,
    /// Promotions to cluster head across the whole run.
    pub ch_elections: u64,
    /// Protocol event records drained from all nodes, in processing order.
    pub event_log: Vec<EventRecord>,
}

/// Per-node summary in a [`SimulationResult`].
#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub addr: Address,
    /// Times the node served as cluster head.
    pub weight: u32,
    pub counters: NodeCounters,
}

/// Base-station summary in a [`SimulationResult`].
#[derive(Debug, Clone, Serialize)]
pub struct StationSummary {
    pub addr: Address,
    /// Total relays received.
    pub received: u64,
    /// Relays received per cluster head.
    pub per_head: Vec<(Address, u64)>,
}

/// Final summary of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    /// Simulated time when the run ended.
    pub ended_at: Timestamp,
    pub ch_elections: u64,
    pub messages_sent: u64,
    pub messages_delivered: u64,
    pub messages_dropped: u64,
    pub timer_fires: u64,
    pub timers_canceled: u64,
    /// Number of protocol event records collected.
    pub events_logged: usize,
    pub nodes: Vec<NodeSummary>,
    pub station: Option<StationSummary>,
}

impl SimulationResult {
    /// Summary for one node, if it took part in the run.
    #[must_use]
    pub fn node(&self, addr: Address) -> Option<&NodeSummary> {
        self.nodes.iter().find(|summary| summary.addr == addr)
    }

    /// Total data messages sent by all nodes.
    #[must_use]
    pub fn total_data_sent(&self) -> u64 {
        self.nodes.iter().map(|n| n.counters.data_sent).sum()
    }

    /// Total relays forwarded by all nodes.
    #[must_use]
    pub fn total_relays_sent(&self) -> u64 {
        self.nodes.iter().map(|n| n.counters.relays_sent).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_totals_sum_over_nodes() {
        let counters_a = NodeCounters {
            data_sent: 3,
            relays_sent: 1,
            ..NodeCounters::default()
        };
        let counters_b = NodeCounters {
            data_sent: 2,
            relays_sent: 4,
            ..NodeCounters::default()
        };
        let result = SimulationResult {
            ended_at: Timestamp::from_secs(60),
            ch_elections: 2,
            messages_sent: 0,
            messages_delivered: 0,
            messages_dropped: 0,
            timer_fires: 0,
            timers_canceled: 0,
            events_logged: 0,
            nodes: vec![
                NodeSummary {
                    addr: Address::new(1),
                    weight: 1,
                    counters: counters_a,
                },
                NodeSummary {
                    addr: Address::new(2),
                    weight: 1,
                    counters: counters_b,
                },
            ],
            station: None,
        };

        assert_eq!(result.total_data_sent(), 5);
        assert_eq!(result.total_relays_sent(), 5);
        assert!(result.node(Address::new(2)).is_some());
        assert!(result.node(Address::new(9)).is_none());
    }
}
