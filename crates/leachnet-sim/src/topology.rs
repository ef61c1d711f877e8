//! Node placement and the signal model.

use std::collections::BTreeMap;

use leachnet_protocol::{Address, Duration};
use serde::{Deserialize, Serialize};

/// 2-D position of a node, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance(self, other: Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Per-link overrides of the default signal model.
#[derive(Debug, Clone, Copy, Default)]
pub struct Link {
    /// Fixed signal strength, overriding the distance-based default.
    pub signal: Option<f64>,
    /// Fixed propagation delay, overriding the topology default.
    pub delay: Option<Duration>,
    /// Whether the link is severed.
    pub down: bool,
}

impl Link {
    /// Create a link with default properties.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the signal strength on this link.
    #[must_use]
    pub fn with_signal(mut self, signal: f64) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Fix the propagation delay on this link.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sever the link.
    #[must_use]
    pub fn severed(mut self) -> Self {
        self.down = true;
        self
    }
}

/// Placement and link model for a simulated network.
///
/// Everyone can hear everyone by default (one broadcast domain); received
/// signal strength falls off with the square of the distance between the
/// recorded positions. Individual links can pin a strength or delay, or
/// be severed entirely.
#[derive(Debug)]
pub struct Topology {
    positions: BTreeMap<Address, Position>,
    links: BTreeMap<(Address, Address), Link>,
    tx_power: f64,
    default_delay: Duration,
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}

impl Topology {
    /// Create an empty topology.
    #[must_use]
    pub fn new() -> Self {
        Topology {
            positions: BTreeMap::new(),
            links: BTreeMap::new(),
            tx_power: 1.0,
            default_delay: Duration::from_millis(1),
        }
    }

    /// Set the transmit power feeding the distance falloff.
    #[must_use]
    pub fn with_tx_power(mut self, power: f64) -> Self {
        self.tx_power = power;
        self
    }

    /// Set the default propagation delay.
    #[must_use]
    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Record a node's position.
    pub fn place(&mut self, addr: Address, position: Position) {
        self.positions.insert(addr, position);
    }

    /// A node's recorded position.
    #[must_use]
    pub fn position(&self, addr: Address) -> Option<Position> {
        self.positions.get(&addr).copied()
    }

    /// All recorded positions.
    pub fn positions(&self) -> impl Iterator<Item = (Address, Position)> + '_ {
        self.positions.iter().map(|(addr, pos)| (*addr, *pos))
    }

    /// Override properties of the link between two nodes (symmetric).
    pub fn set_link(&mut self, a: Address, b: Address, link: Link) {
        self.links.insert(Self::key(a, b), link);
    }

    /// Whether `a` can currently reach `b`.
    #[must_use]
    pub fn connected(&self, a: Address, b: Address) -> bool {
        self.links
            .get(&Self::key(a, b))
            .map_or(true, |link| !link.down)
    }

    /// Signal strength observed at `to` for a transmission from `from`.
    ///
    /// Unknown positions count as co-located, giving full transmit power.
    #[must_use]
    pub fn signal_strength(&self, from: Address, to: Address) -> f64 {
        if let Some(link) = self.links.get(&Self::key(from, to)) {
            if let Some(signal) = link.signal {
                return signal;
            }
        }
        let distance = match (self.position(from), self.position(to)) {
            (Some(a), Some(b)) => a.distance(b),
            _ => 0.0,
        };
        self.tx_power / (1.0 + distance * distance)
    }

    /// Propagation delay from `from` to `to`.
    #[must_use]
    pub fn delay(&self, from: Address, to: Address) -> Duration {
        self.links
            .get(&Self::key(from, to))
            .and_then(|link| link.delay)
            .unwrap_or(self.default_delay)
    }

    fn key(a: Address, b: Address) -> (Address, Address) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Address = Address::new(1);
    const B: Address = Address::new(2);

    #[test]
    fn distance() {
        let origin = Position::new(0.0, 0.0);
        assert_eq!(origin.distance(Position::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn signal_falls_off_with_distance() {
        let mut topo = Topology::new();
        topo.place(A, Position::new(0.0, 0.0));
        topo.place(B, Position::new(10.0, 0.0));

        let near = topo.signal_strength(A, A);
        let far = topo.signal_strength(A, B);
        assert!(near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn unknown_positions_hear_at_full_power() {
        let topo = Topology::new().with_tx_power(2.0);
        assert_eq!(topo.signal_strength(A, B), 2.0);
    }

    #[test]
    fn link_overrides_signal_and_delay() {
        let mut topo = Topology::new();
        topo.set_link(
            A,
            B,
            Link::new()
                .with_signal(0.42)
                .with_delay(Duration::from_millis(7)),
        );

        assert_eq!(topo.signal_strength(A, B), 0.42);
        assert_eq!(topo.signal_strength(B, A), 0.42);
        assert_eq!(topo.delay(A, B), Duration::from_millis(7));
    }

    #[test]
    fn severed_link_disconnects_both_ways() {
        let mut topo = Topology::new();
        assert!(topo.connected(A, B));
        topo.set_link(A, B, Link::new().severed());
        assert!(!topo.connected(A, B));
        assert!(!topo.connected(B, A));
    }
}
