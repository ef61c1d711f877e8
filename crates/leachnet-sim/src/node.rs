//! Simulated node wrapper.

use std::cell::Cell;
use std::rc::Rc;

use leachnet_protocol::{
    Address, EnergyProbe, EventRecord, Node, NodeCounters, ProtocolConfig, Result, Role,
};

/// Energy probe backed by a shared per-node energy cell.
///
/// The simulation owns the cell and can adjust the value between events;
/// the protocol reads it when appending event records.
#[derive(Debug, Clone)]
pub struct SimEnergyProbe {
    cell: Rc<Cell<f64>>,
}

impl EnergyProbe for SimEnergyProbe {
    fn residual_energy(&self) -> Result<f64> {
        Ok(self.cell.get())
    }
}

/// A protocol node embedded in the simulation.
pub struct SimNode {
    inner: Node<SimEnergyProbe>,
    energy: Rc<Cell<f64>>,
}

impl SimNode {
    /// Default initial energy, in joules.
    pub const DEFAULT_ENERGY: f64 = 10.0;

    /// Create a node with the given identity, configuration, and seed.
    pub fn new(addr: Address, config: ProtocolConfig, seed: u64) -> Result<Self> {
        let energy = Rc::new(Cell::new(Self::DEFAULT_ENERGY));
        let probe = SimEnergyProbe {
            cell: Rc::clone(&energy),
        };
        Ok(SimNode {
            inner: Node::new(addr, config, probe, seed)?,
            energy,
        })
    }

    /// The wrapped protocol node.
    #[must_use]
    pub fn inner(&self) -> &Node<SimEnergyProbe> {
        &self.inner
    }

    /// The wrapped protocol node, mutably.
    pub fn inner_mut(&mut self) -> &mut Node<SimEnergyProbe> {
        &mut self.inner
    }

    /// The node's address.
    #[must_use]
    pub fn addr(&self) -> Address {
        self.inner.addr()
    }

    /// Current protocol role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.inner.role()
    }

    /// Protocol counters.
    #[must_use]
    pub fn counters(&self) -> NodeCounters {
        self.inner.counters()
    }

    /// Drain buffered event records.
    pub fn take_events(&mut self) -> Vec<EventRecord> {
        self.inner.take_events()
    }

    /// Residual energy currently reported to the node.
    #[must_use]
    pub fn energy(&self) -> f64 {
        self.energy.get()
    }

    /// Set the residual energy the probe reports.
    pub fn set_energy(&self, joules: f64) {
        self.energy.set(joules);
    }
}
