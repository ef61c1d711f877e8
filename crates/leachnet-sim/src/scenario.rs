//! Scenario builder for setting up and running simulations.

use leachnet_protocol::{Address, Duration, ProtocolConfig, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::metrics::SimulationResult;
use crate::sim::Simulator;
use crate::topology::Position;

/// How nodes are placed in the field.
#[derive(Debug, Clone, Copy)]
enum Placement {
    /// Square grid with the given spacing in meters.
    Grid { spacing: f64 },
    /// Uniformly random positions inside a square field.
    Random { side: f64 },
}

/// Builder for simulation scenarios.
///
/// Nodes are numbered from 1; the base station takes the address named in
/// the protocol config and sits at the field origin.
pub struct ScenarioBuilder {
    num_nodes: usize,
    seed: u64,
    config: ProtocolConfig,
    placement: Placement,
    run_for: Duration,
}

impl ScenarioBuilder {
    /// Create a scenario with the given number of nodes.
    #[must_use]
    pub fn new(num_nodes: usize) -> Self {
        ScenarioBuilder {
            num_nodes,
            seed: 42,
            config: ProtocolConfig::default(),
            placement: Placement::Grid { spacing: 10.0 },
            run_for: Duration::from_secs(60),
        }
    }

    /// Set the RNG seed for the whole run.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Replace the protocol configuration.
    #[must_use]
    pub fn with_config(mut self, config: ProtocolConfig) -> Self {
        self.config = config;
        self
    }

    /// Place nodes on a square grid with the given spacing.
    #[must_use]
    pub fn grid_placement(mut self, spacing: f64) -> Self {
        self.placement = Placement::Grid { spacing };
        self
    }

    /// Place nodes uniformly at random in a square field.
    #[must_use]
    pub fn random_placement(mut self, side: f64) -> Self {
        self.placement = Placement::Random { side };
        self
    }

    /// Set how much simulated time to run.
    #[must_use]
    pub fn run_for(mut self, span: Duration) -> Self {
        self.run_for = span;
        self
    }

    /// Build the simulator without starting it.
    pub fn build(self) -> Result<Simulator> {
        let mut sim = Simulator::new(self.config.clone(), self.seed)?;
        sim.add_station()?;
        sim.topology_mut()
            .place(self.config.base_station, Position::new(0.0, 0.0));

        let mut placement_rng = StdRng::seed_from_u64(self.seed);
        let columns = (self.num_nodes as f64).sqrt().ceil().max(1.0) as usize;
        for index in 0..self.num_nodes {
            let addr = Address::new(index as u32 + 1);
            sim.add_node(addr)?;
            let position = match self.placement {
                Placement::Grid { spacing } => Position::new(
                    (index % columns) as f64 * spacing,
                    (index / columns) as f64 * spacing,
                ),
                Placement::Random { side } => Position::new(
                    placement_rng.gen_range(0.0..side),
                    placement_rng.gen_range(0.0..side),
                ),
            };
            sim.topology_mut().place(addr, position);
        }
        Ok(sim)
    }

    /// Build, start, run, and summarize.
    pub fn run(self) -> Result<SimulationResult> {
        let span = self.run_for;
        let mut sim = self.build()?;
        sim.start();
        sim.run_for(span);
        Ok(sim.finish())
    }
}
