//! Discrete-event simulation harness for the leachnet clustering
//! protocol.
//!
//! Provides the external collaborators the protocol core expects —
//! scheduler, transport, addressing, energy probe — as one single-threaded
//! engine: a priority queue of timer and delivery events, a placement and
//! signal model, and metrics collection. Runs with the same seed produce
//! identical results.
//!
//! ```
//! use leachnet_protocol::Duration;
//! use leachnet_sim::ScenarioBuilder;
//!
//! let result = ScenarioBuilder::new(10)
//!     .with_seed(7)
//!     .run_for(Duration::from_secs(60))
//!     .run()
//!     .unwrap();
//! assert_eq!(result.nodes.len(), 10);
//! ```

pub mod event;
pub mod metrics;
pub mod node;
pub mod scenario;
pub mod sim;
pub mod topology;

pub use metrics::{NodeSummary, SimMetrics, SimulationResult, StationSummary};
pub use node::{SimEnergyProbe, SimNode};
pub use scenario::ScenarioBuilder;
pub use sim::Simulator;
pub use topology::{Link, Position, Topology};
