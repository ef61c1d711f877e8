//! Scenario runner binary.
//!
//! Usage: `leachnet-sim [NODES] [SECONDS] [SEED] [HEAD_SHARE]`
//!
//! Runs one simulation and prints the summary as JSON on stdout; set
//! `RUST_LOG` to see protocol traffic.

use leachnet_protocol::{Duration, ProtocolConfig};
use leachnet_sim::ScenarioBuilder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leachnet=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let nodes: usize = match args.next() {
        Some(raw) => raw.parse()?,
        None => 20,
    };
    let seconds: u64 = match args.next() {
        Some(raw) => raw.parse()?,
        None => 120,
    };
    let seed: u64 = match args.next() {
        Some(raw) => raw.parse()?,
        None => 42,
    };
    let share: f64 = match args.next() {
        Some(raw) => raw.parse()?,
        None => 0.05,
    };

    tracing::info!(nodes, seconds, seed, share, "starting simulation");

    let config = ProtocolConfig::default().with_cluster_head_share(share);
    let result = ScenarioBuilder::new(nodes)
        .with_seed(seed)
        .with_config(config)
        .random_placement(100.0)
        .run_for(Duration::from_secs(seconds))
        .run()?;

    tracing::info!(
        elections = result.ch_elections,
        relays = result.station.as_ref().map_or(0, |s| s.received),
        "simulation finished"
    );

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
