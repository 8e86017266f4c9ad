//! hiernet simulation driver
//!
//! Loads a scenario file, builds the described network and runs routing
//! passes from the root coordinator, then prints every node's table.

use anyhow::{bail, Context};
use hiernet_core::logging;
use hiernet_mesh::{RoutingSnapshot, Scenario};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

const SIM_PROTOCOL_VERSION: u32 = 1;
const SIM_RUNTIME_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct SimVersionHandshake {
    version: &'static str,
    runtime_version: u32,
    protocol_version: u32,
}

#[derive(Debug, PartialEq)]
struct SimArgs {
    config: PathBuf,
    passes: Option<u32>,
    json: bool,
}

/// JSON output of a simulation run
#[derive(Debug, Serialize)]
struct RunOutput {
    passes: u32,
    hierarchy_height: usize,
    accepted: usize,
    rejected: usize,
    routes: usize,
    snapshot: RoutingSnapshot,
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--version-json") {
        let handshake = SimVersionHandshake {
            version: env!("CARGO_PKG_VERSION"),
            runtime_version: SIM_RUNTIME_VERSION,
            protocol_version: SIM_PROTOCOL_VERSION,
        };
        println!("{}", serde_json::to_string(&handshake)?);
        return Ok(());
    }

    let sim_args = parse_args(&args)?;
    let mut scenario = load_scenario(&sim_args.config)?;
    if let Some(passes) = sim_args.passes {
        scenario.config.simulation.passes = passes;
    }

    logging::init_from_config(&scenario.config.logging);

    let output = run(&scenario)?;
    if sim_args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_text(&output);
    }
    Ok(())
}

fn load_scenario(path: &Path) -> anyhow::Result<Scenario> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario {}", path.display()))?;
    let scenario: Scenario = toml::from_str(&raw)
        .with_context(|| format!("failed to parse scenario {}", path.display()))?;
    Ok(scenario)
}

fn run(scenario: &Scenario) -> anyhow::Result<RunOutput> {
    let topology = scenario.build()?;
    let passes = scenario.config.simulation.passes;

    let mut accepted = 0;
    let mut rejected = 0;
    for pass in 1..=passes {
        let report = topology.update_routing();
        accepted = report.total_accepted();
        rejected = report.rejected;
        info!(pass, accepted, rejected, "Routing pass complete");
    }

    let snapshot = topology.snapshot();
    Ok(RunOutput {
        passes,
        hierarchy_height: topology.hierarchy_height(),
        accepted,
        rejected,
        routes: snapshot.route_count(),
        snapshot,
    })
}

fn print_text(output: &RunOutput) {
    println!(
        "passes={} height={} accepted={} rejected={} routes={}",
        output.passes,
        output.hierarchy_height,
        output.accepted,
        output.rejected,
        output.routes
    );
    for (node, table) in &output.snapshot.nodes {
        println!("{}", node);
        for entry in table {
            println!(
                "  {:<12} via {:<12} hops={} rate={}kbit delay={}ms lossless={}",
                entry.destination.to_string(),
                entry.next_hop.to_string(),
                entry.hop_count,
                entry.qos.data_rate_kbit,
                entry.qos.delay_ms,
                entry.qos.lossless
            );
        }
    }
}

fn parse_args(args: &[String]) -> anyhow::Result<SimArgs> {
    let mut config = None;
    let mut passes = None;
    let mut json = false;

    let mut args_iter = args.iter().skip(1);
    while let Some(arg) = args_iter.next() {
        match arg.as_str() {
            "--config" => match args_iter.next() {
                Some(path) => config = Some(PathBuf::from(path)),
                None => bail!("--config was provided without a path"),
            },
            "--passes" => match args_iter.next() {
                Some(value) => {
                    let count: u32 = value
                        .parse()
                        .with_context(|| format!("invalid pass count {:?}", value))?;
                    passes = Some(count);
                }
                None => bail!("--passes was provided without a count"),
            },
            "--json" => json = true,
            other => bail!("unknown argument {:?}", other),
        }
    }

    match config {
        Some(config) => Ok(SimArgs {
            config,
            passes,
            json,
        }),
        None => bail!("missing required --config <path> argument"),
    }
}
