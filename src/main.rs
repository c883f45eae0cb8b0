mod config;
mod headless;

use anyhow::Result;
use config::{ScenarioConfig, DEFAULT_SCENARIO_PATH};
use headless::HeadlessConfig;
use std::env;
use std::path::PathBuf;
use tracing::info;

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    info!("Starting voxmob v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOptions::parse(env::args().skip(1));
    if cli.help {
        print_usage();
        return Ok(());
    }

    let scenario_path = cli
        .scenario
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SCENARIO_PATH));
    let scenario = ScenarioConfig::load_from_path(&scenario_path);

    let summary = headless::run(HeadlessConfig {
        scenario,
        max_ticks: cli.max_ticks,
        world_seed: cli.world_seed,
        events_path: cli.events,
        agents_path: cli.save_agents,
    })?;

    println!(
        "ticks={} events={} attacks={} teleports={} mobs={}",
        summary.ticks, summary.events, summary.attacks, summary.teleports, summary.mobs_remaining
    );
    Ok(())
}

#[derive(Debug, Default, PartialEq)]
struct CliOptions {
    help: bool,
    scenario: Option<PathBuf>,
    world_seed: Option<u64>,
    max_ticks: Option<u64>,
    events: Option<PathBuf>,
    save_agents: Option<PathBuf>,
}

impl CliOptions {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Self {
        let mut opts = CliOptions::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => opts.help = true,
                "--scenario" => {
                    if let Some(path) = args.next() {
                        opts.scenario = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--scenario requires a file path");
                    }
                }
                "--world-seed" => {
                    if let Some(raw) = args.next() {
                        match raw.parse::<u64>() {
                            Ok(value) => opts.world_seed = Some(value),
                            Err(err) => {
                                tracing::error!(%err, value = %raw, "--world-seed must be an integer");
                            }
                        }
                    } else {
                        tracing::error!("--world-seed requires an integer");
                    }
                }
                "--max-ticks" => {
                    if let Some(raw) = args.next() {
                        match raw.parse::<u64>() {
                            Ok(value) => opts.max_ticks = Some(value),
                            Err(err) => {
                                tracing::error!(%err, value = %raw, "--max-ticks must be an integer");
                            }
                        }
                    } else {
                        tracing::error!("--max-ticks requires an integer");
                    }
                }
                "--events" => {
                    if let Some(path) = args.next() {
                        opts.events = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--events requires a file path");
                    }
                }
                "--save-agents" => {
                    if let Some(path) = args.next() {
                        opts.save_agents = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--save-agents requires a file path");
                    }
                }
                other => {
                    tracing::warn!(arg = %other, "Ignoring unknown argument");
                }
            }
        }

        opts
    }
}

fn print_usage() {
    println!(
        "Usage: voxmob [--scenario <path>] [--max-ticks <n>] [--world-seed <n>] \
         [--events <path.jsonl>] [--save-agents <path>]"
    );
}
