use crate::config::ScenarioConfig;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;
use voxmob_testkit::{EventRecord, JsonlSink};
use voxmob_world::persist::save_agents;
use voxmob_world::{SimEvent, Simulation};

pub struct HeadlessConfig {
    pub scenario: ScenarioConfig,
    /// Overrides the scenario's tick count.
    pub max_ticks: Option<u64>,
    /// Overrides the scenario's seed.
    pub world_seed: Option<u64>,
    pub events_path: Option<PathBuf>,
    pub agents_path: Option<PathBuf>,
}

/// Totals reported after a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub events: usize,
    pub attacks: usize,
    pub teleports: usize,
    pub mobs_remaining: usize,
}

pub fn run(cfg: HeadlessConfig) -> Result<RunSummary> {
    let mut scenario = cfg.scenario;
    if let Some(seed) = cfg.world_seed {
        scenario.seed = seed;
    }
    let ticks = cfg.max_ticks.unwrap_or(scenario.ticks);
    let mut sim = scenario
        .build()
        .with_context(|| format!("Failed to build scenario '{}'", scenario.name))?;

    let mut sink = cfg
        .events_path
        .as_ref()
        .map(JsonlSink::create)
        .transpose()?;

    let mut summary = RunSummary {
        ticks,
        ..RunSummary::default()
    };
    for _ in 0..ticks {
        sim.step();
        for event in sim.drain_events() {
            match event.event {
                SimEvent::Attack { .. } => summary.attacks += 1,
                SimEvent::Teleported { .. } => summary.teleports += 1,
                _ => {}
            }
            summary.events += 1;
            if let Some(sink) = sink.as_mut() {
                sink.write(&EventRecord {
                    tick: event.tick,
                    kind: event.label(),
                    payload: &event.event,
                })?;
            }
        }
    }
    summary.mobs_remaining = count_mobs(&sim);

    if let Some(sink) = sink {
        let written = sink.finish()?;
        info!(written, "event log flushed");
    }
    if let Some(path) = &cfg.agents_path {
        let records = sim.save_agents();
        save_agents(path, &records)?;
        info!(count = records.len(), path = %path.display(), "agents saved");
    }

    info!(
        scenario = %scenario.name,
        ticks = summary.ticks,
        events = summary.events,
        attacks = summary.attacks,
        teleports = summary.teleports,
        mobs = summary.mobs_remaining,
        "headless run finished"
    );
    Ok(summary)
}

fn count_mobs(sim: &Simulation) -> usize {
    sim.entities()
        .ids()
        .into_iter()
        .filter(|id| sim.entities().mob(*id).is_some())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scenario_runs_to_completion() {
        let summary = run(HeadlessConfig {
            scenario: ScenarioConfig::default(),
            max_ticks: Some(40),
            world_seed: Some(3),
            events_path: None,
            agents_path: None,
        })
        .expect("run");
        assert_eq!(summary.ticks, 40);
        assert_eq!(summary.mobs_remaining, 1);
        assert!(summary.events >= 1);
    }
}
