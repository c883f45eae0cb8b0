//! Micro-worldtest harness for deterministic, tick-based replay tests.
//!
//! A micro-worldtest is intentionally small: it steps a tiny simulation for a
//! fixed number of ticks and snapshots selected state each tick. Running the
//! same setup twice must produce byte-identical reports.

use crate::snapshot::{canonical_json, first_difference};
use anyhow::Result;
use serde::Serialize;
use voxmob_core::SimTick;

/// Configuration for a micro-worldtest.
#[derive(Debug, Clone)]
pub struct MicroWorldtestConfig {
    /// Human-readable name (written into the report).
    pub name: String,
    /// Number of ticks to step (report includes the initial snapshot at tick 0).
    pub ticks: u64,
}

/// Single snapshot frame captured at a given tick.
#[derive(Debug, Clone, Serialize)]
pub struct MicroWorldtestFrame<S> {
    /// Tick number.
    pub tick: u64,
    /// Snapshot payload.
    pub snapshot: S,
}

#[derive(Debug, Clone, Serialize)]
struct MicroWorldtestReport<S> {
    name: String,
    frames: Vec<MicroWorldtestFrame<S>>,
}

/// Run a micro-worldtest and return its report as canonical JSON.
///
/// Captures the initial snapshot at tick 0, then steps `config.ticks` times,
/// capturing a snapshot after each step (so the report contains `ticks + 1` frames).
pub fn record_micro_worldtest<State, Snapshot, StepFn, SnapFn>(
    config: &MicroWorldtestConfig,
    mut state: State,
    mut step: StepFn,
    mut snapshot: SnapFn,
) -> Result<String>
where
    Snapshot: Serialize,
    StepFn: FnMut(SimTick, &mut State),
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let mut frames = Vec::with_capacity(config.ticks as usize + 1);

    let mut tick = SimTick::ZERO;
    frames.push(MicroWorldtestFrame {
        tick: tick.0,
        snapshot: snapshot(tick, &state),
    });

    for _ in 0..config.ticks {
        step(tick, &mut state);
        tick = tick.advance(1);
        frames.push(MicroWorldtestFrame {
            tick: tick.0,
            snapshot: snapshot(tick, &state),
        });
    }

    let report = MicroWorldtestReport {
        name: config.name.clone(),
        frames,
    };
    canonical_json(&report)
}

/// Record the same micro-worldtest twice from fresh state and fail if the
/// reports differ anywhere.
pub fn assert_deterministic_replay<State, Snapshot, SetupFn, StepFn, SnapFn>(
    config: MicroWorldtestConfig,
    mut setup: SetupFn,
    mut step: StepFn,
    mut snapshot: SnapFn,
) -> Result<String>
where
    Snapshot: Serialize,
    SetupFn: FnMut() -> State,
    StepFn: FnMut(SimTick, &mut State),
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let first = record_micro_worldtest(&config, setup(), &mut step, &mut snapshot)?;
    let second = record_micro_worldtest(&config, setup(), &mut step, &mut snapshot)?;
    if let Some(line) = first_difference(&first, &second) {
        anyhow::bail!(
            "Replay of {} diverged at report line {}",
            config.name,
            line
        );
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ticks: u64) -> MicroWorldtestConfig {
        MicroWorldtestConfig {
            name: "counter".into(),
            ticks,
        }
    }

    #[test]
    fn report_has_initial_frame_plus_one_per_tick() {
        let json = record_micro_worldtest(&config(3), 0u32, |_, n| *n += 1, |_, n| *n).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let frames = value["frames"].as_array().unwrap();
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[3]["snapshot"], 3);
        assert_eq!(frames[3]["tick"], 3);
    }

    #[test]
    fn nondeterministic_step_is_caught() {
        let mut runs = 0u32;
        let result = assert_deterministic_replay(
            config(2),
            || {
                runs += 1;
                runs
            },
            |_, n| *n += 1,
            |_, n| *n,
        );
        assert!(result.is_err());
        assert!(assert_deterministic_replay(config(2), || 0u32, |_, n| *n += 1, |_, n| *n).is_ok());
    }
}
