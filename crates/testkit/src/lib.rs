#![warn(missing_docs)]
//! Deterministic testing surfaces (event stream + replay comparison).

mod micro_worldtest;
mod snapshot;

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use voxmob_core::SimTick;

pub use micro_worldtest::*;
pub use snapshot::*;

/// Primary event record captured by headless runs.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a, P: Serialize> {
    /// Simulation tick when the event occurred.
    pub tick: SimTick,
    /// Human-readable kind label.
    pub kind: &'a str,
    /// Event payload.
    pub payload: &'a P,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    file: BufWriter<File>,
    written: usize,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create event log {}", path.display()))?;
        Ok(Self {
            file: BufWriter::new(file),
            written: 0,
        })
    }

    /// Append one record to the log.
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush buffered records to disk.
    pub fn finish(mut self) -> Result<usize> {
        self.file.flush()?;
        Ok(self.written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn jsonl_sink_writes_one_line_per_record() {
        let path = std::env::temp_dir().join(format!(
            "voxmob-events-{}.jsonl",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let mut sink = JsonlSink::create(&path).expect("sink create");
        let payload = serde_json::json!({ "mob": 3 });
        for tick in 0..2 {
            sink.write(&EventRecord {
                tick: SimTick(tick),
                kind: "attack",
                payload: &payload,
            })
            .expect("write succeeds");
        }
        assert_eq!(sink.finish().expect("flush"), 2);
        let contents = fs::read_to_string(&path).expect("file readable");
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("\"kind\":\"attack\""));
        fs::remove_file(&path).ok();
    }
}
