//! Crash dump written when a run dies on a fatal fault.
//!
//! The dump is self-contained: the seed and configuration reproduce the run
//! when the same script is replayed with `--seed`. The schema is versioned for
//! forward-compatible evolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::console::Config;
use crate::sim::trace::TraceEvent;

pub const CRASH_DUMP_SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrashDump {
    pub schema_version: u32,

    /// Version stamp for diagnostics.
    pub package_version: String,

    /// Determinism key.
    pub seed: u64,
    pub config: Config,

    /// Failure data.
    pub command: String,
    pub fault: String,
    pub detail: Option<String>,
    pub trace: Vec<TraceEvent>,
}

impl CrashDump {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    pub fn read_from(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(std::io::Error::other)
    }
}
