//! Runtime-settable harness parameters.
//!
//! Every field of [`Config`] is reachable by name through the `option`
//! command. The table of names, ranges and accessors is static; values are
//! integers (booleans are 0 or 1).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::CommandError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Longest string displayed or copied out on removal.
    pub string_length: usize,
    /// Allocation failure probability in percent.
    pub fail_probability: u32,
    /// Consecutive failed queue operations tolerated before a hard failure.
    pub fail_limit: u32,
    /// Lists longer than this are truncated when shown and freed without
    /// the cautious walk.
    pub big_list_size: usize,
    /// Failed commands after which the console stops.
    pub error_limit: u32,
    pub verbosity: u8,
    pub echo: bool,
    /// Route ih/it/rh/rt to the timing oracle.
    pub simulation: bool,
    /// Time limit of one protected region, in milliseconds.
    pub time_limit_ms: u64,
    /// Largest queue whose values are snapshotted for exact result checks.
    pub snapshot_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_verbosity(4)
    }
}

impl Config {
    /// Defaults, with echo enabled above verbosity 1.
    pub fn with_verbosity(verbosity: u8) -> Self {
        Self {
            string_length: 1024,
            fail_probability: 0,
            fail_limit: 30,
            big_list_size: 30,
            error_limit: 5,
            verbosity,
            echo: verbosity > 1,
            simulation: false,
            time_limit_ms: 1000,
            snapshot_limit: 10_000,
        }
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    /// Set option `name` to `value`, checking its range.
    pub fn set(&mut self, name: &str, value: i64) -> Result<&'static OptionSpec, CommandError> {
        let spec = option(name).ok_or_else(|| CommandError::UnknownOption(name.to_string()))?;
        if value < spec.min || value > spec.max {
            return Err(CommandError::OptionRange {
                name: spec.name,
                value,
                min: spec.min,
                max: spec.max,
            });
        }
        (spec.set)(self, value);
        Ok(spec)
    }
}

/// One named option.
pub struct OptionSpec {
    pub name: &'static str,
    pub doc: &'static str,
    pub min: i64,
    pub max: i64,
    pub get: fn(&Config) -> i64,
    pub set: fn(&mut Config, i64),
}

const I32_MAX: i64 = i32::MAX as i64;

pub static OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        name: "length",
        doc: "Maximum length of displayed string",
        min: 1,
        max: 1 << 20,
        get: |c| c.string_length as i64,
        set: |c, v| c.string_length = v as usize,
    },
    OptionSpec {
        name: "malloc",
        doc: "Malloc failure probability percent",
        min: 0,
        max: 100,
        get: |c| i64::from(c.fail_probability),
        set: |c, v| c.fail_probability = v as u32,
    },
    OptionSpec {
        name: "fail",
        doc: "Number of times allow queue operations to return false",
        min: 0,
        max: I32_MAX,
        get: |c| i64::from(c.fail_limit),
        set: |c, v| c.fail_limit = v as u32,
    },
    OptionSpec {
        name: "big",
        doc: "Queue size above which display truncates and free skips the cautious walk",
        min: 0,
        max: I32_MAX,
        get: |c| c.big_list_size as i64,
        set: |c, v| c.big_list_size = v as usize,
    },
    OptionSpec {
        name: "error",
        doc: "Number of errors until exit",
        min: 1,
        max: I32_MAX,
        get: |c| i64::from(c.error_limit),
        set: |c, v| c.error_limit = v as u32,
    },
    OptionSpec {
        name: "verbose",
        doc: "Verbosity level",
        min: 0,
        max: 5,
        get: |c| i64::from(c.verbosity),
        set: |c, v| c.verbosity = v as u8,
    },
    OptionSpec {
        name: "echo",
        doc: "Do/don't echo commands",
        min: 0,
        max: 1,
        get: |c| i64::from(c.echo),
        set: |c, v| c.echo = v != 0,
    },
    OptionSpec {
        name: "simulation",
        doc: "Start/Stop simulation mode",
        min: 0,
        max: 1,
        get: |c| i64::from(c.simulation),
        set: |c, v| c.simulation = v != 0,
    },
    OptionSpec {
        name: "timeout",
        doc: "Time limit of one queue operation, in milliseconds",
        min: 1,
        max: 3_600_000,
        get: |c| c.time_limit_ms as i64,
        set: |c, v| c.time_limit_ms = v as u64,
    },
    OptionSpec {
        name: "snapshot",
        doc: "Largest queue whose values are checked exactly after reordering",
        min: 0,
        max: I32_MAX,
        get: |c| c.snapshot_limit as i64,
        set: |c, v| c.snapshot_limit = v as usize,
    },
];

pub fn option(name: &str) -> Option<&'static OptionSpec> {
    OPTIONS.iter().find(|spec| spec.name == name)
}
