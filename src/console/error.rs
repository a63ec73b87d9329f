use std::path::PathBuf;

/// Usage errors. Each aborts only the command that raised it.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    #[error("{command} {expected}")]
    Arity {
        command: String,
        expected: &'static str,
    },

    #[error("Invalid {what} '{value}'")]
    InvalidInteger { what: &'static str, value: String },

    #[error("Unknown parameter '{0}'")]
    UnknownOption(String),

    #[error("Parameter {name} must be in {min}..={max}, got {value}")]
    OptionRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Invalid sort option")]
    InvalidSortOption,

    #[error("{0} does not need arguments in simulation mode")]
    SimulationArgs(String),

    #[error("No timing oracle installed for simulation mode")]
    NoOracle,

    #[error("Cannot read file '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CommandError {
    pub(crate) fn arity(command: &str, expected: &'static str) -> Self {
        CommandError::Arity {
            command: command.to_string(),
            expected,
        }
    }
}
