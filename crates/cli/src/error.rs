//! Errors reported by CLI commands.

use rigbay_admin::commerce::CommerceError;
use rigbay_admin::config::ConfigError;
use rigbay_core::build::{BuildError, ComponentCategory};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Environment configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Commerce API call failed.
    #[error("Commerce API error: {0}")]
    Commerce(#[from] CommerceError),

    /// Input file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Input file is not valid YAML or JSON for the expected shape.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Build file is structurally wrong.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Build file lists two parts for one slot.
    #[error("Build file has more than one {0} part")]
    DuplicateSlot(ComponentCategory),

    /// Build evaluated with error-severity warnings under `--strict`.
    #[error("Build is incompatible ({0} blocking issue(s))")]
    Incompatible(usize),

    /// Seed file failed validation; nothing was written.
    #[error("{0} validation error(s) in seed file")]
    InvalidSeed(usize),

    /// Some products could not be created.
    #[error("{0} product(s) failed to seed")]
    SeedFailed(usize),
}
