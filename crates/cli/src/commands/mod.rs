//! Command implementations.

pub mod build;
pub mod catalog;

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::CliError;

/// Read a YAML (or JSON, which is valid YAML) document from disk.
pub(crate) async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let display = path.display().to_string();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Read {
            path: display.clone(),
            source,
        })?;
    serde_yaml::from_str(&content).map_err(|source| CliError::Parse {
        path: display,
        source,
    })
}
