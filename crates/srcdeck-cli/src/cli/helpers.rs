use super::CliError;
use anyhow::Context;
use serde::Deserialize;
use srcdeck_core::common::fixed::FixedFrame;
use srcdeck_core::common::values::ValueTable;
use srcdeck_core::domain::SourceError;
use srcdeck_core::modules::sources::{ActivationField, CellBox};
use std::fs;
use std::path::Path;

/// Cell boxes and the per-cell activity table an activation source samples.
#[derive(Debug, Deserialize)]
pub(super) struct ActivationInput {
    pub(super) cells: Vec<CellBox>,
    pub(super) field: ActivationField,
}

fn read_text(path: &Path, what: &str) -> Result<String, CliError> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read {} '{}'", what, path.display()))
        .map_err(CliError::Internal)
}

pub(super) fn load_value_table(path: &Path) -> Result<ValueTable, CliError> {
    let text = read_text(path, "variable table")?;
    ValueTable::from_json_str(&text).map_err(|error| CliError::Source(error.into()))
}

pub(super) fn load_frame(path: Option<&Path>) -> Result<FixedFrame, CliError> {
    match path {
        Some(path) => {
            let text = read_text(path, "frame")?;
            Ok(FixedFrame::from_json_str(&text)?)
        }
        None => Ok(FixedFrame::world("World")),
    }
}

pub(super) fn load_activation(path: &Path) -> Result<ActivationInput, CliError> {
    let text = read_text(path, "activation input")?;
    serde_json::from_str(&text).map_err(|error| {
        CliError::Source(SourceError::configuration(
            "CONFIG.ACTIVATION_INPUT",
            format!("failed to parse '{}': {}", path.display(), error),
        ))
    })
}
