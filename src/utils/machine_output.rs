//! Structured output for `--format json|yaml`

use crate::error::{Result, UpmError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct MachineEnvelope<T>
where
    T: Serialize,
{
    pub version: String,
    pub command: String,
    pub backend: String,
    pub ok: bool,
    pub data: T,
    pub warnings: Vec<String>,
}

impl<T: Serialize> MachineEnvelope<T> {
    pub fn new(command: &str, backend: &str, data: T, warnings: Vec<String>) -> Self {
        Self {
            version: "v1".to_string(),
            command: command.to_string(),
            backend: backend.to_string(),
            ok: true,
            data,
            warnings,
        }
    }
}

/// Render the envelope as `json` or `yaml`.
pub fn render<T>(envelope: &MachineEnvelope<T>, format: &str) -> Result<String>
where
    T: Serialize,
{
    match format {
        "json" => serde_json::to_string_pretty(envelope)
            .map_err(|e| UpmError::Serialization(e.to_string())),
        "yaml" => {
            serde_yml::to_string(envelope).map_err(|e| UpmError::Serialization(e.to_string()))
        }
        other => Err(UpmError::Serialization(format!(
            "Unsupported machine output format '{}'",
            other
        ))),
    }
}

pub fn emit_v1<T>(command: &str, backend: &str, data: T, format: &str) -> Result<()>
where
    T: Serialize,
{
    let envelope = MachineEnvelope::new(command, backend, data, Vec::new());
    println!("{}", render(&envelope, format)?.trim_end());
    Ok(())
}
