//! JSON-lines event scripts
//!
//! Each non-empty line that does not start with `#` is either an
//! [`AudioEvent`] (`{"type":"PlayerEnterWorld","player":"alice"}`) or a pause
//! in the replay (`{"wait_ms":1500}`).

use anyhow::{Context, Result};
use minstrel_core::domain::messages::AudioEvent;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    Wait { wait_ms: u64 },
    Event(AudioEvent),
}

/// Parse one script line; blank lines and comments yield `None`
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<ScriptStep>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let step = serde_json::from_str(trimmed)
        .with_context(|| format!("line {line_no}: not a valid event or wait step"))?;
    Ok(Some(step))
}
