use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::StatuslineError;

/// Model display name used when the snapshot carries none.
pub const MODEL_PLACEHOLDER: &str = "Claude";

/// Directory marker used when no current directory is known.
pub const DIR_PLACEHOLDER: &str = "~";

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// Session metadata piped by Claude Code on each statusline tick.
/// All fields are optional -- the host may omit any of them, and the
/// entire blob may be absent or empty.
#[derive(Debug, Deserialize, Default)]
pub struct Snapshot {
    pub session_id: Option<String>,
    pub model: Option<Model>,
    pub workspace: Option<Workspace>,
    pub context_window: Option<ContextWindow>,
    pub cost: Option<Cost>,
    // serde_json silently drops unknown fields, so new host fields cannot
    // break deserialization.
}

#[derive(Debug, Deserialize, Default)]
pub struct Model {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Workspace {
    pub current_dir: Option<String>,
    pub project_dir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ContextWindow {
    pub context_window_size: Option<u64>,
    #[allow(dead_code)] // Deserialized for forward-compatibility; not consumed.
    pub total_input_tokens: Option<u64>,
    pub total_output_tokens: Option<u64>,
    pub current_usage: Option<CurrentUsage>,
}

/// Token usage of the request currently occupying the context window.
#[derive(Debug, Deserialize, Default, Clone, Copy)]
pub struct CurrentUsage {
    pub input_tokens: Option<u64>,
    pub cache_creation_input_tokens: Option<u64>,
    pub cache_read_input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// Cumulative cost counters for the whole session.
#[derive(Debug, Deserialize, Default)]
pub struct Cost {
    pub total_cost_usd: Option<f64>,
    pub total_lines_added: Option<u64>,
    pub total_lines_removed: Option<u64>,
}

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

impl Snapshot {
    /// Model display name, or the fixed placeholder when absent.
    pub fn model_name(&self) -> &str {
        self.model
            .as_ref()
            .and_then(|m| m.display_name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(MODEL_PLACEHOLDER)
    }

    /// Raw current directory, empty string when absent.
    pub fn current_dir(&self) -> &str {
        self.workspace
            .as_ref()
            .and_then(|w| w.current_dir.as_deref())
            .unwrap_or("")
    }

    /// Project directory, falling back to the current directory.
    pub fn project_dir(&self) -> &str {
        self.workspace
            .as_ref()
            .and_then(|w| w.project_dir.as_deref())
            .filter(|dir| !dir.is_empty())
            .unwrap_or_else(|| self.current_dir())
    }

    /// Last path segment of the current directory, or the placeholder.
    pub fn dir_name(&self) -> &str {
        Path::new(self.current_dir())
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(DIR_PLACEHOLDER)
    }
}

// ---------------------------------------------------------------------------
// Stdin parsing
// ---------------------------------------------------------------------------

/// Buffer all of stdin and parse it as a [`Snapshot`].
///
/// The host writes the whole snapshot and closes the pipe; the read blocks
/// until it does. Empty or malformed input is an error for the caller to
/// collapse into the fallback line -- it must never abort the render.
pub fn read_stdin() -> Result<Snapshot, StatuslineError> {
    let mut buf = Vec::new();
    std::io::stdin().lock().read_to_end(&mut buf)?;

    if buf.is_empty() {
        return Err(StatuslineError::EmptyInput);
    }

    Ok(serde_json::from_slice(&buf)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
