//! Per-session usage ledger backing the delta segment.
//!
//! One CSV file per session, append-only; each invocation reads the last
//! line written by the previous one, then appends its own. Nothing here may
//! fail the render: every error degrades to "no previous entry" or a
//! skipped append, logged at debug level.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::context::ContextBudget;
use crate::error::StatuslineError;
use crate::snapshot::Snapshot;

/// Ledger file used when the snapshot carries no session id.
const SHARED_LEDGER: &str = "shared.csv";

/// Prefix of the pre-`sessions/` flat layout, migrated on sight.
const LEGACY_PREFIX: &str = "usage-";

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One appended row. Column order is fixed -- older builds of the tool read
/// these files, and the reader below depends on `used` being column two.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord {
    /// Unix epoch seconds at append time.
    pub at: u64,
    /// Context tokens in use (input + cache creation + cache read). The
    /// next invocation diffs its own usage against this value.
    pub used: u64,
    /// Cumulative output tokens across the session.
    pub total_output: u64,
    /// Current-turn input tokens.
    pub turn_input: u64,
    /// Current-turn output tokens.
    pub turn_output: u64,
    pub cache_creation: u64,
    pub cache_read: u64,
    /// Cumulative session cost in USD.
    pub cost_usd: f64,
    pub lines_added: u64,
    pub lines_removed: u64,
    /// Session id, `-` when absent.
    pub session: String,
    /// Model id, `-` when absent.
    pub model: String,
    /// Project directory, `-` when absent.
    pub project: String,
    /// Context window size in tokens.
    pub window: u64,
}

impl UsageRecord {
    /// Snapshot the values worth persisting for this tick.
    pub fn capture(snap: &Snapshot, budget: &ContextBudget) -> UsageRecord {
        let usage = snap
            .context_window
            .as_ref()
            .and_then(|cw| cw.current_usage)
            .unwrap_or_default();
        let total_output = snap
            .context_window
            .as_ref()
            .and_then(|cw| cw.total_output_tokens)
            .unwrap_or(0);
        let cost = snap.cost.as_ref();

        let at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        UsageRecord {
            at,
            used: budget.used,
            total_output,
            turn_input: usage.input_tokens.unwrap_or(0),
            turn_output: usage.output_tokens.unwrap_or(0),
            cache_creation: usage.cache_creation_input_tokens.unwrap_or(0),
            cache_read: usage.cache_read_input_tokens.unwrap_or(0),
            cost_usd: cost.and_then(|c| c.total_cost_usd).unwrap_or(0.0),
            lines_added: cost.and_then(|c| c.total_lines_added).unwrap_or(0),
            lines_removed: cost.and_then(|c| c.total_lines_removed).unwrap_or(0),
            session: placeholder_if_empty(snap.session_id.as_deref()),
            model: placeholder_if_empty(snap.model.as_ref().and_then(|m| m.id.as_deref())),
            project: placeholder_if_empty(Some(snap.project_dir())),
            window: budget.window,
        }
    }

    fn to_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.at,
            self.used,
            self.total_output,
            self.turn_input,
            self.turn_output,
            self.cache_creation,
            self.cache_read,
            self.cost_usd,
            self.lines_added,
            self.lines_removed,
            self.session,
            self.model,
            self.project,
            self.window,
        )
    }
}

fn placeholder_if_empty(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Handle to one session's ledger file.
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    /// Resolve the ledger for a session id under the state root. Ids are
    /// sanitized into safe file names; a missing or unusable id falls back
    /// to the shared ledger.
    pub fn for_session(root: &Path, session_id: Option<&str>) -> Ledger {
        Ledger {
            path: root.join("sessions").join(ledger_file_name(session_id)),
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Usage recorded by the previous invocation, from the last line of the
    /// ledger. `None` means no usable previous entry (missing file, empty
    /// file, unparseable line) -- in that case no delta is rendered.
    pub fn previous_usage(&self) -> Option<u64> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!("ledger read failed for {}: {e}", self.path.display());
                }
                return None;
            }
        };

        text.lines().last().and_then(parse_usage_line)
    }

    /// Append one record, creating the sessions directory on first use.
    pub fn append(&self, record: &UsageRecord) -> Result<(), StatuslineError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", record.to_line())?;
        Ok(())
    }
}

/// Extract the previous-usage value from a ledger line.
///
/// Current format: `used` is the second comma-separated column. Lines
/// without a comma are the legacy single-column format and hold the bare
/// value -- this fallback is a compatibility shim and must stay.
fn parse_usage_line(line: &str) -> Option<u64> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if line.contains(',') {
        line.split(',').nth(1).and_then(|field| field.trim().parse().ok())
    } else {
        line.parse().ok()
    }
}

fn ledger_file_name(session_id: Option<&str>) -> String {
    let id = match session_id {
        Some(id) if !id.is_empty() => id,
        _ => return SHARED_LEDGER.to_string(),
    };

    let safe: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Ids like ".." sanitize to pure dots; route those to the shared file
    // rather than producing a path-traversing name.
    if safe.trim_matches('.').is_empty() {
        SHARED_LEDGER.to_string()
    } else {
        format!("{safe}.csv")
    }
}

// ---------------------------------------------------------------------------
// Paths and migration
// ---------------------------------------------------------------------------

/// State root holding the `sessions/` directory. `CC_STATUSLINE_STATE_DIR`
/// wins (for testing); otherwise `~/.claude/statusline`.
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("CC_STATUSLINE_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    dirs::home_dir().map(|home| home.join(".claude").join("statusline"))
}

/// Move `usage-<session>.csv` files from the old flat layout into
/// `sessions/`. When the destination already exists the legacy file is
/// discarded, never merged over newer data. Best-effort throughout: any
/// failure is logged and skipped.
pub fn migrate_legacy(root: &Path) {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(_) => return, // nothing to migrate, possibly nothing at all yet
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = match name.to_str() {
            Some(name) => name,
            None => continue,
        };
        let stem = match name
            .strip_prefix(LEGACY_PREFIX)
            .and_then(|rest| rest.strip_suffix(".csv"))
        {
            Some(stem) if !stem.is_empty() => stem,
            _ => continue,
        };
        if !entry.path().is_file() {
            continue;
        }

        let dest_dir = root.join("sessions");
        if let Err(e) = std::fs::create_dir_all(&dest_dir) {
            tracing::debug!("could not create {}: {e}", dest_dir.display());
            return;
        }

        let dest = dest_dir.join(format!("{stem}.csv"));
        let moved = if dest.exists() {
            std::fs::remove_file(entry.path())
        } else {
            std::fs::rename(entry.path(), &dest)
        };
        if let Err(e) = moved {
            tracing::debug!("legacy ledger migration failed for {name}: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
