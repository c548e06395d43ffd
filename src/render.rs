//! Segment rendering and line assembly.
//!
//! Each segment renders independently and is omitted when its inputs are
//! missing; the assembly inserts separators only between segments that are
//! actually present, so the line never carries stray ` | ` runs.

use std::fmt::Write as FmtWrite;
use std::path::Path;

use colored::Colorize;

use crate::config::Config;
use crate::context::{format_tokens, BudgetTier, ContextBudget};
use crate::git::GitProbe;
use crate::snapshot::Snapshot;

/// Line emitted when the snapshot cannot be parsed at all. Plain text, no
/// ANSI.
pub const FALLBACK: &str = "[Claude] ~";

/// Assemble the status line from pre-computed parts.
///
/// `budget` is `Some` only when the snapshot carried a usable context
/// window; `delta` is `Some` only when a positive usage delta was tracked
/// for this tick. Both annotations attach to the context segment, so a
/// delta without a budget is never rendered.
pub fn render_line(
    snap: &Snapshot,
    cfg: &Config,
    budget: Option<ContextBudget>,
    delta: Option<u64>,
    git: &dyn GitProbe,
) -> String {
    let mut out = String::new();
    let _ = write!(out, "{} {}", render_model(snap), render_dir(snap));

    if let Some(git_segment) = render_git(snap, git) {
        let _ = write!(out, " | {git_segment}");
    }

    if let Some(budget) = budget {
        let _ = write!(out, " | {}", render_budget(&budget, cfg));
        if let Some(delta) = delta {
            let _ = write!(out, " {}", render_delta(delta, cfg));
        }
        let _ = write!(out, " {}", render_autocompact(&budget, cfg));
    }

    if let Some(session) = render_session(snap, cfg) {
        let _ = write!(out, " | {session}");
    }

    out
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

fn render_model(snap: &Snapshot) -> String {
    format!("[{}]", snap.model_name()).dimmed().to_string()
}

fn render_dir(snap: &Snapshot) -> String {
    snap.dir_name().blue().to_string()
}

/// Branch plus bracketed change count. `None` when there is no project
/// directory or no branch; a zero change count drops only the bracket.
fn render_git(snap: &Snapshot, git: &dyn GitProbe) -> Option<String> {
    let project_dir = snap.project_dir();
    if project_dir.is_empty() {
        return None;
    }

    let dir = Path::new(project_dir);
    let branch = git.branch(dir)?;
    let changes = git.change_count(dir)?;

    if changes > 0 {
        Some(format!(
            "{} {}",
            branch.magenta(),
            format!("[{changes}]").cyan()
        ))
    } else {
        Some(branch.magenta().to_string())
    }
}

fn render_budget(budget: &ContextBudget, cfg: &Config) -> String {
    // Truncated tenths: 72.15% prints as 72.1, never 72.2.
    let tenths = budget.free_tenths();
    let text = format!(
        "{} free ({}.{}%)",
        format_tokens(budget.free, cfg.token_detail),
        tenths / 10,
        tenths % 10
    );
    let tinted = match budget.tier() {
        BudgetTier::Ample => text.green(),
        BudgetTier::Caution => text.yellow(),
        BudgetTier::Critical => text.red(),
    };
    tinted.to_string()
}

fn render_delta(delta: u64, cfg: &Config) -> String {
    format!("+{}", format_tokens(delta, cfg.token_detail))
        .cyan()
        .to_string()
}

fn render_autocompact(budget: &ContextBudget, cfg: &Config) -> String {
    if budget.autocompact {
        format!("[AC:{}]", format_tokens(budget.buffer, cfg.token_detail))
            .dimmed()
            .to_string()
    } else {
        "[AC:off]".dimmed().to_string()
    }
}

fn render_session(snap: &Snapshot, cfg: &Config) -> Option<String> {
    if !cfg.show_session {
        return None;
    }
    match snap.session_id.as_deref() {
        Some(id) if !id.is_empty() => Some(id.dimmed().to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::FakeGit;
    use crate::snapshot::{CurrentUsage, DIR_PLACEHOLDER, MODEL_PLACEHOLDER};

    fn snapshot(json: &str) -> Snapshot {
        serde_json::from_str(json).unwrap()
    }

    fn usage(input: u64, create: u64, read: u64) -> CurrentUsage {
        CurrentUsage {
            input_tokens: Some(input),
            cache_creation_input_tokens: Some(create),
            cache_read_input_tokens: Some(read),
            output_tokens: Some(0),
        }
    }

    fn no_git() -> FakeGit {
        FakeGit {
            branch: None,
            changes: None,
        }
    }

    #[test]
    fn test_full_line_exact() {
        colored::control::set_override(false);
        let snap = snapshot(
            r#"{
                "session_id": "sid-1",
                "model": {"display_name": "X"},
                "workspace": {"current_dir": "/a/b"}
            }"#,
        );
        let budget = ContextBudget::compute(200000, &usage(10000, 500, 200), true);
        let git = FakeGit {
            branch: Some("main".to_string()),
            changes: Some(3),
        };

        let line = render_line(&snap, &Config::default(), budget, Some(500), &git);
        assert_eq!(
            line,
            "[X] b | main [3] | 144,300 free (72.1%) +500 [AC:45,000] | sid-1"
        );
    }

    #[test]
    fn test_empty_snapshot_is_fallback_text() {
        colored::control::set_override(false);
        let snap = snapshot("{}");
        let line = render_line(&snap, &Config::default(), None, None, &no_git());
        assert_eq!(line, FALLBACK);
    }

    #[test]
    fn test_fallback_matches_placeholders() {
        assert_eq!(FALLBACK, format!("[{MODEL_PLACEHOLDER}] {DIR_PLACEHOLDER}"));
    }

    #[test]
    fn test_missing_git_leaves_no_stray_separator() {
        colored::control::set_override(false);
        let snap = snapshot(
            r#"{"model": {"display_name": "X"}, "workspace": {"current_dir": "/a/b"}}"#,
        );
        let budget = ContextBudget::compute(200000, &usage(10000, 500, 200), true);

        let line = render_line(&snap, &Config::default(), budget, None, &no_git());
        assert_eq!(line, "[X] b | 144,300 free (72.1%) [AC:45,000]");
    }

    #[test]
    fn test_clean_branch_has_no_change_bracket() {
        colored::control::set_override(false);
        let snap = snapshot(r#"{"workspace": {"current_dir": "/a/b"}}"#);
        let git = FakeGit {
            branch: Some("main".to_string()),
            changes: Some(0),
        };

        let line = render_line(&snap, &Config::default(), None, None, &git);
        assert!(line.contains("main"));
        assert!(!line.contains("[0]"));
    }

    #[test]
    fn test_failed_change_count_omits_git_segment() {
        colored::control::set_override(false);
        let snap = snapshot(r#"{"workspace": {"current_dir": "/a/b"}}"#);
        let git = FakeGit {
            branch: Some("main".to_string()),
            changes: None,
        };

        // Either query failing drops the whole segment.
        let line = render_line(&snap, &Config::default(), None, None, &git);
        assert!(!line.contains("main"));
        assert_eq!(line, render_line(&snap, &Config::default(), None, None, &no_git()));
    }

    #[test]
    fn test_session_hidden_when_disabled() {
        colored::control::set_override(false);
        let snap = snapshot(r#"{"session_id": "sid-1"}"#);
        let cfg = Config {
            show_session: false,
            ..Config::default()
        };

        let line = render_line(&snap, &cfg, None, None, &no_git());
        assert!(!line.contains("sid-1"));
        assert_eq!(line, FALLBACK);
    }

    #[test]
    fn test_autocompact_off_annotation() {
        colored::control::set_override(false);
        let snap = snapshot(r#"{"workspace": {"current_dir": "/a/b"}}"#);
        let budget = ContextBudget::compute(200000, &usage(10000, 500, 200), false);

        let line = render_line(&snap, &Config::default(), budget, None, &no_git());
        assert!(line.contains("189,300 free"));
        assert!(line.contains("[AC:off]"));
        assert!(!line.contains("[AC:45"));
    }

    #[test]
    fn test_abbreviated_token_format() {
        colored::control::set_override(false);
        let snap = snapshot(r#"{"workspace": {"current_dir": "/a/b"}}"#);
        let cfg = Config {
            token_detail: false,
            ..Config::default()
        };
        let budget = ContextBudget::compute(200000, &usage(10000, 500, 200), true);

        let line = render_line(&snap, &cfg, budget, Some(1200), &no_git());
        assert!(line.contains("144.3k free (72.1%)"));
        assert!(line.contains("+1.2k"));
        assert!(line.contains("[AC:45.0k]"));
    }

    #[test]
    fn test_delta_needs_budget() {
        colored::control::set_override(false);
        let snap = snapshot(r#"{"workspace": {"current_dir": "/a/b"}}"#);

        let line = render_line(&snap, &Config::default(), None, Some(500), &no_git());
        assert!(!line.contains("+500"));
    }
}
