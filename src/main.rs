mod config;
mod context;
mod error;
mod git;
mod ledger;
mod render;
mod snapshot;

use std::panic::{catch_unwind, AssertUnwindSafe};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::Config;
use context::ContextBudget;
use git::ProcessGit;
use ledger::{Ledger, UsageRecord};
use snapshot::Snapshot;

/// Render one colorized status line for a Claude Code session.
///
/// Reads a JSON session snapshot on stdin and prints exactly one line on
/// stdout. Intended for the host's statusLine hook, so it always exits 0,
/// malformed input included.
#[derive(Parser)]
#[command(name = "cc-statusline", version, about, long_about = None)]
struct Cli {
    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long)]
    no_color: bool,
}

/// Wraps `run` in `catch_unwind` so that panics are swallowed and the
/// process always exits 0 with one line on stdout.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let result = catch_unwind(AssertUnwindSafe(|| run(cli)));

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            tracing::debug!("render failed: {e:#}");
            println!("{}", render::FALLBACK);
            Ok(())
        }
        Err(_) => {
            println!("{}", render::FALLBACK);
            Ok(())
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    init_tracing();

    // Claude Code pipes stdout (not a TTY), so colored would normally
    // disable escapes. Force them on unless the user opted out.
    if cli.no_color || std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    } else {
        colored::control::set_override(true);
    }

    let snap = match snapshot::read_stdin() {
        Ok(snap) => snap,
        Err(e) => {
            tracing::debug!("snapshot unusable: {e}");
            println!("{}", render::FALLBACK);
            return Ok(());
        }
    };

    let cfg = Config::load_or_init();

    // Budget only exists when the snapshot carries both a window size and
    // current-usage data.
    let budget = snap.context_window.as_ref().and_then(|cw| {
        let usage = cw.current_usage?;
        ContextBudget::compute(cw.context_window_size.unwrap_or(0), &usage, cfg.autocompact)
    });

    let delta = match budget {
        Some(ref budget) if cfg.show_delta => track_delta(&snap, budget),
        _ => None,
    };

    let line = render::render_line(&snap, &cfg, budget, delta, &ProcessGit);
    println!("{line}");

    Ok(())
}

/// Read the previous ledger entry and append the current one. Returns the
/// usage growth since the last tick, `None` on first run or when usage
/// shrank (a compaction, not growth). Ledger failures degrade to `None`.
fn track_delta(snap: &Snapshot, budget: &ContextBudget) -> Option<u64> {
    let root = ledger::state_dir()?;
    ledger::migrate_legacy(&root);

    let store = Ledger::for_session(&root, snap.session_id.as_deref());
    let previous = store.previous_usage();

    let record = UsageRecord::capture(snap, budget);
    if let Err(e) = store.append(&record) {
        tracing::debug!("ledger append failed: {e}");
    }

    previous.and_then(|prev| budget.used.checked_sub(prev).filter(|delta| *delta > 0))
}

/// Diagnostics go to stderr; stdout belongs to the status line. Silent by
/// default, opt in with RUST_LOG.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
