//! Context-budget accounting.
//!
//! Free space is reported relative to the full window, optionally minus the
//! fixed fraction Claude Code reserves for automatic history compaction.

use crate::snapshot::CurrentUsage;

/// Fraction of the context window reserved for the autocompact buffer
/// (22.5% -- 45k tokens of a 200k window).
pub const AUTOCOMPACT_RESERVE: f64 = 0.225;

/// Color tier for the free-context display, selected from the floored
/// integer percentage. Boundary values fall into the lower tier: exactly
/// 50% is `Caution`, exactly 25% is `Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetTier {
    Ample,
    Caution,
    Critical,
}

/// Derived context-budget numbers for one snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ContextBudget {
    /// Total context window size in tokens.
    pub window: u64,
    /// Tokens currently occupying the window (input + cache traffic).
    pub used: u64,
    /// Autocompact buffer size, computed whether or not it is applied.
    pub buffer: u64,
    /// Free tokens after subtracting usage (and the buffer when enabled),
    /// clamped at zero.
    pub free: u64,
    /// Whether the buffer was subtracted.
    pub autocompact: bool,
}

impl ContextBudget {
    /// Derive the budget from the current usage. Returns `None` for a zero
    /// or missing window size -- there is nothing meaningful to show.
    pub fn compute(window: u64, usage: &CurrentUsage, autocompact: bool) -> Option<ContextBudget> {
        if window == 0 {
            return None;
        }

        let used = usage
            .input_tokens
            .unwrap_or(0)
            .saturating_add(usage.cache_creation_input_tokens.unwrap_or(0))
            .saturating_add(usage.cache_read_input_tokens.unwrap_or(0));

        let buffer = (window as f64 * AUTOCOMPACT_RESERVE).floor() as u64;

        // Usage may legitimately exceed the nominal budget around compaction
        // events; the saturating chain clamps free space at zero.
        let free = if autocompact {
            window.saturating_sub(used).saturating_sub(buffer)
        } else {
            window.saturating_sub(used)
        };

        Some(ContextBudget {
            window,
            used,
            buffer,
            free,
            autocompact,
        })
    }

    /// Free space as a percentage of the full window.
    pub fn free_percent(&self) -> f64 {
        self.free as f64 * 100.0 / self.window as f64
    }

    /// Free percentage in integer tenths, truncated toward zero: 72.15%
    /// yields 721 and displays as `72.1`, never `72.2`. Must stay integer
    /// arithmetic; flooring the f64 percent drops exact tenths (72.1 is
    /// 72.0999... as a double and would floor to 72.0).
    pub fn free_tenths(&self) -> u64 {
        (self.free as u128 * 1000 / self.window as u128) as u64
    }

    /// Tier from the floored integer percentage, strict thresholds.
    pub fn tier(&self) -> BudgetTier {
        let whole = self.free_percent() as u64;
        if whole > 50 {
            BudgetTier::Ample
        } else if whole > 25 {
            BudgetTier::Caution
        } else {
            BudgetTier::Critical
        }
    }
}

/// Format a token count either exactly with thousands grouping ("144,300")
/// or abbreviated with one decimal ("144.3k").
pub fn format_tokens(tokens: u64, exact: bool) -> String {
    if exact {
        group_thousands(tokens)
    } else {
        format!("{:.1}k", tokens as f64 / 1000.0)
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
