use thiserror::Error;

/// Errors raised at the fallible boundaries (stdin, config, ledger).
///
/// None of these ever reach the user: every caller collapses them into a
/// fallback line, a default value, or an omitted segment. The typed variants
/// exist so the collapse sites stay explicit instead of blanket-catching.
#[derive(Error, Debug)]
pub enum StatuslineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("empty input on stdin")]
    EmptyInput,
}
