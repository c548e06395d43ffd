//! User-configurable statusline settings.
//!
//! The config file is the upstream `key=value` format (one per line, `#`
//! comments), not TOML -- it is an external interface shared with earlier
//! versions of the tool and must keep parsing their files.

use std::path::{Path, PathBuf};

/// Written verbatim on first run so the defaults are self-documenting.
const DEFAULT_CONFIG: &str = "\
# cc-statusline configuration
#
# autocompact     reserve the 22.5% autocompact buffer when computing free
#                 context; keep in sync with the /config setting in Claude Code
# token_detail    true = exact token counts, false = abbreviated (e.g. 132.4k)
# show_delta      show context growth since the previous refresh
# show_session    show the session id
# show_io_tokens  reserved for the in/out token segment
autocompact=true
token_detail=true
show_delta=true
show_session=true
show_io_tokens=true
";

/// Boolean display toggles. Missing file or missing keys are not errors --
/// everything defaults to enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Subtract the autocompact buffer from free context.
    pub autocompact: bool,

    /// Exact thousands-grouped token counts instead of abbreviated `N.Nk`.
    pub token_detail: bool,

    /// Track and render the per-refresh usage delta.
    pub show_delta: bool,

    /// Render the session id segment.
    pub show_session: bool,

    /// Reserved; parsed but not consumed by rendering yet.
    #[allow(dead_code)]
    pub show_io_tokens: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autocompact: true,
            token_detail: true,
            show_delta: true,
            show_session: true,
            show_io_tokens: true,
        }
    }
}

impl Config {
    /// Load the config, creating the default file on first run.
    ///
    /// Checks `CC_STATUSLINE_CONFIG` first (for testing), then falls back to
    /// `~/.claude/statusline.conf`. Every failure mode degrades to the
    /// in-memory defaults; a failed first-run write is logged and ignored.
    pub fn load_or_init() -> Config {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Config::default(),
        }
    }

    /// Load from an explicit path, writing the default file when absent.
    pub fn load_from(path: &Path) -> Config {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Err(e) = write_default(path) {
                    tracing::debug!("could not write default config to {}: {e}", path.display());
                }
                Config::default()
            }
            Err(e) => {
                tracing::debug!("config read failed for {}: {e}", path.display());
                Config::default()
            }
        }
    }

    /// Parse `key=value` lines. Unknown keys and malformed lines are
    /// ignored; any value other than `false` (case-insensitive) reads as
    /// enabled, matching earlier versions of the tool.
    pub fn parse(text: &str) -> Config {
        let mut config = Config::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = match line.split_once('=') {
                Some(kv) => kv,
                None => continue,
            };
            let enabled = !value.trim().eq_ignore_ascii_case("false");
            match key.trim() {
                "autocompact" => config.autocompact = enabled,
                "token_detail" => config.token_detail = enabled,
                "show_delta" => config.show_delta = enabled,
                "show_session" => config.show_session = enabled,
                "show_io_tokens" => config.show_io_tokens = enabled,
                _ => {}
            }
        }

        config
    }
}

/// Resolve the config file path. `CC_STATUSLINE_CONFIG` wins; otherwise
/// `~/.claude/statusline.conf` (the location the host documents).
fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CC_STATUSLINE_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".claude").join("statusline.conf"))
}

fn write_default(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_all_enabled() {
        let config = Config::default();
        assert!(config.autocompact);
        assert!(config.token_detail);
        assert!(config.show_delta);
        assert!(config.show_session);
        assert!(config.show_io_tokens);
    }

    #[test]
    fn test_default_file_round_trips_to_defaults() {
        assert_eq!(Config::parse(DEFAULT_CONFIG), Config::default());
    }

    #[test]
    fn test_parse_disables_keys() {
        let config = Config::parse("autocompact=false\nshow_delta=false\n");
        assert!(!config.autocompact);
        assert!(!config.show_delta);
        assert!(config.token_detail);
        assert!(config.show_session);
    }

    #[test]
    fn test_parse_value_case_insensitive() {
        let config = Config::parse("autocompact=FALSE\ntoken_detail=False");
        assert!(!config.autocompact);
        assert!(!config.token_detail);
    }

    #[test]
    fn test_parse_non_false_values_enable() {
        // Anything that is not "false" counts as enabled (upstream semantics).
        let config = Config::parse("autocompact=maybe\nshow_delta=1");
        assert!(config.autocompact);
        assert!(config.show_delta);
    }

    #[test]
    fn test_parse_skips_comments_and_junk() {
        let config = Config::parse(
            "# a comment\n\nshow_session = false\nnot a key value line\nunknown_key=false\n",
        );
        assert!(!config.show_session);
        assert!(config.autocompact);
    }

    #[test]
    fn test_load_from_missing_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("statusline.conf");

        let config = Config::load_from(&path);
        assert_eq!(config, Config::default());

        let written = std::fs::read_to_string(&path).expect("default file created");
        assert!(written.contains("autocompact=true"));
        assert!(written.contains("show_io_tokens=true"));
    }

    #[test]
    fn test_load_from_existing_file_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("statusline.conf");
        std::fs::write(&path, "autocompact=false\n").unwrap();

        let config = Config::load_from(&path);
        assert!(!config.autocompact);

        let kept = std::fs::read_to_string(&path).unwrap();
        assert_eq!(kept, "autocompact=false\n");
    }
}
