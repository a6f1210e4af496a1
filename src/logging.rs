//! File-backed `tracing` sink.
//!
//! Stdout belongs to the terminal while a runtime is active, so events are only
//! recorded when `STRATA_TUI_LOG` names a file.

use std::fs::OpenOptions;
use std::sync::Mutex;

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

use crate::config::EnvConfig;
use crate::error::Result;

static INSTALLED: OnceCell<bool> = OnceCell::new();

/// Install the global subscriber described by `config`.
///
/// Returns whether a sink is active. Later calls return the first outcome
/// without touching the global dispatcher again.
pub fn init(config: &EnvConfig) -> Result<bool> {
    INSTALLED.get_or_try_init(|| install(config)).copied()
}

fn install(config: &EnvConfig) -> Result<bool> {
    let Some(path) = config.log_path.as_deref() else {
        return Ok(false);
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_new(config.filter_directive())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Another subscriber may already own the global slot (host application).
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .is_ok();
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::init;
    use crate::config::EnvConfig;

    #[test]
    fn init_writes_events_to_file_and_second_call_is_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("strata.log");
        let config = EnvConfig {
            log_path: Some(path.to_string_lossy().into_owned()),
            log_level: Some("debug".to_string()),
            ..EnvConfig::default()
        };

        let first = init(&config).expect("init");
        tracing::debug!(target: "strata_tui::logging", "sink online");

        let other = EnvConfig::default();
        let second = init(&other).expect("second init");
        assert_eq!(first, second);

        if first {
            let contents = std::fs::read_to_string(&path).expect("read log");
            assert!(contents.contains("sink online"), "log was: {contents:?}");
        }
    }
}
