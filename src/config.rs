//! Environment configuration and runtime options.

use std::env;

#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub log_path: Option<String>,
    pub log_level: Option<String>,
    pub debug: bool,
    pub no_alt_screen: bool,
    pub no_default_keys: bool,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            log_path: env_string_opt("STRATA_TUI_LOG"),
            log_level: env_string_opt("STRATA_TUI_LOG_LEVEL"),
            debug: env_flag("STRATA_TUI_DEBUG"),
            no_alt_screen: env_flag("STRATA_TUI_NO_ALT_SCREEN"),
            no_default_keys: env_flag("STRATA_TUI_NO_DEFAULT_KEYS"),
        }
    }

    /// Filter directive for the log sink: explicit level, else `debug`/`info`.
    pub fn filter_directive(&self) -> String {
        match self.log_level.as_deref() {
            Some(level) => level.to_string(),
            None if self.debug => "debug".to_string(),
            None => "info".to_string(),
        }
    }
}

/// Knobs for [`crate::runtime::Runtime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Render inside the alternate screen buffer.
    pub alt_screen: bool,
    /// Enable the built-in `q`/`ctrl+c`, `t` and `a` shortcuts.
    pub default_shortcuts: bool,
    /// How long an incomplete escape tail is held before it is flushed.
    pub escape_timeout_ms: u64,
    /// Upper bound on how long the main loop sleeps before re-checking signal flags.
    pub poll_interval_ms: u64,
    /// Size used when the terminal cannot report one.
    pub fallback_size: (u16, u16),
    /// Reserve the bottom row for the status bar.
    pub status_bar: bool,
    /// Register SIGWINCH/SIGINT/SIGTERM flags on start.
    pub handle_signals: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            alt_screen: true,
            default_shortcuts: true,
            escape_timeout_ms: 10,
            poll_interval_ms: 50,
            fallback_size: (80, 24),
            status_bar: true,
            handle_signals: true,
        }
    }
}

impl RuntimeOptions {
    pub fn from_env() -> Self {
        Self::from_config(&EnvConfig::from_env())
    }

    pub fn from_config(config: &EnvConfig) -> Self {
        Self {
            alt_screen: !config.no_alt_screen,
            default_shortcuts: !config.no_default_keys,
            ..Self::default()
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{EnvConfig, RuntimeOptions};
    use std::env;
    use std::sync::{Mutex, OnceLock};

    pub(crate) struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    const KEYS: [&str; 5] = [
        "STRATA_TUI_LOG",
        "STRATA_TUI_LOG_LEVEL",
        "STRATA_TUI_DEBUG",
        "STRATA_TUI_NO_ALT_SCREEN",
        "STRATA_TUI_NO_DEFAULT_KEYS",
    ];

    #[test]
    fn env_defaults_are_off() {
        let _lock = env_lock();
        let _guards: Vec<_> = KEYS.iter().map(|key| set_env_guard(key, None)).collect();

        let config = EnvConfig::from_env();
        assert!(config.log_path.is_none());
        assert!(config.log_level.is_none());
        assert!(!config.debug);
        assert!(!config.no_alt_screen);
        assert!(!config.no_default_keys);
        assert_eq!(config.filter_directive(), "info");
    }

    #[test]
    fn env_flags_set_to_one_enable() {
        let _lock = env_lock();
        let _g1 = set_env_guard("STRATA_TUI_LOG", Some("/tmp/strata.log"));
        let _g2 = set_env_guard("STRATA_TUI_LOG_LEVEL", None);
        let _g3 = set_env_guard("STRATA_TUI_DEBUG", Some("1"));
        let _g4 = set_env_guard("STRATA_TUI_NO_ALT_SCREEN", Some("1"));
        let _g5 = set_env_guard("STRATA_TUI_NO_DEFAULT_KEYS", Some("1"));

        let config = EnvConfig::from_env();
        assert_eq!(config.log_path.as_deref(), Some("/tmp/strata.log"));
        assert!(config.debug);
        assert_eq!(config.filter_directive(), "debug");

        let options = RuntimeOptions::from_config(&config);
        assert!(!options.alt_screen);
        assert!(!options.default_shortcuts);
        assert_eq!(options.escape_timeout_ms, 10);
    }

    #[test]
    fn flags_other_than_one_are_ignored() {
        let _lock = env_lock();
        let _g = set_env_guard("STRATA_TUI_NO_ALT_SCREEN", Some("true"));
        assert!(!EnvConfig::from_env().no_alt_screen);
    }

    #[test]
    fn blank_strings_are_ignored_and_level_wins_over_debug() {
        let _lock = env_lock();
        let _g1 = set_env_guard("STRATA_TUI_LOG", Some("  "));
        let _g2 = set_env_guard("STRATA_TUI_LOG_LEVEL", Some("strata_tui=trace"));
        let _g3 = set_env_guard("STRATA_TUI_DEBUG", Some("1"));

        let config = EnvConfig::from_env();
        assert!(config.log_path.is_none());
        assert_eq!(config.filter_directive(), "strata_tui=trace");
    }

    #[test]
    fn default_options_match_documented_values() {
        let options = RuntimeOptions::default();
        assert!(options.alt_screen);
        assert!(options.default_shortcuts);
        assert_eq!(options.poll_interval_ms, 50);
        assert_eq!(options.fallback_size, (80, 24));
        assert!(options.status_bar);
    }
}
