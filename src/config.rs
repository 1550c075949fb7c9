//! Environment configuration.

use std::env;

pub const DEFAULT_TICK_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Path of the debug log sink; unset disables logging entirely.
    pub debug_log: Option<String>,
    /// Log per-frame diff statistics to the debug log.
    pub debug_frames: bool,
    /// Skip mouse reporting; the toolkit becomes keyboard-only.
    pub no_mouse: bool,
    /// Stay on the primary screen buffer instead of the alternate one.
    pub no_alt_screen: bool,
    /// Period of the hover/blink tick thread in milliseconds.
    pub tick_ms: u64,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            debug_log: env_string_opt("CEL_DEBUG_LOG"),
            debug_frames: env_flag("CEL_DEBUG_FRAMES"),
            no_mouse: env_flag("CEL_NO_MOUSE"),
            no_alt_screen: env_flag("CEL_NO_ALT_SCREEN"),
            tick_ms: env_u64("CEL_TICK_MS", DEFAULT_TICK_MS),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            debug_log: None,
            debug_frames: false,
            no_mouse: false,
            no_alt_screen: false,
            tick_ms: DEFAULT_TICK_MS,
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .filter(|&value| value > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::{EnvConfig, DEFAULT_TICK_MS};
    use std::env;
    use std::sync::{Mutex, OnceLock};

    struct EnvGuard {
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

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn env_defaults() {
        let _lock = env_lock();
        let _g1 = set_env_guard("CEL_DEBUG_LOG", None);
        let _g2 = set_env_guard("CEL_DEBUG_FRAMES", None);
        let _g3 = set_env_guard("CEL_NO_MOUSE", None);
        let _g4 = set_env_guard("CEL_NO_ALT_SCREEN", None);
        let _g5 = set_env_guard("CEL_TICK_MS", None);

        let config = EnvConfig::from_env();
        assert!(config.debug_log.is_none());
        assert!(!config.debug_frames);
        assert!(!config.no_mouse);
        assert!(!config.no_alt_screen);
        assert_eq!(config.tick_ms, DEFAULT_TICK_MS);
    }

    #[test]
    fn env_flags_set_to_one_enable() {
        let _lock = env_lock();
        let _g1 = set_env_guard("CEL_DEBUG_LOG", Some("/tmp/cel.log"));
        let _g2 = set_env_guard("CEL_DEBUG_FRAMES", Some("1"));
        let _g3 = set_env_guard("CEL_NO_MOUSE", Some("1"));
        let _g4 = set_env_guard("CEL_NO_ALT_SCREEN", Some("1"));
        let _g5 = set_env_guard("CEL_TICK_MS", Some("250"));

        let config = EnvConfig::from_env();
        assert_eq!(config.debug_log.as_deref(), Some("/tmp/cel.log"));
        assert!(config.debug_frames);
        assert!(config.no_mouse);
        assert!(config.no_alt_screen);
        assert_eq!(config.tick_ms, 250);
    }

    #[test]
    fn blank_and_zero_values_fall_back() {
        let _lock = env_lock();
        let _g1 = set_env_guard("CEL_DEBUG_LOG", Some("   "));
        let _g2 = set_env_guard("CEL_TICK_MS", Some("0"));
        let config = EnvConfig::from_env();
        assert!(config.debug_log.is_none());
        assert_eq!(config.tick_ms, DEFAULT_TICK_MS);
    }
}
