use std::env;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MedX";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_DB_PATH: &str = "medx.db";
const DEFAULT_LOG_FILE: &str = "medx.log";
const DEFAULT_TRIAGE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TRIAGE_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_TRIAGE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TICK_RATE_HZ: u32 = 30;
const MAX_TICK_RATE_HZ: u32 = 240;

/// Filter used when `MEDX_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medx=info"
}

/// Runtime settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite file holding session and access-code records (`MEDX_DB_PATH`).
    pub db_path: PathBuf,
    /// Where tracing output goes (`MEDX_LOG_FILE`); the terminal belongs to the UI.
    pub log_file: PathBuf,
    /// `EnvFilter` directives (`MEDX_LOG`).
    pub log_filter: String,
    /// Generative-language API key (`GEMINI_API_KEY`, then `API_KEY`). Empty means every
    /// triage request falls back to the default advice.
    pub triage_api_key: String,
    pub triage_base_url: String,
    pub triage_model: String,
    pub triage_timeout_secs: u64,
    /// Refuse a sign-in while the account is marked active elsewhere (`MEDX_SINGLE_SESSION`).
    pub single_session: bool,
    /// UI ticks per second (`MEDX_TICK_RATE`, 1 to 240). Ticks drive redraws, notice
    /// timeouts and triage polling.
    pub tick_rate_hz: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            log_filter: default_log_filter().to_string(),
            triage_api_key: String::new(),
            triage_base_url: DEFAULT_TRIAGE_URL.to_string(),
            triage_model: DEFAULT_TRIAGE_MODEL.to_string(),
            triage_timeout_secs: DEFAULT_TRIAGE_TIMEOUT_SECS,
            single_session: true,
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
        }
    }
}

impl AppConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            db_path: get("MEDX_DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path),
            log_file: get("MEDX_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
            log_filter: get("MEDX_LOG").unwrap_or(defaults.log_filter),
            triage_api_key: get("GEMINI_API_KEY")
                .or_else(|| get("API_KEY"))
                .unwrap_or(defaults.triage_api_key),
            triage_base_url: get("MEDX_TRIAGE_URL").unwrap_or(defaults.triage_base_url),
            triage_model: get("MEDX_TRIAGE_MODEL").unwrap_or(defaults.triage_model),
            triage_timeout_secs: get("MEDX_TRIAGE_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.triage_timeout_secs),
            single_session: get("MEDX_SINGLE_SESSION")
                .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
                .unwrap_or(defaults.single_session),
            tick_rate_hz: get("MEDX_TICK_RATE")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .map(|hz| hz.clamp(1, MAX_TICK_RATE_HZ))
                .unwrap_or(defaults.tick_rate_hz),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(config_from(&[]), AppConfig::default());
    }

    #[test]
    fn gemini_key_wins_over_generic_key() {
        let config = config_from(&[("API_KEY", "generic"), ("GEMINI_API_KEY", "gemini")]);
        assert_eq!(config.triage_api_key, "gemini");

        let config = config_from(&[("API_KEY", "generic")]);
        assert_eq!(config.triage_api_key, "generic");
    }

    #[test]
    fn bad_timeout_falls_back_to_default() {
        let config = config_from(&[("MEDX_TRIAGE_TIMEOUT_SECS", "soon")]);
        assert_eq!(config.triage_timeout_secs, DEFAULT_TRIAGE_TIMEOUT_SECS);

        let config = config_from(&[("MEDX_TRIAGE_TIMEOUT_SECS", " 5 ")]);
        assert_eq!(config.triage_timeout_secs, 5);
    }

    #[test]
    fn single_session_can_be_switched_off() {
        assert!(!config_from(&[("MEDX_SINGLE_SESSION", "off")]).single_session);
        assert!(!config_from(&[("MEDX_SINGLE_SESSION", "0")]).single_session);
        assert!(config_from(&[("MEDX_SINGLE_SESSION", "yes")]).single_session);
    }

    #[test]
    fn tick_rate_is_clamped() {
        assert_eq!(config_from(&[("MEDX_TICK_RATE", "60")]).tick_rate_hz, 60);
        assert_eq!(config_from(&[("MEDX_TICK_RATE", "0")]).tick_rate_hz, 1);
        assert_eq!(config_from(&[("MEDX_TICK_RATE", "10000")]).tick_rate_hz, 240);
        assert_eq!(config_from(&[("MEDX_TICK_RATE", "fast")]).tick_rate_hz, 30);
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = config_from(&[("MEDX_DB_PATH", "  "), ("MEDX_LOG", "")]);
        assert_eq!(config.db_path, PathBuf::from("medx.db"));
        assert_eq!(config.log_filter, "medx=info");
    }

    #[test]
    fn app_name_is_medx() {
        assert_eq!(APP_NAME, "MedX");
    }
}
