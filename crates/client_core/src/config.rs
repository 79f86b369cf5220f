use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use tracing::warn;

pub const SETTINGS_FILE: &str = "sporecheck.toml";
pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub service_url: String,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    service_url: Option<String>,
    request_timeout_ms: Option<u64>,
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |name| std::env::var(name).ok())
}

/// Defaults, then `path` (if readable), then the environment.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.service_url {
                    settings.service_url = v;
                }
                match file_cfg.request_timeout_ms {
                    Some(0) => warn!("ignoring zero request_timeout_ms in {}", path.display()),
                    Some(v) => settings.request_timeout = Duration::from_millis(v),
                    None => {}
                }
            }
            Err(err) => warn!("ignoring unreadable settings file {}: {err}", path.display()),
        }
    }

    if let Some(v) = non_empty(env("SPORECHECK_SERVICE_URL")) {
        settings.service_url = v;
    }
    if let Some(v) = non_empty(env("APP__SERVICE_URL")) {
        settings.service_url = v;
    }

    if let Some(v) = non_empty(env("APP__REQUEST_TIMEOUT_MS")) {
        match v.parse::<u64>() {
            Ok(parsed) if parsed > 0 => settings.request_timeout = Duration::from_millis(parsed),
            Ok(_) => warn!("ignoring zero APP__REQUEST_TIMEOUT_MS"),
            Err(_) => warn!("ignoring non-numeric APP__REQUEST_TIMEOUT_MS={v}"),
        }
    }

    settings
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
