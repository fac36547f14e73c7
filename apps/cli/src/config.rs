use std::{collections::HashMap, fs, path::Path, time::Duration};

use client_core::{capped_list_limit, BookingSettings};

pub const DEFAULT_CONFIG_PATH: &str = "taller.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: String,
    pub anon_key: String,
    pub request_timeout_ms: u64,
    pub ready_timeout_ms: u64,
    pub list_limit: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:54321".into(),
            anon_key: String::new(),
            request_timeout_ms: 15_000,
            ready_timeout_ms: 3_000,
            list_limit: 50,
        }
    }
}

impl Settings {
    pub fn booking(&self) -> BookingSettings {
        BookingSettings {
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            ready_timeout: Duration::from_millis(self.ready_timeout_ms),
            list_limit: capped_list_limit(self.list_limit),
        }
    }
}

pub fn load_settings(config_path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            apply_file(&mut settings, &file_cfg);
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings.backend_url = normalize_backend_url(&settings.backend_url);
    settings
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, toml::Value>) {
    let text = |key: &str| match file_cfg.get(key) {
        Some(toml::Value::String(v)) => Some(v.clone()),
        Some(toml::Value::Integer(v)) => Some(v.to_string()),
        _ => None,
    };

    if let Some(v) = text("backend_url") {
        settings.backend_url = v;
    }
    if let Some(v) = text("anon_key") {
        settings.anon_key = v;
    }
    set_parsed(&mut settings.request_timeout_ms, text("request_timeout_ms"));
    set_parsed(&mut settings.ready_timeout_ms, text("ready_timeout_ms"));
    set_parsed(&mut settings.list_limit, text("list_limit"));
}

pub(crate) fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("SUPABASE_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = var("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Some(v) = var("SUPABASE_ANON_KEY") {
        settings.anon_key = v;
    }
    if let Some(v) = var("APP__ANON_KEY") {
        settings.anon_key = v;
    }

    set_parsed(&mut settings.request_timeout_ms, var("APP__REQUEST_TIMEOUT_MS"));
    set_parsed(&mut settings.ready_timeout_ms, var("APP__READY_TIMEOUT_MS"));
    set_parsed(&mut settings.list_limit, var("APP__LIST_LIMIT"));
}

fn set_parsed<T: std::str::FromStr>(target: &mut T, raw: Option<String>) {
    if let Some(parsed) = raw.and_then(|v| v.trim().parse::<T>().ok()) {
        *target = parsed;
    }
}

pub(crate) fn normalize_backend_url(raw_backend_url: &str) -> String {
    let raw_backend_url = raw_backend_url.trim();

    if raw_backend_url.is_empty() {
        return Settings::default().backend_url;
    }

    let url = if raw_backend_url.contains("://") {
        raw_backend_url.to_string()
    } else {
        format!("https://{raw_backend_url}")
    };

    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
