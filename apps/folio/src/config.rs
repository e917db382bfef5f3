use std::{fs, path::Path};

use anyhow::Context;
use offline_cache::{config::DEFAULT_CACHE_NAME, DispatcherConfig};
use serde::Deserialize;
use tracing::warn;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Site scope the dispatcher controls, e.g. `https://example.github.io/`.
    pub origin: Option<String>,
    pub cache_name: String,
    pub database_url: String,
    /// Overrides the built-in precache list; paths resolve against `origin`.
    pub manifest: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            origin: None,
            cache_name: DEFAULT_CACHE_NAME.into(),
            database_url: "sqlite://./data/folio.db".into(),
            manifest: None,
        }
    }
}

impl Settings {
    /// Dispatcher configuration for `scope`, carrying this file's cache name and
    /// manifest.
    pub fn dispatcher_config(&self, scope: Url) -> anyhow::Result<DispatcherConfig> {
        let config = DispatcherConfig::new(scope)
            .context("invalid site scope")?
            .with_cache_name(self.cache_name.clone());
        match &self.manifest {
            Some(paths) => config
                .with_manifest(paths.iter().map(String::as_str))
                .context("invalid manifest entry"),
            None => Ok(config),
        }
    }

    pub fn origin_url(&self) -> anyhow::Result<Option<Url>> {
        self.origin
            .as_deref()
            .map(|origin| Url::parse(origin).with_context(|| format!("invalid origin '{origin}'")))
            .transpose()
    }
}

/// Loads `path` if it exists, then applies environment overrides.
pub fn load_settings(path: &Path) -> Settings {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => match toml::from_str::<Settings>(&raw) {
            Ok(settings) => settings,
            Err(error) => {
                warn!(path = %path.display(), %error, "config: ignoring unreadable settings file");
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    };
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

/// Applies `FOLIO_*` then `APP__*` overrides; the `APP__` form wins.
pub fn apply_env_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("FOLIO_ORIGIN") {
        settings.origin = Some(v);
    }
    if let Some(v) = var("APP__ORIGIN") {
        settings.origin = Some(v);
    }

    if let Some(v) = var("FOLIO_CACHE_NAME") {
        settings.cache_name = v;
    }
    if let Some(v) = var("APP__CACHE_NAME") {
        settings.cache_name = v;
    }

    if let Some(v) = var("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = var("APP__DATABASE_URL") {
        settings.database_url = v;
    }
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    let path = raw_database_url
        .strip_prefix("sqlite:")
        .unwrap_or(raw_database_url)
        .replace('\\', "/");
    format!("sqlite://{path}")
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
