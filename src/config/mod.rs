//! Configuration loading and persistence.
//!
//! One TOML file under the platform config directory. A missing file is
//! seeded with the defaults on first load so the user has something to
//! edit; a seed-write failure is logged and the defaults are used anyway.

pub mod model;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

pub use model::AppConfig;

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nullchat")
        .join("config.toml")
}

pub fn load_config() -> Result<AppConfig> {
    load_from(&config_path())
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    save_to(config, &config_path())
}

fn load_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        let config = AppConfig::default();
        if let Err(e) = save_to(&config, path) {
            warn!("Failed to write default config: {e:#}");
        }
        return Ok(config);
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config at {}", path.display()))?;
    Ok(config)
}

fn save_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(tag: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "nullchat-config-{tag}-{}",
                std::process::id()
            ));
            let _ = std::fs::remove_dir_all(&dir);
            Self(dir)
        }

        fn path(&self) -> PathBuf {
            self.0.join("config.toml")
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn first_load_seeds_the_file_with_defaults() {
        let dir = TempDir::new("seed");
        let config = load_from(&dir.path()).unwrap();
        assert_eq!(config.behavior.history_limit, 50);
        assert!(dir.path().exists());

        let reread = load_from(&dir.path()).unwrap();
        assert_eq!(reread.gateway.http_url, config.gateway.http_url);
    }

    #[test]
    fn saved_values_survive_a_reload() {
        let dir = TempDir::new("roundtrip");
        let mut config = AppConfig::default();
        config.behavior.history_limit = 25;
        config.behavior.fallback_auto_join = vec!["#lobby".into()];
        save_to(&config, &dir.path()).unwrap();

        let loaded = load_from(&dir.path()).unwrap();
        assert_eq!(loaded.behavior.history_limit, 25);
        assert_eq!(loaded.behavior.fallback_auto_join, ["#lobby"]);
    }

    #[test]
    fn malformed_file_is_an_error_not_a_default() {
        let dir = TempDir::new("malformed");
        std::fs::create_dir_all(&dir.0).unwrap();
        std::fs::write(dir.path(), "not = [valid").unwrap();
        assert!(load_from(&dir.path()).is_err());
    }

    #[test]
    fn partial_file_fills_missing_sections_with_defaults() {
        let dir = TempDir::new("partial");
        std::fs::create_dir_all(&dir.0).unwrap();
        std::fs::write(dir.path(), "[behavior]\nhistory_limit = 10\n").unwrap();
        let config = load_from(&dir.path()).unwrap();
        assert_eq!(config.behavior.history_limit, 10);
        assert_eq!(config.gateway.http_url, "http://127.0.0.1:4000");
        assert!(config.notifications.enabled);
    }
}
