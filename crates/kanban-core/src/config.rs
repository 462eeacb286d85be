use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BOARDS_DIR: &str = "boards";
pub const DEFAULT_ASSET_URL_PREFIX: &str = "uploads";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;
pub const DEFAULT_AVATAR_URL_TEMPLATE: &str =
    "https://trello-members.s3.amazonaws.com/{id}/{hash}/170.png";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub boards_dir: Option<PathBuf>,
    #[serde(default)]
    pub asset_url_prefix: Option<String>,
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,
    #[serde(default)]
    pub fetch_concurrency: Option<usize>,
    #[serde(default)]
    pub avatar_url_template: Option<String>,
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            dirs::home_dir().map(|home| home.join(".config/kanban/config.toml"))
        }
        #[cfg(target_os = "linux")]
        {
            dirs::config_dir().map(|config| config.join("kanban/config.toml"))
        }
        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map(|config| config.join("kanban\\config.toml"))
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }

    /// Load the user config file, then apply `KANBAN_BOARDS_DIR`.
    pub fn load() -> Self {
        let mut config = Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default();
        if let Ok(dir) = std::env::var("KANBAN_BOARDS_DIR") {
            if !dir.is_empty() {
                config.boards_dir = Some(PathBuf::from(dir));
            }
        }
        config
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Ignoring malformed config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Could not read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn with_boards_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.boards_dir = Some(dir.into());
        self
    }

    pub fn effective_boards_dir(&self) -> PathBuf {
        self.boards_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BOARDS_DIR))
    }

    pub fn effective_asset_url_prefix(&self) -> &str {
        self.asset_url_prefix
            .as_deref()
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_ASSET_URL_PREFIX)
    }

    pub fn effective_fetch_timeout(&self) -> Duration {
        Duration::from_secs(
            self.fetch_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
        )
    }

    pub fn effective_fetch_concurrency(&self) -> usize {
        self.fetch_concurrency
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_FETCH_CONCURRENCY)
    }

    pub fn effective_avatar_url_template(&self) -> &str {
        self.avatar_url_template
            .as_deref()
            .unwrap_or(DEFAULT_AVATAR_URL_TEMPLATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.effective_boards_dir(), PathBuf::from("boards"));
        assert_eq!(config.effective_asset_url_prefix(), "uploads");
        assert_eq!(config.effective_fetch_timeout(), Duration::from_secs(30));
        assert_eq!(config.effective_fetch_concurrency(), 4);
        assert!(config.effective_avatar_url_template().contains("{hash}"));
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "boards_dir = \"/srv/boards\"\nasset_url_prefix = \"/files/\"\nfetch_timeout_secs = 5\nfetch_concurrency = 0\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.effective_boards_dir(), PathBuf::from("/srv/boards"));
        assert_eq!(config.effective_asset_url_prefix(), "files");
        assert_eq!(config.effective_fetch_timeout(), Duration::from_secs(5));
        // zero workers would stall every fetch
        assert_eq!(config.effective_fetch_concurrency(), 4);
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "boards_dir = [not toml").unwrap();

        let config = AppConfig::load_from(&path);
        assert!(config.boards_dir.is_none());
    }

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml"));
        assert!(config.boards_dir.is_none());
    }
}
