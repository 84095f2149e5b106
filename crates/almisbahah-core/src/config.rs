//! Agent configuration management.
//!
//! The configuration holds everything the agent treats as deploy-time
//! constants: the origin, the cache generation name, the asset manifest, the
//! reminder schedule and the notification template. It is immutable once an
//! [`crate::Agent`] is built from it.
//!
//! Configuration is stored at `~/.config/almisbahah/config.json`. Missing
//! fields take the defaults of the deployed worker.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::{ReminderSchedule, ReminderTime};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "almisbahah";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Increment when cached files change significantly.
const DEFAULT_CACHE_NAME: &str = "almisbahah-cache-v2";

const DEFAULT_ORIGIN: &str = "http://localhost:8080";

const DEFAULT_REMINDER_TAG: &str = "dhikr-reminder";

/// Minutes after a reminder time during which a wake still counts.
const DEFAULT_REMINDER_WINDOW_MINUTES: u32 = 20;

const MINUTES_PER_DAY: u32 = 24 * 60;

const DEFAULT_ASSETS: &[&str] = &[
    "/",
    "index.html",
    "manifest.json",
    "icons/icon-192x192.png",
    "icons/icon-512x512.png",
    "icons/whatsapp-icon.png",
    "icons/telegram-icon.png",
    "icons/copy-link-icon.png",
];

const DEFAULT_ICON: &str = "/icons/icon-192x192.png";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("origin is not a valid absolute URL: {0}")]
    InvalidOrigin(String),

    #[error("cache name must not be empty")]
    EmptyCacheName,

    #[error("asset manifest must not be empty")]
    EmptyManifest,

    #[error("reminder {index} has invalid time {hour}:{minute:02}")]
    InvalidReminder { index: usize, hour: u8, minute: u8 },

    #[error("reminder window must be at least one minute")]
    ZeroWindow,

    #[error("reminder window of {0} minutes must be shorter than a day")]
    WindowTooLong(u32),
}

/// Display template for reminder notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationTemplate {
    /// `{label}` is replaced with the matched reminder's label.
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    /// Page opened when the notification is clicked, relative to the origin.
    pub start_path: String,
}

impl Default for NotificationTemplate {
    fn default() -> Self {
        Self {
            title: "تذكير {label}: حان وقت الأذكار".to_string(),
            body: "لا تنسَ أذكار الصباح/المساء أو الأذكار التي اعتدت عليها باستخدام المسبحة."
                .to_string(),
            icon: DEFAULT_ICON.to_string(),
            badge: DEFAULT_ICON.to_string(),
            vibrate: vec![100, 50, 100],
            start_path: "/index.html".to_string(),
        }
    }
}

impl NotificationTemplate {
    pub fn title_for(&self, reminder: &ReminderTime) -> String {
        self.title.replace("{label}", &reminder.label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub origin: String,
    pub cache_name: String,
    pub assets: Vec<String>,
    pub reminder_tag: String,
    pub reminder_window_minutes: u32,
    pub reminders: Vec<ReminderTime>,
    pub notification: NotificationTemplate,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            assets: DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect(),
            reminder_tag: DEFAULT_REMINDER_TAG.to_string(),
            reminder_window_minutes: DEFAULT_REMINDER_WINDOW_MINUTES,
            reminders: vec![
                ReminderTime::new(8, 0, "الصباح"),
                ReminderTime::new(14, 0, "بعد الظهر"),
                ReminderTime::new(18, 0, "المساء"),
                ReminderTime::new(21, 0, "بعد العشاء"),
            ],
            notification: NotificationTemplate::default(),
        }
    }
}

impl AgentConfig {
    /// Load from the default location, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the on-disk cache generations.
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.origin_url()?;
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::EmptyCacheName);
        }
        if self.assets.is_empty() {
            return Err(ConfigError::EmptyManifest);
        }
        if self.reminder_window_minutes == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.reminder_window_minutes >= MINUTES_PER_DAY {
            return Err(ConfigError::WindowTooLong(self.reminder_window_minutes));
        }
        if let Some((index, reminder)) = self
            .reminders
            .iter()
            .enumerate()
            .find(|(_, r)| !r.is_valid())
        {
            return Err(ConfigError::InvalidReminder {
                index,
                hour: reminder.hour,
                minute: reminder.minute,
            });
        }
        Ok(())
    }

    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url =
            Url::parse(&self.origin).map_err(|_| ConfigError::InvalidOrigin(self.origin.clone()))?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidOrigin(self.origin.clone()));
        }
        Ok(url)
    }

    pub fn schedule(&self) -> ReminderSchedule {
        ReminderSchedule::new(self.reminders.clone(), self.reminder_window_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preset() {
        let config = AgentConfig::default();
        assert_eq!(config.cache_name, "almisbahah-cache-v2");
        assert_eq!(config.assets.len(), 8);
        assert_eq!(config.assets[0], "/");
        assert_eq!(config.reminders.len(), 4);
        assert_eq!(config.reminder_window_minutes, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AgentConfig = serde_json::from_str(
            r#"{ "cache_name": "almisbahah-cache-v3", "reminders": [{ "hour": 6, "minute": 30, "label": "الفجر" }] }"#,
        )
        .unwrap();
        assert_eq!(config.cache_name, "almisbahah-cache-v3");
        assert_eq!(config.reminders, vec![ReminderTime::new(6, 30, "الفجر")]);
        assert_eq!(config.reminder_tag, "dhikr-reminder");
        assert_eq!(config.notification.vibrate, vec![100, 50, 100]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AgentConfig::default();
        config.origin = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidOrigin(_))));

        let mut config = AgentConfig::default();
        config.cache_name = "  ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptyCacheName));

        let mut config = AgentConfig::default();
        config.assets.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyManifest));

        let mut config = AgentConfig::default();
        config.reminder_window_minutes = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroWindow));

        let mut config = AgentConfig::default();
        config.reminder_window_minutes = u32::MAX;
        assert_eq!(config.validate(), Err(ConfigError::WindowTooLong(u32::MAX)));

        let mut config = AgentConfig::default();
        config.reminder_window_minutes = 1439;
        assert_eq!(config.validate(), Ok(()));

        let mut config = AgentConfig::default();
        config.reminders.push(ReminderTime::new(25, 0, "bad"));
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidReminder {
                index: 4,
                hour: 25,
                minute: 0
            })
        );
    }

    #[test]
    fn test_title_template() {
        let template = NotificationTemplate::default();
        let title = template.title_for(&ReminderTime::new(18, 0, "المساء"));
        assert_eq!(title, "تذكير المساء: حان وقت الأذكار");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let mut config = AgentConfig::default();
        config.origin = "https://misbaha.example".to_string();

        config.save_to(&path).unwrap();
        let loaded = AgentConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
