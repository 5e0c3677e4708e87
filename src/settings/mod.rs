//! Client-local settings and the session-scoped cache
//!
//! `SettingsStore` is the single owner of the persisted reading level and
//! the "pretest completed" flag. It loads once on start and writes the file
//! on every change; nothing expires.

use std::path::{Path, PathBuf};

use ahash::AHashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::Level;

/// Persisted key-value settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "literacyLevel", default, skip_serializing_if = "Option::is_none")]
    pub literacy_level: Option<Level>,

    #[serde(rename = "literacyTestCompleted", default, skip_serializing_if = "is_false")]
    pub literacy_test_completed: bool,

    #[serde(rename = "sessionId", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Process-wide settings service, injected into every reader and writer
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    settings: Settings,
}

impl SettingsStore {
    /// Settings that live only as long as this value
    pub fn in_memory() -> Self {
        Self {
            path: None,
            settings: Settings::default(),
        }
    }

    /// Load settings from `path`; a missing file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };
        tracing::debug!(?settings, "loaded settings from {}", path.display());
        Ok(Self {
            path: Some(path),
            settings,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn literacy_level(&self) -> Option<Level> {
        self.settings.literacy_level
    }

    /// Stored level, or beginner when no level was ever recorded
    pub fn level_or_default(&self) -> Level {
        self.settings.literacy_level.unwrap_or(Level::Beginner)
    }

    pub fn test_completed(&self) -> bool {
        self.settings.literacy_test_completed
    }

    /// Record a level from the pretest or from direct selection.
    ///
    /// Both paths mark the pretest as completed.
    pub fn record_level(&mut self, level: Level) -> Result<()> {
        self.settings.literacy_level = Some(level);
        self.settings.literacy_test_completed = true;
        tracing::info!("literacy level set to {}", level);
        self.persist()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.settings.session_id.as_deref()
    }

    pub fn set_session_id(&mut self, id: &str) -> Result<()> {
        self.settings.session_id = Some(id.to_string());
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string(&self.settings)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Session-scoped cache of serialized values keyed by a fixed tag
#[derive(Debug, Default)]
pub struct SessionCache {
    entries: AHashMap<String, String>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `tag`; an entry that no longer deserializes is a miss
    pub fn get<T: DeserializeOwned>(&self, tag: &str) -> Option<T> {
        let raw = self.entries.get(tag)?;
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("dropping unreadable cache entry {}: {}", tag, e);
                None
            }
        }
    }

    pub fn put<T: Serialize>(&mut self, tag: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.entries.insert(tag.to_string(), raw);
        Ok(())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// End of session
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_level_marks_completed() {
        let mut store = SettingsStore::in_memory();
        assert!(!store.test_completed());
        assert_eq!(store.level_or_default(), Level::Beginner);

        store.record_level(Level::Advanced).unwrap();
        assert!(store.test_completed());
        assert_eq!(store.literacy_level(), Some(Level::Advanced));
    }

    #[test]
    fn test_settings_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut store = SettingsStore::open(&path).unwrap();
        store.record_level(Level::Intermediate).unwrap();

        let reopened = SettingsStore::open(&path).unwrap();
        assert_eq!(reopened.literacy_level(), Some(Level::Intermediate));
        assert!(reopened.test_completed());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("literacyLevel = \"intermediate\""));
        assert!(raw.contains("literacyTestCompleted = true"));
    }

    #[test]
    fn test_unset_flag_is_not_written() {
        let raw = toml::to_string(&Settings::default()).unwrap();
        assert!(!raw.contains("literacyTestCompleted"));
    }

    #[test]
    fn test_session_cache_round_trip_and_clear() {
        let mut cache = SessionCache::new();
        cache.put("literacy_quiz_v1", &vec![1, 2, 3]).unwrap();
        let cached: Option<Vec<u32>> = cache.get("literacy_quiz_v1");
        assert_eq!(cached, Some(vec![1, 2, 3]));

        cache.clear();
        assert!(!cache.contains("literacy_quiz_v1"));
    }
}
