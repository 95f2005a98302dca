use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::blocking::DEFAULT_BLOCKED_APPS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            user_id: "local-user".into(),
            display_name: "You".into(),
        }
    }
}

/// Values substituted when a form field does not parse as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputDefaults {
    pub task_minutes: u32,
    pub group_goal_minutes: u32,
    pub group_max_members: u32,
}

impl Default for InputDefaults {
    fn default() -> Self {
        Self {
            task_minutes: 30,
            group_goal_minutes: 60,
            group_max_members: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserSettings {
    profile: UserProfile,
    blocked_apps: Vec<String>,
    defaults: InputDefaults,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            profile: UserProfile::default(),
            blocked_apps: DEFAULT_BLOCKED_APPS.iter().map(|app| app.to_string()).collect(),
            defaults: InputDefaults::default(),
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable settings at {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn profile(&self) -> UserProfile {
        self.data.read().unwrap_or_else(PoisonError::into_inner).profile.clone()
    }

    pub fn blocked_apps(&self) -> Vec<String> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .blocked_apps
            .clone()
    }

    pub fn defaults(&self) -> InputDefaults {
        self.data.read().unwrap_or_else(PoisonError::into_inner).defaults
    }

    pub fn update_profile(&self, profile: UserProfile) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        guard.profile = profile;
        self.persist(&guard)
    }

    pub fn update_blocked_apps(&self, blocked_apps: Vec<String>) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        guard.blocked_apps = blocked_apps;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("focusboard-settings-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let store = SettingsStore::new(scratch_path()).unwrap();
        assert_eq!(store.profile(), UserProfile::default());
        assert_eq!(store.defaults().task_minutes, 30);
        assert_eq!(store.blocked_apps().len(), DEFAULT_BLOCKED_APPS.len());
    }

    #[test]
    fn updates_survive_reload() {
        let path = scratch_path();
        let store = SettingsStore::new(path.clone()).unwrap();
        store
            .update_profile(UserProfile {
                user_id: "u42".into(),
                display_name: "Sam".into(),
            })
            .unwrap();
        store.update_blocked_apps(vec!["com.example.game".into()]).unwrap();

        let reloaded = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(reloaded.profile().user_id, "u42");
        assert_eq!(reloaded.blocked_apps(), vec!["com.example.game".to_string()]);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn partial_and_corrupt_files_fall_back() {
        let path = scratch_path();
        fs::write(&path, r#"{"profile":{"userId":"u7","displayName":"Kim"}}"#).unwrap();
        let partial = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(partial.profile().user_id, "u7");
        assert_eq!(partial.defaults(), InputDefaults::default());

        fs::write(&path, "{ nope").unwrap();
        let corrupt = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(corrupt.profile(), UserProfile::default());
        let _ = fs::remove_file(path);
    }
}
