use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::alerts::NotificationState;

pub const KEY_HASH_CODE: &str = "hashcode";
pub const KEY_ALLOWANCE: &str = "allowance";
pub const KEY_LAST_NOTIFIED_THRESHOLD: &str = "last_notified_threshold";
pub const KEY_LAST_NOTIFIED_PERIOD: &str = "last_notified_period";
pub const KEY_LAST_CHECKED: &str = "last_checked";

const SETTINGS_FILENAME: &str = "settings.toml";

/// Persistent flat key/value store, saved to disk on every write
pub struct SettingsStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Values hold the account hash code
        f.debug_struct("SettingsStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SettingsStore {
    /// Open the store at `path`; a missing file is an empty store
    pub fn open(path: &Path) -> Result<Self> {
        let entries = read_entries(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        })
    }

    /// Path of the store inside the application config directory
    pub fn default_path(config_dir: &Path) -> PathBuf {
        config_dir.join(SETTINGS_FILENAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a setting; blank values count as absent
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.reload()?;
        Ok(entries
            .get(key)
            .filter(|value| !value.trim().is_empty())
            .cloned())
    }

    /// Save a new setting, or update an existing one
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.reload()?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.reload()?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    pub fn entries(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.reload()?.clone())
    }

    pub fn hash_code(&self) -> Result<Option<String>> {
        self.get(KEY_HASH_CODE)
    }

    /// Allowance in GB; a stored value that is not a positive number is an error
    pub fn allowance(&self) -> Result<Option<f64>> {
        match self.get(KEY_ALLOWANCE)? {
            Some(raw) => {
                let value = raw
                    .trim()
                    .trim_end_matches("GB")
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("Invalid allowance in settings: {}", raw))?;
                validate_allowance(value)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub fn set_allowance(&self, allowance_gib: f64) -> Result<()> {
        validate_allowance(allowance_gib)?;
        self.set(KEY_ALLOWANCE, &allowance_gib.to_string())
    }

    /// Threshold de-duplication state; unreadable values reset to "nothing notified"
    pub fn notification_state(&self) -> Result<NotificationState> {
        let entries = self.reload()?;
        Ok(notification_state_from(&entries))
    }

    pub fn set_notification_state(&self, state: &NotificationState) -> Result<()> {
        let mut entries = self.reload()?;
        insert_notification_state(&mut entries, state);
        self.persist(&entries)
    }

    /// Read, modify and write the notification state under one lock.
    /// The file is only rewritten when `update` changed the state.
    pub fn update_notification_state<R>(
        &self,
        update: impl FnOnce(&mut NotificationState) -> R,
    ) -> Result<R> {
        let mut entries = self.reload()?;
        let before = notification_state_from(&entries);
        let mut state = before;

        let result = update(&mut state);

        if state != before {
            insert_notification_state(&mut entries, &state);
            self.persist(&entries)?;
        }
        Ok(result)
    }

    pub fn clear_notification_state(&self) -> Result<()> {
        let mut entries = self.reload()?;
        let removed_threshold = entries.remove(KEY_LAST_NOTIFIED_THRESHOLD).is_some();
        let removed_period = entries.remove(KEY_LAST_NOTIFIED_PERIOD).is_some();
        if removed_threshold || removed_period {
            self.persist(&entries)?;
        }
        Ok(())
    }

    pub fn last_checked(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .get(KEY_LAST_CHECKED)?
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    pub fn set_last_checked(&self, checked_at: DateTime<Utc>) -> Result<()> {
        self.set(KEY_LAST_CHECKED, &checked_at.to_rfc3339())
    }

    /// Lock the store and refresh it from disk, so writes from other processes are not lost
    fn reload(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Settings store lock poisoned"))?;
        *entries = read_entries(&self.path)?;
        Ok(entries)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory: {}", parent.display()))?;
        }

        let contents = toml::to_string(entries).context("Failed to serialize settings")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write settings file: {}", self.path.display()))?;

        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse settings file: {}", path.display()))
}

fn notification_state_from(entries: &BTreeMap<String, String>) -> NotificationState {
    fn parsed<T: std::str::FromStr>(entries: &BTreeMap<String, String>, key: &str) -> Option<T> {
        entries.get(key).and_then(|v| v.trim().parse().ok())
    }
    NotificationState {
        last_threshold: parsed(entries, KEY_LAST_NOTIFIED_THRESHOLD).unwrap_or(0),
        period_start: parsed(entries, KEY_LAST_NOTIFIED_PERIOD).unwrap_or(0),
    }
}

fn insert_notification_state(entries: &mut BTreeMap<String, String>, state: &NotificationState) {
    entries.insert(
        KEY_LAST_NOTIFIED_THRESHOLD.to_string(),
        state.last_threshold.to_string(),
    );
    entries.insert(
        KEY_LAST_NOTIFIED_PERIOD.to_string(),
        state.period_start.to_string(),
    );
}

pub fn validate_allowance(allowance_gib: f64) -> Result<()> {
    if !allowance_gib.is_finite() || allowance_gib <= 0.0 {
        anyhow::bail!("Allowance must be a positive number of GB, got {}", allowance_gib);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (SettingsStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app").join("settings.toml");
        let store = SettingsStore::open(&path).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let (store, _temp_dir) = create_test_store();
        assert_eq!(store.get(KEY_HASH_CODE).unwrap(), None);
        assert!(store.entries().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_set_persists_across_reopen() {
        let (store, _temp_dir) = create_test_store();
        store.set(KEY_HASH_CODE, "abc123").unwrap();
        store.set(KEY_HASH_CODE, "def456").unwrap();
        assert!(store.path().exists());

        let reopened = SettingsStore::open(store.path()).unwrap();
        assert_eq!(reopened.hash_code().unwrap(), Some("def456".to_string()));
    }

    #[test]
    fn test_blank_value_counts_as_absent() {
        let (store, _temp_dir) = create_test_store();
        store.set(KEY_HASH_CODE, "   ").unwrap();
        assert_eq!(store.hash_code().unwrap(), None);
    }

    #[test]
    fn test_remove() {
        let (store, _temp_dir) = create_test_store();
        store.set(KEY_HASH_CODE, "abc123").unwrap();
        store.remove(KEY_HASH_CODE).unwrap();
        store.remove("never-set").unwrap();

        let reopened = SettingsStore::open(store.path()).unwrap();
        assert_eq!(reopened.hash_code().unwrap(), None);
    }

    #[test]
    fn test_allowance_must_be_positive() {
        let (store, _temp_dir) = create_test_store();

        store.set_allowance(60.0).unwrap();
        assert_eq!(store.allowance().unwrap(), Some(60.0));

        assert!(store.set_allowance(0.0).is_err());
        assert!(store.set_allowance(-5.0).is_err());
        assert!(store.set_allowance(f64::NAN).is_err());

        // Hand-edited files are validated on read
        store.set(KEY_ALLOWANCE, "-3").unwrap();
        assert!(store.allowance().is_err());
        store.set(KEY_ALLOWANCE, "90 GB").unwrap();
        assert_eq!(store.allowance().unwrap(), Some(90.0));
    }

    #[test]
    fn test_notification_state_round_trip() {
        let (store, _temp_dir) = create_test_store();
        assert_eq!(store.notification_state().unwrap(), NotificationState::default());

        let state = NotificationState {
            last_threshold: 75,
            period_start: 1_790_812_800,
        };
        store.set_notification_state(&state).unwrap();

        let reopened = SettingsStore::open(store.path()).unwrap();
        assert_eq!(reopened.notification_state().unwrap(), state);

        reopened.clear_notification_state().unwrap();
        assert_eq!(reopened.notification_state().unwrap(), NotificationState::default());
    }

    #[test]
    fn test_last_checked_round_trip() {
        let (store, _temp_dir) = create_test_store();
        let now = DateTime::parse_from_rfc3339("2026-10-19T08:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        store.set_last_checked(now).unwrap();
        assert_eq!(store.last_checked().unwrap(), Some(now));
    }

    #[test]
    fn test_two_handles_see_each_others_writes() {
        let (watcher, _temp_dir) = create_test_store();
        watcher.set(KEY_HASH_CODE, "old").unwrap();
        watcher.set_allowance(60.0).unwrap();

        let other = SettingsStore::open(watcher.path()).unwrap();
        other.set(KEY_HASH_CODE, "new").unwrap();
        other.set_allowance(90.0).unwrap();

        assert_eq!(watcher.allowance().unwrap(), Some(90.0));

        // A write through the first handle keeps the other handle's values
        watcher
            .set_last_checked(DateTime::parse_from_rfc3339("2026-10-19T08:30:00Z").unwrap().with_timezone(&Utc))
            .unwrap();
        let reopened = SettingsStore::open(watcher.path()).unwrap();
        assert_eq!(reopened.hash_code().unwrap(), Some("new".to_string()));
        assert_eq!(reopened.allowance().unwrap(), Some(90.0));
        assert!(reopened.last_checked().unwrap().is_some());
    }

    #[test]
    fn test_update_notification_state_writes_only_on_change() {
        let (store, _temp_dir) = create_test_store();

        let unchanged = store.update_notification_state(|_| "untouched").unwrap();
        assert_eq!(unchanged, "untouched");
        assert!(!store.path().exists());

        store
            .update_notification_state(|state| {
                state.last_threshold = 75;
                state.period_start = 1_790_812_800;
            })
            .unwrap();

        let other = SettingsStore::open(store.path()).unwrap();
        assert_eq!(other.notification_state().unwrap().last_threshold, 75);
    }
}
