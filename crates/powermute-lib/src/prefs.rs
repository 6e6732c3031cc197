//! Preference store interface and TOML file-backed implementation.
//!
//! The store is read-only from this module's perspective; writes happen
//! out of process. `reload()` picks them up before each read that must
//! be current (the seed and the per-call charging-sound decision).

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Preference key: disable the low-battery flashing LED.
pub const PREF_FLASHING_LED_DISABLED: &str = "flashing_led_disabled";
/// Preference key: charging LED mode (string form of `ChargingLedMode`).
pub const PREF_CHARGING_LED_MODE: &str = "charging_led_mode";
/// Preference key: globally disable the vendor charging sound.
pub const PREF_DASH_SOUND_DISABLED: &str = "dash_sound_disabled";

/// Read-only view of the persisted preferences.
pub trait PreferenceStore: Send + Sync {
    /// Pick up out-of-process writes before the next read.
    fn reload(&self);
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_str(&self, key: &str) -> Option<String>;
}

/// System sound categories the quiet-hours policy can mute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemSound {
    Ringer,
    Media,
    Alarm,
    Charger,
}

/// Quiet-hours policy evaluator.
pub trait QuietHoursEvaluator: Send + Sync {
    /// Whether quiet hours currently mute the given sound category.
    /// Implementations reload their own preference snapshot first.
    fn is_system_sound_muted(&self, sound: SystemSound) -> bool;
}

// ── File-backed store ──

/// TOML-file-backed preference store with explicit reload.
///
/// Missing file reads as empty; a parse error keeps the last good
/// snapshot and logs a warning, so a half-written file never wipes the
/// effective settings.
pub struct FilePrefs {
    path: PathBuf,
    table: Mutex<toml::Table>,
}

impl FilePrefs {
    /// Open a preference file, reading its current contents.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let prefs = FilePrefs {
            path: path.into(),
            table: Mutex::new(toml::Table::new()),
        };
        prefs.reload();
        prefs
    }

    /// Default platform path: `<config dir>/powermute/prefs.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("powermute").join("prefs.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(path: &Path) -> Option<toml::Table> {
        let contents = std::fs::read_to_string(path).ok()?;
        match contents.parse::<toml::Table>() {
            Ok(table) => Some(table),
            Err(e) => {
                log::warn!("prefs parse error ({}): {e}", path.display());
                None
            }
        }
    }

    fn table(&self) -> std::sync::MutexGuard<'_, toml::Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PreferenceStore for FilePrefs {
    fn reload(&self) {
        if let Some(table) = Self::read_table(&self.path) {
            *self.table() = table;
        } else if !self.path.exists() {
            *self.table() = toml::Table::new();
        }
        // Parse error: keep the last good snapshot.
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.table().get(key).and_then(toml::Value::as_bool)
    }

    fn get_str(&self, key: &str) -> Option<String> {
        self.table()
            .get(key)
            .and_then(toml::Value::as_str)
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_prefs(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("prefs.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn open_reads_existing_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_prefs(
            &dir,
            "flashing_led_disabled = true\ncharging_led_mode = \"DISABLED\"\n",
        );

        let prefs = FilePrefs::open(path);
        assert_eq!(prefs.get_bool(PREF_FLASHING_LED_DISABLED), Some(true));
        assert_eq!(
            prefs.get_str(PREF_CHARGING_LED_MODE).as_deref(),
            Some("DISABLED")
        );
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = FilePrefs::open(dir.path().join("absent.toml"));
        assert_eq!(prefs.get_bool(PREF_FLASHING_LED_DISABLED), None);
        assert_eq!(prefs.get_str(PREF_CHARGING_LED_MODE), None);
    }

    #[test]
    fn reload_picks_up_out_of_process_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_prefs(&dir, "dash_sound_disabled = false\n");

        let prefs = FilePrefs::open(&path);
        assert_eq!(prefs.get_bool(PREF_DASH_SOUND_DISABLED), Some(false));

        std::fs::write(&path, "dash_sound_disabled = true\n").unwrap();
        prefs.reload();
        assert_eq!(prefs.get_bool(PREF_DASH_SOUND_DISABLED), Some(true));
    }

    #[test]
    fn parse_error_keeps_last_good_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_prefs(&dir, "charging_led_mode = \"CONSTANT\"\n");

        let prefs = FilePrefs::open(&path);
        std::fs::write(&path, "charging_led_mode = [unclosed\n").unwrap();
        prefs.reload();
        assert_eq!(
            prefs.get_str(PREF_CHARGING_LED_MODE).as_deref(),
            Some("CONSTANT"),
            "broken file must not wipe effective settings"
        );
    }

    #[test]
    fn deleted_file_reads_as_empty_after_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_prefs(&dir, "flashing_led_disabled = true\n");

        let prefs = FilePrefs::open(&path);
        assert_eq!(prefs.get_bool(PREF_FLASHING_LED_DISABLED), Some(true));

        std::fs::remove_file(&path).unwrap();
        prefs.reload();
        assert_eq!(prefs.get_bool(PREF_FLASHING_LED_DISABLED), None);
    }

    #[test]
    fn wrong_type_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_prefs(&dir, "flashing_led_disabled = \"yes\"\n");

        let prefs = FilePrefs::open(path);
        assert_eq!(prefs.get_bool(PREF_FLASHING_LED_DISABLED), None);
    }

    #[test]
    fn default_path_under_config_dir() {
        if let Some(path) = FilePrefs::default_path() {
            assert!(path.ends_with("powermute/prefs.toml"));
        }
    }
}
