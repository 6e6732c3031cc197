//! `config` subcommand — show the effective policy and preference file.

use std::path::PathBuf;

use powermute_lib::policy::PolicyState;
use powermute_lib::prefs::{FilePrefs, PREF_DASH_SOUND_DISABLED, PreferenceStore};

use super::{ConfigOutput, Result, SettingsJson, kv, kv_indent, kv_width};

pub(super) fn cmd_config(json: bool, custom_path: Option<&str>) -> Result<()> {
    let prefs_path = custom_path
        .map(PathBuf::from)
        .or_else(FilePrefs::default_path);
    let prefs_exists = prefs_path.as_ref().is_some_and(|p| p.exists());

    // Seed a fresh policy the same way the overrides do at install time.
    let state = PolicyState::new();
    let mut dash_sound_disabled = false;
    if let Some(path) = &prefs_path {
        let prefs = FilePrefs::open(path);
        state.seed_from_prefs(&prefs);
        dash_sound_disabled = prefs.get_bool(PREF_DASH_SOUND_DISABLED).unwrap_or(false);
    }

    if json {
        let output = ConfigOutput {
            prefs_file: prefs_path.as_ref().map(|p| p.display().to_string()),
            prefs_file_exists: prefs_exists,
            settings: SettingsJson {
                flashing_led_disabled: state.flashing_led_disabled(),
                charging_led_mode: state.charging_led_mode().to_string(),
                dash_sound_disabled,
            },
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    let w = kv_width(
        &["Preference file:"],
        &[
            "flashing_led_disabled:",
            "charging_led_mode:",
            "dash_sound_disabled:",
        ],
    );

    match &prefs_path {
        Some(p) => {
            if prefs_exists {
                kv("Preference file:", format_args!("{} (loaded)", p.display()), w);
            } else {
                kv(
                    "Preference file:",
                    format_args!("{} (not found, using defaults)", p.display()),
                    w,
                );
            }
        }
        None => kv("Preference file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    kv_indent("flashing_led_disabled:", state.flashing_led_disabled(), w);
    kv_indent("charging_led_mode:", state.charging_led_mode(), w);
    kv_indent("dash_sound_disabled:", dash_sound_disabled, w);
    Ok(())
}
