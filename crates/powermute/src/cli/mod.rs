//! CLI subcommands — effective configuration and override dry-runs.

mod config_cmd;
mod simulate;

use clap::Subcommand;
use serde::Serialize;

pub(super) use powermute_lib::error::Result;
pub(super) use powermute_lib::policy::ChargingLedMode;

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{key:<width$}{value}", width = w);
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub prefs_file: Option<String>,
    pub prefs_file_exists: bool,
    pub settings: SettingsJson,
}

#[derive(Serialize)]
pub(super) struct SettingsJson {
    pub flashing_led_disabled: bool,
    pub charging_led_mode: String,
    pub dash_sound_disabled: bool,
}

#[derive(Serialize)]
pub(super) struct SimulateOutput {
    pub mode: String,
    pub flashing_led_disabled: bool,
    pub steps: Vec<SimStepJson>,
}

#[derive(Serialize)]
pub(super) struct SimStepJson {
    pub step: String,
    pub outcome: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the effective configuration and preference file path
    Config {
        /// Preference file to read instead of the platform default
        #[arg(long)]
        prefs: Option<String>,
    },

    /// Dry-run the overrides against an in-memory host
    Simulate {
        /// Charging LED mode (DEFAULT, EMULATED, CONSTANT, DISABLED)
        #[arg(long, default_value = "DEFAULT")]
        mode: String,
        /// Disable the low-battery flashing LED
        #[arg(long)]
        flashing_disabled: bool,
        /// Mute the vendor charging sound
        #[arg(long)]
        mute_charging_sound: bool,
        /// Low-battery warning policy (default, nonintrusive, off)
        #[arg(long)]
        warning_policy: Option<String>,
    },
}

pub fn run(cmd: Command, json: bool) -> Result<()> {
    match cmd {
        Command::Config { prefs } => config_cmd::cmd_config(json, prefs.as_deref()),
        Command::Simulate {
            mode,
            flashing_disabled,
            mute_charging_sound,
            warning_policy,
        } => simulate::cmd_simulate(
            json,
            &mode,
            flashing_disabled,
            mute_charging_sound,
            warning_policy.as_deref(),
        ),
    }
}

#[cfg(test)]
mod format_tests {
    use super::*;

    #[test]
    fn kv_width_top_only() {
        let w = kv_width(&["Short:", "Longer key:"], &[]);
        // "Longer key:" = 11 + PADDING = 13
        assert_eq!(w, 13);
    }

    #[test]
    fn kv_width_indent_drives_width() {
        // Indent key needs +2 for the prefix
        let w = kv_width(&["A:"], &["charging_led_mode:"]);
        // "charging_led_mode:" = 18 + PADDING + 2 = 22
        assert_eq!(w, 22);
    }

    #[test]
    fn kv_width_empty_both() {
        assert_eq!(kv_width(&[], &[]), 0);
    }
}

#[cfg(test)]
mod json_struct_tests {
    use super::*;

    #[test]
    fn config_output_missing_path_is_null() {
        let output = ConfigOutput {
            prefs_file: None,
            prefs_file_exists: false,
            settings: SettingsJson {
                flashing_led_disabled: false,
                charging_led_mode: "DEFAULT".into(),
                dash_sound_disabled: false,
            },
        };
        let json = serde_json::to_string_pretty(&output).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["prefs_file"].is_null());
        assert_eq!(parsed["prefs_file_exists"], false);
        assert_eq!(parsed["settings"]["charging_led_mode"], "DEFAULT");
    }

    #[test]
    fn simulate_output_round_trips() {
        let output = SimulateOutput {
            mode: "DISABLED".into(),
            flashing_led_disabled: true,
            steps: vec![SimStepJson {
                step: "recompute (charging)".into(),
                outcome: "suppressed".into(),
            }],
        };
        let json = serde_json::to_string_pretty(&output).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["mode"], "DISABLED");
        assert_eq!(parsed["steps"][0]["outcome"], "suppressed");
    }
}
