//! `simulate` subcommand — dry-run the overrides against the in-memory
//! mock host and report what each interception decided.

use std::sync::{Arc, Mutex};

use powermute_lib::actions::{BatteryOverrides, HostEnv};
use powermute_lib::hook::HookRegistry;
use powermute_lib::host::mock::{
    MockAuthority, MockHost, MockLedController, MockPrefs, MockQuietHours, MockSoundReceiver,
    MockTransport, MockWarningReceiver,
};
use powermute_lib::host::{BatteryStatus, LedAttachment, LedController};
use powermute_lib::policy::LowBatteryPolicy;

use super::{ChargingLedMode, Result, SimStepJson, SimulateOutput, kv, kv_indent, kv_width};

fn parse_warning_policy(value: Option<&str>) -> Option<LowBatteryPolicy> {
    let value = value?;
    match value.to_ascii_lowercase().as_str() {
        "default" => Some(LowBatteryPolicy::Default),
        "nonintrusive" => Some(LowBatteryPolicy::Nonintrusive),
        "off" => Some(LowBatteryPolicy::Off),
        other => {
            log::warn!("unknown warning policy `{other}`, using host default");
            None
        }
    }
}

pub(super) fn cmd_simulate(
    json: bool,
    mode: &str,
    flashing_disabled: bool,
    mute_charging_sound: bool,
    warning_policy: Option<&str>,
) -> Result<()> {
    let mode = mode.parse::<ChargingLedMode>().unwrap_or_else(|e| {
        log::warn!("{e}, using DEFAULT");
        ChargingLedMode::Default
    });

    let env = HostEnv {
        transport: Arc::new(MockTransport::new()),
        prefs: Arc::new(MockPrefs::new()),
        quiet_hours: Arc::new(MockQuietHours::new(mute_charging_sound)),
        authority: Arc::new(MockAuthority::new(parse_warning_policy(warning_policy))),
    };

    let overrides = BatteryOverrides::new();
    let mut registry = HookRegistry::new();
    overrides.install(&mut registry, &MockHost::full(), &env);
    overrides.policy().set_charging_led_mode(mode);
    overrides.policy().set_flashing_led_disabled(flashing_disabled);

    let mut steps: Vec<SimStepJson> = Vec::new();

    // Controller attachment.
    let controller = Arc::new(Mutex::new(MockLedController::new()));
    let as_dyn: Arc<Mutex<dyn LedController>> = controller.clone();
    let mut attachment = LedAttachment { controller: as_dyn };
    registry.led_constructed.dispatch(&mut attachment, |_| ());
    steps.push(SimStepJson {
        step: "controller constructed".into(),
        outcome: if overrides.led().is_attached() {
            "attached, settings subscription active".into()
        } else {
            "not attached".into()
        },
    });

    // LED recompute in both charge states.
    for status in [BatteryStatus::Charging, BatteryStatus::Discharging] {
        let forced = {
            let mut controller = controller.lock().unwrap();
            controller.status = status;
            registry
                .led_recompute
                .dispatch(&mut *controller, |_| ())
                .forced
        };
        let label = match status {
            BatteryStatus::Charging => "recompute (charging)",
            _ => "recompute (discharging)",
        };
        steps.push(SimStepJson {
            step: label.into(),
            outcome: if forced {
                "suppressed, light off".into()
            } else {
                "host default".into()
            },
        });
    }

    // Low-battery warning.
    let mut warning = MockWarningReceiver::new();
    registry.warning_update.dispatch(&mut warning, |_| ());
    steps.push(SimStepJson {
        step: "low-battery warning".into(),
        outcome: match (warning.warning_enabled, warning.play_sound) {
            (false, _) => "warning disabled".into(),
            (true, false) => "shown without sound".into(),
            (true, true) => "host default".into(),
        },
    });

    // Vendor charging-sound callback.
    let mut sound = MockSoundReceiver::new(1);
    let mut heard = None;
    registry.battery_info_refreshed.dispatch(&mut sound, |r| {
        heard = r.sound_id().ok();
    });
    steps.push(SimStepJson {
        step: "charging-sound callback".into(),
        outcome: match heard {
            Some(0) => "muted during call, id restored".into(),
            _ => "host default".into(),
        },
    });

    if json {
        let output = SimulateOutput {
            mode: mode.to_string(),
            flashing_led_disabled: flashing_disabled,
            steps,
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    let w = kv_width(
        &["Mode:", "Flashing disabled:"],
        &[
            "controller constructed:",
            "recompute (charging):",
            "recompute (discharging):",
            "low-battery warning:",
            "charging-sound callback:",
        ],
    );
    kv("Mode:", mode, w);
    kv("Flashing disabled:", flashing_disabled, w);
    println!();
    println!("Steps:");
    for step in &steps {
        kv_indent(&format!("{}:", step.step), &step.outcome, w);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_warning_policy_known_values() {
        assert_eq!(
            parse_warning_policy(Some("nonintrusive")),
            Some(LowBatteryPolicy::Nonintrusive)
        );
        assert_eq!(parse_warning_policy(Some("OFF")), Some(LowBatteryPolicy::Off));
        assert_eq!(parse_warning_policy(None), None);
        assert_eq!(parse_warning_policy(Some("loud")), None);
    }

    #[test]
    fn cmd_simulate_default_policy_succeeds() {
        assert!(cmd_simulate(false, "DEFAULT", false, false, None).is_ok());
    }

    #[test]
    fn cmd_simulate_full_suppression_succeeds() {
        assert!(cmd_simulate(true, "DISABLED", true, true, Some("off")).is_ok());
    }

    #[test]
    fn cmd_simulate_bad_mode_falls_back() {
        assert!(cmd_simulate(false, "BLINKING", false, false, None).is_ok());
    }
}
