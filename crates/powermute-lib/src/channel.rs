//! Configuration change channel — typed settings deltas and the listener
//! that applies them.
//!
//! The host's broadcast transport delivers [`ConfigDelta`] messages on a
//! fixed topic. Deltas carry only the fields that changed; the listener
//! applies them to [`PolicyState`] and immediately pushes a refresh at
//! the attached LED controller so the change is visible without waiting
//! for the next natural state transition.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::policy::{ChargingLedMode, LedBinding, PolicyState};

/// Topic identifying battery LED settings-changed messages.
pub const TOPIC_BATTERY_LED_SETTINGS: &str = "battery-led-settings-changed";

/// Partial settings update. Absent fields leave the corresponding policy
/// field unchanged; applying the same delta twice is idempotent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flashing_led_disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charging_led_mode: Option<ChargingLedMode>,
}

impl ConfigDelta {
    /// Parse a delta from its JSON wire form.
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }

    /// Whether the delta carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.flashing_led_disabled.is_none() && self.charging_led_mode.is_none()
    }
}

/// Consumer of settings-changed messages. The transport holds
/// subscribers behind `Arc` and may call them from any of its threads.
pub trait SettingsSubscriber: Send + Sync {
    fn on_settings_changed(&self, delta: &ConfigDelta);
}

/// Applies settings deltas to policy state and requests an immediate
/// recompute from the attached controller.
pub struct SettingsListener {
    policy: Arc<PolicyState>,
    led: Arc<LedBinding>,
}

impl SettingsListener {
    pub fn new(policy: Arc<PolicyState>, led: Arc<LedBinding>) -> Self {
        SettingsListener { policy, led }
    }
}

impl SettingsSubscriber for SettingsListener {
    fn on_settings_changed(&self, delta: &ConfigDelta) {
        if let Some(disabled) = delta.flashing_led_disabled {
            self.policy.set_flashing_led_disabled(disabled);
        }
        if let Some(mode) = delta.charging_led_mode {
            self.policy.set_charging_led_mode(mode);
        }
        // A failed refresh must not break delivery of future messages.
        if let Err(e) = self.led.request_refresh() {
            log::warn!("settings refresh failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LedController;
    use crate::host::mock::MockLedController;
    use std::sync::Mutex;

    fn listener_with_controller() -> (SettingsListener, Arc<Mutex<MockLedController>>) {
        let policy = Arc::new(PolicyState::new());
        let led = Arc::new(LedBinding::new());
        let controller = Arc::new(Mutex::new(MockLedController::new()));
        let as_dyn: Arc<Mutex<dyn LedController>> = controller.clone();
        led.attach(&as_dyn);
        (SettingsListener::new(policy, led), controller)
    }

    #[test]
    fn delta_json_wire_form_is_camel_case() {
        let delta = ConfigDelta {
            flashing_led_disabled: Some(true),
            charging_led_mode: Some(ChargingLedMode::Disabled),
        };
        let json = serde_json::to_string(&delta).unwrap();
        assert_eq!(
            json,
            "{\"flashingLedDisabled\":true,\"chargingLedMode\":\"DISABLED\"}"
        );
    }

    #[test]
    fn delta_from_json_partial() {
        let delta = ConfigDelta::from_json("{\"chargingLedMode\":\"DISABLED\"}").unwrap();
        assert_eq!(delta.flashing_led_disabled, None);
        assert_eq!(delta.charging_led_mode, Some(ChargingLedMode::Disabled));
    }

    #[test]
    fn delta_from_json_empty_object() {
        let delta = ConfigDelta::from_json("{}").unwrap();
        assert!(delta.is_empty());
    }

    #[test]
    fn delta_from_json_unknown_mode_is_rejected() {
        assert!(ConfigDelta::from_json("{\"chargingLedMode\":\"BLINKING\"}").is_err());
    }

    #[test]
    fn partial_delta_leaves_other_field_unchanged() {
        let (listener, _controller) = listener_with_controller();
        listener.policy.set_flashing_led_disabled(true);

        listener.on_settings_changed(&ConfigDelta {
            flashing_led_disabled: None,
            charging_led_mode: Some(ChargingLedMode::Disabled),
        });

        assert!(
            listener.policy.flashing_led_disabled(),
            "absent field must stay unchanged"
        );
        assert_eq!(
            listener.policy.charging_led_mode(),
            ChargingLedMode::Disabled
        );
    }

    #[test]
    fn same_delta_twice_is_idempotent() {
        let (listener, _controller) = listener_with_controller();
        let delta = ConfigDelta {
            flashing_led_disabled: Some(true),
            charging_led_mode: Some(ChargingLedMode::Constant),
        };

        listener.on_settings_changed(&delta);
        let flashing = listener.policy.flashing_led_disabled();
        let mode = listener.policy.charging_led_mode();

        listener.on_settings_changed(&delta);
        assert_eq!(listener.policy.flashing_led_disabled(), flashing);
        assert_eq!(listener.policy.charging_led_mode(), mode);
    }

    #[test]
    fn delta_triggers_refresh() {
        let (listener, controller) = listener_with_controller();
        listener.on_settings_changed(&ConfigDelta {
            flashing_led_disabled: Some(true),
            charging_led_mode: None,
        });
        assert_eq!(controller.lock().unwrap().refresh_requests, 1);
    }

    #[test]
    fn empty_delta_still_requests_refresh() {
        let (listener, controller) = listener_with_controller();
        listener.on_settings_changed(&ConfigDelta::default());
        assert_eq!(controller.lock().unwrap().refresh_requests, 1);
    }

    #[test]
    fn unattached_listener_applies_delta_without_error() {
        let policy = Arc::new(PolicyState::new());
        let led = Arc::new(LedBinding::new());
        let listener = SettingsListener::new(policy.clone(), led);

        listener.on_settings_changed(&ConfigDelta {
            flashing_led_disabled: Some(true),
            charging_led_mode: None,
        });
        assert!(policy.flashing_led_disabled());
    }

    #[test]
    fn refresh_failure_does_not_block_future_messages() {
        let (listener, controller) = listener_with_controller();
        controller.lock().unwrap().fail_refresh = true;

        listener.on_settings_changed(&ConfigDelta {
            charging_led_mode: Some(ChargingLedMode::Disabled),
            ..Default::default()
        });
        assert_eq!(
            listener.policy.charging_led_mode(),
            ChargingLedMode::Disabled,
            "delta must apply even when the refresh fails"
        );

        controller.lock().unwrap().fail_refresh = false;
        listener.on_settings_changed(&ConfigDelta {
            flashing_led_disabled: Some(true),
            ..Default::default()
        });
        assert!(listener.policy.flashing_led_disabled());
        assert_eq!(controller.lock().unwrap().refresh_requests, 1);
    }
}
