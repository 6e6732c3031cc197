//! Interception actions — the four battery/power behavior overrides.
//!
//! Each install function builds hooks over the typed host adapter and
//! registers them with the registry. Registration failures are logged
//! per attach point; one missing entry point never blocks the others.

use std::sync::Arc;

use crate::channel::{SettingsListener, TOPIC_BATTERY_LED_SETTINGS};
use crate::hook::{AfterCall, BeforeCall, Hook, HookRegistry};
use crate::host::{
    BatteryInfoAuthority, ChargingSoundReceiver, ConfigTransport, HookHost, LedAttachment,
    LedController, WarningReceiver,
};
use crate::policy::{ChargingLedMode, LedBinding, LowBatteryPolicy, PolicyState};
use crate::prefs::{PREF_DASH_SOUND_DISABLED, PreferenceStore, QuietHoursEvaluator, SystemSound};

/// External collaborators supplied by the host adapter.
pub struct HostEnv {
    pub transport: Arc<dyn ConfigTransport>,
    pub prefs: Arc<dyn PreferenceStore>,
    pub quiet_hours: Arc<dyn QuietHoursEvaluator>,
    pub authority: Arc<dyn BatteryInfoAuthority>,
}

/// Owns the policy mirror and the controller back reference, and
/// installs the interception actions into a registry.
///
/// One instance per process, lifetime = process lifetime. There is no
/// uninstall path; hooks stay active until the host exits.
pub struct BatteryOverrides {
    policy: Arc<PolicyState>,
    led: Arc<LedBinding>,
}

impl BatteryOverrides {
    pub fn new() -> Self {
        BatteryOverrides {
            policy: Arc::new(PolicyState::new()),
            led: Arc::new(LedBinding::new()),
        }
    }

    pub fn policy(&self) -> &Arc<PolicyState> {
        &self.policy
    }

    pub fn led(&self) -> &Arc<LedBinding> {
        &self.led
    }

    /// Install all overrides.
    pub fn install(&self, registry: &mut HookRegistry, host: &dyn HookHost, env: &HostEnv) {
        install_led_override(
            registry,
            host,
            &self.policy,
            &self.led,
            env.transport.clone(),
            env.prefs.as_ref(),
        );
        install_warning_override(registry, host, env.authority.clone());
        install_charging_sound_mute(
            registry,
            host,
            &self.policy,
            env.prefs.clone(),
            env.quiet_hours.clone(),
        );
    }
}

impl Default for BatteryOverrides {
    fn default() -> Self {
        Self::new()
    }
}

// ── Charging/flashing LED override ──

/// Install the LED hooks: record the controller at construction time and
/// subscribe to settings changes, then suppress the light on recompute
/// when policy says so.
pub fn install_led_override(
    registry: &mut HookRegistry,
    host: &dyn HookHost,
    policy: &Arc<PolicyState>,
    led: &Arc<LedBinding>,
    transport: Arc<dyn ConfigTransport>,
    prefs: &dyn PreferenceStore,
) {
    policy.seed_from_prefs(prefs);

    let listener = Arc::new(SettingsListener::new(policy.clone(), led.clone()));
    let led_slot = led.clone();
    let attach = Hook::new().after(move |call: &mut AfterCall<'_, LedAttachment, ()>| {
        let controller = call.receiver().controller.clone();
        led_slot.attach(&controller);
        transport.subscribe(TOPIC_BATTERY_LED_SETTINGS, listener.clone());
        Ok(())
    });
    if let Err(e) = registry.led_constructed.register(host, attach) {
        log::warn!("skipping LED construction hook: {e}");
    }

    let policy = policy.clone();
    let recompute = Hook::new().before(move |call: &mut BeforeCall<'_, dyn LedController, ()>| {
        let status = call.receiver().battery_status()?;
        if status.is_charging() {
            if policy.charging_led_mode() == ChargingLedMode::Disabled {
                log::debug!("suppressing charging LED");
                call.receiver().battery_light()?.turn_off()?;
                call.force_result(());
            }
        } else if policy.flashing_led_disabled() {
            log::debug!("suppressing low-battery flashing LED");
            call.receiver().battery_light()?.turn_off()?;
            call.force_result(());
        }
        Ok(())
    });
    if let Err(e) = registry.led_recompute.register(host, recompute) {
        log::warn!("skipping LED recompute hook: {e}");
    }
}

// ── Low-battery warning override ──

/// Install the warning hook: adjust the notification receiver's flags
/// per the authority's policy before the original logic runs.
pub fn install_warning_override(
    registry: &mut HookRegistry,
    host: &dyn HookHost,
    authority: Arc<dyn BatteryInfoAuthority>,
) {
    let hook = Hook::new().before(move |call: &mut BeforeCall<'_, dyn WarningReceiver, ()>| {
        // Authority not up yet: defer to the host default.
        let Some(policy) = authority.low_battery_warning_policy() else {
            return Ok(());
        };
        match policy {
            LowBatteryPolicy::Default => {}
            LowBatteryPolicy::Nonintrusive => call.receiver().set_play_sound(false)?,
            LowBatteryPolicy::Off => call.receiver().set_warning_enabled(false)?,
        }
        Ok(())
    });
    if let Err(e) = registry.warning_update.register(host, hook) {
        log::warn!("skipping low-battery warning hook: {e}");
    }
}

// ── Quiet-hours charging-sound mute ──

/// Whether the dash-charging sound should be muted right now: true when
/// the dedicated preference disables it, or quiet hours mute the charger
/// sound class.
pub fn charging_sound_muted(
    prefs: &dyn PreferenceStore,
    quiet_hours: &dyn QuietHoursEvaluator,
) -> bool {
    prefs.reload();
    if prefs.get_bool(PREF_DASH_SOUND_DISABLED).unwrap_or(false) {
        return true;
    }
    quiet_hours.is_system_sound_muted(SystemSound::Charger)
}

/// Install the charging-sound mute around the vendor battery-info
/// callback. No-op on hosts without the vendor callback.
pub fn install_charging_sound_mute(
    registry: &mut HookRegistry,
    host: &dyn HookHost,
    policy: &Arc<PolicyState>,
    prefs: Arc<dyn PreferenceStore>,
    quiet_hours: Arc<dyn QuietHoursEvaluator>,
) {
    if !host.has_vendor_charging_sound() {
        return;
    }

    let stash = policy.clone();
    let restore = policy.clone();
    let hook = Hook::new()
        .before(move |call: &mut BeforeCall<'_, dyn ChargingSoundReceiver, ()>| {
            if charging_sound_muted(prefs.as_ref(), quiet_hours.as_ref())
                && !stash.dash_mute_active()
            {
                let id = call.receiver().sound_id()?;
                stash.stash_dash_sound_id(id);
                call.receiver().set_sound_id(0)?;
            }
            Ok(())
        })
        .after(move |call| {
            if let Some(id) = restore.stashed_dash_sound_id() {
                // Clear only after a successful restore.
                call.receiver().set_sound_id(id)?;
                restore.clear_dash_sound_id();
            }
            Ok(())
        });
    if let Err(e) = registry.battery_info_refreshed.register(host, hook) {
        log::warn!("skipping charging-sound hook: {e}");
    }
}
