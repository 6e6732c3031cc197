//! Host subsystem adapter — typed interfaces over the intercepted code.
//!
//! The host adapter layer translates these traits into whatever the real
//! platform offers. Everything here is a black-box contract: this module
//! reads and mutates the host's live state only through these accessors,
//! never by field name.

use std::sync::{Arc, Mutex};

use crate::channel::SettingsSubscriber;
use crate::error::Result;
use crate::hook::AttachPoint;
use crate::policy::LowBatteryPolicy;

/// Battery charge status as reported by the host's battery properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryStatus {
    Unknown,
    Charging,
    Discharging,
    NotCharging,
    Full,
}

impl BatteryStatus {
    pub fn is_charging(self) -> bool {
        matches!(self, BatteryStatus::Charging)
    }
}

/// Handle on the battery light hardware.
pub trait BatteryLight {
    fn turn_off(&mut self) -> Result<()>;
}

/// The host's LED controller — the intercepted instance.
pub trait LedController: Send {
    /// Current battery status from the controller's enclosing context.
    fn battery_status(&self) -> Result<BatteryStatus>;

    /// The battery light handle reachable from this controller.
    fn battery_light(&mut self) -> Result<&mut dyn BatteryLight>;

    /// Recompute the visible light state now, without waiting for the
    /// next natural state transition.
    fn request_refresh(&mut self) -> Result<()>;
}

/// Construction-time context for a freshly attached LED controller.
///
/// Carries the sharable reference so the module can keep a weak back
/// reference; the controller's lifecycle stays with the host.
pub struct LedAttachment {
    pub controller: Arc<Mutex<dyn LedController>>,
}

/// Receiver of the low-battery-notification update call.
pub trait WarningReceiver {
    fn set_play_sound(&mut self, play: bool) -> Result<()>;
    fn set_warning_enabled(&mut self, enabled: bool) -> Result<()>;
}

/// Receiver of the vendor battery-info-refreshed callback, exposing the
/// charging sound id field.
pub trait ChargingSoundReceiver {
    fn sound_id(&self) -> Result<u32>;
    fn set_sound_id(&mut self, id: u32) -> Result<()>;
}

/// External battery-info authority. May be absent (not yet initialized)
/// at any time, in which case the warning override defers to the host
/// default.
pub trait BatteryInfoAuthority: Send + Sync {
    /// `None` when the authority is unavailable.
    fn low_battery_warning_policy(&self) -> Option<LowBatteryPolicy>;
}

/// Capability view of the running host build.
pub trait HookHost {
    /// Whether the named entry point exists on this platform build.
    fn supports(&self, point: AttachPoint) -> bool;

    /// Whether this host build ships the vendor charging-sound callback.
    fn has_vendor_charging_sound(&self) -> bool {
        false
    }
}

/// Broadcast transport delivering configuration-change messages.
///
/// Delivery is at-least-once, on whatever thread the host's messaging
/// uses; order relative to preference-store writes is not guaranteed.
pub trait ConfigTransport: Send + Sync {
    fn subscribe(&self, topic: &'static str, subscriber: Arc<dyn SettingsSubscriber>);
}

/// In-memory mock host for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use crate::channel::ConfigDelta;
    use crate::error::HookError;
    use crate::prefs::{PreferenceStore, QuietHoursEvaluator, SystemSound};

    /// Mock host build: a configurable set of supported attach points.
    pub struct MockHost {
        pub supported: Vec<AttachPoint>,
        pub vendor_charging_sound: bool,
    }

    impl MockHost {
        /// All four attach points present, vendor callback included.
        pub fn full() -> Self {
            MockHost {
                supported: vec![
                    AttachPoint::LedControllerConstructed,
                    AttachPoint::LedRecompute,
                    AttachPoint::WarningUpdate,
                    AttachPoint::BatteryInfoRefreshed,
                ],
                vendor_charging_sound: true,
            }
        }

        /// A full host with one attach point missing.
        pub fn without(point: AttachPoint) -> Self {
            let mut host = Self::full();
            host.supported.retain(|&p| p != point);
            host
        }
    }

    impl HookHost for MockHost {
        fn supports(&self, point: AttachPoint) -> bool {
            self.supported.contains(&point)
        }

        fn has_vendor_charging_sound(&self) -> bool {
            self.vendor_charging_sound
        }
    }

    /// Mock battery light recording turn-off calls.
    pub struct MockLight {
        pub on: bool,
        pub turn_off_calls: u32,
        /// If true, `turn_off` returns a `StateAccess` error.
        pub fail_turn_off: bool,
    }

    impl MockLight {
        pub fn new() -> Self {
            MockLight {
                on: true,
                turn_off_calls: 0,
                fail_turn_off: false,
            }
        }
    }

    impl Default for MockLight {
        fn default() -> Self {
            Self::new()
        }
    }

    impl BatteryLight for MockLight {
        fn turn_off(&mut self) -> Result<()> {
            if self.fail_turn_off {
                return Err(HookError::StateAccess(
                    "mock: turn_off failure injected".into(),
                ));
            }
            self.on = false;
            self.turn_off_calls += 1;
            Ok(())
        }
    }

    /// Mock LED controller with injectable failures.
    pub struct MockLedController {
        pub status: BatteryStatus,
        pub light: MockLight,
        pub refresh_requests: u32,
        /// If true, `battery_status` returns a `StateAccess` error.
        pub fail_status: bool,
        /// If true, `request_refresh` returns a `Refresh` error.
        pub fail_refresh: bool,
    }

    impl MockLedController {
        pub fn new() -> Self {
            MockLedController {
                status: BatteryStatus::Discharging,
                light: MockLight::new(),
                refresh_requests: 0,
                fail_status: false,
                fail_refresh: false,
            }
        }

        pub fn with_status(status: BatteryStatus) -> Self {
            let mut c = Self::new();
            c.status = status;
            c
        }
    }

    impl Default for MockLedController {
        fn default() -> Self {
            Self::new()
        }
    }

    impl LedController for MockLedController {
        fn battery_status(&self) -> Result<BatteryStatus> {
            if self.fail_status {
                return Err(HookError::StateAccess(
                    "mock: battery status unavailable".into(),
                ));
            }
            Ok(self.status)
        }

        fn battery_light(&mut self) -> Result<&mut dyn BatteryLight> {
            Ok(&mut self.light)
        }

        fn request_refresh(&mut self) -> Result<()> {
            if self.fail_refresh {
                return Err(HookError::Refresh("mock: refresh failure injected".into()));
            }
            self.refresh_requests += 1;
            Ok(())
        }
    }

    /// Mock low-battery notification receiver.
    pub struct MockWarningReceiver {
        pub play_sound: bool,
        pub warning_enabled: bool,
    }

    impl MockWarningReceiver {
        pub fn new() -> Self {
            MockWarningReceiver {
                play_sound: true,
                warning_enabled: true,
            }
        }
    }

    impl Default for MockWarningReceiver {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WarningReceiver for MockWarningReceiver {
        fn set_play_sound(&mut self, play: bool) -> Result<()> {
            self.play_sound = play;
            Ok(())
        }

        fn set_warning_enabled(&mut self, enabled: bool) -> Result<()> {
            self.warning_enabled = enabled;
            Ok(())
        }
    }

    /// Mock charging-sound receiver with injectable field-access failures.
    pub struct MockSoundReceiver {
        pub sound_id: u32,
        pub fail_read: bool,
        pub fail_write: bool,
    }

    impl MockSoundReceiver {
        pub fn new(sound_id: u32) -> Self {
            MockSoundReceiver {
                sound_id,
                fail_read: false,
                fail_write: false,
            }
        }
    }

    impl ChargingSoundReceiver for MockSoundReceiver {
        fn sound_id(&self) -> Result<u32> {
            if self.fail_read {
                return Err(HookError::StateAccess("mock: sound id unreadable".into()));
            }
            Ok(self.sound_id)
        }

        fn set_sound_id(&mut self, id: u32) -> Result<()> {
            if self.fail_write {
                return Err(HookError::StateAccess("mock: sound id unwritable".into()));
            }
            self.sound_id = id;
            Ok(())
        }
    }

    /// Mock battery-info authority; `None` simulates "not yet initialized".
    pub struct MockAuthority {
        policy: Mutex<Option<LowBatteryPolicy>>,
    }

    impl MockAuthority {
        pub fn new(policy: Option<LowBatteryPolicy>) -> Self {
            MockAuthority {
                policy: Mutex::new(policy),
            }
        }

        pub fn set_policy(&self, policy: Option<LowBatteryPolicy>) {
            *self.policy.lock().unwrap() = policy;
        }
    }

    impl BatteryInfoAuthority for MockAuthority {
        fn low_battery_warning_policy(&self) -> Option<LowBatteryPolicy> {
            *self.policy.lock().unwrap()
        }
    }

    /// Mock broadcast transport recording subscriptions; tests deliver
    /// messages with [`MockTransport::deliver`].
    pub struct MockTransport {
        subscriptions: Mutex<Vec<(&'static str, Arc<dyn SettingsSubscriber>)>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            MockTransport {
                subscriptions: Mutex::new(Vec::new()),
            }
        }

        pub fn subscription_count(&self) -> usize {
            self.subscriptions.lock().unwrap().len()
        }

        /// Deliver a delta to every subscriber of `topic`.
        pub fn deliver(&self, topic: &str, delta: &ConfigDelta) {
            let subscribers: Vec<_> = self
                .subscriptions
                .lock()
                .unwrap()
                .iter()
                .filter(|(t, _)| *t == topic)
                .map(|(_, s)| s.clone())
                .collect();
            for subscriber in subscribers {
                subscriber.on_settings_changed(delta);
            }
        }
    }

    impl Default for MockTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ConfigTransport for MockTransport {
        fn subscribe(&self, topic: &'static str, subscriber: Arc<dyn SettingsSubscriber>) {
            self.subscriptions.lock().unwrap().push((topic, subscriber));
        }
    }

    /// In-memory preference store counting reloads.
    pub struct MockPrefs {
        values: Mutex<HashMap<String, String>>,
        pub reloads: AtomicU32,
    }

    impl MockPrefs {
        pub fn new() -> Self {
            MockPrefs {
                values: Mutex::new(HashMap::new()),
                reloads: AtomicU32::new(0),
            }
        }

        pub fn set(&self, key: &str, value: &str) {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }

        pub fn reload_count(&self) -> u32 {
            self.reloads.load(Ordering::SeqCst)
        }
    }

    impl Default for MockPrefs {
        fn default() -> Self {
            Self::new()
        }
    }

    impl PreferenceStore for MockPrefs {
        fn reload(&self) {
            self.reloads.fetch_add(1, Ordering::SeqCst);
        }

        fn get_bool(&self, key: &str) -> Option<bool> {
            self.values
                .lock()
                .unwrap()
                .get(key)
                .and_then(|v| v.parse().ok())
        }

        fn get_str(&self, key: &str) -> Option<String> {
            self.values.lock().unwrap().get(key).cloned()
        }
    }

    /// Mock quiet-hours evaluator with a toggleable charger mute.
    pub struct MockQuietHours {
        charger_muted: AtomicBool,
    }

    impl MockQuietHours {
        pub fn new(charger_muted: bool) -> Self {
            MockQuietHours {
                charger_muted: AtomicBool::new(charger_muted),
            }
        }

        pub fn set_charger_muted(&self, muted: bool) {
            self.charger_muted.store(muted, Ordering::SeqCst);
        }
    }

    impl QuietHoursEvaluator for MockQuietHours {
        fn is_system_sound_muted(&self, sound: SystemSound) -> bool {
            sound == SystemSound::Charger && self.charger_muted.load(Ordering::SeqCst)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock::*;

    #[test]
    fn battery_status_is_charging() {
        assert!(BatteryStatus::Charging.is_charging());
        assert!(!BatteryStatus::Discharging.is_charging());
        assert!(!BatteryStatus::Full.is_charging());
        assert!(!BatteryStatus::Unknown.is_charging());
    }

    #[test]
    fn mock_host_without_drops_one_point() {
        let host = MockHost::without(AttachPoint::BatteryInfoRefreshed);
        assert!(host.supports(AttachPoint::LedRecompute));
        assert!(!host.supports(AttachPoint::BatteryInfoRefreshed));
    }

    #[test]
    fn mock_light_turn_off() {
        let mut light = MockLight::new();
        assert!(light.on);
        light.turn_off().unwrap();
        assert!(!light.on);
        assert_eq!(light.turn_off_calls, 1);
    }

    #[test]
    fn mock_light_fail_injection() {
        let mut light = MockLight::new();
        light.fail_turn_off = true;
        assert!(light.turn_off().is_err());
        assert!(light.on, "failed turn_off must not change state");
    }

    #[test]
    fn mock_controller_refresh_counts() {
        let mut c = MockLedController::new();
        c.request_refresh().unwrap();
        c.request_refresh().unwrap();
        assert_eq!(c.refresh_requests, 2);
    }

    #[test]
    fn mock_controller_status_failure() {
        let mut c = MockLedController::with_status(BatteryStatus::Charging);
        assert_eq!(c.battery_status().unwrap(), BatteryStatus::Charging);
        c.fail_status = true;
        assert!(c.battery_status().is_err());
    }

    #[test]
    fn mock_sound_receiver_round_trip() {
        let mut r = MockSoundReceiver::new(17);
        assert_eq!(r.sound_id().unwrap(), 17);
        r.set_sound_id(0).unwrap();
        assert_eq!(r.sound_id, 0);
    }

    #[test]
    fn mock_quiet_hours_only_mutes_charger() {
        use crate::prefs::{QuietHoursEvaluator, SystemSound};
        let qh = MockQuietHours::new(true);
        assert!(qh.is_system_sound_muted(SystemSound::Charger));
        assert!(!qh.is_system_sound_muted(SystemSound::Ringer));
        qh.set_charger_muted(false);
        assert!(!qh.is_system_sound_muted(SystemSound::Charger));
    }
}
