//! Policy state — in-memory mirror of the battery LED and sound settings.
//!
//! One `PolicyState` exists per process, created at module init and
//! mutated only by the settings listener and the charging-sound mute
//! action. Flag reads are eventually consistent: an interception on one
//! host thread may observe a value one recompute cycle stale while a
//! settings delta lands on another. That is acceptable; there is no
//! locking discipline on the flags.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::host::LedController;
use crate::prefs::{PREF_CHARGING_LED_MODE, PREF_FLASHING_LED_DISABLED, PreferenceStore};

/// Charging LED behavior selected by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChargingLedMode {
    #[default]
    Default,
    Emulated,
    Constant,
    Disabled,
}

impl ChargingLedMode {
    fn as_u8(self) -> u8 {
        match self {
            ChargingLedMode::Default => 0,
            ChargingLedMode::Emulated => 1,
            ChargingLedMode::Constant => 2,
            ChargingLedMode::Disabled => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ChargingLedMode::Emulated,
            2 => ChargingLedMode::Constant,
            3 => ChargingLedMode::Disabled,
            _ => ChargingLedMode::Default,
        }
    }
}

impl fmt::Display for ChargingLedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChargingLedMode::Default => "DEFAULT",
            ChargingLedMode::Emulated => "EMULATED",
            ChargingLedMode::Constant => "CONSTANT",
            ChargingLedMode::Disabled => "DISABLED",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ChargingLedMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("DEFAULT") {
            Ok(ChargingLedMode::Default)
        } else if s.eq_ignore_ascii_case("EMULATED") {
            Ok(ChargingLedMode::Emulated)
        } else if s.eq_ignore_ascii_case("CONSTANT") {
            Ok(ChargingLedMode::Constant)
        } else if s.eq_ignore_ascii_case("DISABLED") {
            Ok(ChargingLedMode::Disabled)
        } else {
            Err(format!("unknown charging LED mode: {s}"))
        }
    }
}

/// Low-battery warning policy, read from the external battery-info
/// authority at interception time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowBatteryPolicy {
    /// Host default: warning shown with sound.
    Default,
    /// Visual warning only, audible warning suppressed.
    Nonintrusive,
    /// Notification suppressed entirely.
    Off,
}

// ── Policy state ──

/// Process-wide policy mirror.
pub struct PolicyState {
    flashing_led_disabled: AtomicBool,
    charging_led_mode: AtomicU8,
    /// Set if-and-only-if a charging-sound mute is active between a
    /// before/after action pair. Holds the receiver's real sound id;
    /// leaving it populated past the after-action would lose that id.
    dash_sound_original: Mutex<Option<u32>>,
}

impl PolicyState {
    pub fn new() -> Self {
        PolicyState {
            flashing_led_disabled: AtomicBool::new(false),
            charging_led_mode: AtomicU8::new(ChargingLedMode::Default.as_u8()),
            dash_sound_original: Mutex::new(None),
        }
    }

    /// One-time synchronous seed from the preference store.
    ///
    /// Missing or unparseable values fall back to defaults (flashing LED
    /// enabled, charging mode `DEFAULT`).
    pub fn seed_from_prefs(&self, prefs: &dyn PreferenceStore) {
        prefs.reload();
        self.set_flashing_led_disabled(prefs.get_bool(PREF_FLASHING_LED_DISABLED).unwrap_or(false));
        let mode = prefs
            .get_str(PREF_CHARGING_LED_MODE)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        self.set_charging_led_mode(mode);
    }

    pub fn flashing_led_disabled(&self) -> bool {
        self.flashing_led_disabled.load(Ordering::Relaxed)
    }

    pub fn set_flashing_led_disabled(&self, disabled: bool) {
        self.flashing_led_disabled.store(disabled, Ordering::Relaxed);
    }

    pub fn charging_led_mode(&self) -> ChargingLedMode {
        ChargingLedMode::from_u8(self.charging_led_mode.load(Ordering::Relaxed))
    }

    pub fn set_charging_led_mode(&self, mode: ChargingLedMode) {
        self.charging_led_mode.store(mode.as_u8(), Ordering::Relaxed);
    }

    fn stash(&self) -> std::sync::MutexGuard<'_, Option<u32>> {
        self.dash_sound_original
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a charging-sound mute is currently active.
    pub fn dash_mute_active(&self) -> bool {
        self.stash().is_some()
    }

    /// Remember the receiver's real sound id for the duration of one call.
    pub fn stash_dash_sound_id(&self, id: u32) {
        *self.stash() = Some(id);
    }

    /// The stashed sound id, if a mute is active.
    pub fn stashed_dash_sound_id(&self) -> Option<u32> {
        *self.stash()
    }

    /// Clear the stash once the sound id has been restored.
    pub fn clear_dash_sound_id(&self) {
        *self.stash() = None;
    }
}

impl Default for PolicyState {
    fn default() -> Self {
        Self::new()
    }
}

// ── Controller back reference ──

/// Weak back reference to the live intercepted LED controller.
///
/// The controller's lifecycle belongs to the host; this binding only
/// allows the settings listener to push a "refresh now" signal at it.
pub struct LedBinding {
    slot: Mutex<Option<Weak<Mutex<dyn LedController>>>>,
}

impl LedBinding {
    pub fn new() -> Self {
        LedBinding {
            slot: Mutex::new(None),
        }
    }

    /// Record the controller attached by the construction hook.
    pub fn attach(&self, controller: &Arc<Mutex<dyn LedController>>) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::downgrade(controller));
    }

    /// Whether a live controller is currently attached.
    pub fn is_attached(&self) -> bool {
        self.upgrade().is_some()
    }

    fn upgrade(&self) -> Option<Arc<Mutex<dyn LedController>>> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().and_then(Weak::upgrade)
    }

    /// Ask the attached controller to recompute its light state now.
    ///
    /// A silent no-op when no controller is attached yet — the refresh
    /// naturally happens once attachment occurs.
    pub fn request_refresh(&self) -> Result<()> {
        let Some(controller) = self.upgrade() else {
            return Ok(());
        };
        let mut controller = controller.lock().unwrap_or_else(PoisonError::into_inner);
        controller.request_refresh()
    }
}

impl Default for LedBinding {
    fn default() -> Self {
        Self::new()
    }
}
