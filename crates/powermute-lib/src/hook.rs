//! Hook registry — before/after interception points over host entry points.
//!
//! The host adapter exposes each overridable entry point as an
//! [`AttachPoint`]; this module binds before- and/or after-actions to
//! those points. A before-action sees a mutable view of the call's
//! receiver and may force a result, which skips the original logic
//! entirely. An after-action sees the same receiver plus the computed
//! result, whether or not it was forced. Action errors are logged and
//! contained — they never escape into the host's own call path.

use std::fmt;

use crate::error::{HookError, Result};
use crate::host::{ChargingSoundReceiver, HookHost, LedAttachment, LedController, WarningReceiver};

/// Named host entry points this module can intercept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachPoint {
    /// LED controller construction (attachment time).
    LedControllerConstructed,
    /// LED light-state recompute call.
    LedRecompute,
    /// Low-battery notification update call.
    WarningUpdate,
    /// Vendor-specific battery-info-refreshed callback.
    BatteryInfoRefreshed,
}

impl fmt::Display for AttachPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttachPoint::LedControllerConstructed => "led-controller-constructed",
            AttachPoint::LedRecompute => "led-recompute",
            AttachPoint::WarningUpdate => "warning-update",
            AttachPoint::BatteryInfoRefreshed => "battery-info-refreshed",
        };
        write!(f, "{name}")
    }
}

// ── Call views ──

/// Mutable view of an intercepted call handed to before-actions.
pub struct BeforeCall<'a, R: ?Sized, T> {
    receiver: &'a mut R,
    forced: Option<T>,
}

impl<R: ?Sized, T> BeforeCall<'_, R, T> {
    /// The call's receiver object.
    pub fn receiver(&mut self) -> &mut R {
        self.receiver
    }

    /// Force the call's result, skipping the original logic.
    pub fn force_result(&mut self, value: T) {
        self.forced = Some(value);
    }

    /// Whether a result has been forced by this or an earlier before-action.
    pub fn is_forced(&self) -> bool {
        self.forced.is_some()
    }
}

/// View of an intercepted call handed to after-actions, once the result
/// exists (computed by the original logic or forced by a before-action).
pub struct AfterCall<'a, R: ?Sized, T> {
    receiver: &'a mut R,
    result: &'a T,
    forced: bool,
}

impl<R: ?Sized, T> AfterCall<'_, R, T> {
    /// The call's receiver object.
    pub fn receiver(&mut self) -> &mut R {
        self.receiver
    }

    /// The call's result.
    pub fn result(&self) -> &T {
        self.result
    }

    /// Whether the result was forced (the original logic was skipped).
    pub fn was_forced(&self) -> bool {
        self.forced
    }
}

// ── Hooks ──

/// Boxed before-action over receiver `R` and result `T`.
pub type BeforeAction<R, T> =
    Box<dyn for<'a> Fn(&mut BeforeCall<'a, R, T>) -> Result<()> + Send + Sync>;

/// Boxed after-action over receiver `R` and result `T`.
pub type AfterAction<R, T> =
    Box<dyn for<'a> Fn(&mut AfterCall<'a, R, T>) -> Result<()> + Send + Sync>;

/// One interception: an optional before-action and/or after-action.
pub struct Hook<R: ?Sized, T> {
    before: Option<BeforeAction<R, T>>,
    after: Option<AfterAction<R, T>>,
}

impl<R: ?Sized, T> Hook<R, T> {
    /// Start an empty hook; attach actions with [`before`](Self::before)
    /// and [`after`](Self::after).
    pub fn new() -> Self {
        Hook {
            before: None,
            after: None,
        }
    }

    /// Attach a before-action.
    pub fn before(
        mut self,
        action: impl for<'a> Fn(&mut BeforeCall<'a, R, T>) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.before = Some(Box::new(action));
        self
    }

    /// Attach an after-action.
    pub fn after(
        mut self,
        action: impl for<'a> Fn(&mut AfterCall<'a, R, T>) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.after = Some(Box::new(action));
        self
    }
}

impl<R: ?Sized, T> Default for Hook<R, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies one registered hook. Hooks are never unregistered — the
/// handle exists for logging and diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookHandle {
    point: AttachPoint,
    index: usize,
}

impl HookHandle {
    pub fn point(&self) -> AttachPoint {
        self.point
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Outcome of dispatching an intercepted call.
#[derive(Debug)]
pub struct Dispatched<T> {
    /// The call's result (original or forced).
    pub value: T,
    /// True when a before-action forced the result and the original
    /// logic was skipped.
    pub forced: bool,
}

// ── Hook point ──

/// All hooks registered against one attach point.
pub struct HookPoint<R: ?Sized, T> {
    point: AttachPoint,
    hooks: Vec<Hook<R, T>>,
}

impl<R: ?Sized, T> HookPoint<R, T> {
    fn new(point: AttachPoint) -> Self {
        HookPoint {
            point,
            hooks: Vec::new(),
        }
    }

    /// The attach point this hook point binds to.
    pub fn point(&self) -> AttachPoint {
        self.point
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Register a hook against this attach point.
    ///
    /// Fails with [`HookError::AttachPointNotFound`] when the running
    /// host build does not expose the entry point. Callers log and skip
    /// so independent attach points still install.
    pub fn register(&mut self, host: &dyn HookHost, hook: Hook<R, T>) -> Result<HookHandle> {
        if !host.supports(self.point) {
            return Err(HookError::AttachPointNotFound(self.point));
        }
        self.hooks.push(hook);
        Ok(HookHandle {
            point: self.point,
            index: self.hooks.len() - 1,
        })
    }

    /// Run an intercepted call: before-actions, then `original` unless a
    /// result was forced, then after-actions.
    ///
    /// Action errors are logged here and never reach the host call path;
    /// the original logic (or the forced short-circuit) still applies.
    pub fn dispatch(&self, receiver: &mut R, original: impl FnOnce(&mut R) -> T) -> Dispatched<T> {
        let mut call = BeforeCall {
            receiver,
            forced: None,
        };
        for hook in &self.hooks {
            if let Some(before) = &hook.before {
                if let Err(e) = before(&mut call) {
                    log::warn!("{}: before action failed: {e}", self.point);
                }
            }
        }

        let BeforeCall { receiver, forced } = call;
        let was_forced = forced.is_some();
        let result = match forced {
            Some(value) => value,
            None => original(&mut *receiver),
        };

        let mut call = AfterCall {
            receiver,
            result: &result,
            forced: was_forced,
        };
        for hook in &self.hooks {
            if let Some(after) = &hook.after {
                if let Err(e) = after(&mut call) {
                    log::warn!("{}: after action failed: {e}", self.point);
                }
            }
        }

        Dispatched {
            value: result,
            forced: was_forced,
        }
    }
}

// ── Registry ──

/// The four typed hook points consumed by this module.
///
/// Registration happens once at install time (`&mut`); dispatch is
/// shared (`&self`) and safe to call from the host's service threads.
pub struct HookRegistry {
    pub led_constructed: HookPoint<LedAttachment, ()>,
    pub led_recompute: HookPoint<dyn LedController, ()>,
    pub warning_update: HookPoint<dyn WarningReceiver, ()>,
    pub battery_info_refreshed: HookPoint<dyn ChargingSoundReceiver, ()>,
}

impl HookRegistry {
    pub fn new() -> Self {
        HookRegistry {
            led_constructed: HookPoint::new(AttachPoint::LedControllerConstructed),
            led_recompute: HookPoint::new(AttachPoint::LedRecompute),
            warning_update: HookPoint::new(AttachPoint::WarningUpdate),
            battery_info_refreshed: HookPoint::new(AttachPoint::BatteryInfoRefreshed),
        }
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
