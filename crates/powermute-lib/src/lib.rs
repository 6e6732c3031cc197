//! PowerMute — battery LED, low-battery warning, and charging-sound
//! overrides for a host power subsystem.
//!
//! The library intercepts four host entry points through a typed hook
//! registry ([`hook`]), applies the user's policy ([`policy`]) inside
//! before/after actions ([`actions`]), and keeps that policy current via
//! a preference store ([`prefs`]) and a settings-change channel
//! ([`channel`]). The host platform is reached exclusively through the
//! adapter traits in [`host`].

pub mod actions;
pub mod channel;
pub mod error;
pub mod hook;
pub mod host;
pub mod policy;
pub mod prefs;

pub use error::{HookError, Result};
