//! Unified error type for the powermute-lib crate.
//!
//! [`HookError`] covers the three failure classes of the interception
//! engine. None of them may escape into the host subsystem's own call
//! path: `dispatch` logs action errors and continues, and install
//! functions log and skip the failing attach point.

use std::fmt;

use crate::hook::AttachPoint;

/// Errors raised by hook installation and interception actions.
///
/// String payloads follow the convention **"context: details"** where
/// *context* identifies the operation (e.g. `"battery status"`,
/// `"sound id"`) and *details* describes what went wrong.
#[derive(Debug)]
pub enum HookError {
    /// The named host entry point does not exist on this platform build.
    /// The hook is skipped; other attach points still install.
    AttachPointNotFound(AttachPoint),
    /// Reading or writing a foreign field failed. The action degrades to
    /// a no-op for the current call only.
    StateAccess(String),
    /// Forcing a refresh on the attached LED controller failed.
    Refresh(String),
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookError::AttachPointNotFound(point) => {
                write!(f, "Attach point not found: {point}")
            }
            HookError::StateAccess(e) => write!(f, "State access failed: {e}"),
            HookError::Refresh(e) => write!(f, "Refresh failed: {e}"),
        }
    }
}

impl std::error::Error for HookError {}

/// Crate-level Result alias using [`HookError`].
pub type Result<T> = std::result::Result<T, HookError>;
