// Tickpress Output Layer
// Simulated key presses: the injection boundary and its implementations

use std::cell::RefCell;
use std::rc::Rc;

use crate::key::{key_from_name, Key};

#[cfg(feature = "linux-input")]
mod uinput;

#[cfg(feature = "linux-input")]
pub use uinput::{VirtualKeyboard, VIRTUAL_DEVICE_NAME};

/// Error types for key injection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PressError {
    #[error("unknown key name: '{0}'")]
    UnknownKey(String),

    #[error("failed to create virtual device: {0}")]
    DeviceCreation(String),

    #[error("failed to write event: {0}")]
    WriteError(String),
}

/// Synchronously simulates a physical press and release of a named key.
pub trait KeyPresser {
    fn press_and_release(&mut self, key: &str) -> Result<(), PressError>;
}

/// Resolve a configured key name, mapping failure to [`PressError`]
pub fn resolve_key(name: &str) -> Result<Key, PressError> {
    key_from_name(name).ok_or_else(|| PressError::UnknownKey(name.to_string()))
}

/// Presser that logs instead of touching the OS input stream.
///
/// Clones share one press log, so a handle kept outside the engine can
/// inspect what was pressed.
#[derive(Debug, Clone, Default)]
pub struct DryRunPresser {
    pressed: Rc<RefCell<Vec<String>>>,
}

impl DryRunPresser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every key pressed so far, in order
    pub fn presses(&self) -> Vec<String> {
        self.pressed.borrow().clone()
    }
}

impl KeyPresser for DryRunPresser {
    fn press_and_release(&mut self, key: &str) -> Result<(), PressError> {
        let resolved = resolve_key(key)?;
        log::info!("[dry-run] press and release {} ({})", key, resolved);
        self.pressed.borrow_mut().push(key.to_string());
        Ok(())
    }
}
