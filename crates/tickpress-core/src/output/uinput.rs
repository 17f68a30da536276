// Tickpress uinput Output
// Virtual keyboard that injects the pickup key press

use std::time::Duration;

use evdev::uinput::VirtualDeviceBuilder;
use evdev::{AttributeSet, EventType, InputEvent};

use super::{resolve_key, KeyPresser, PressError};
use crate::{Action, Key};

/// Name given to the virtual device; the hotkey listener skips it.
pub const VIRTUAL_DEVICE_NAME: &str = "Tickpress (virtual) Keyboard";

/// Virtual uinput keyboard for key output
pub struct VirtualKeyboard {
    device: evdev::uinput::VirtualDevice,
    /// Key currently held down, released on drop if a release failed
    held: Option<Key>,
    hold: Duration,
}

impl VirtualKeyboard {
    /// Create a new virtual uinput keyboard
    pub fn new() -> Result<Self, PressError> {
        let mut keys = AttributeSet::new();
        // Advertise all standard keyboard keys (0-255)
        for code in 0..256u16 {
            keys.insert(evdev::Key::new(code));
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(|e: std::io::Error| PressError::DeviceCreation(e.to_string()))?
            .name(VIRTUAL_DEVICE_NAME)
            .with_keys(&keys)
            .map_err(|e: std::io::Error| PressError::DeviceCreation(e.to_string()))?
            .build()
            .map_err(|e: std::io::Error| PressError::DeviceCreation(e.to_string()))?;

        Ok(Self {
            device,
            held: None,
            hold: Duration::ZERO,
        })
    }

    /// Keep the key down this long between press and release.
    ///
    /// Some applications drop presses that arrive with zero gap.
    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    /// Write a single key event to the virtual device
    fn write_key_event(&mut self, key: Key, action: Action) -> Result<(), PressError> {
        let key_event = InputEvent::new(EventType::KEY, key.code(), action.to_i32());
        // SYN event is required for the kernel to process the key event
        let syn_event = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);

        self.device
            .emit(&[key_event, syn_event])
            .map_err(|e: std::io::Error| PressError::WriteError(e.to_string()))?;

        match action {
            Action::Press => self.held = Some(key),
            Action::Release => self.held = None,
            Action::Repeat => {}
        }
        Ok(())
    }
}

impl KeyPresser for VirtualKeyboard {
    fn press_and_release(&mut self, key: &str) -> Result<(), PressError> {
        let key = resolve_key(key)?;
        self.write_key_event(key, Action::Press)?;
        if !self.hold.is_zero() {
            std::thread::sleep(self.hold);
        }
        self.write_key_event(key, Action::Release)
    }
}

/// Never leave a key stuck down when the device goes away
impl Drop for VirtualKeyboard {
    fn drop(&mut self) {
        if let Some(key) = self.held.take() {
            let _ = self.write_key_event(key, Action::Release);
        }
    }
}
