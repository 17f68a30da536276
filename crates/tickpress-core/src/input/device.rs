// Tickpress Input Layer - Device Detection
// Decides which event devices can deliver hotkeys

use std::collections::HashSet;

use crate::key::Key;

/// Key capabilities read from an evdev device
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    /// Whether the device supports EV_KEY events
    pub has_ev_key: bool,
    /// Supported key codes
    pub supported_keys: HashSet<u16>,
}

impl DeviceCapabilities {
    pub fn new<I: IntoIterator<Item = u16>>(has_ev_key: bool, supported_keys: I) -> Self {
        Self {
            has_ev_key,
            supported_keys: supported_keys.into_iter().collect(),
        }
    }

    /// Check if a specific key is supported
    pub fn supports(&self, key: Key) -> bool {
        self.has_ev_key && self.supported_keys.contains(&key.code())
    }
}

// QWERTY row key codes: Q, W, E, R, T, Y
const QWERTY_CODES: &[u16] = &[16, 17, 18, 19, 20, 21];

// Representative A-Z and SPACE codes for keyboard detection
const A_Z_SPACE_CODES: &[u16] = &[57, 30, 44]; // SPACE, A, Z

/// Determine if a device is a full keyboard.
///
/// Mice, power buttons and media remotes also report EV_KEY, so a keyboard
/// must additionally expose the QWERTY row plus A, Z and SPACE.
pub fn is_keyboard(capabilities: &DeviceCapabilities) -> bool {
    if !capabilities.has_ev_key {
        return false;
    }
    let keys = &capabilities.supported_keys;
    QWERTY_CODES.iter().all(|code| keys.contains(code))
        && A_Z_SPACE_CODES.iter().all(|code| keys.contains(code))
}

/// True if the device can emit at least one of `hotkeys`
pub fn supports_any(capabilities: &DeviceCapabilities, hotkeys: &[Key]) -> bool {
    hotkeys.iter().any(|key| capabilities.supports(*key))
}

/// Check if a device is a virtual device based on its name.
///
/// Our own uinput keyboard must never be read back, or the simulated
/// pickup press could be taken for a hotkey.
pub fn is_virtual_device(name: &str, prefix: &str) -> bool {
    name.contains(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyboard_caps() -> DeviceCapabilities {
        let mut keys = vec![0];
        keys.extend_from_slice(QWERTY_CODES);
        keys.extend_from_slice(A_Z_SPACE_CODES);
        keys.extend(59..=68); // F1-F10
        DeviceCapabilities::new(true, keys)
    }

    #[test]
    fn test_full_keyboard_detected() {
        assert!(is_keyboard(&keyboard_caps()));
    }

    #[test]
    fn test_mouse_is_not_a_keyboard() {
        // BTN_LEFT, BTN_RIGHT, BTN_MIDDLE
        let caps = DeviceCapabilities::new(true, [272, 273, 274]);
        assert!(!is_keyboard(&caps));
    }

    #[test]
    fn test_no_ev_key() {
        let caps = DeviceCapabilities::new(false, QWERTY_CODES.iter().copied());
        assert!(!is_keyboard(&caps));
        assert!(!caps.supports(Key(16)));
    }

    #[test]
    fn test_supports_any_hotkey() {
        let caps = keyboard_caps();
        assert!(supports_any(&caps, &[Key(66), Key(200)]));
        assert!(!supports_any(&caps, &[Key(88)])); // F12 not advertised
        assert!(!supports_any(&caps, &[]));
    }

    #[test]
    fn test_is_virtual_device() {
        assert!(is_virtual_device(
            "Tickpress (virtual) Keyboard",
            "Tickpress (virtual)"
        ));
        assert!(!is_virtual_device("Logitech USB Keyboard", "Tickpress (virtual)"));
    }
}
