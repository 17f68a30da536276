// Tickpress Input Layer
// Device detection, filtering and the evdev hotkey listener

mod device;
mod filter;

#[cfg(feature = "linux-input")]
mod listener;

pub use device::{is_keyboard, is_virtual_device, supports_any, DeviceCapabilities};
pub use filter::matches_device_filter;

#[cfg(feature = "linux-input")]
pub use listener::{DeviceInfo, HotkeyListener, ListenerError, ListenerResult};
