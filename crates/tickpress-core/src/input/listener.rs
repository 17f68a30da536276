// Tickpress Hotkey Listener
// Reads key-down events straight from evdev keyboards

use std::os::unix::io::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};

use evdev::{Device, EventType};

use super::{is_keyboard, is_virtual_device, matches_device_filter, supports_any, DeviceCapabilities};
use crate::{Action, Key};

/// Result type for listener operations
pub type ListenerResult<T> = Result<T, ListenerError>;

/// Errors that can occur while capturing hotkeys
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Device information for listing devices
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
    pub path: Option<String>,
}

/// Global hotkey capture over evdev.
///
/// Devices are opened without grabbing, so hotkeys still reach the
/// focused application; only key-down edges are reported.
pub struct HotkeyListener {
    devices: Vec<Device>,
    poll_fds: Vec<libc::pollfd>,
}

impl HotkeyListener {
    /// Virtual device prefix to filter out
    const VIRT_DEVICE_PREFIX: &'static str = "Tickpress (virtual)";

    /// Open every device that can deliver one of `hotkeys`, or the devices
    /// named in `filter_names` when it is not empty.
    pub fn open(filter_names: &[String], hotkeys: &[Key]) -> ListenerResult<Self> {
        let mut devices = Vec::new();

        for (path, device) in evdev::enumerate() {
            let device_name = device.name().unwrap_or("Unknown");
            let device_path = path.to_str().unwrap_or_default();
            let caps = Self::capabilities(&device);
            let hotkey_keyboard = is_keyboard(&caps) && supports_any(&caps, hotkeys);
            let is_virtual = is_virtual_device(device_name, Self::VIRT_DEVICE_PREFIX);

            if matches_device_filter(
                device_name,
                device_path,
                filter_names,
                hotkey_keyboard,
                is_virtual,
            ) {
                log::debug!("Listening on {} ({})", device_name, device_path);
                devices.push(device);
            }
        }

        if devices.is_empty() {
            return Err(ListenerError::DeviceNotFound(
                "No keyboard devices found that can send the hotkeys".to_string(),
            ));
        }

        let poll_fds = devices
            .iter()
            .map(|d| libc::pollfd {
                fd: d.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            })
            .collect();

        Ok(Self { devices, poll_fds })
    }

    /// List all keyboard devices
    ///
    /// This is useful for the --list-devices CLI flag.
    pub fn list_devices() -> ListenerResult<Vec<DeviceInfo>> {
        let mut devices_info = Vec::new();

        for (path, device) in evdev::enumerate() {
            let name = device.name().unwrap_or("Unknown").to_string();
            if is_virtual_device(&name, Self::VIRT_DEVICE_PREFIX)
                || !is_keyboard(&Self::capabilities(&device))
            {
                continue;
            }
            devices_info.push(DeviceInfo {
                index: devices_info.len(),
                name,
                path: path.to_str().map(|s| s.to_string()),
            });
        }

        if devices_info.is_empty() {
            return Err(ListenerError::DeviceNotFound(
                "No keyboard devices found".to_string(),
            ));
        }

        Ok(devices_info)
    }

    fn capabilities(device: &Device) -> DeviceCapabilities {
        let has_ev_key = device.supported_events().contains(EventType::KEY);
        let keys: Vec<u16> = device
            .supported_keys()
            .map(|set| set.iter().map(|k| k.code()).collect())
            .unwrap_or_default();
        DeviceCapabilities::new(has_ev_key, keys)
    }

    /// Wait up to `timeout_ms` for key-down events.
    ///
    /// Returns an empty vector on timeout or EINTR (a signal arrived);
    /// the caller checks its running flag and decides whether to continue.
    pub fn poll_presses(&mut self, timeout_ms: i32) -> ListenerResult<Vec<Key>> {
        let mut presses = Vec::new();

        let poll_result = unsafe {
            libc::poll(
                self.poll_fds.as_mut_ptr(),
                self.poll_fds.len() as libc::nfds_t,
                timeout_ms,
            )
        };

        if poll_result < 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                return Ok(presses);
            }
            return Err(ListenerError::Io(err));
        }

        if poll_result == 0 {
            return Ok(presses);
        }

        let mut lost = Vec::new();
        for (i, device) in self.devices.iter_mut().enumerate() {
            let revents = self.poll_fds[i].revents;
            if revents & libc::POLLIN == 0 {
                if is_hangup(revents) {
                    lost.push(i);
                }
                continue;
            }
            match device.fetch_events() {
                Ok(events) => {
                    for event in events {
                        if event.event_type() != EventType::KEY {
                            continue;
                        }
                        if Action::from_i32(event.value()).is_some_and(Action::just_pressed) {
                            presses.push(Key::from(event.code()));
                        }
                    }
                }
                Err(e) if is_disconnect(&e) => lost.push(i),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => log::debug!("Read from input device {} failed: {}", i, e),
            }
        }

        self.drop_devices(&lost)?;
        Ok(presses)
    }

    /// Stop polling devices that went away; fails once none are left.
    fn drop_devices(&mut self, lost: &[usize]) -> ListenerResult<()> {
        if lost.is_empty() {
            return Ok(());
        }
        for &i in lost.iter().rev() {
            let device = self.devices.remove(i);
            self.poll_fds.remove(i);
            log::warn!("Keyboard disconnected: {}", device_label(&device));
        }
        if self.devices.is_empty() {
            return Err(ListenerError::DeviceNotFound(
                "every hotkey keyboard was disconnected".to_string(),
            ));
        }
        Ok(())
    }

    /// Deliver key-down events to `on_press` until `running` is cleared.
    pub fn run<F>(&mut self, running: &AtomicBool, mut on_press: F) -> ListenerResult<()>
    where
        F: FnMut(Key),
    {
        while running.load(Ordering::SeqCst) {
            for key in self.poll_presses(100)? {
                on_press(key);
            }
        }
        Ok(())
    }

    /// Get the names of all devices
    pub fn device_names(&self) -> Vec<String> {
        self.devices
            .iter()
            .map(|d| d.name().unwrap_or("Unknown").to_string())
            .collect()
    }

    /// Get number of devices being listened to
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

/// Poll flags meaning the fd will never deliver events again
fn is_hangup(revents: libc::c_short) -> bool {
    revents & (libc::POLLHUP | libc::POLLERR | libc::POLLNVAL) != 0
}

/// Read errors raised by an unplugged device
fn is_disconnect(err: &std::io::Error) -> bool {
    err.raw_os_error() == Some(libc::ENODEV)
}

fn device_label(device: &Device) -> String {
    device.name().unwrap_or("Unknown").to_string()
}
