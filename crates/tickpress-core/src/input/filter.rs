// Tickpress Input Layer - Device Filtering
// Device matching for autodetection and manual selection

/// Check if a device should be listened to.
///
/// 1. Virtual devices are always rejected.
/// 2. If names are given, only devices matching by path or name are used.
/// 3. Otherwise only keyboards that can emit a bound hotkey are used.
pub fn matches_device_filter(
    device_name: &str,
    device_path: &str,
    filter_names: &[String],
    is_hotkey_keyboard: bool,
    is_virtual: bool,
) -> bool {
    if is_virtual {
        return false;
    }

    if !filter_names.is_empty() {
        return filter_names
            .iter()
            .any(|wanted| device_path == wanted || device_name == wanted);
    }

    is_hotkey_keyboard
}
