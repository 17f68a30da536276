use std::time::Duration;

use crate::config::Configuration;
use crate::sync::schedule::lag_compensation;

/// Engine-facing copy of the active settings.
///
/// Rebuilt from [`Configuration`] whenever a handler commits a change, so
/// the engine never has to consult the store while arming.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeState {
    pub pickup_key: String,
    pub sync_interval: u32,
    pub non_host_lag: f64,
    /// Authoritative host-mode flag, mirrored into `Configuration::host_mode`
    pub host_mode: bool,
}

impl RuntimeState {
    /// Delay added after the boundary before pressing
    pub fn lag(&self) -> Duration {
        lag_compensation(self.host_mode, self.non_host_lag)
    }
}

impl From<&Configuration> for RuntimeState {
    fn from(config: &Configuration) -> Self {
        Self {
            pickup_key: config.pickup_key.clone(),
            sync_interval: config.sync_interval,
            non_host_lag: config.non_host_lag,
            host_mode: config.host_mode,
        }
    }
}
