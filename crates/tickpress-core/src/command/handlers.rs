// Tickpress Command Handlers
// Validate, apply and persist setting changes

use std::fmt;
use std::path::PathBuf;

use crate::config::{parse_interval, parse_lag, parse_pickup_key, Configuration, ValueError};
use crate::key::key_from_name;
use crate::state::{Applied, Session};

/// Why a handler left the session untouched
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Invalid(#[from] ValueError),

    #[error("reload cancelled (answer was '{0}')")]
    Cancelled(String),
}

pub fn set_pickup_key(session: &mut Session, raw: &str) -> Result<Applied, CommandError> {
    let key = parse_pickup_key(raw)?;
    if key_from_name(&key).is_none() {
        log::warn!(
            "'{}' is not a known key name; presses will fail until it is changed",
            key
        );
    }
    let summary = format!("Pickup key set to '{}'", key);
    Ok(session.commit(summary, |c| c.pickup_key = key))
}

pub fn set_sync_interval(session: &mut Session, raw: &str) -> Result<Applied, CommandError> {
    let interval = parse_interval(raw)?;
    let summary = format!("Sync interval set to {}s", interval);
    Ok(session.commit(summary, |c| c.sync_interval = interval))
}

pub fn set_non_host_lag(session: &mut Session, raw: &str) -> Result<Applied, CommandError> {
    let lag = parse_lag(raw)?;
    let summary = format!("Non-host lag set to {} ms", lag_millis(lag));
    Ok(session.commit(summary, |c| c.non_host_lag = lag))
}

pub fn toggle_host_mode(session: &mut Session) -> Applied {
    let host_mode = !session.runtime().host_mode;
    let summary = format!("Host mode is now {}", on_off(host_mode));
    session.commit(summary, |c| c.host_mode = host_mode)
}

/// Reset every setting to its built-in default after a `y`/`yes` answer.
pub fn reload_defaults(session: &mut Session, confirmation: &str) -> Result<Applied, CommandError> {
    if !is_confirmation(confirmation) {
        return Err(CommandError::Cancelled(confirmation.trim().to_string()));
    }
    Ok(session.commit("Settings reset to defaults".to_string(), |c| {
        *c = Configuration::default()
    }))
}

/// `y` or `yes`, any case, surrounding whitespace ignored
pub fn is_confirmation(raw: &str) -> bool {
    let answer = raw.trim().to_ascii_lowercase();
    answer == "y" || answer == "yes"
}

/// Read-only snapshot for the status trigger
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub pickup_key: String,
    pub sync_interval: u32,
    pub non_host_lag: f64,
    pub host_mode: bool,
    pub dirty: bool,
    pub config_path: PathBuf,
}

pub fn status_report(session: &Session) -> StatusReport {
    let runtime = session.runtime();
    StatusReport {
        pickup_key: runtime.pickup_key.clone(),
        sync_interval: runtime.sync_interval,
        non_host_lag: runtime.non_host_lag,
        host_mode: runtime.host_mode,
        dirty: session.is_dirty(),
        config_path: session.store().path().to_path_buf(),
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current settings:")?;
        writeln!(f, "  pickup key     {}", self.pickup_key)?;
        writeln!(f, "  sync interval  {}s", self.sync_interval)?;
        writeln!(f, "  non-host lag   {} ms", lag_millis(self.non_host_lag))?;
        writeln!(f, "  host mode      {}", on_off(self.host_mode))?;
        if self.dirty {
            write!(
                f,
                "  UNSAVED: last write to {} failed",
                self.config_path.display()
            )
        } else {
            write!(f, "  saved to       {}", self.config_path.display())
        }
    }
}

fn lag_millis(lag: f64) -> i64 {
    (lag * 1000.0).round() as i64
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "On"
    } else {
        "Off"
    }
}
