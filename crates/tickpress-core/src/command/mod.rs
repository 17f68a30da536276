// Tickpress Commands
// Messages on the command queue, their handlers and the single consumer

pub mod coordinator;
pub mod dispatcher;
pub mod handlers;

pub use coordinator::{Console, Coordinator, Exit, StdoutConsole};
pub use dispatcher::{command_queue, Dispatcher};
pub use handlers::{CommandError, StatusReport};

use crate::state::Session;
use crate::trigger::Trigger;

/// A discrete unit of work for the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A bound hotkey was pressed
    Trigger(Trigger),
    /// A line typed at the console, answering the pending prompt
    Input(String),
    /// SIGINT or SIGTERM
    Interrupt,
}

/// A setting waiting for console input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    PickupKey,
    SyncInterval,
    NonHostLag,
    ReloadDefaults,
}

impl Prompt {
    /// Prompt opened by a trigger, if the trigger needs input
    pub fn for_trigger(trigger: Trigger) -> Option<Self> {
        match trigger {
            Trigger::SetPickupKey => Some(Prompt::PickupKey),
            Trigger::SetSyncInterval => Some(Prompt::SyncInterval),
            Trigger::SetNonHostLag => Some(Prompt::NonHostLag),
            Trigger::ReloadDefaults => Some(Prompt::ReloadDefaults),
            _ => None,
        }
    }

    /// Question shown to the operator
    pub fn question(self, session: &Session) -> String {
        let runtime = session.runtime();
        match self {
            Prompt::PickupKey => {
                format!("Enter new pickup key (current: {}):", runtime.pickup_key)
            }
            Prompt::SyncInterval => format!(
                "Enter new sync interval in seconds (current: {}):",
                runtime.sync_interval
            ),
            Prompt::NonHostLag => format!(
                "Enter new non-host lag in seconds (current: {}):",
                runtime.non_host_lag
            ),
            Prompt::ReloadDefaults => "Reset all settings to defaults? [y/N]:".to_string(),
        }
    }
}
