// Tickpress Core Library
// Presses a key on a wall-clock sync boundary, driven by global hotkeys

pub mod action;
pub mod command;
pub mod config;
pub mod input;
pub mod key;
pub mod output;
pub mod state;
pub mod sync;
pub mod trigger;

pub use action::Action;
pub use command::{
    command_queue, Command, CommandError, Console, Coordinator, Dispatcher, Exit, Prompt,
    StatusReport, StdoutConsole,
};
pub use config::{ConfigError, ConfigMetadata, ConfigStore, Configuration, ValueError};
pub use key::{key_from_name, Key};
pub use output::{DryRunPresser, KeyPresser, PressError};
pub use state::{Applied, RuntimeState, Session};
pub use sync::{
    cancel_pair, ArmOutcome, ArmPlan, ArmReport, Burst, CancelToken, Canceller, Clock,
    SyncEngine, SystemClock,
};
pub use trigger::{BindingError, Bindings, Trigger};

#[cfg(feature = "linux-input")]
pub use input::{HotkeyListener, ListenerError};
#[cfg(feature = "linux-input")]
pub use output::VirtualKeyboard;
