// Tickpress Dispatcher
// Producer side of the command queue, shared by every event source

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Command;
use crate::key::Key;
use crate::sync::Canceller;
use crate::trigger::{Bindings, Trigger};

/// Turns hotkeys, console lines and signals into queued commands.
///
/// Cheap to clone; each event source (listener thread, stdin reader,
/// signal handler) gets its own handle. Quit and interrupt also fire the
/// canceller so an armed wait ends without waiting for the queue.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: Sender<Command>,
    canceller: Canceller,
    bindings: Bindings,
}

/// Create the command queue: many producers, one consumer
pub fn command_queue(bindings: Bindings, canceller: Canceller) -> (Dispatcher, Receiver<Command>) {
    let (tx, rx) = unbounded();
    (
        Dispatcher {
            tx,
            canceller,
            bindings,
        },
        rx,
    )
}

impl Dispatcher {
    /// Dispatch the trigger bound to `key`, if any.
    pub fn key_pressed(&self, key: Key) -> Option<Trigger> {
        let trigger = self.bindings.trigger_for(key)?;
        log::debug!("Hotkey {} -> {}", key, trigger);
        self.dispatch(trigger);
        Some(trigger)
    }

    /// Queue a trigger. Returns false once the coordinator is gone.
    pub fn dispatch(&self, trigger: Trigger) -> bool {
        if trigger == Trigger::Quit {
            self.canceller.cancel();
        }
        self.send(Command::Trigger(trigger))
    }

    /// Queue a console line
    pub fn input(&self, line: String) -> bool {
        self.send(Command::Input(line))
    }

    /// Queue the forced-exit path and cut any armed wait short
    pub fn interrupt(&self) -> bool {
        self.canceller.cancel();
        self.send(Command::Interrupt)
    }

    fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }
}
