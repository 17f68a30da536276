// Tickpress Coordinator
// Single consumer of the command queue; the only code that touches the session

use std::ops::ControlFlow;

use crossbeam_channel::Receiver;

use super::handlers::{self, CommandError};
use super::{Command, Prompt};
use crate::state::{Applied, Session};
use crate::sync::{ArmOutcome, SyncEngine};
use crate::trigger::{Bindings, Trigger};

/// Where user-facing text goes
pub trait Console {
    fn show(&mut self, text: &str);
}

/// Console printing to stdout
#[derive(Debug, Default)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn show(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Collects output instead of printing it
impl Console for Vec<String> {
    fn show(&mut self, text: &str) {
        self.push(text.to_string());
    }
}

/// Why the coordinator stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The quit trigger
    Quit,
    /// SIGINT / SIGTERM
    Interrupted,
    /// Every producer went away
    Disconnected,
}

impl Exit {
    /// Process exit status
    pub fn code(self) -> i32 {
        match self {
            Exit::Quit | Exit::Disconnected => 0,
            Exit::Interrupted => 130,
        }
    }
}

/// Drains the command queue one message at a time.
///
/// Commands run to completion in arrival order, including an armed wait,
/// so there is never more than one mutation in flight. Prompts never block:
/// a setting trigger only records what the next console line is for.
pub struct Coordinator<C: Console = StdoutConsole> {
    session: Session,
    engine: SyncEngine,
    bindings: Bindings,
    pending: Option<Prompt>,
    console: C,
}

impl<C: Console> Coordinator<C> {
    pub fn new(session: Session, engine: SyncEngine, bindings: Bindings, console: C) -> Self {
        Self {
            session,
            engine,
            bindings,
            pending: None,
            console,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// Prompt the next console line will answer
    pub fn pending(&self) -> Option<Prompt> {
        self.pending
    }

    /// Print the startup banner
    pub fn greet(&mut self) {
        let help = self.bindings.help_text();
        self.console.show(help.trim_end());
        let status = handlers::status_report(&self.session).to_string();
        self.console.show(&status);
    }

    /// Process commands until quit, interrupt, or the queue closes
    pub fn run(&mut self, commands: &Receiver<Command>) -> Exit {
        for command in commands.iter() {
            if let ControlFlow::Break(exit) = self.handle(command) {
                return exit;
            }
        }
        Exit::Disconnected
    }

    /// Process a single command
    pub fn handle(&mut self, command: Command) -> ControlFlow<Exit> {
        match command {
            Command::Trigger(trigger) => return self.on_trigger(trigger),
            Command::Input(line) => self.on_input(&line),
            Command::Interrupt => {
                self.console.show("Force exited...");
                return ControlFlow::Break(Exit::Interrupted);
            }
        }
        ControlFlow::Continue(())
    }

    fn on_trigger(&mut self, trigger: Trigger) -> ControlFlow<Exit> {
        if let Some(prompt) = Prompt::for_trigger(trigger) {
            if let Some(previous) = self.pending.replace(prompt) {
                log::debug!("Prompt {:?} replaced by {:?}", previous, prompt);
            }
            let question = prompt.question(&self.session);
            self.console.show(&question);
            return ControlFlow::Continue(());
        }

        match trigger {
            Trigger::ShowHelp => {
                let help = self.bindings.help_text();
                self.console.show(help.trim_end());
            }
            Trigger::ShowStatus => {
                let status = handlers::status_report(&self.session).to_string();
                self.console.show(&status);
            }
            Trigger::ToggleHostMode => {
                let applied = handlers::toggle_host_mode(&mut self.session);
                self.report_applied(&applied);
            }
            Trigger::Arm => self.arm(),
            Trigger::Quit => {
                self.console.show("Exited...");
                return ControlFlow::Break(Exit::Quit);
            }
            Trigger::SetPickupKey
            | Trigger::SetSyncInterval
            | Trigger::SetNonHostLag
            | Trigger::ReloadDefaults => {}
        }
        ControlFlow::Continue(())
    }

    fn on_input(&mut self, line: &str) {
        let Some(prompt) = self.pending.take() else {
            log::debug!("Ignoring console input with no open prompt: {:?}", line);
            return;
        };

        let result = match prompt {
            Prompt::PickupKey => handlers::set_pickup_key(&mut self.session, line),
            Prompt::SyncInterval => handlers::set_sync_interval(&mut self.session, line),
            Prompt::NonHostLag => handlers::set_non_host_lag(&mut self.session, line),
            Prompt::ReloadDefaults => handlers::reload_defaults(&mut self.session, line),
        };

        match result {
            Ok(applied) => self.report_applied(&applied),
            Err(CommandError::Cancelled(_)) => self.console.show("Reload cancelled."),
            Err(e) => self.console.show(&format!("Invalid input: {}", e)),
        }
    }

    fn report_applied(&mut self, applied: &Applied) {
        if applied.saved {
            self.console.show(&applied.summary);
        } else {
            self.console.show(&format!(
                "{} (not saved: settings file could not be written)",
                applied.summary
            ));
        }
    }

    fn arm(&mut self) {
        let runtime = self.session.runtime().clone();
        let plan = self.engine.plan(&runtime);
        self.console.show(&format!(
            "Will press '{}' at {}, with {} ms lag compensation (in {:.2}s).",
            runtime.pickup_key,
            plan.target.format("%H:%M:%S"),
            plan.lag.as_millis(),
            plan.wait.saturating_sub(plan.lag).as_secs_f64(),
        ));

        let outcome = self.engine.fire(&plan, &runtime.pickup_key);
        let message = match outcome {
            ArmOutcome::Fired { presses: 1 } => format!("Pressed. {}", self.rearm_hint()),
            ArmOutcome::Fired { presses } => {
                format!("Pressed {} times. {}", presses, self.rearm_hint())
            }
            ArmOutcome::Cancelled { presses } => {
                format!("Armed wait cancelled after {} press(es).", presses)
            }
            ArmOutcome::PressFailed { error, .. } => format!("Press failed: {}", error),
        };
        self.console.show(&message);
    }

    fn rearm_hint(&self) -> String {
        let key = |t| {
            self.bindings
                .key_for(t)
                .map(|k| k.name())
                .unwrap_or("?")
        };
        format!(
            "Press {} to trigger again, {} to toggle host mode, {} to quit.",
            key(Trigger::Arm),
            key(Trigger::ToggleHostMode),
            key(Trigger::Quit)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigStore, Configuration};
    use crate::output::DryRunPresser;
    use crate::sync::{cancel_pair, CancelToken, Clock};
    use chrono::{NaiveDate, NaiveDateTime};

    struct Pinned(NaiveDateTime);

    impl Clock for Pinned {
        fn now(&self) -> NaiveDateTime {
            self.0
        }
    }

    fn near_boundary() -> Pinned {
        Pinned(
            NaiveDate::from_ymd_opt(2024, 5, 17)
                .unwrap()
                .and_hms_milli_opt(12, 0, 9, 995)
                .unwrap(),
        )
    }

    fn coordinator(
        dir: &tempfile::TempDir,
        cancel: CancelToken,
    ) -> (Coordinator<Vec<String>>, DryRunPresser) {
        let presser = DryRunPresser::new();
        let store = ConfigStore::new(dir.path().join("config.toml"));
        let mut config = Configuration::default();
        config.host_mode = true;
        let session = Session::new(store, config);
        let engine = SyncEngine::new(Box::new(near_boundary()), Box::new(presser.clone()), cancel);
        (
            Coordinator::new(session, engine, Bindings::default_layout(), Vec::new()),
            presser,
        )
    }

    #[test]
    fn test_prompt_then_input_applies() {
        let dir = tempfile::tempdir().unwrap();
        let (mut coord, _) = coordinator(&dir, CancelToken::never());

        coord.handle(Command::Trigger(Trigger::SetSyncInterval));
        assert_eq!(coord.pending(), Some(Prompt::SyncInterval));
        coord.handle(Command::Input("20".into()));

        assert_eq!(coord.pending(), None);
        assert_eq!(coord.session().runtime().sync_interval, 20);
        assert!(coord.console().last().unwrap().contains("20s"));
    }

    #[test]
    fn test_invalid_input_reported_and_prompt_closed() {
        let dir = tempfile::tempdir().unwrap();
        let (mut coord, _) = coordinator(&dir, CancelToken::never());

        coord.handle(Command::Trigger(Trigger::SetNonHostLag));
        coord.handle(Command::Input("-1".into()));

        assert_eq!(coord.pending(), None);
        assert_eq!(coord.session().runtime().non_host_lag, 0.1);
        assert!(coord.console().last().unwrap().starts_with("Invalid input"));
    }

    #[test]
    fn test_input_without_prompt_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (mut coord, _) = coordinator(&dir, CancelToken::never());
        let before = coord.session().config().clone();

        assert_eq!(
            coord.handle(Command::Input("y".into())),
            ControlFlow::Continue(())
        );
        assert_eq!(coord.session().config(), &before);
        assert!(coord.console().is_empty());
    }

    #[test]
    fn test_reload_cancelled_message() {
        let dir = tempfile::tempdir().unwrap();
        let (mut coord, _) = coordinator(&dir, CancelToken::never());

        coord.handle(Command::Trigger(Trigger::ReloadDefaults));
        coord.handle(Command::Input("no".into()));
        assert_eq!(coord.console().last().unwrap(), "Reload cancelled.");
        assert!(coord.session().runtime().host_mode);
    }

    #[test]
    fn test_later_prompt_replaces_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let (mut coord, _) = coordinator(&dir, CancelToken::never());

        coord.handle(Command::Trigger(Trigger::SetSyncInterval));
        coord.handle(Command::Trigger(Trigger::SetPickupKey));
        coord.handle(Command::Input("e".into()));

        assert_eq!(coord.session().runtime().pickup_key, "e");
        assert_eq!(coord.session().runtime().sync_interval, 10);
    }

    #[test]
    fn test_arm_presses_pickup_key() {
        let dir = tempfile::tempdir().unwrap();
        let (mut coord, presser) = coordinator(&dir, CancelToken::never());

        coord.handle(Command::Trigger(Trigger::Arm));
        assert_eq!(presser.presses(), vec!["f".to_string()]);
        let lines = coord.console();
        assert!(lines[0].starts_with("Will press 'f' at 12:00:10"));
        assert!(lines[1].starts_with("Pressed."));
        assert!(lines[1].contains("F8"));
    }

    #[test]
    fn test_quit_cancels_armed_wait() {
        let dir = tempfile::tempdir().unwrap();
        let (canceller, token) = cancel_pair();
        let (mut coord, presser) = coordinator(&dir, token);
        canceller.cancel();

        coord.handle(Command::Trigger(Trigger::Arm));
        assert!(presser.presses().is_empty());
        assert!(coord.console().last().unwrap().contains("cancelled"));
    }

    #[test]
    fn test_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let (mut coord, _) = coordinator(&dir, CancelToken::never());

        assert_eq!(
            coord.handle(Command::Trigger(Trigger::Quit)),
            ControlFlow::Break(Exit::Quit)
        );
        assert_eq!(
            coord.handle(Command::Interrupt),
            ControlFlow::Break(Exit::Interrupted)
        );
        assert_eq!(Exit::Quit.code(), 0);
        assert_eq!(Exit::Interrupted.code(), 130);
    }

    #[test]
    fn test_status_and_help_are_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let (mut coord, _) = coordinator(&dir, CancelToken::never());

        coord.handle(Command::Trigger(Trigger::ShowStatus));
        coord.handle(Command::Trigger(Trigger::ShowHelp));
        assert!(coord.console()[0].contains("Current settings"));
        assert!(coord.console()[1].contains("Available triggers"));
        assert!(!coord.session().store().path().exists());
    }
}
