// Tickpress CLI
// Presses a key on the next sync boundary when the arm hotkey is hit

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use tickpress_core::{
    cancel_pair, command_queue, Bindings, Burst, ConfigStore, Coordinator, Dispatcher,
    DryRunPresser, Exit, HotkeyListener, Key, KeyPresser, Session, StdoutConsole, SyncEngine,
    SystemClock, VirtualKeyboard,
};

/// Press a key in sync with a wall-clock tick
#[derive(Parser, Debug)]
#[command(name = "tickpress")]
#[command(version)]
#[command(about = "Press a key on the next sync boundary, with lag compensation", long_about = None)]
struct Args {
    /// Settings file (default: ~/.config/tickpress/config.toml)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Only listen to these devices, by name or path (can be used multiple times)
    #[arg(short, long, value_name = "DEVICE")]
    devices: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Load the settings file, report what was read and exit
    #[arg(long)]
    check_config: bool,

    /// List available keyboard devices
    #[arg(long)]
    list_devices: bool,

    /// Presses per armed cycle
    #[arg(long, default_value_t = 1, value_name = "COUNT")]
    burst: u32,

    /// Pause between burst presses, in milliseconds
    #[arg(long, default_value_t = 40, value_name = "MS")]
    burst_interval_ms: u64,

    /// Hold the key down this long before releasing, in milliseconds
    #[arg(long, default_value_t = 0, value_name = "MS")]
    hold_ms: u64,

    /// Log presses instead of injecting them
    #[arg(long)]
    dry_run: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

fn list_devices() -> anyhow::Result<()> {
    let devices = HotkeyListener::list_devices().context("Error finding keyboard devices")?;
    println!("Found {} keyboard device(s):", devices.len());
    for device in &devices {
        match &device.path {
            Some(path) => println!("  {}: {} ({})", device.index, device.name, path),
            None => println!("  {}: {}", device.index, device.name),
        }
    }
    Ok(())
}

fn check_config(store: &ConfigStore) -> anyhow::Result<()> {
    let (config, meta) = store.load();
    println!("{}", meta.describe());
    println!("  pickup_key    = {}", config.pickup_key);
    println!("  sync_interval = {}", config.sync_interval);
    println!("  non_host_lag  = {}", config.non_host_lag);
    println!("  host_mode     = {}", config.host_mode);
    if !meta.warnings.is_empty() {
        bail!("{} problem(s) found in {}", meta.warnings.len(), meta.path.display());
    }
    println!("Configuration is valid");
    Ok(())
}

fn build_presser(args: &Args) -> anyhow::Result<Box<dyn KeyPresser>> {
    if args.dry_run {
        return Ok(Box::new(DryRunPresser::new()));
    }
    let keyboard = VirtualKeyboard::new()
        .context("Could not create the virtual keyboard (is /dev/uinput writable?)")?
        .with_hold(Duration::from_millis(args.hold_ms));
    Ok(Box::new(keyboard))
}

/// Forward SIGINT/SIGTERM to the coordinator; a second signal exits at once.
fn spawn_signal_thread(dispatcher: Dispatcher) -> anyhow::Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM]).context("Could not install signal handler")?;
    std::thread::spawn(move || {
        let mut interrupted = false;
        for signal in &mut signals {
            log::debug!("Received signal {}", signal);
            if interrupted {
                std::process::exit(Exit::Interrupted.code());
            }
            interrupted = true;
            dispatcher.interrupt();
        }
    });
    Ok(())
}

/// Why the console reader stopped
#[derive(Debug)]
enum InputEnd {
    /// End of input; open prompts can no longer be answered
    Closed,
    /// Reading failed
    Failed(std::io::Error),
    /// The coordinator is gone
    Disconnected,
}

/// Forward each line of `reader` to the coordinator until one side stops
fn forward_lines<R: BufRead>(reader: R, dispatcher: &Dispatcher) -> InputEnd {
    for line in reader.lines() {
        match line {
            Ok(line) => {
                if !dispatcher.input(line) {
                    return InputEnd::Disconnected;
                }
            }
            Err(e) => return InputEnd::Failed(e),
        }
    }
    InputEnd::Closed
}

/// Feed console lines to the coordinator so prompts never block it
fn spawn_stdin_thread(dispatcher: Dispatcher) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        match forward_lines(stdin.lock(), &dispatcher) {
            InputEnd::Closed => {
                log::warn!("Console input closed; prompts can no longer be answered")
            }
            InputEnd::Failed(e) => {
                log::warn!("Console input failed: {}; prompts can no longer be answered", e)
            }
            InputEnd::Disconnected => {}
        }
    });
}

fn spawn_listener_thread(
    mut listener: HotkeyListener,
    dispatcher: Dispatcher,
    running: Arc<AtomicBool>,
) {
    std::thread::spawn(move || {
        let result = listener.run(&running, |key| {
            dispatcher.key_pressed(key);
        });
        if let Err(e) = result {
            log::error!("Hotkey listener stopped: {}", e);
        }
    });
}

fn run(args: Args) -> anyhow::Result<Exit> {
    if args.list_devices {
        list_devices()?;
        return Ok(Exit::Quit);
    }

    let store = args
        .config
        .clone()
        .map(ConfigStore::new)
        .unwrap_or_else(ConfigStore::at_default_location);

    if args.check_config {
        check_config(&store)?;
        return Ok(Exit::Quit);
    }

    let (session, meta) = Session::load(store);
    println!("{}", meta.describe());

    let bindings = Bindings::default_layout();
    let hotkeys: Vec<Key> = bindings.iter().map(|(key, _)| key).collect();
    let listener = HotkeyListener::open(&args.devices, &hotkeys)
        .context("Could not open keyboard devices (is the user in the 'input' group?)")?;
    log::debug!("Listening on {:?}", listener.device_names());

    let (canceller, token) = cancel_pair();
    let (dispatcher, commands) = command_queue(bindings.clone(), canceller);

    let burst = Burst::new(args.burst, Duration::from_millis(args.burst_interval_ms));
    let engine =
        SyncEngine::new(Box::new(SystemClock), build_presser(&args)?, token).with_burst(burst);

    let running = Arc::new(AtomicBool::new(true));
    spawn_signal_thread(dispatcher.clone())?;
    spawn_stdin_thread(dispatcher.clone());
    spawn_listener_thread(listener, dispatcher, running.clone());

    let mut coordinator = Coordinator::new(session, engine, bindings, StdoutConsole);
    coordinator.greet();
    let exit = coordinator.run(&commands);
    running.store(false, Ordering::SeqCst);
    Ok(exit)
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let code = match run(args) {
        Ok(exit) => exit.code(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickpress_core::Command;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["tickpress"]);

        assert_eq!(args.config, None);
        assert!(args.devices.is_empty());
        assert!(!args.verbose);
        assert!(!args.check_config);
        assert!(!args.list_devices);
        assert!(!args.dry_run);
        assert_eq!(args.burst, 1);
        assert_eq!(args.burst_interval_ms, 40);
        assert_eq!(args.hold_ms, 0);
    }

    #[test]
    fn test_args_with_options() {
        let args = Args::parse_from([
            "tickpress",
            "--config",
            "/tmp/tickpress.toml",
            "--verbose",
            "--devices",
            "/dev/input/event0",
            "--devices",
            "/dev/input/event1",
            "--burst",
            "5",
            "--burst-interval-ms",
            "20",
        ]);

        assert_eq!(args.config, Some(PathBuf::from("/tmp/tickpress.toml")));
        assert!(args.verbose);
        assert_eq!(args.devices, vec!["/dev/input/event0", "/dev/input/event1"]);
        assert_eq!(args.burst, 5);
        assert_eq!(args.burst_interval_ms, 20);
    }

    #[test]
    fn test_args_check_config() {
        let args = Args::parse_from(["tickpress", "-c", "/tmp/t.toml", "--check-config"]);
        assert!(args.check_config);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/t.toml")));
    }

    #[test]
    fn test_check_config_reports_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "sync_interval = 0\n").unwrap();

        assert!(check_config(&ConfigStore::new(&path)).is_err());

        std::fs::write(&path, "sync_interval = 15\n").unwrap();
        assert!(check_config(&ConfigStore::new(&path)).is_ok());
    }

    #[test]
    fn test_console_lines_forwarded_until_eof() {
        let (canceller, _token) = cancel_pair();
        let (dispatcher, commands) = command_queue(Bindings::default_layout(), canceller);

        let end = forward_lines(std::io::Cursor::new("15\ny\n"), &dispatcher);
        assert!(matches!(end, InputEnd::Closed));
        assert_eq!(commands.try_recv(), Ok(Command::Input("15".to_string())));
        assert_eq!(commands.try_recv(), Ok(Command::Input("y".to_string())));
        assert!(commands.try_recv().is_err());
    }

    #[test]
    fn test_console_reader_stops_when_coordinator_gone() {
        let (canceller, _token) = cancel_pair();
        let (dispatcher, commands) = command_queue(Bindings::default_layout(), canceller);
        drop(commands);

        let end = forward_lines(std::io::Cursor::new("15\n"), &dispatcher);
        assert!(matches!(end, InputEnd::Disconnected));
    }
}
