//! Entry point for the **launchgrid** replay host.
//!
//! Reads newline-delimited JSON [`HostEvent`]s from stdin on a background
//! thread and drives a [`Launcher`] with them on the main thread.  Time is
//! virtual: it only moves on `{"Advance":{"ms":N}}`, so a script replays
//! identically every run.
//!
//! Every save and every cosmetic event is printed to stdout as one JSON
//! line.  With `--snapshot <path>` the saved record is also read from (at
//! startup) and written back to that file.

use launchgrid::command::HostEvent;
use launchgrid::config::Config;
use launchgrid::ipc::listener::LineSource;
use launchgrid::item::LauncherRecord;
use launchgrid::launcher::Launcher;
use launchgrid::traits::{EventSource, LauncherEvent, LayoutStore};
use log::{error, info, warn};
use serde_json::json;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Resolve the config directory (`$XDG_CONFIG_HOME/launchgrid`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("launchgrid")
}

/// Try to load the config from `$XDG_CONFIG_HOME/launchgrid/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

/// Value following `flag` on the command line.
fn arg_value(flag: &str) -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == flag {
            return args.next();
        }
    }
    None
}

fn load_record(path: &Path) -> Option<LauncherRecord> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            info!("no saved layout at {} ({}), starting empty", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("ignoring unreadable layout {}: {}", path.display(), e);
            None
        }
    }
}

//  Store

/// Prints every save and optionally writes it to a file.
struct JsonStore {
    path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
#[error("store error: {0}")]
struct StoreError(String);

impl LayoutStore for JsonStore {
    type Error = StoreError;

    fn on_layout_change(&mut self, record: &LauncherRecord, manual: bool) -> Result<(), StoreError> {
        emit_line(&json!({ "save": record, "manual": manual }));
        if let Some(path) = &self.path {
            let text = serde_json::to_string_pretty(record)
                .map_err(|e| StoreError(e.to_string()))?;
            std::fs::write(path, text)
                .map_err(|e| StoreError(format!("write {}: {}", path.display(), e)))?;
        }
        Ok(())
    }
}

fn emit_line(value: &serde_json::Value) {
    let mut stdout = io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{}", value) {
        error!("stdout: {}", e);
    }
}

//  Main

fn main() {
    env_logger::init();

    let config = load_config();
    let snapshot = arg_value("--snapshot").map(PathBuf::from);
    let initial = snapshot.as_deref().and_then(load_record);

    let mut launcher = Launcher::new(config, JsonStore { path: snapshot }, initial);
    let (event_tx, event_rx) = mpsc::channel::<LauncherEvent>();
    launcher.set_events(event_tx);

    let (host_tx, host_rx) = mpsc::channel::<HostEvent>();
    std::thread::spawn(move || {
        let mut source = LineSource::new(io::BufReader::new(io::stdin()));
        if let Err(e) = source.run(host_tx) {
            error!("input error: {}", e);
        }
    });

    run_event_loop(&mut launcher, host_rx, &event_rx);
}

fn run_event_loop(
    launcher: &mut Launcher<JsonStore>,
    host_rx: mpsc::Receiver<HostEvent>,
    event_rx: &mpsc::Receiver<LauncherEvent>,
) {
    info!("launchgrid running");
    let mut now = Instant::now();

    for event in host_rx {
        if let HostEvent::Advance { ms } = event {
            now += Duration::from_millis(ms);
        }
        if let Err(e) = launcher.handle(event, now) {
            error!("event error: {}", e);
        }
        print_events(event_rx);
    }

    // Let pending timers run out so the last change is saved.
    while let Some(deadline) = launcher.next_deadline() {
        now = now.max(deadline);
        if let Err(e) = launcher.tick(now) {
            error!("event error: {}", e);
        }
        print_events(event_rx);
    }
    launcher.teardown();
    print_events(event_rx);
    info!("input closed, exiting");
}

fn print_events(rx: &mpsc::Receiver<LauncherEvent>) {
    for event in rx.try_iter() {
        match serde_json::to_value(&event) {
            Ok(value) => emit_line(&value),
            Err(e) => error!("unserializable event {:?}: {}", event, e),
        }
    }
}
