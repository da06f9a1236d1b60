//! Launching and stopping the external mixer application.

use std::env;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use psutil::process;
use tracing::{info, warn};

use crate::settings::Settings;

/// Terminal emulators probed, in order, when the mixer application has to
/// run inside one.
const TERMINALS: &[&str] = &[
    "x-terminal-emulator",
    "gnome-terminal",
    "konsole",
    "xfce4-terminal",
    "alacritty",
    "xterm",
];

pub struct MixerHelper {
    settings: Arc<Settings>,
}

impl MixerHelper {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Start the configured mixer application, or stop it when it is
    /// already running.
    pub fn toggle(&self) {
        let (app, in_terminal) = {
            let app = self.settings.r().app();
            (app.mixer_app.clone(), app.run_in_terminal)
        };
        if app.is_empty() {
            warn!("no mixer application configured");
            return;
        }

        match find_process(&app) {
            Some(pid) => {
                info!("stopping mixer application {} (pid {})", app, pid);
                let _ = Command::new("kill").arg(pid.to_string()).status();
            }
            None => self.spawn(&app, in_terminal),
        }
    }

    fn spawn(&self, app: &str, in_terminal: bool) {
        let result = if in_terminal {
            match find_terminal() {
                Some(term) => Command::new(term).arg("-e").arg(app).spawn(),
                None => {
                    warn!("no terminal emulator found, running {} directly", app);
                    Command::new(app).spawn()
                }
            }
        } else {
            Command::new(app).spawn()
        };
        match result {
            Ok(child) => info!("started mixer application {} (pid {})", app, child.id()),
            Err(e) => warn!("can't start mixer application {}: {}", app, e),
        }
    }
}

fn find_process(name: &str) -> Option<u32> {
    let processes = match process::processes() {
        Ok(list) => list,
        Err(e) => {
            warn!("can't list processes: {}", e);
            return None;
        }
    };
    for entry in processes {
        if let Ok(proc) = entry {
            if proc.name().map(|n| n == name).unwrap_or(false) {
                return Some(proc.pid());
            }
        }
    }
    None
}

fn find_terminal() -> Option<&'static str> {
    let path = env::var_os("PATH")?;
    for term in TERMINALS {
        for dir in env::split_paths(&path) {
            if Path::new(&dir).join(term).is_file() {
                return Some(term);
            }
        }
    }
    None
}
