//! Terminal rendering for pipeline events

use console::style;
use vial_events::AppEvent;

/// Renders events to the terminal as they arrive
pub struct EventHandler {
    colors: bool,
    debug: bool,
}

impl EventHandler {
    pub fn new(colors: bool, debug: bool) -> Self {
        Self { colors, debug }
    }

    fn ok(&self, text: &str) -> String {
        if self.colors {
            style(text).green().to_string()
        } else {
            text.to_string()
        }
    }

    fn warn(&self, text: &str) -> String {
        if self.colors {
            style(text).yellow().bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::OperationStarted { operation } => {
                println!("==> {operation}");
            }
            AppEvent::OperationCompleted { operation, success } => {
                if success {
                    println!("{} {operation}", self.ok("ok:"));
                } else {
                    println!("{} {operation}", self.warn("failed:"));
                }
            }
            AppEvent::OperationFailed { operation, error } => {
                eprintln!("{} {operation}: {error}", self.warn("error:"));
            }
            AppEvent::DownloadStarted { url, artifact, .. } => {
                println!("  fetching {artifact} from {url}");
            }
            AppEvent::DownloadProgress { .. } => {}
            AppEvent::DownloadCompleted { artifact, size } => {
                println!("  fetched {artifact} ({size} bytes)");
            }
            AppEvent::Verified { artifact, sha256 } => {
                println!("  verified {artifact} ({})", &sha256[..12]);
            }
            AppEvent::VenvCreating {
                package,
                version,
                python,
            } => {
                println!("  provisioning venv for {package}-{version} with {python}");
            }
            AppEvent::VenvCreated { .. } => {}
            AppEvent::ArchiveInstalling { archive, .. } => {
                println!("  installing {archive}");
            }
            AppEvent::ArchiveInstalled { .. } => {}
            AppEvent::ExecutableLinked { executable, path } => {
                println!("  linked {executable} -> {path}");
            }
            AppEvent::SmokeTestStarted { executable, flag } => {
                println!("  smoke test: {executable} {flag}");
            }
            AppEvent::SmokeTestPassed { executable } => {
                println!("  {} {executable} runs", self.ok("ok:"));
            }
            AppEvent::SmokeTestFailed { executable, status } => {
                eprintln!(
                    "{} smoke test for {executable} failed ({status}); install kept on disk",
                    self.warn("warning:")
                );
            }
            AppEvent::Warning { message } => {
                eprintln!("{} {message}", self.warn("warning:"));
            }
            AppEvent::DebugLog { message } => {
                if self.debug {
                    eprintln!("debug: {message}");
                }
            }
        }
    }
}
