use crate::config;
use crate::errors::SetupError;
use crate::fetch;
use crate::install::{self, InstallReport};
use crate::platform::{platform, PathUpdate};
use crate::probe;
use eframe::egui::{self, Color32, RichText};
use reqwest::blocking::Client;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;

/// Where the controller currently is. Transitions are pure (see
/// [`transition`]); the GUI only renders the phase and forwards events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Checking,
    Installed,
    NotInstalled,
    Confirming,
    Downloading { received: u64, total: Option<u64> },
    Extracting,
    UpdatingPath,
    Done { path_ok: bool },
}

impl Phase {
    /// Busy phases disable both buttons for the duration of the run.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Phase::Downloading { .. } | Phase::Extracting | Phase::UpdatingPath
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ProbeFinished(bool),
    CheckRequested,
    InstallRequested,
    Confirmed,
    Declined,
    Progress(u64, Option<u64>),
    ExtractionStarted,
    PathUpdateStarted,
    Succeeded { path_ok: bool },
    Failed,
}

/// The controller's state machine. Unknown (phase, event) pairs leave the
/// phase unchanged, so stray worker messages after a failure are harmless.
pub fn transition(phase: &Phase, event: &Event) -> Phase {
    match (phase, event) {
        (Phase::Checking, Event::ProbeFinished(true)) => Phase::Installed,
        (Phase::Checking, Event::ProbeFinished(false)) => Phase::NotInstalled,
        (Phase::Installed | Phase::NotInstalled | Phase::Done { .. }, Event::CheckRequested) => {
            Phase::Checking
        }
        (Phase::NotInstalled, Event::InstallRequested) => Phase::Confirming,
        (Phase::Confirming, Event::Confirmed) => Phase::Downloading {
            received: 0,
            total: None,
        },
        (Phase::Confirming, Event::Declined) => Phase::NotInstalled,
        (Phase::Downloading { .. }, Event::Progress(received, total)) => Phase::Downloading {
            received: *received,
            total: *total,
        },
        (Phase::Downloading { .. }, Event::ExtractionStarted) => Phase::Extracting,
        (Phase::Extracting, Event::PathUpdateStarted) => Phase::UpdatingPath,
        (Phase::UpdatingPath, Event::Succeeded { path_ok }) => Phase::Done { path_ok: *path_ok },
        (
            Phase::Downloading { .. } | Phase::Extracting | Phase::UpdatingPath,
            Event::Failed,
        ) => Phase::NotInstalled,
        (current, _) => current.clone(),
    }
}

/// Messages from the install worker back to the interface thread.
#[derive(Debug)]
pub enum WorkerMsg {
    Progress(u64, Option<u64>),
    Extracting,
    UpdatingPath,
    Finished(Result<Outcome, SetupError>),
}

/// A finished run. The PATH update result rides alongside the extraction
/// report because its failure is soft: extracted files stand either way.
#[derive(Debug)]
pub struct Outcome {
    pub report: InstallReport,
    pub path_update: Result<PathUpdate, SetupError>,
}

fn event_for(msg: &WorkerMsg) -> Event {
    match msg {
        WorkerMsg::Progress(received, total) => Event::Progress(*received, *total),
        WorkerMsg::Extracting => Event::ExtractionStarted,
        WorkerMsg::UpdatingPath => Event::PathUpdateStarted,
        WorkerMsg::Finished(Ok(outcome)) => Event::Succeeded {
            path_ok: outcome.path_update.is_ok(),
        },
        WorkerMsg::Finished(Err(_)) => Event::Failed,
    }
}

/// Fetch, extract and persist, reporting over `tx`. The fetch and persist
/// steps are injected so the whole flow runs under test without a network or
/// a real environment mechanism. A fetch failure never reaches the installer.
pub fn run_install<F, P>(
    fetch_archive: F,
    persist: P,
    target: &Path,
    expected_root: &str,
    marker: &str,
    tx: &Sender<WorkerMsg>,
) where
    F: FnOnce(&mut dyn FnMut(u64, Option<u64>)) -> Result<Vec<u8>, SetupError>,
    P: FnOnce(&Path) -> Result<PathUpdate, SetupError>,
{
    let mut on_progress = |received, total| {
        let _ = tx.send(WorkerMsg::Progress(received, total));
    };
    let bytes = match fetch_archive(&mut on_progress) {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = tx.send(WorkerMsg::Finished(Err(e)));
            return;
        }
    };

    let _ = tx.send(WorkerMsg::Extracting);
    let report = match install::install(&bytes, target, expected_root, marker) {
        Ok(report) => report,
        Err(e) => {
            let _ = tx.send(WorkerMsg::Finished(Err(e)));
            return;
        }
    };

    let _ = tx.send(WorkerMsg::UpdatingPath);
    let path_update = persist(&report.target);
    let _ = tx.send(WorkerMsg::Finished(Ok(Outcome {
        report,
        path_update,
    })));
}

pub struct SetupApp {
    phase: Phase,
    status: String,
    status_color: Option<Color32>,
    instructions: String,
    worker: Option<Receiver<WorkerMsg>>,
}

const GREEN: Color32 = Color32::from_rgb(0x2e, 0x7d, 0x32);
const RED: Color32 = Color32::from_rgb(0xc6, 0x28, 0x28);
const BLUE: Color32 = Color32::from_rgb(0x15, 0x65, 0xc0);

impl SetupApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let mut app = Self {
            phase: Phase::Checking,
            status: String::new(),
            status_color: None,
            instructions: String::new(),
            worker: None,
        };
        app.check_status();
        app
    }

    /// Probe the search path and settle into Installed / NotInstalled.
    fn check_status(&mut self) {
        self.phase = transition(&self.phase, &Event::CheckRequested);
        self.set_status("Checking ADB status in PATH...", None);
        self.instructions.clear();

        let found = probe::in_search_path(config::TOOL_NAME);
        self.phase = transition(&Phase::Checking, &Event::ProbeFinished(found));
        if found {
            self.set_status("ADB is found in your PATH!", Some(GREEN));
            self.instructions =
                "ADB is correctly configured. You can use 'adb' from any terminal window."
                    .to_string();
        } else {
            self.set_status("ADB not found in your PATH.", Some(RED));
            self.instructions = format!(
                "Click 'Download & Install ADB' to get the latest tools.\n\
                 They will be saved directly to:\n{}\n\n\
                 This tool will then attempt to automatically add that location to your user PATH.",
                config::install_dir().display()
            );
        }
    }

    fn set_status(&mut self, text: impl Into<String>, color: Option<Color32>) {
        self.status = text.into();
        self.status_color = color;
    }

    /// Install button: blocking yes/no confirmation, then hand the run to a
    /// background thread so the window keeps painting progress.
    fn request_install(&mut self) {
        self.phase = transition(&self.phase, &Event::InstallRequested);
        if self.phase != Phase::Confirming {
            return;
        }
        self.instructions.clear();

        let target = config::install_dir();
        let confirmed = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Info)
            .set_title("Confirm Download & Install")
            .set_description(format!(
                "ADB tools will be downloaded and extracted directly to:\n{}\n\n\
                 After extraction, this tool will attempt to add that path to your user \
                 environment variables.\n\nDo you want to continue?",
                target.display()
            ))
            .set_buttons(rfd::MessageButtons::YesNo)
            .show();

        if confirmed != rfd::MessageDialogResult::Yes {
            self.phase = transition(&self.phase, &Event::Declined);
            return;
        }

        self.phase = transition(&self.phase, &Event::Confirmed);
        self.set_status(
            format!("Initiating download to {}...", target.display()),
            None,
        );
        self.spawn_worker(target);
    }

    fn spawn_worker(&mut self, target: std::path::PathBuf) {
        let (tx, rx) = channel();
        self.worker = Some(rx);
        let marker = config::marker_file_name();
        std::thread::spawn(move || {
            let client = Client::new();
            run_install(
                |on_progress| fetch::fetch(&client, config::DOWNLOAD_URL, on_progress),
                |dir| platform().persist_path_entry(dir),
                &target,
                config::ARCHIVE_ROOT,
                &marker,
                &tx,
            );
        });
    }

    fn drain_worker(&mut self) {
        let Some(rx) = &self.worker else { return };
        let mut finished = false;
        let mut pending = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            if matches!(msg, WorkerMsg::Finished(_)) {
                finished = true;
            }
            pending.push(msg);
        }
        for msg in pending {
            self.phase = transition(&self.phase, &event_for(&msg));
            self.render_msg(&msg);
        }
        if finished {
            self.worker = None;
        }
    }

    fn render_msg(&mut self, msg: &WorkerMsg) {
        match msg {
            WorkerMsg::Progress(received, Some(total)) if *total > 0 => {
                let pct = *received as f64 / *total as f64 * 100.0;
                self.set_status(
                    format!("Downloading... {pct:.1}% ({received}/{total} bytes)"),
                    None,
                );
            }
            WorkerMsg::Progress(received, _) => {
                self.set_status(format!("Downloading... {received} bytes"), None);
            }
            WorkerMsg::Extracting => {
                self.set_status(
                    format!("Download complete. Extracting to {}...", config::install_dir().display()),
                    None,
                );
            }
            WorkerMsg::UpdatingPath => {
                self.set_status("Attempting to add install directory to user PATH...", None);
            }
            WorkerMsg::Finished(Ok(outcome)) => self.finish_success(outcome),
            WorkerMsg::Finished(Err(e)) => self.finish_failure(e),
        }
    }

    fn finish_success(&mut self, outcome: &Outcome) {
        let target = outcome.report.target.display().to_string();
        if !outcome.report.skipped.is_empty() {
            log::warn!(
                "{} archive member(s) could not be extracted",
                outcome.report.skipped.len()
            );
        }

        if let Err(path_err) = &outcome.path_update {
            rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Error)
                .set_title("PATH Update Failed")
                .set_description(format!(
                    "Failed to automatically add {target} to your user PATH.\n\nDetails:\n{path_err}\n\n\
                     You may need to add it manually."
                ))
                .show();
        }

        let final_message = format!(
            "ADB tools extracted to {target}.\n\
             {}\n\n\
             For the changes to take effect, you may need to RESTART your computer.\n\
             After restarting, run this tool again to verify that ADB is found in your PATH.",
            match &outcome.path_update {
                Ok(_) => "The location was added to your user PATH.".to_string(),
                Err(e) => format!("The user PATH could not be updated automatically: {e}"),
            }
        );
        self.set_status("Installation complete. Please restart and re-check.", Some(BLUE));
        self.instructions = final_message.clone();

        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Info)
            .set_title("Installation Complete - Action Required")
            .set_description(final_message)
            .show();
    }

    fn finish_failure(&mut self, err: &SetupError) {
        let title = match err {
            SetupError::Network(_) => "Download Error",
            SetupError::ArchiveFormat(_) | SetupError::ArchiveLayout(_) => "Extraction Error",
            _ => "Error",
        };
        self.set_status(format!("{err}"), Some(RED));
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title(title)
            .set_description(format!("{err}"))
            .show();
    }
}

impl eframe::App for SetupApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_worker();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(20.0);
                let status = match self.status_color {
                    Some(color) => RichText::new(&self.status).color(color),
                    None => RichText::new(&self.status),
                };
                ui.label(status);
                ui.add_space(10.0);

                let busy = self.phase.is_busy();
                if ui
                    .add_enabled(!busy, egui::Button::new("Check ADB Status"))
                    .clicked()
                {
                    self.check_status();
                }
                ui.add_space(10.0);

                let can_install = self.phase == Phase::NotInstalled;
                if ui
                    .add_enabled(can_install, egui::Button::new("Download & Install ADB"))
                    .clicked()
                {
                    self.request_install();
                }
                ui.add_space(10.0);

                if !self.instructions.is_empty() {
                    ui.add(egui::Label::new(&self.instructions).wrap(true));
                }
            });
        });

        // Keep draining worker messages while a run is in flight.
        if self.worker.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
