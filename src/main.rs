#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod config;
mod errors;
mod fetch;
mod install;
mod platform;
mod probe;

use anyhow::Result;
use eframe::egui;

use crate::app::SetupApp;

fn main() -> Result<()> {
    env_logger::init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([460.0, 360.0])
            .with_min_inner_size([380.0, 300.0]),
        ..Default::default()
    };
    eframe::run_native(
        "ADB Path Checker and Installer",
        native_options,
        Box::new(|cc| Box::new(SetupApp::new(cc))),
    )
    .map_err(|e| anyhow::anyhow!("failed to start the interface: {e}"))
}
