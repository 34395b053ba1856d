mod backend_bridge;
mod config;
mod controller;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::{commands::BackendCommand, runtime::BackendSettings};
use crate::config::{load_settings, StartupArgs};
use crate::controller::events::UiEvent;
use crate::ui::DesktopGuiApp;

fn main() -> eframe::Result<()> {
    let args = StartupArgs::parse();
    let settings = load_settings(&args);

    let filter = EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::info!(
        backend_url = %settings.backend_url,
        session_db = %settings.session_db_url,
        assets_dir = %settings.assets_dir.display(),
        download_dir = %settings.download_dir.display(),
        "starting risk console"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(
        cmd_rx,
        ui_tx,
        BackendSettings {
            backend_url: settings.backend_url.clone(),
            session_db_url: settings.session_db_url.clone(),
        },
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Risk Console")
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([960.0, 640.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "Risk Console",
        options,
        Box::new(move |_cc| Ok(Box::new(DesktopGuiApp::new(cmd_tx, ui_rx, &settings)))),
    )
}
