use std::time::Duration;

mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;

use crate::backend_bridge::{commands::BackendCommand, runtime};
use crate::controller::events::UiEvent;
use crate::ui::SporecheckApp;

#[derive(Debug, Parser)]
#[command(name = "sporecheck-gui", about = "Desktop front end for the mushroom classifier")]
struct Args {
    /// Classifier service base URL; overrides sporecheck.toml and the environment.
    #[arg(long)]
    service_url: Option<String>,
    /// Per-request timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt().with_env_filter("info").init();

    let mut settings = client_core::load_settings();
    if let Some(service_url) = args.service_url {
        settings.service_url = service_url;
    }
    if let Some(ms) = args.timeout_ms.filter(|ms| *ms > 0) {
        settings.request_timeout = Duration::from_millis(ms);
    }
    tracing::info!(
        service_url = %settings.service_url,
        timeout_ms = settings.request_timeout.as_millis() as u64,
        "starting desktop gui"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    runtime::launch(cmd_rx, ui_tx, settings.clone());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Mushroom Classifier")
            .with_inner_size([760.0, 900.0])
            .with_min_inner_size([520.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Mushroom Classifier",
        options,
        Box::new(move |_cc| Ok(Box::new(SporecheckApp::new(cmd_tx, ui_rx, settings)))),
    )
}
