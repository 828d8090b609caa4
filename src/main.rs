mod app;
mod color;
mod state;
mod ui;

use app::RustyPulseApp;
use eframe::egui;
use rusty_pulse::AnnotationConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AnnotationConfig::from_env().unwrap_or_else(|e| {
        log::error!("Ignoring config: {e}");
        AnnotationConfig::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Pulse – ECG Annotator",
        options,
        Box::new(|_cc| Ok(Box::new(RustyPulseApp::new(config)))),
    )
}
