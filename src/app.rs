use eframe::egui;

use rusty_pulse::AnnotationConfig;

use crate::state::{AppState, Browse};
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyPulseApp {
    pub state: AppState,
}

impl RustyPulseApp {
    pub fn new(config: AnnotationConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for RustyPulseApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Arrow keys browse the selected label unless a text field has focus.
        if !ctx.wants_keyboard_input() {
            let (left, right) = ctx.input(|i| {
                (
                    i.key_pressed(egui::Key::ArrowLeft),
                    i.key_pressed(egui::Key::ArrowRight),
                )
            });
            if left {
                self.state.browse(Browse::Previous);
            }
            if right {
                self.state.browse(Browse::Next);
            }
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: axes and labels ----
        egui::SidePanel::left("annotation_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: heart rate ----
        egui::TopBottomPanel::bottom("interval_panel")
            .default_height(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::interval_panel(ui, &mut self.state);
            });

        // ---- Central panel: signal plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            let action = plot::signal_plot(ui, &mut self.state);
            if let Some(x) = action.clicked_x {
                self.state.annotate_at(x);
            }
            if let Some(x) = action.secondary_x {
                self.state.center_nearest(x);
            }
        });
    }
}
