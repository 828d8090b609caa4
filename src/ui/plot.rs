use eframe::egui::{Color32, Ui};
use egui_plot::{Line, Plot, PlotBounds, PlotPoints, Points, VLine};

use rusty_pulse::data::labels::LabelKind;

use crate::state::AppState;

/// Result of interacting with the signal plot this frame.
#[derive(Debug, Default)]
pub struct PlotAction {
    /// Plot x coordinate of a primary click.
    pub clicked_x: Option<f64>,
    /// Plot x coordinate of a secondary click.
    pub secondary_x: Option<f64>,
}

// ---------------------------------------------------------------------------
// Signal plot (central panel)
// ---------------------------------------------------------------------------

/// Render the selected signal with label markers and segment boundaries.
pub fn signal_plot(ui: &mut Ui, state: &mut AppState) -> PlotAction {
    let mut action = PlotAction::default();
    let view_center = state.view_center.take();

    let (Some(store), Some(axis)) = (&state.store, &state.y_axis) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a recording to annotate  (File → Open…)");
        });
        return action;
    };
    let Some(signal) = store.signal(axis) else {
        return action;
    };
    let domain = store.get_time_domain();
    let x = domain.values();
    let x_label = store.time_axis().unwrap_or("Index").to_string();

    Plot::new("signal_plot")
        .legend(egui_plot::Legend::default())
        .x_axis_label(x_label)
        .y_axis_label(axis.as_str())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let points: PlotPoints = x
                .iter()
                .zip(signal.iter())
                .map(|(&xi, &yi)| [xi, yi])
                .collect();
            plot_ui.line(Line::new(points).name(axis).color(Color32::LIGHT_BLUE).width(1.0));

            let labels = store.labels();
            for label in labels.labels() {
                let color = state.label_colors.color_for(label);
                match labels.kind(label) {
                    Some(LabelKind::Segment) => {
                        for &row in labels.marks(label).into_iter().flatten() {
                            if let Some(xr) = domain.x_at(row) {
                                plot_ui.vline(VLine::new(xr).name(label).color(color));
                            }
                        }
                    }
                    _ => {
                        let marks: PlotPoints = labels
                            .marks(label)
                            .into_iter()
                            .flatten()
                            .filter_map(|&row| Some([domain.x_at(row)?, *signal.get(row)?]))
                            .collect();
                        plot_ui.points(Points::new(marks).name(label).color(color).radius(4.0));
                    }
                }
            }

            if let Some(center) = view_center {
                let bounds = plot_ui.plot_bounds();
                let half = bounds.width() / 2.0;
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                    [center - half, bounds.min()[1]],
                    [center + half, bounds.max()[1]],
                ));
            }

            let pointer = plot_ui.pointer_coordinate();
            if plot_ui.response().clicked() {
                action.clicked_x = pointer.map(|p| p.x);
            }
            if plot_ui.response().secondary_clicked() {
                action.secondary_x = pointer.map(|p| p.x);
            }
        });
    action
}

// ---------------------------------------------------------------------------
// Interval and heart-rate plots (bottom panel)
// ---------------------------------------------------------------------------

/// Render beat intervals over time, with a vertical line at each flagged
/// anomaly.
pub fn interval_plot(ui: &mut Ui, points: Vec<[f64; 2]>, anomalies: &[f64]) {
    Plot::new("interval_plot")
        .x_axis_label("Time")
        .y_axis_label("RRi [ms]")
        .allow_drag(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(PlotPoints::from(points.clone())).name("RRi").width(1.0));
            plot_ui.points(Points::new(PlotPoints::from(points)).radius(2.5));
            for &x in anomalies {
                plot_ui.vline(VLine::new(x).name("Anomaly").color(Color32::ORANGE));
            }
        });
}

/// Render instantaneous heart rate over time.
pub fn rate_plot(ui: &mut Ui, points: Vec<[f64; 2]>) {
    Plot::new("rate_plot")
        .x_axis_label("Time")
        .y_axis_label("HR [bpm]")
        .allow_drag(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(PlotPoints::from(points.clone())).name("HR").width(1.0));
            plot_ui.points(Points::new(PlotPoints::from(points)).radius(2.5));
        });
}
