use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use rusty_pulse::data::intervals::{
    DEFAULT_DROP_THRESHOLD, DEFAULT_RISE_THRESHOLD, DEFAULT_VARIABILITY_WINDOW, IntervalQuality,
};
use rusty_pulse::data::labels::LabelKind;

use crate::state::{AppState, Browse};
use crate::ui::plot;

// ---------------------------------------------------------------------------
// Left side panel – axes, labels, snapping
// ---------------------------------------------------------------------------

/// Render the left annotation panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Annotation");
    ui.separator();

    let Some(store) = &state.store else {
        ui.label("No recording loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let axes = store.get_plottable_axes();
    let time_axes = store.get_time_axes();
    let current_time_axis = store.time_axis().map(str::to_string);
    let labels: Vec<(String, LabelKind, usize)> = store
        .labels()
        .labels()
        .map(|l| {
            let kind = store.labels().kind(l).unwrap_or(LabelKind::Point);
            (l.to_string(), kind, store.labels().count(l))
        })
        .collect();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Axis selectors ----
            ui.strong("Signal");
            let current_axis = state.y_axis.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("y_axis")
                .selected_text(&current_axis)
                .show_ui(ui, |ui: &mut Ui| {
                    for axis in &axes {
                        if ui.selectable_label(current_axis == *axis, axis).clicked() {
                            state.y_axis = Some(axis.clone());
                        }
                    }
                });

            if time_axes.len() > 1 {
                ui.strong("Time axis");
                let current = current_time_axis.clone().unwrap_or_default();
                egui::ComboBox::from_id_salt("time_axis")
                    .selected_text(&current)
                    .show_ui(ui, |ui: &mut Ui| {
                        for axis in &time_axes {
                            if ui.selectable_label(current == *axis, axis).clicked() {
                                if let Some(store) = &mut state.store {
                                    if let Err(e) = store.set_time_axis(axis) {
                                        state.status_message = Some(format!("Error: {e:#}"));
                                    }
                                }
                            }
                        }
                    });
            }
            ui.separator();

            // ---- Labels ----
            ui.strong("Labels");
            for (name, kind, count) in &labels {
                let color = state.label_colors.color_for(name);
                let suffix = match kind {
                    LabelKind::Segment => " (segment)",
                    LabelKind::Point => "",
                };
                let text = RichText::new(format!("{name}{suffix}  ({count})")).color(color);
                let selected = state.selected_label.as_deref() == Some(name.as_str());
                if ui.selectable_label(selected, text).clicked() {
                    state.selected_label = Some(name.clone());
                    state.cursor = None;
                }
            }

            ui.horizontal(|ui: &mut Ui| {
                let edit = ui.text_edit_singleline(&mut state.new_label);
                let submitted =
                    edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Create").clicked() || submitted {
                    state.create_label();
                }
            });
            ui.separator();

            // ---- Snapping ----
            ui.strong("Selection");
            ui.checkbox(&mut state.select_options.snap_enabled, "Snap to peak");
            ui.add(
                egui::Slider::new(&mut state.select_options.window, 1..=50)
                    .text("Snap window"),
            );
            ui.checkbox(&mut state.center_on_selection, "Center on new mark");
            ui.separator();

            // ---- Browse ----
            ui.strong("Browse");
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("◀ Previous").clicked() {
                    state.browse(Browse::Previous);
                }
                if ui.button("Next ▶").clicked() {
                    state.browse(Browse::Next);
                }
            });
            if let Some(row) = state.cursor {
                ui.label(format!("At row {row}"));
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Save").clicked() {
                state.save(None);
                ui.close_menu();
            }
            if ui.button("Save as…").clicked() {
                save_file_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(store) = &state.store {
            let name = store
                .source_path()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!("{name}: {} rows", store.row_count()));
        }

        ui.separator();

        if ui
            .selectable_label(state.select_options.snap_enabled, "Snap")
            .clicked()
        {
            state.select_options.snap_enabled = !state.select_options.snap_enabled;
        }

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// Bottom panel – intervals, heart rate and interval table
// ---------------------------------------------------------------------------

/// Render derived intervals: interval plot, rate plot and table side by side.
pub fn interval_panel(ui: &mut Ui, state: &mut AppState) {
    let Some(report) = state.intervals().cloned() else {
        ui.label("No recording loaded.");
        return;
    };

    let anomalies = report.anomalies(DEFAULT_DROP_THRESHOLD, DEFAULT_RISE_THRESHOLD);
    let anomaly_x: Vec<f64> = state
        .store
        .as_ref()
        .map(|store| {
            anomalies
                .iter()
                .filter_map(|&row| store.get_time_domain().x_at(row))
                .collect()
        })
        .unwrap_or_default();

    ui.horizontal(|ui: &mut Ui| {
        match report.mean_rate() {
            Some(rate) => ui.strong(format!("Mean HR: {rate:.0} bpm")),
            None => ui.label("Fewer than two beats outside suppressed segments."),
        };
        let flagged = report.records.len() - report.valid().count();
        if flagged > 0 {
            ui.label(
                RichText::new(format!("{flagged} non-positive intervals"))
                    .color(Color32::YELLOW),
            );
        }
        if !anomalies.is_empty() {
            ui.label(
                RichText::new(format!("{} possible premature beats", anomalies.len()))
                    .color(Color32::ORANGE),
            );
        }
        if !report.unresolved_labels.is_empty() {
            ui.label(format!(
                "Heartbeat classes not in recording: {}",
                report.unresolved_labels.join(", ")
            ));
        }
    });

    let variability = report.variability(DEFAULT_VARIABILITY_WINDOW);
    ui.columns(3, |columns| {
        plot::interval_plot(&mut columns[0], report.interval_points(), &anomaly_x);
        plot::rate_plot(&mut columns[1], report.rate_points());

        TableBuilder::new(&mut columns[2])
            .striped(true)
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::remainder())
            .header(20.0, |mut header| {
                for title in ["Row", "Time", "Interval [s]", "HR [bpm]", "RMSSD [ms]"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, report.records.len(), |mut row| {
                    let i = row.index();
                    let record = &report.records[i];
                    row.col(|ui| {
                        let text = RichText::new(record.index.to_string());
                        if anomalies.contains(&record.index) {
                            ui.label(text.color(Color32::ORANGE));
                        } else {
                            ui.label(text);
                        }
                    });
                    row.col(|ui| {
                        ui.label(format!("{:.3}", record.timestamp));
                    });
                    row.col(|ui| {
                        let text = RichText::new(format!("{:.3}", record.interval));
                        match record.quality {
                            IntervalQuality::Valid => ui.label(text),
                            IntervalQuality::NonPositive => ui.label(text.color(Color32::YELLOW)),
                        };
                    });
                    row.col(|ui| {
                        ui.label(record.rate.map(|r| format!("{r:.1}")).unwrap_or_default());
                    });
                    row.col(|ui| {
                        ui.label(
                            variability[i]
                                .map(|v| format!("{v:.1}"))
                                .unwrap_or_default(),
                        );
                    });
                });
            });
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open recording")
        .add_filter("Supported files", &["csv", "txt", "tsv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Text", &["txt", "tsv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let Some(store) = &state.store else {
        state.status_message = Some("No data to save".to_string());
        return;
    };
    let default_name = store
        .source_path()
        .and_then(|p| p.file_stem())
        .map(|s| format!("{}.csv", s.to_string_lossy()))
        .unwrap_or_else(|| "recording.csv".to_string());

    let file = rfd::FileDialog::new()
        .set_title("Save recording")
        .add_filter("CSV", &["csv"])
        .set_file_name(default_name)
        .save_file();

    if let Some(path) = file {
        state.save(Some(&path));
    }
}
