use std::path::Path;

use rusty_pulse::data::annotate::SelectOptions;
use rusty_pulse::data::intervals::IntervalReport;
use rusty_pulse::data::labels::{LabelKind, Toggle};
use rusty_pulse::{AnnotationConfig, TabularDataStore};

use crate::color::LabelColors;

/// Direction for browsing through the marks of the selected label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browse {
    Previous,
    Next,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AnnotationConfig,

    /// Loaded recording (None until user loads a file).
    pub store: Option<TabularDataStore>,

    /// Signal shown in the main plot and used for snapping.
    pub y_axis: Option<String>,

    /// Label toggled by a click on the plot.
    pub selected_label: Option<String>,

    /// Text field for declaring a new label.
    pub new_label: String,

    pub select_options: SelectOptions,

    /// Re-centre the plot on each new annotation.
    pub center_on_selection: bool,

    /// Row the browse buttons continue from.
    pub cursor: Option<usize>,

    /// X coordinate the plot should be centred on next frame.
    pub view_center: Option<f64>,

    /// Label colours, rebuilt when labels are added.
    pub label_colors: LabelColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Derived intervals, dropped on every label mutation.
    intervals: Option<IntervalReport>,
}

impl AppState {
    pub fn new(config: AnnotationConfig) -> Self {
        let select_options = SelectOptions {
            snap_enabled: config.snap_enabled,
            window: config.snap_window,
        };
        Self {
            config,
            store: None,
            y_axis: None,
            selected_label: None,
            new_label: String::new(),
            select_options,
            center_on_selection: false,
            cursor: None,
            view_center: None,
            label_colors: LabelColors::default(),
            status_message: None,
            intervals: None,
        }
    }

    /// Ingest a newly loaded recording and pick default axis / label.
    pub fn set_store(&mut self, store: TabularDataStore) {
        self.y_axis = store.get_plottable_axes().into_iter().next();
        self.selected_label = store
            .labels()
            .labels()
            .find(|l| store.labels().kind(l) == Some(LabelKind::Point))
            .map(str::to_string);
        self.label_colors = LabelColors::new(store.labels().labels());
        self.cursor = None;
        self.view_center = None;
        self.intervals = None;
        self.status_message = None;
        self.store = Some(store);
    }

    /// Load a file. On failure the current recording stays open.
    pub fn open_path(&mut self, path: &Path) {
        match TabularDataStore::load(path, self.config.clone()) {
            Ok(store) => self.set_store(store),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    pub fn save(&mut self, target: Option<&Path>) {
        let Some(store) = &mut self.store else {
            self.status_message = Some("No data to save".to_string());
            return;
        };
        match store.save(target) {
            Ok(path) => {
                self.status_message = Some(format!("Saved to {}", path.display()));
            }
            Err(e) => {
                log::error!("Failed to save file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    pub fn reload(&mut self) {
        let Some(store) = &mut self.store else {
            return;
        };
        match store.reload() {
            Ok(()) => {
                let store = self.store.take();
                if let Some(store) = store {
                    self.set_store(store);
                }
            }
            Err(e) => {
                log::error!("Failed to reload file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Declare a label from the text field and select it.
    pub fn create_label(&mut self) {
        let name = self.new_label.trim().to_string();
        let Some(store) = &mut self.store else {
            return;
        };
        match store.labels_mut().declare(&name) {
            Ok(()) => {
                self.label_colors = LabelColors::new(store.labels().labels());
                self.selected_label = Some(name);
                self.new_label.clear();
                self.intervals = None;
            }
            Err(e) => self.status_message = Some(format!("Error: {e}")),
        }
    }

    /// Toggle the selected label at the row nearest to plot coordinate `x`.
    pub fn annotate_at(&mut self, x: f64) {
        let (Some(store), Some(label), Some(axis)) =
            (&mut self.store, &self.selected_label, &self.y_axis)
        else {
            return;
        };
        // Coordinate → row resolution belongs to the view, not the core.
        let Some(hint) = store.get_time_domain().row_near(x) else {
            return;
        };
        match store.annotate(label, axis, hint as f64, self.select_options) {
            Ok(Some(annotation)) => {
                self.intervals = None;
                self.cursor = Some(annotation.row);
                if annotation.toggle == Toggle::Added && self.center_on_selection {
                    self.view_center = store.get_time_domain().x_at(annotation.row);
                }
                if !self.label_colors.contains(label) {
                    self.label_colors = LabelColors::new(store.labels().labels());
                }
            }
            Ok(None) => {}
            Err(e) => self.status_message = Some(format!("Error: {e:#}")),
        }
    }

    /// Move the view to the previous / next mark of the selected label.
    /// Stops at the ends.
    pub fn browse(&mut self, direction: Browse) {
        let (Some(store), Some(label)) = (&self.store, &self.selected_label) else {
            return;
        };
        let labels = store.labels();
        let target = match (direction, self.cursor) {
            (Browse::Next, Some(row)) => labels.next_after(label, row),
            (Browse::Previous, Some(row)) => labels.previous_before(label, row),
            (Browse::Next, None) => labels.marks(label).and_then(|m| m.first().copied()),
            (Browse::Previous, None) => labels.last(label),
        };
        if let Some(row) = target {
            self.cursor = Some(row);
            self.view_center = store.get_time_domain().x_at(row);
        }
    }

    /// Centre on the mark of the selected label nearest to `x`.
    pub fn center_nearest(&mut self, x: f64) {
        let (Some(store), Some(label)) = (&self.store, &self.selected_label) else {
            return;
        };
        let Some(row) = store.get_time_domain().row_near(x) else {
            return;
        };
        if let Some(mark) = store.labels().nearest(label, row) {
            self.cursor = Some(mark);
            self.view_center = store.get_time_domain().x_at(mark);
        }
    }

    /// Derived intervals, recomputed after any label change.
    pub fn intervals(&mut self) -> Option<&IntervalReport> {
        let store = self.store.as_ref()?;
        Some(self.intervals.get_or_insert_with(|| store.derive_intervals()))
    }
}
