use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::config::AnnotationConfig;

use super::annotate::{self, Annotation, SelectOptions};
use super::classify::{self, Classification, ColumnRole};
use super::intervals::{self, IntervalReport};
use super::labels::LabelStore;
use super::loader::{self, Delimiter, LoadedTable};
use super::suppression::SuppressionMask;
use super::table::RawTable;
use super::time::{self, TimeDomain, TimeUnit};
use super::writer;

// ---------------------------------------------------------------------------
// TabularDataStore – one loaded recording and its annotations
// ---------------------------------------------------------------------------

/// Owns the raw table, its classification and the label store, and is the
/// single read/write surface for the UI.
///
/// The table and classification are fixed for the lifetime of the store; a
/// reload builds a new store and only replaces the old one on success.
#[derive(Debug, Clone)]
pub struct TabularDataStore {
    config: AnnotationConfig,
    table: RawTable,
    classification: Classification,
    labels: LabelStore,
    time_axis: Option<String>,
    time_domain: TimeDomain,
    source_path: Option<PathBuf>,
    delimiter: Delimiter,
}

impl TabularDataStore {
    /// Classify `table`, normalise its first time axis and load existing
    /// label columns into a fresh [`LabelStore`].
    pub fn from_table(table: RawTable, config: AnnotationConfig) -> Result<Self> {
        let classification = classify::classify(table.columns(), &config)?;

        let mut labels = LabelStore::new(table.len(), config.segment_markers.clone());
        for (column, classified) in table.columns().iter().zip(classification.columns()) {
            let Some(name) = classified.role.label_name() else {
                continue;
            };
            labels.declare(name)?;
            for row in classify::present_rows(column) {
                labels.mark(name, row)?;
            }
        }

        let mut store = Self {
            config,
            time_domain: TimeDomain::RowIndex(table.len()),
            table,
            classification,
            labels,
            time_axis: None,
            source_path: None,
            delimiter: Delimiter::default(),
        };
        if let Some(first) = store.classification.time_axes().into_iter().next() {
            store.set_time_axis(&first)?;
        }
        Ok(store)
    }

    /// Load a recording from disk.
    pub fn load(path: &Path, config: AnnotationConfig) -> Result<Self> {
        let LoadedTable { table, delimiter } = loader::load_file(path)
            .with_context(|| format!("loading {}", path.display()))?;
        let mut store = Self::from_table(table, config)
            .with_context(|| format!("classifying {}", path.display()))?;
        store.source_path = Some(path.to_path_buf());
        store.delimiter = delimiter;
        log::info!(
            "Loaded {} rows from {}: time axes {:?}, plottable {:?}, labels {:?}",
            store.row_count(),
            path.display(),
            store.get_time_axes(),
            store.get_plottable_axes(),
            store.labels.labels().collect::<Vec<_>>()
        );
        Ok(store)
    }

    /// Re-read the source file, discarding unsaved annotations. On failure
    /// the current state is kept.
    pub fn reload(&mut self) -> Result<()> {
        let Some(path) = self.source_path.clone() else {
            bail!("recording has no source file to reload");
        };
        *self = Self::load(&path, self.config.clone())?;
        Ok(())
    }

    /// Write the table and all labels. Saves over the source file unless a
    /// `target` is given; a new target becomes the source path. `.csv`
    /// targets are written comma separated whatever the source delimiter.
    pub fn save(&mut self, target: Option<&Path>) -> Result<PathBuf> {
        let path = match (target, &self.source_path) {
            (Some(target), _) => target.to_path_buf(),
            (None, Some(source)) => {
                // Parquet input is read-only; save next to it as CSV.
                if loader::is_parquet(source) {
                    source.with_extension("csv")
                } else {
                    source.clone()
                }
            }
            (None, None) => bail!("no target path to save to"),
        };
        let delimiter = Delimiter::for_target(&path, self.delimiter);
        writer::save_file(
            &path,
            &self.table,
            &self.classification,
            &self.labels,
            &self.config,
            delimiter,
        )?;
        self.source_path = Some(path.clone());
        self.delimiter = delimiter;
        Ok(path)
    }

    // -- Read surface --

    pub fn config(&self) -> &AnnotationConfig {
        &self.config
    }

    pub fn table(&self) -> &RawTable {
        &self.table
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn row_count(&self) -> usize {
        self.table.len()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    pub fn get_plottable_axes(&self) -> Vec<String> {
        self.classification.plottable_axes()
    }

    pub fn get_time_axes(&self) -> Vec<String> {
        self.classification.time_axes()
    }

    /// Name of the time axis backing [`Self::get_time_domain`], if any.
    pub fn time_axis(&self) -> Option<&str> {
        self.time_axis.as_deref()
    }

    /// X domain: normalised seconds, or row index when no time axis exists.
    pub fn get_time_domain(&self) -> &TimeDomain {
        &self.time_domain
    }

    /// Switch the x domain to another classified time axis.
    pub fn set_time_axis(&mut self, name: &str) -> Result<()> {
        if self.classification.role_of(name) != Some(&ColumnRole::TimeAxis) {
            bail!("'{name}' is not a time axis");
        }
        let column = self
            .table
            .column(name)
            .with_context(|| format!("missing column '{name}'"))?;
        let unit = self
            .config
            .time_unit
            .unwrap_or_else(|| TimeUnit::detect(name));
        self.time_domain = TimeDomain::Seconds(time::normalize(&column.to_f64(), unit.factor()));
        self.time_axis = Some(name.to_string());
        log::debug!("Time axis set to '{name}' ({unit:?})");
        Ok(())
    }

    /// Values of a time or plottable axis; missing cells are NaN.
    pub fn signal(&self, axis: &str) -> Option<Vec<f64>> {
        match self.classification.role_of(axis)? {
            ColumnRole::TimeAxis | ColumnRole::PlottableAxis => {
                self.table.column(axis).map(|c| c.to_f64())
            }
            _ => None,
        }
    }

    // -- Annotations --

    pub fn labels(&self) -> &LabelStore {
        &self.labels
    }

    pub fn labels_mut(&mut self) -> &mut LabelStore {
        &mut self.labels
    }

    /// Current suppression mask, rebuilt from the label store on each call.
    pub fn suppression_mask(&self) -> SuppressionMask {
        SuppressionMask::from_store(&self.labels)
    }

    /// Select a row on `axis` from a row hint and toggle `label` there.
    pub fn annotate(
        &mut self,
        label: &str,
        axis: &str,
        raw_index_hint: f64,
        options: SelectOptions,
    ) -> Result<Option<Annotation>> {
        let signal = self
            .signal(axis)
            .with_context(|| format!("'{axis}' is not a signal axis"))?;
        Ok(annotate::annotate(
            &mut self.labels,
            label,
            &signal,
            raw_index_hint,
            options,
        )?)
    }

    /// Intervals over the configured heartbeat classes.
    pub fn derive_intervals(&self) -> IntervalReport {
        intervals::derive(
            &self.labels,
            self.config.heartbeat_classes.iter().map(String::as_str),
            &self.suppression_mask(),
            &self.time_domain,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::error::SchemaError;
    use crate::data::loader::parse_delimited;
    use approx::assert_relative_eq;

    const RECORDING: &str = "\
timestamp [ms],ECG,Label: N,Label: ~
1000,0.1,,
1004,0.2,1,
1008,0.9,,
1012,0.3,,1
1016,0.1,1,
1020,0.2,,
";

    fn store() -> TabularDataStore {
        let table = parse_delimited(RECORDING, Delimiter::Comma).unwrap();
        TabularDataStore::from_table(table, AnnotationConfig::default()).unwrap()
    }

    #[test]
    fn test_from_table_classifies_and_loads_labels() {
        let s = store();
        assert_eq!(s.row_count(), 6);
        assert_eq!(s.table().len(), 6);
        assert_eq!(s.config().label_prefix, "Label: ");
        assert_eq!(
            s.classification().role_of("Label: ~"),
            Some(&ColumnRole::SegmentLabel("~".to_string()))
        );
        assert_eq!(s.get_plottable_axes(), vec!["ECG".to_string()]);
        assert_eq!(s.time_axis(), Some("timestamp [ms]"));
        assert_eq!(s.labels().indices_of("N"), vec![1, 4]);
        assert_eq!(s.labels().indices_of("~"), vec![3]);
        assert_eq!(s.suppression_mask().ranges(), &[3..6]);
    }

    #[test]
    fn test_time_domain_in_seconds() {
        let s = store();
        let TimeDomain::Seconds(series) = s.get_time_domain() else {
            panic!("expected a seconds domain");
        };
        assert_relative_eq!(series.values()[0], 0.0);
        assert_relative_eq!(series.values()[5], 0.020, epsilon = 1e-12);
    }

    #[test]
    fn test_row_index_domain_without_time_axis() {
        let table = parse_delimited("ECG\n1\n2\n3\n", Delimiter::Comma).unwrap();
        let s = TabularDataStore::from_table(table, AnnotationConfig::default()).unwrap();
        assert_eq!(s.time_axis(), None);
        assert_eq!(s.get_time_domain(), &TimeDomain::RowIndex(3));
    }

    #[test]
    fn test_bad_label_column_is_schema_error() {
        let table = parse_delimited("ECG,Label: N\n1,1\n2,x\n", Delimiter::Comma).unwrap();
        let err = TabularDataStore::from_table(table, AnnotationConfig::default()).unwrap_err();
        let schema = err.downcast_ref::<SchemaError>().unwrap();
        assert_eq!(schema.column(), Some("Label: N"));
    }

    #[test]
    fn test_blank_label_column_is_schema_error() {
        use crate::data::table::{CellValue, Column};
        let table = RawTable::new(vec![
            Column::numeric("ECG", &[1.0, 2.0]),
            Column::new("Label: ", vec![CellValue::Number(1.0), CellValue::Missing]),
        ])
        .unwrap();
        let err = TabularDataStore::from_table(table, AnnotationConfig::default()).unwrap_err();
        let schema = err.downcast_ref::<SchemaError>().unwrap();
        assert_eq!(schema.column(), Some("Label: "));
    }

    #[test]
    fn test_annotate_then_derive() {
        let mut s = store();
        let options = SelectOptions {
            snap_enabled: true,
            window: 1,
        };
        let a = s.annotate("N", "ECG", 1.0, options).unwrap().unwrap();
        // Row 1 was marked; snapping moved the click to the peak at row 2.
        assert_eq!(a.row, 2);
        assert_eq!(s.labels().indices_of("N"), vec![1, 2, 4]);

        let report = s.derive_intervals();
        // Row 4 lies in the suppressed tail, so only (1, 2) survives.
        assert_eq!(report.records.len(), 1);
        assert_relative_eq!(report.records[0].interval, 0.004, epsilon = 1e-12);
        assert_relative_eq!(report.records[0].rate.unwrap(), 15000.0, epsilon = 1e-6);
        assert_eq!(
            report.unresolved_labels,
            vec!["S".to_string(), "V".to_string()]
        );
    }

    #[test]
    fn test_annotate_unknown_axis_fails_without_mutation() {
        let mut s = store();
        let before = s.labels().clone();
        assert!(s.annotate("N", "Label: N", 1.0, SelectOptions::default()).is_err());
        assert_eq!(s.labels(), &before);
    }

    #[test]
    fn test_set_time_axis_rejects_non_time_column() {
        let mut s = store();
        assert!(s.set_time_axis("ECG").is_err());
        assert_eq!(s.time_axis(), Some("timestamp [ms]"));
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut s = store();
        assert!(s.save(None).is_err());
        assert!(s.reload().is_err());
    }
}
