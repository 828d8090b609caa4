use crate::config::AnnotationConfig;

use super::error::SchemaError;
use super::table::{CellValue, Column};

/// Value written for a row where a label is present.
pub const LABEL_PRESENT: f64 = 1.0;

// ---------------------------------------------------------------------------
// ColumnRole – what a column is used for
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRole {
    TimeAxis,
    PlottableAxis,
    /// Point label; carries the name without the prefix.
    Label(String),
    /// Segment-suppression label; carries the name without the prefix.
    SegmentLabel(String),
    Ignored,
}

impl ColumnRole {
    /// Label name for label / segment-label columns.
    pub fn label_name(&self) -> Option<&str> {
        match self {
            ColumnRole::Label(name) | ColumnRole::SegmentLabel(name) => Some(name),
            _ => None,
        }
    }
}

/// One classified column, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedColumn {
    pub name: String,
    pub role: ColumnRole,
}

/// Result of a classification pass. Business logic reads columns through
/// these roles, never by matching names again.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    columns: Vec<ClassifiedColumn>,
}

impl Classification {
    pub fn columns(&self) -> &[ClassifiedColumn] {
        &self.columns
    }

    pub fn role_of(&self, name: &str) -> Option<&ColumnRole> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.role)
    }

    fn names_with(&self, pred: impl Fn(&ColumnRole) -> bool) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| pred(&c.role))
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn time_axes(&self) -> Vec<String> {
        self.names_with(|r| *r == ColumnRole::TimeAxis)
    }

    pub fn plottable_axes(&self) -> Vec<String> {
        self.names_with(|r| *r == ColumnRole::PlottableAxis)
    }

    /// Columns carrying label data (point and segment), in source order.
    pub fn label_columns(&self) -> impl Iterator<Item = &ClassifiedColumn> {
        self.columns.iter().filter(|c| c.role.label_name().is_some())
    }
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

/// Assign a role to a single column. Label values are not validated here.
pub fn role_for(column: &Column, config: &AnnotationConfig) -> ColumnRole {
    if let Some(label) = config.label_name(&column.name) {
        return if config.is_segment_marker(label) {
            ColumnRole::SegmentLabel(label.to_string())
        } else {
            ColumnRole::Label(label.to_string())
        };
    }
    // An all-empty column is vacuously numeric but has nothing to plot.
    if !column.is_numeric() || !column.has_values() {
        return ColumnRole::Ignored;
    }
    if config.is_time_column(&column.name) {
        ColumnRole::TimeAxis
    } else {
        ColumnRole::PlottableAxis
    }
}

/// Classify every column and validate label columns.
///
/// Fails on the first label column whose name is blank after the prefix or
/// that holds anything other than the presence marker (`1`) or an empty
/// field.
pub fn classify(columns: &[Column], config: &AnnotationConfig) -> Result<Classification, SchemaError> {
    let mut classified = Vec::with_capacity(columns.len());
    for column in columns {
        let role = role_for(column, config);
        if let Some(label) = role.label_name() {
            if label.trim().is_empty() {
                return Err(SchemaError::EmptyLabelName {
                    column: column.name.clone(),
                });
            }
            validate_label_column(column)?;
        }
        classified.push(ClassifiedColumn {
            name: column.name.clone(),
            role,
        });
    }
    Ok(Classification {
        columns: classified,
    })
}

fn validate_label_column(column: &Column) -> Result<(), SchemaError> {
    for (row, value) in column.values.iter().enumerate() {
        match value {
            CellValue::Missing => {}
            CellValue::Number(v) if *v == LABEL_PRESENT => {}
            other => {
                return Err(SchemaError::InvalidLabelValue {
                    column: column.name.clone(),
                    row,
                    value: other.to_string(),
                })
            }
        }
    }
    Ok(())
}

/// Rows marked present in a validated label column.
pub fn present_rows(column: &Column) -> impl Iterator<Item = usize> + '_ {
    column
        .values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.as_f64() == Some(LABEL_PRESENT))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(name: &str, values: &[&str]) -> Column {
        Column::new(name, values.iter().map(|s| CellValue::parse(s)).collect())
    }

    fn sample_columns() -> Vec<Column> {
        vec![
            Column::numeric("timestamp [ms]", &[0.0, 4.0, 8.0]),
            Column::numeric("ECG", &[0.1, 0.9, 0.2]),
            parsed("Label: N", &["", "1", ""]),
            parsed("Label: ~", &["1", "", ""]),
            parsed("comment", &["a", "", "b"]),
            parsed("empty", &["", "", ""]),
        ]
    }

    #[test]
    fn test_classify_roles() {
        let config = AnnotationConfig::default();
        let c = classify(&sample_columns(), &config).unwrap();
        assert_eq!(c.role_of("timestamp [ms]"), Some(&ColumnRole::TimeAxis));
        assert_eq!(c.role_of("ECG"), Some(&ColumnRole::PlottableAxis));
        assert_eq!(c.role_of("Label: N"), Some(&ColumnRole::Label("N".into())));
        assert_eq!(
            c.role_of("Label: ~"),
            Some(&ColumnRole::SegmentLabel("~".into()))
        );
        assert_eq!(c.role_of("comment"), Some(&ColumnRole::Ignored));
        assert_eq!(c.role_of("empty"), Some(&ColumnRole::Ignored));
        assert_eq!(c.time_axes(), vec!["timestamp [ms]".to_string()]);
        assert_eq!(c.plottable_axes(), vec!["ECG".to_string()]);
        assert_eq!(c.label_columns().count(), 2);
    }

    #[test]
    fn test_classify_is_total_and_deterministic() {
        let config = AnnotationConfig::default();
        let columns = sample_columns();
        let first = classify(&columns, &config).unwrap();
        let second = classify(&columns, &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.columns().len(), columns.len());
    }

    #[test]
    fn test_label_prefix_wins_over_time_substring() {
        let config = AnnotationConfig::default();
        let columns = vec![parsed("Label: time marker", &["1", ""])];
        let c = classify(&columns, &config).unwrap();
        assert_eq!(
            c.role_of("Label: time marker"),
            Some(&ColumnRole::Label("time marker".into()))
        );
    }

    #[test]
    fn test_text_time_column_is_ignored() {
        let config = AnnotationConfig::default();
        let columns = vec![parsed("Time", &["12:00:01", "12:00:02"])];
        let c = classify(&columns, &config).unwrap();
        assert_eq!(c.role_of("Time"), Some(&ColumnRole::Ignored));
    }

    #[test]
    fn test_invalid_label_value_names_column_and_row() {
        let config = AnnotationConfig::default();
        let columns = vec![
            Column::numeric("ECG", &[1.0, 2.0, 3.0]),
            parsed("Label: V", &["1", "", "2"]),
        ];
        let err = classify(&columns, &config).unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidLabelValue {
                column: "Label: V".into(),
                row: 2,
                value: "2".into(),
            }
        );
        assert!(err.to_string().contains("Label: V"));
    }

    #[test]
    fn test_blank_label_name_names_column() {
        let config = AnnotationConfig::default();
        for name in ["Label: ", "Label:   "] {
            let columns = vec![Column::numeric("ECG", &[1.0]), parsed(name, &["1"])];
            let err = classify(&columns, &config).unwrap_err();
            assert_eq!(
                err,
                SchemaError::EmptyLabelName {
                    column: name.into()
                }
            );
            assert_eq!(err.column(), Some(name));
        }
    }

    #[test]
    fn test_custom_segment_marker() {
        let mut config = AnnotationConfig::default();
        config.segment_markers = ["Noise".to_string()].into();
        let columns = vec![parsed("Label: Noise", &["1"]), parsed("Label: ~", &[""])];
        let c = classify(&columns, &config).unwrap();
        assert_eq!(
            c.role_of("Label: Noise"),
            Some(&ColumnRole::SegmentLabel("Noise".into()))
        );
        assert_eq!(c.role_of("Label: ~"), Some(&ColumnRole::Label("~".into())));
    }

    #[test]
    fn test_present_rows() {
        let col = parsed("Label: N", &["", "1", "", "1.0"]);
        assert_eq!(present_rows(&col).collect::<Vec<_>>(), vec![1, 3]);
    }
}
