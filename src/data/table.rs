use std::collections::BTreeSet;
use std::fmt;

use super::error::SchemaError;

// ---------------------------------------------------------------------------
// CellValue – a single field of the source table
// ---------------------------------------------------------------------------

/// A dynamically-typed table cell. Text files carry no dtype, so every field
/// is guessed on load: empty → `Missing`, parsable float → `Number`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Missing,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // `{}` on f64 is the shortest representation that round-trips.
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Missing => Ok(()),
        }
    }
}

impl CellValue {
    /// Guess the type of a raw text field.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return CellValue::Missing;
        }
        match s.parse::<f64>() {
            Ok(v) => CellValue::Number(v),
            Err(_) => CellValue::Text(s.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

// ---------------------------------------------------------------------------
// Column / RawTable
// ---------------------------------------------------------------------------

/// One named column of the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Convenience constructor for an all-numeric column.
    pub fn numeric(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(name, values.iter().copied().map(CellValue::Number).collect())
    }

    /// True when every non-missing value is a number.
    pub fn is_numeric(&self) -> bool {
        self.values
            .iter()
            .all(|v| matches!(v, CellValue::Number(_) | CellValue::Missing))
    }

    /// True when the column holds at least one non-missing value.
    pub fn has_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_missing())
    }

    /// Numeric view of the column; missing and text cells become NaN.
    pub fn to_f64(&self) -> Vec<f64> {
        self.values
            .iter()
            .map(|v| v.as_f64().unwrap_or(f64::NAN))
            .collect()
    }
}

/// The loaded table: ordered columns of equal length.
///
/// Row position (0..len) is the key used by labels and intervals, so the
/// table is immutable once built; a reload replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    columns: Vec<Column>,
    rows: usize,
}

impl RawTable {
    /// Build a table, checking equal column lengths and unique names.
    pub fn new(columns: Vec<Column>) -> Result<Self, SchemaError> {
        let rows = columns.first().map_or(0, |c| c.values.len());
        let mut seen = BTreeSet::new();
        for col in &columns {
            if col.values.len() != rows {
                return Err(SchemaError::LengthMismatch {
                    column: col.name.clone(),
                    expected: rows,
                    found: col.values.len(),
                });
            }
            if !seen.insert(col.name.as_str()) {
                return Err(SchemaError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a table from a header and row-major records.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, SchemaError> {
        let width = headers.len();
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();

        for (row_no, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(SchemaError::RaggedRow {
                    row: row_no,
                    expected: width,
                    found: row.len(),
                });
            }
            for (col, value) in columns.iter_mut().zip(row) {
                col.values.push(value);
            }
        }
        Self::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_parse() {
        assert_eq!(CellValue::parse(""), CellValue::Missing);
        assert_eq!(CellValue::parse("  "), CellValue::Missing);
        assert_eq!(CellValue::parse("1.5"), CellValue::Number(1.5));
        assert_eq!(CellValue::parse("-3"), CellValue::Number(-3.0));
        assert_eq!(CellValue::parse("abc"), CellValue::Text("abc".into()));
    }

    #[test]
    fn test_cell_value_display_round_trips() {
        for raw in ["1000", "0.5", "-12.25", "1"] {
            let cell = CellValue::parse(raw);
            assert_eq!(cell.to_string(), raw);
        }
        assert_eq!(CellValue::Missing.to_string(), "");
    }

    #[test]
    fn test_column_is_numeric_ignores_missing() {
        let col = Column::new(
            "ECG",
            vec![CellValue::Number(1.0), CellValue::Missing, CellValue::Number(2.0)],
        );
        assert!(col.is_numeric());
        let col = Column::new("note", vec![CellValue::Text("x".into()), CellValue::Missing]);
        assert!(!col.is_numeric());
    }

    #[test]
    fn test_from_rows_rejects_ragged_row() {
        let err = RawTable::from_rows(
            vec!["a".into(), "b".into()],
            vec![
                vec![CellValue::Number(1.0), CellValue::Number(2.0)],
                vec![CellValue::Number(3.0)],
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_new_rejects_length_mismatch_and_duplicates() {
        let err = RawTable::new(vec![
            Column::numeric("a", &[1.0, 2.0]),
            Column::numeric("b", &[1.0]),
        ])
        .unwrap_err();
        assert_eq!(err.column(), Some("b"));

        let err = RawTable::new(vec![
            Column::numeric("a", &[1.0]),
            Column::numeric("a", &[2.0]),
        ])
        .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateColumn("a".into()));
    }

    #[test]
    fn test_table_shape() {
        let table = RawTable::new(vec![
            Column::numeric("time", &[0.0, 1.0, 2.0]),
            Column::numeric("ECG", &[0.1, 0.2, 0.3]),
        ])
        .unwrap();
        assert_eq!(table.len(), 3);
        assert!(!table.is_empty());
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["time", "ECG"]);
        assert_eq!(table.column("ECG").unwrap().to_f64(), vec![0.1, 0.2, 0.3]);
    }
}
