use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::SchemaError;
use super::table::{CellValue, Column, RawTable};

// ---------------------------------------------------------------------------
// Delimiter
// ---------------------------------------------------------------------------

/// Field separator of a delimited text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
    Tab,
    /// Runs of spaces. Empty fields cannot be expressed.
    Whitespace,
}

impl Delimiter {
    /// Guess the delimiter from the header line.
    pub fn sniff(header_line: &str) -> Self {
        if header_line.contains(';') {
            Delimiter::Semicolon
        } else if header_line.contains(',') {
            Delimiter::Comma
        } else if header_line.contains('\t') {
            Delimiter::Tab
        } else {
            Delimiter::Whitespace
        }
    }

    /// Delimiter to write `path` with. A `.csv` target is always comma
    /// separated because that is how it will be read back; other targets
    /// keep `source`.
    pub fn for_target(path: &Path, source: Delimiter) -> Self {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv { Delimiter::Comma } else { source }
    }

    /// Byte used when writing. Whitespace tables are written tab-separated
    /// so that empty label fields survive a reload.
    pub fn write_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab | Delimiter::Whitespace => b'\t',
        }
    }
}

/// A parsed table plus the delimiter it was read with (used again on save).
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: RawTable,
    pub delimiter: Delimiter,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a recording from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – comma-separated, header row first
/// * `.txt`     – delimiter sniffed from the header (`;`, `,`, tab or spaces)
/// * `.parquet` – flat numeric / string / bool columns (read-only)
pub fn load_file(path: &Path) -> Result<LoadedTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let text = read_text(path)?;
            let table = parse_delimited(&text, Delimiter::Comma)?;
            Ok(LoadedTable {
                table,
                delimiter: Delimiter::Comma,
            })
        }
        "txt" | "tsv" => {
            let text = read_text(path)?;
            let delimiter = Delimiter::sniff(text.lines().next().unwrap_or(""));
            let table = parse_delimited(&text, delimiter)?;
            Ok(LoadedTable { table, delimiter })
        }
        "parquet" | "pq" => Ok(LoadedTable {
            table: load_parquet(path)?,
            delimiter: Delimiter::Comma,
        }),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Whether a path names a Parquet file (which is never written back).
pub fn is_parquet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet") || e.eq_ignore_ascii_case("pq"))
}

fn read_text(path: &Path) -> Result<String> {
    let mut text = String::new();
    std::fs::File::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .read_to_string(&mut text)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(text)
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

/// Parse delimited text: first row = column names, empty field = missing.
pub fn parse_delimited(text: &str, delimiter: Delimiter) -> Result<RawTable> {
    let (headers, rows) = match delimiter {
        Delimiter::Whitespace => split_whitespace_rows(text),
        Delimiter::Comma => read_csv_rows(text, b',')?,
        Delimiter::Semicolon => read_csv_rows(text, b';')?,
        Delimiter::Tab => read_csv_rows(text, b'\t')?,
    };
    let rows: Vec<Vec<CellValue>> = rows
        .into_iter()
        .map(|row| row.iter().map(|s| CellValue::parse(s)).collect::<Vec<_>>())
        .collect();
    let table = RawTable::from_rows(headers, rows)?;
    log::info!(
        "Parsed {} rows x {} columns ({delimiter:?})",
        table.len(),
        table.columns().len()
    );
    Ok(table)
}

type Rows = (Vec<String>, Vec<Vec<String>>);

fn read_csv_rows(text: &str, delimiter: u8) -> Result<Rows> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((headers, rows))
}

fn split_whitespace_rows(text: &str) -> Rows {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let headers: Vec<String> = lines
        .next()
        .map(|l| l.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    let rows: Vec<Vec<String>> = lines
        .map(|l| l.split_whitespace().map(str::to_string).collect())
        .collect();
    (headers, rows)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per signal / label.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Nested columns are rejected.
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<Column> = schema
        .fields()
        .iter()
        .map(|f| Column::new(f.name().clone(), Vec::new()))
        .collect();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, column) in columns.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            for row in 0..batch.num_rows() {
                let value = extract_cell(array, row)
                    .with_context(|| format!("column '{}', row {row}", column.name))?;
                column.values.push(value);
            }
        }
    }

    Ok(RawTable::new(columns)?)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Missing);
    }
    let value = match col.data_type() {
        DataType::Utf8 => {
            let s = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            CellValue::parse(s.value(row))
        }
        DataType::LargeUtf8 => CellValue::parse(col.as_string::<i64>().value(row)),
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            CellValue::Number(arr.value(row) as f64)
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            CellValue::Number(arr.value(row) as f64)
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            CellValue::Number(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            CellValue::Number(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col
                .as_any()
                .downcast_ref::<BooleanArray>()
                .context("expected BooleanArray")?;
            // Boolean label columns: true = present.
            if arr.value(row) {
                CellValue::Number(1.0)
            } else {
                CellValue::Missing
            }
        }
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(value)
}

/// True when an error chain contains a [`SchemaError`].
pub fn is_schema_error(err: &anyhow::Error) -> bool {
    err.chain().any(|e| e.downcast_ref::<SchemaError>().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(Delimiter::sniff("time;ECG"), Delimiter::Semicolon);
        assert_eq!(Delimiter::sniff("time,ECG"), Delimiter::Comma);
        assert_eq!(Delimiter::sniff("time\tECG"), Delimiter::Tab);
        assert_eq!(Delimiter::sniff("time   ECG"), Delimiter::Whitespace);
    }

    #[test]
    fn test_csv_targets_are_written_with_commas() {
        let csv = Path::new("out/rec.CSV");
        let txt = Path::new("out/rec.txt");
        assert_eq!(Delimiter::for_target(csv, Delimiter::Semicolon), Delimiter::Comma);
        assert_eq!(Delimiter::for_target(csv, Delimiter::Whitespace), Delimiter::Comma);
        assert_eq!(Delimiter::for_target(txt, Delimiter::Semicolon), Delimiter::Semicolon);
    }

    #[test]
    fn test_parse_comma_with_missing_fields() {
        let text = "time [ms],ECG,Label: N\n0,0.1,\n4,0.9,1\n8,,\n";
        let table = parse_delimited(text, Delimiter::Comma).unwrap();
        assert_eq!(table.len(), 3);
        let ecg = table.column("ECG").unwrap();
        assert_eq!(ecg.values[2], CellValue::Missing);
        let label = table.column("Label: N").unwrap();
        assert_eq!(label.values[1], CellValue::Number(1.0));
    }

    #[test]
    fn test_parse_whitespace() {
        let text = "time  ECG\n0   0.5\n\n1  0.7\n";
        let table = parse_delimited(text, Delimiter::Whitespace).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("ECG").unwrap().to_f64(), vec![0.5, 0.7]);
    }

    #[test]
    fn test_parse_tab_keeps_empty_fields() {
        let text = "ECG\tLabel: N\n0.5\t\n0.7\t1\n";
        let table = parse_delimited(text, Delimiter::Tab).unwrap();
        let label = table.column("Label: N").unwrap();
        assert_eq!(label.values, vec![CellValue::Missing, CellValue::Number(1.0)]);
    }

    #[test]
    fn test_parse_semicolon() {
        let text = "time;ECG\n0;1.5\n1;2.5\n";
        let table = parse_delimited(text, Delimiter::Semicolon).unwrap();
        assert_eq!(table.column("time").unwrap().to_f64(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_ragged_row_is_schema_error() {
        let text = "a,b\n1,2\n3\n";
        let err = parse_delimited(text, Delimiter::Comma).unwrap_err();
        assert!(is_schema_error(&err));
        assert_eq!(
            err.downcast_ref::<SchemaError>(),
            Some(&SchemaError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_file(Path::new("recording.xlsx")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }
}
