use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::AnnotationConfig;

use super::classify::Classification;
use super::labels::LabelStore;
use super::loader::Delimiter;
use super::table::RawTable;

// ---------------------------------------------------------------------------
// Delimited writer
// ---------------------------------------------------------------------------

/// Write the full table back out: every non-label column in source order,
/// then one column per declared label (ascending name) re-materialised from
/// the store as `1` / empty.
pub fn write_delimited<W: Write>(
    out: W,
    table: &RawTable,
    classification: &Classification,
    labels: &LabelStore,
    config: &AnnotationConfig,
    delimiter: Delimiter,
) -> Result<()> {
    let data_columns: Vec<_> = table
        .columns()
        .iter()
        .zip(classification.columns())
        .filter(|(_, classified)| classified.role.label_name().is_none())
        .map(|(column, _)| column)
        .collect();
    let label_names: Vec<&str> = labels.labels().collect();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter.write_byte())
        .from_writer(out);

    let header: Vec<String> = data_columns
        .iter()
        .map(|c| c.name.clone())
        .chain(label_names.iter().map(|l| config.label_column(l)))
        .collect();
    writer.write_record(&header).context("writing header")?;

    for row in 0..table.len() {
        let record: Vec<String> = data_columns
            .iter()
            .map(|c| c.values[row].to_string())
            .chain(label_names.iter().map(|l| {
                if labels.contains(l, row) {
                    "1".to_string()
                } else {
                    String::new()
                }
            }))
            .collect();
        writer
            .write_record(&record)
            .with_context(|| format!("writing row {row}"))?;
    }
    writer.flush().context("flushing output")?;
    Ok(())
}

/// Write the table to `path`, replacing any existing file.
pub fn save_file(
    path: &Path,
    table: &RawTable,
    classification: &Classification,
    labels: &LabelStore,
    config: &AnnotationConfig,
    delimiter: Delimiter,
) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_delimited(
        std::io::BufWriter::new(file),
        table,
        classification,
        labels,
        config,
        delimiter,
    )
    .with_context(|| format!("saving {}", path.display()))?;
    log::info!("Saved {} rows to {}", table.len(), path.display());
    Ok(())
}
