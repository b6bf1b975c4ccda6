use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Local-time stamp used both in export file names and in the `Timestamp`
/// column, e.g. `2026-08-06_1430H`.
pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d_%H%MH").to_string()
}

/// Writes `records` to `<dir>/<name>_<stamp>.csv` and returns the path.
///
/// The header row is the union of record keys in first-seen order, plus a
/// trailing `Timestamp` column carrying `stamp` on every row. Missing keys
/// and JSON nulls become empty cells; strings are written verbatim; any
/// other value is written as its JSON text.
pub fn write_csv(name: &str, records: &[Value], stamp: &str, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;
    let path = dir.join(format!("{}_{}.csv", name, stamp));

    let mut writer =
        Writer::from_path(&path).with_context(|| format!("failed to open {}", path.display()))?;

    let columns = column_union(records);

    let mut header: Vec<&str> = columns.iter().map(String::as_str).collect();
    header.push("Timestamp");
    writer.write_record(&header)?;

    for record in records {
        let mut row: Vec<String> = Vec::with_capacity(columns.len() + 1);
        for column in &columns {
            row.push(cell_text(record.get(column)));
        }
        row.push(stamp.to_string());
        writer.write_record(&row)?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn column_union(records: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        if let Some(object) = record.as_object() {
            for key in object.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
    }
    columns
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
