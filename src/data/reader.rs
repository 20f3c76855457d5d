//! Delimited text reader for continuous data sets
//!
//! Files are tab-delimited with a header row. Lines starting with `//`
//! are comments, `"` quotes a field and `*` marks a missing value.

use super::DataSet;
use crate::error::{CausalError, Result};
use std::path::Path;
use tracing::debug;

/// Lexical conventions of a tabular data file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularFormat {
    /// Field delimiter
    pub delimiter: u8,
    /// Lines starting with this prefix are skipped
    pub comment_prefix: String,
    /// Quote character
    pub quote: u8,
    /// Cell text meaning "missing"
    pub missing_marker: String,
}

impl Default for TabularFormat {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            comment_prefix: "//".to_string(),
            quote: b'"',
            missing_marker: "*".to_string(),
        }
    }
}

/// Read a continuous data set from a file; the data set is named after the file stem
pub fn read_continuous(path: impl AsRef<Path>, format: &TabularFormat) -> Result<DataSet> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "data".to_string());
    let data = parse_continuous(&text, &name, &path.display().to_string(), format)?;
    debug!(
        path = %path.display(),
        rows = data.num_rows(),
        columns = data.num_columns(),
        "Read continuous data set"
    );
    Ok(data)
}

/// Parse continuous data from text; `source` labels errors
pub fn parse_continuous(
    text: &str,
    name: &str,
    source: &str,
    format: &TabularFormat,
) -> Result<DataSet> {
    let body: String = text
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with(format.comment_prefix.as_str())
        })
        .collect::<Vec<_>>()
        .join("\n");

    if body.is_empty() {
        return Err(CausalError::parse(source, "no header line"));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter)
        .quote(format.quote)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let names: Vec<String> = reader
        .headers()
        .map_err(|e| CausalError::parse(source, e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    if let Some(pos) = names.iter().position(String::is_empty) {
        return Err(CausalError::parse(
            source,
            format!("empty variable name in header column {}", pos + 1),
        ));
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| CausalError::parse(source, e.to_string()))?;
        for (col, field) in record.iter().enumerate() {
            let value = if field == format.missing_marker {
                f64::NAN
            } else {
                field.parse::<f64>().map_err(|_| {
                    CausalError::parse(
                        source,
                        format!(
                            "row {}, column '{}': '{}' is not a number",
                            row + 1,
                            names[col],
                            field
                        ),
                    )
                })?
            };
            columns[col].push(value);
        }
    }

    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    DataSet::continuous(name, &refs, columns)
        .map_err(|e| CausalError::parse(source, e.to_string()))
}
