use std::fs;
use std::path::Path;

use crate::error::{OptifindError, Result};

/// One line of the input source list.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    id: String,
    coordinates: Vec<f64>,
}

impl SourceRecord {
    pub fn new(id: impl Into<String>, coordinates: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            coordinates,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// World coordinates in the cube's native axis order.
    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }
}

pub fn load(path: impl AsRef<Path>, expected_columns: usize) -> Result<Vec<SourceRecord>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|_| {
        OptifindError::catalogue(format!(
            "Failed to read input catalogue: {}",
            path.display()
        ))
    })?;
    parse(&content, expected_columns)
}

/// Parses `id, coord_1, coord_2, ...` lines. `expected_columns` is the cube
/// dimensionality plus one for the id.
pub fn parse(content: &str, expected_columns: usize) -> Result<Vec<SourceRecord>> {
    let rows = split_rows(content)?;

    let Some((_, first)) = rows.first() else {
        return Err(OptifindError::catalogue(
            "No sources found in input catalogue.",
        ));
    };
    let n_cols = first.len();
    if n_cols != expected_columns {
        return Err(OptifindError::catalogue(format!(
            "Data cube is {}D, but {} coordinate values given in catalogue.",
            expected_columns.saturating_sub(1),
            n_cols - 1
        )));
    }

    rows.into_iter()
        .map(|(line, fields)| parse_record(line, fields))
        .collect()
}

/// Trimmed fields of every data line, tagged with 1-based line numbers. The
/// first data line fixes the column count for the whole file.
fn split_rows(content: &str) -> Result<Vec<(usize, Vec<&str>)>> {
    let mut rows: Vec<(usize, Vec<&str>)> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if let Some((_, first)) = rows.first() {
            if first.len() != fields.len() {
                return Err(OptifindError::catalogue_line(
                    i + 1,
                    format!(
                        "Variable number of catalogue columns encountered ({} instead of {}).",
                        fields.len(),
                        first.len()
                    ),
                ));
            }
        }
        rows.push((i + 1, fields));
    }
    Ok(rows)
}

fn parse_record(line: usize, fields: Vec<&str>) -> Result<SourceRecord> {
    let coordinates = fields[1..]
        .iter()
        .map(|field| {
            field.parse::<f64>().map_err(|_| {
                OptifindError::catalogue_line(line, format!("invalid coordinate value '{}'", field))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SourceRecord::new(fields[0], coordinates))
}
