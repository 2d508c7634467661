//! Parser for the package manager's fixed-width tables.
//!
//! ```text
//! Name             Id                Version  Available Source
//! -------------------------------------------------------------
//! Git              Git.Git           2.43.0   2.44.0    winget
//! ```
//!
//! Column boundaries come from the display column where each expected
//! title starts in the header line. A second header/separator pair (the "explicit targeting"
//! section some versions print) restarts column detection.

use crate::error::{Result, SyncError};
use regex::Regex;
use std::sync::LazyLock;

static SEPARATOR: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\s*-{3,}\s*$"));

fn separator() -> Result<&'static Regex> {
    SEPARATOR
        .as_ref()
        .map_err(|e| SyncError::Other(format!("table separator pattern: {}", e)))
}

/// One data row, cells keyed by column title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    cells: Vec<(String, String)>,
}

impl TableRow {
    /// Trimmed cell text; `None` for a missing column or an empty cell.
    pub fn get(&self, title: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == title)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug)]
struct Column {
    title: String,
    start: usize,
}

/// Keep only what the terminal would show after progress spinners redraw.
fn visible(line: &str) -> &str {
    line.rsplit('\r').next().unwrap_or(line).trim_end()
}

/// Terminal cells taken by `text`; CJK and other wide characters count twice.
fn display_width(text: &str) -> usize {
    console::measure_text_width(text)
}

fn locate_columns(header: &str, titles: &[&str]) -> Option<Vec<Column>> {
    let mut columns: Vec<Column> = titles
        .iter()
        .filter_map(|title| {
            header.find(title).map(|byte_idx| Column {
                title: title.to_string(),
                start: display_width(&header[..byte_idx]),
            })
        })
        .collect();

    if columns.is_empty() {
        return None;
    }
    columns.sort_by_key(|c| c.start);
    Some(columns)
}

/// Assign each character to the column whose start is at or left of the
/// display column the character begins in.
fn split_row(line: &str, columns: &[Column]) -> TableRow {
    let mut values = vec![String::new(); columns.len()];
    let mut at = 0;
    let mut buf = [0u8; 4];

    for ch in line.chars() {
        if let Some(idx) = columns.iter().rposition(|c| c.start <= at) {
            values[idx].push(ch);
        }
        at += display_width(ch.encode_utf8(&mut buf));
    }

    let cells = columns
        .iter()
        .zip(values)
        .map(|(column, value)| (column.title.clone(), value.trim().to_string()))
        .collect();
    TableRow { cells }
}

/// Parse every table in `output`.
///
/// The first of `required` is the key column: a header without it is not a
/// table we understand. Rows with any required cell empty, or with
/// whitespace in the key, are dropped (footers, wrapped text). Returns
/// `None` when no table was found at all.
pub fn parse_table(
    output: &str,
    titles: &[&str],
    required: &[&str],
) -> Result<Option<Vec<TableRow>>> {
    let separator = separator()?;
    let Some(&key_column) = required.first() else {
        return Err(SyncError::Other("table key column not given".into()));
    };
    let lines: Vec<&str> = output.lines().map(visible).collect();

    let mut found = false;
    let mut rows = Vec::new();
    let mut columns: Option<Vec<Column>> = None;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let next_is_separator = lines.get(i + 1).is_some_and(|next| separator.is_match(next));

        if next_is_separator {
            columns = locate_columns(line, titles)
                .filter(|cols| cols.iter().any(|c| c.title == key_column));
            found |= columns.is_some();
            i += 2;
            continue;
        }

        if let Some(cols) = &columns
            && !line.trim().is_empty()
        {
            let row = split_row(line, cols);
            let key_ok = row
                .get(key_column)
                .is_some_and(|key| !key.chars().any(char::is_whitespace));
            let complete = required
                .iter()
                .filter(|title| cols.iter().any(|c| c.title == **title))
                .all(|title| row.get(title).is_some());
            if key_ok && complete {
                rows.push(row);
            }
        }
        i += 1;
    }

    Ok(found.then_some(rows))
}

#[cfg(test)]
mod tests;
