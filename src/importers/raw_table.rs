use std::collections::HashMap;
use tracing::debug;

use crate::models::Column;

/// One yearly station extract as handed over by ingestion: string fields
/// under the file's own header labels, plus the year the extract belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Where the table came from (file path or caller-chosen label), for logs
    pub source: String,
    /// Unparsed year tag; validated by the normalizer
    pub year_tag: String,
    pub header: Vec<String>,
    /// `None` marks a field the reader already knew to be missing
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(
        source: impl Into<String>,
        year_tag: impl Into<String>,
        header: Vec<String>,
    ) -> Self {
        Self {
            source: source.into(),
            year_tag: year_tag.into(),
            header,
            rows: Vec::new(),
        }
    }

    /// Build a table from string slices, treating every cell as present
    pub fn from_strs(source: &str, year_tag: &str, header: &[&str], rows: &[&[&str]]) -> Self {
        let mut table = Self::new(
            source,
            year_tag,
            header.iter().map(|h| h.to_string()).collect(),
        );
        table.rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| Some(cell.to_string())).collect())
            .collect();
        table
    }

    pub fn push_row(&mut self, row: Vec<Option<String>>) {
        self.rows.push(row);
    }

    /// Map semantic columns to field positions via the static header aliases.
    ///
    /// When a label appears twice, the first position wins.
    pub fn column_positions(&self) -> HashMap<Column, usize> {
        let mut positions = HashMap::new();
        for (idx, label) in self.header.iter().enumerate() {
            match Column::from_header(label) {
                Some(column) => {
                    positions.entry(column).or_insert(idx);
                }
                None => debug!("{}: ignoring unknown column '{}'", self.source, label),
            }
        }
        positions
    }

    /// Field at `idx` of `row`, `None` if missing or the row is short
    pub fn field(row: &[Option<String>], idx: usize) -> Option<&str> {
        row.get(idx).and_then(|cell| cell.as_deref())
    }
}
